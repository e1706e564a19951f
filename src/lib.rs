//! Ruster Sniper Library
//!
//! Webhook-triggered Solana token sniper:
//! - Normalizes notification text (NFKC + homoglyph folding) and OCR output
//! - Scans for Base58 mint addresses with a sliding window
//! - Validates canonical 32-byte encodings against a block-list
//! - Races metadata lookups and buys the first resolvable token via Jupiter

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::{BlockList, MetadataSource, SniperPipeline, TextExtractor, TradeDispatcher};
pub use models::{
    AppError, AppResult, ErrorCode, NotificationPayload, PipelineOutcome, SniperConfig, SourceKind,
    TokenMetadata, TradePolicy, TradePolicyTable, TradeReceipt, WebhookResponse,
};
pub use providers::{JupiterDispatcher, OcrSpaceClient, SolanaRpcClient};
pub use utils::{TelemetryCollector, TelemetryStats, WalletSigner};
