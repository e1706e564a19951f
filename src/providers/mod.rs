//! Providers Module - External Service Clients
//!
//! Solana RPC, Jupiter swap API and OCR.space. Each implements one of the
//! core collaborator traits.

pub mod jupiter;
pub mod ocr;
pub mod solana;

pub use jupiter::JupiterDispatcher;
pub use ocr::OcrSpaceClient;
pub use solana::SolanaRpcClient;
