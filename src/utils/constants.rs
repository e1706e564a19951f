//! Constants Module - Single Source of Truth
//!
//! Endpoints, program ids, scanner parameters and built-in trade policies.
//! Other modules import from here instead of hardcoding values.

use crate::models::types::{PriorityLevel, TradePolicy};

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "RusterSniper";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for outbound HTTP requests
pub const USER_AGENT: &str = "RusterSniper/0.1.0";

// ============================================
// HTTP / RPC CONSTANTS
// ============================================

/// Default timeout for Solana RPC requests (seconds)
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 10;

/// Timeout for Jupiter quote/swap requests (seconds)
pub const JUPITER_TIMEOUT_SECS: u64 = 15;

/// Timeout for OCR requests (seconds); OCR.space is slow on large images
pub const OCR_TIMEOUT_SECS: u64 = 30;

/// Largest webhook body accepted (bytes)
pub const MAX_WEBHOOK_BODY_BYTES: usize = 256 * 1024;

/// Allowed clock skew for webhook timestamps (seconds)
pub const WEBHOOK_TOLERANCE_SECS: u64 = 300;

/// Public mainnet RPC used when SOLANA_RPC_URL is not set
pub const DEFAULT_SOLANA_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

/// Jupiter Swap API (lite tier works without an API key)
pub const DEFAULT_JUPITER_API_URL: &str = "https://lite-api.jup.ag/swap/v1";

/// OCR.space remote-image endpoint
pub const DEFAULT_OCR_API_URL: &str = "https://api.ocr.space/parse/imageurl";

/// Default server port
pub const DEFAULT_PORT: u16 = 8080;

// ============================================
// SOLANA CONSTANTS
// ============================================

/// Wrapped SOL mint (Jupiter input for every buy)
pub const WSOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// Lamports per SOL
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Length of a decoded Solana public key
pub const PUBKEY_BYTES: usize = 32;

/// Token Program ID
pub const TOKEN_PROGRAM: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

/// Token-2022 Program ID
pub const TOKEN_2022_PROGRAM: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";

/// Addresses that are never bought, whatever the text says.
/// Quote mints and well-known program ids show up in posts constantly.
pub const DEFAULT_BLOCKLIST: &[&str] = &[
    WSOL_MINT,
    "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", // USDC
    "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB", // USDT
    "11111111111111111111111111111111",             // System Program
    TOKEN_PROGRAM,
    TOKEN_2022_PROGRAM,
    "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL", // Associated Token Program
    "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4",  // Jupiter Aggregator
    "6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P",  // pump.fun
    "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8", // Raydium AMM
];

// ============================================
// SCANNER CONSTANTS
// ============================================

/// Sliding window width (longest address + 1)
pub const SCAN_WINDOW_CHARS: usize = 45;

/// Unique addresses looked up per notification; the rest are dropped
pub const MAX_RESOLVE_CANDIDATES: usize = 32;

/// Base58 run of plausible address length
pub const ADDRESS_PATTERN: &str = "[1-9A-HJ-NP-Za-km-z]{32,44}";

// ============================================
// TRADE POLICY DEFAULTS
// ============================================

/// Default slippage for buys (bps)
pub const DEFAULT_SLIPPAGE_BPS: u16 = 1500;

/// 100%
pub const MAX_SLIPPAGE_BPS: u16 = 10_000;

/// Policy used for unknown users
pub fn default_trade_policy() -> TradePolicy {
    TradePolicy {
        amount_lamports: sol_to_lamports(0.01),
        max_priority_fee_lamports: 1_000_000,
        priority_level: PriorityLevel::High,
        slippage_bps: DEFAULT_SLIPPAGE_BPS,
    }
}

/// Built-in per-user policies, overridable through TRADE_POLICIES
pub fn builtin_trade_policies() -> Vec<(&'static str, TradePolicy)> {
    vec![
        (
            "whale",
            TradePolicy {
                amount_lamports: sol_to_lamports(0.5),
                max_priority_fee_lamports: 5_000_000,
                priority_level: PriorityLevel::VeryHigh,
                slippage_bps: DEFAULT_SLIPPAGE_BPS,
            },
        ),
        (
            "cautious",
            TradePolicy {
                amount_lamports: sol_to_lamports(0.005),
                max_priority_fee_lamports: 200_000,
                priority_level: PriorityLevel::Medium,
                slippage_bps: 500,
            },
        ),
    ]
}

// ============================================
// HELPER FUNCTIONS
// ============================================

/// Convert SOL to lamports (truncating)
#[inline]
pub fn sol_to_lamports(sol: f64) -> u64 {
    (sol * LAMPORTS_PER_SOL as f64) as u64
}

/// Convert lamports to SOL
#[inline]
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Hide the API key part of a URL for logging
pub fn mask_url(url: &str) -> String {
    if let Some(idx) = url.find(['?', '#']) {
        return format!("{}?***", &url[..idx]);
    }
    let host_start = url.find("://").map(|i| i + 3).unwrap_or(0);
    let Some(path_start) = url[host_start..].find('/').map(|p| host_start + p) else {
        return url.to_string();
    };
    match url.rfind('/') {
        // Path segments longer than 20 chars are usually keys (Helius, Alchemy)
        Some(idx) if idx >= path_start && url.len() - idx > 21 => format!("{}/***", &url[..idx]),
        _ => url.to_string(),
    }
}
