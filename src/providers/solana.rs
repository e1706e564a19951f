//! Solana JSON-RPC Client
//!
//! Primary endpoint with an optional fallback. No retries: a sniper that
//! waits on backoff has already lost the race.
//!
//! Used for two things only:
//! - `getAccountInfo` (jsonParsed) to read SPL mint metadata
//! - `sendTransaction` to broadcast the signed swap

use async_trait::async_trait;
use eyre::{eyre, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, CONTENT_TYPE, USER_AGENT};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::resolver::MetadataSource;
use crate::models::errors::AppError;
use crate::models::types::TokenMetadata;
use crate::utils::constants::{mask_url, DEFAULT_RPC_TIMEOUT_SECS, USER_AGENT as USER_AGENT_CONST};

/// JSON-RPC response envelope
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

/// JSON-RPC error object
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// Solana RPC client with fallback
#[derive(Clone)]
pub struct SolanaRpcClient {
    primary_url: String,
    fallback_url: Option<String>,
    client: reqwest::Client,
}

impl SolanaRpcClient {
    pub fn new(primary_url: impl Into<String>, fallback_url: Option<String>) -> Result<Self> {
        let primary_url = primary_url.into();
        info!("🔗 Solana RPC: {}", mask_url(&primary_url));
        if let Some(ref fallback) = fallback_url {
            info!("🔗 Solana fallback RPC: {}", mask_url(fallback));
        }

        Ok(Self {
            primary_url,
            fallback_url,
            client: Self::build_client()?,
        })
    }

    fn build_client() -> Result<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(DEFAULT_RPC_TIMEOUT_SECS))
            .gzip(true)
            .build()
            .map_err(|e| eyre!("Failed to build HTTP client: {}", e))
    }

    /// Masked primary URL for logging
    pub fn masked_url(&self) -> String {
        mask_url(&self.primary_url)
    }

    /// Execute a JSON-RPC call, falling back once on transport failure.
    ///
    /// RPC-level errors (the node answered with an `error` object) are not
    /// retried on the fallback: the other node would say the same thing.
    pub async fn call<T: for<'de> Deserialize<'de>>(&self, method: &str, params: Value) -> Result<T> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let primary_err = match self.execute_call::<T>(&self.primary_url, &payload).await {
            Ok(result) => return Ok(result),
            Err(CallError::Rpc(e)) => return Err(e),
            Err(CallError::Transport(e)) => e,
        };

        let Some(ref fallback) = self.fallback_url else {
            return Err(primary_err);
        };

        warn!(method, error = %primary_err, "⚠️ Primary RPC failed, trying fallback");
        match self.execute_call::<T>(fallback, &payload).await {
            Ok(result) => Ok(result),
            Err(CallError::Rpc(e)) | Err(CallError::Transport(e)) => {
                warn!(method, error = %e, "⚠️ Fallback RPC also failed");
                Err(e)
            }
        }
    }

    async fn execute_call<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        payload: &Value,
    ) -> std::result::Result<T, CallError> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| CallError::Transport(AppError::from(e).into()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CallError::Transport(
                AppError::rpc_error(format!("HTTP error: {}", status)).into(),
            ));
        }

        let json: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| CallError::Transport(eyre!("Failed to parse response: {}", e)))?;

        if let Some(error) = json.error {
            return Err(CallError::Rpc(
                AppError::rpc_error(format!("{} (code: {})", error.message, error.code)).into(),
            ));
        }

        json.result
            .ok_or_else(|| CallError::Rpc(eyre!("No result in response")))
    }

    /// Parsed mint metadata, `None` when the account is missing or not a mint
    pub async fn get_mint_metadata(&self, address: &str) -> Result<Option<TokenMetadata>> {
        let params = json!([address, {"encoding": "jsonParsed", "commitment": "confirmed"}]);
        let result: Value = self.call("getAccountInfo", params).await?;
        parse_mint_account(&result)
    }

    /// Broadcast a base64 wire transaction; returns the signature
    pub async fn send_transaction(&self, tx_base64: &str) -> Result<String> {
        let params = json!([
            tx_base64,
            {"encoding": "base64", "skipPreflight": false, "maxRetries": 3}
        ]);
        self.call::<String>("sendTransaction", params)
            .await
            .map_err(|e| AppError::broadcast_failed(e.to_string()).into())
    }
}

/// Transport failures may go to the fallback; RPC answers may not
enum CallError {
    Transport(eyre::Report),
    Rpc(eyre::Report),
}

#[async_trait]
impl MetadataSource for SolanaRpcClient {
    async fn lookup(&self, address: &str) -> Result<Option<TokenMetadata>> {
        self.get_mint_metadata(address).await
    }
}

/// Read a `getAccountInfo` jsonParsed result
pub fn parse_mint_account(result: &Value) -> Result<Option<TokenMetadata>> {
    let value = match result.get("value") {
        Some(v) if !v.is_null() => v,
        _ => return Ok(None),
    };

    // Non-token accounts come back as base64 arrays instead of parsed objects
    let Some(parsed) = value.pointer("/data/parsed") else {
        debug!("Account data is not parsed, not a token account");
        return Ok(None);
    };
    if parsed.get("type").and_then(Value::as_str) != Some("mint") {
        return Ok(None);
    }

    let info = parsed
        .get("info")
        .ok_or_else(|| eyre!("Mint account without parsed info"))?;

    let decimals = info
        .get("decimals")
        .and_then(Value::as_u64)
        .and_then(|d| u8::try_from(d).ok())
        .ok_or_else(|| eyre!("Mint account has no valid decimals"))?;
    let supply = info
        .get("supply")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| eyre!("Mint account has no valid supply"))?;

    let metadata = TokenMetadata {
        decimals,
        supply,
        is_initialized: info
            .get("isInitialized")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        token_program: value
            .get("owner")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        mint_authority: optional_str(info, "mintAuthority"),
        freeze_authority: optional_str(info, "freezeAuthority"),
    };

    if !metadata.is_token() {
        debug!(decimals, "Mint is uninitialized or has zero decimals");
        return Ok(None);
    }
    Ok(Some(metadata))
}

fn optional_str(obj: &Value, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}
