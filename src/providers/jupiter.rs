//! Jupiter Swap Dispatcher
//!
//! Buy flow for a resolved mint:
//! 1. `GET  {api}/quote`  SOL → mint, amount and slippage from the policy
//! 2. `POST {api}/swap`   prebuilt transaction with priority fee cap
//! 3. sign locally, 4. `sendTransaction` through the Solana RPC client

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use eyre::{eyre, Result};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::core::pipeline::TradeDispatcher;
use crate::models::errors::AppError;
use crate::models::types::{TradePolicy, TradeReceipt};
use crate::providers::solana::SolanaRpcClient;
use crate::utils::constants::{
    lamports_to_sol, JUPITER_TIMEOUT_SECS, USER_AGENT as USER_AGENT_CONST, WSOL_MINT,
};
use crate::utils::signer::WalletSigner;

/// Jupiter-backed trade dispatcher
pub struct JupiterDispatcher {
    api_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
    signer: Arc<WalletSigner>,
    rpc: SolanaRpcClient,
}

impl JupiterDispatcher {
    pub fn new(
        api_url: impl Into<String>,
        api_key: Option<String>,
        signer: Arc<WalletSigner>,
        rpc: SolanaRpcClient,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(JUPITER_TIMEOUT_SECS))
            .gzip(true)
            .build()
            .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key,
            client,
            signer,
            rpc,
        })
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.api_key {
            Some(ref key) => req.header("x-api-key", key),
            None => req,
        }
    }

    /// Raw quote object, passed back verbatim to `/swap`
    pub async fn get_quote(&self, mint: &str, policy: &TradePolicy) -> Result<Value> {
        let url = format!("{}/quote", self.api_url);
        let amount = policy.amount_lamports.to_string();
        let slippage = policy.slippage_bps.to_string();

        let resp = self
            .authorized(self.client.get(&url).query(&[
                ("inputMint", WSOL_MINT),
                ("outputMint", mint),
                ("amount", amount.as_str()),
                ("slippageBps", slippage.as_str()),
            ]))
            .send()
            .await
            .map_err(|e| AppError::quote_failed(format!("Jupiter unreachable: {}", e)))?;

        let status = resp.status();
        let quote: Value = resp
            .json()
            .await
            .map_err(|e| AppError::quote_failed(format!("Invalid quote response: {}", e)))?;

        if !status.is_success() || quote.get("error").is_some() || quote.get("outAmount").is_none() {
            return Err(AppError::quote_failed(format!(
                "Jupiter quote failed: {}",
                jupiter_error_message(&quote, "No route found")
            ))
            .into());
        }
        Ok(quote)
    }

    /// Base64 unsigned swap transaction for `quote`
    pub async fn build_swap(&self, quote: &Value, policy: &TradePolicy) -> Result<String> {
        let body = swap_request_body(quote, self.signer.pubkey(), policy);

        let resp = self
            .authorized(self.client.post(format!("{}/swap", self.api_url)))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::swap_build_failed(format!("Jupiter unreachable: {}", e)))?;

        let status = resp.status();
        let swap: Value = resp
            .json()
            .await
            .map_err(|e| AppError::swap_build_failed(format!("Invalid swap response: {}", e)))?;

        match swap.get("swapTransaction").and_then(Value::as_str) {
            Some(tx) if status.is_success() => Ok(tx.to_string()),
            _ => Err(AppError::swap_build_failed(format!(
                "Jupiter swap failed: {}",
                jupiter_error_message(&swap, "no swap transaction returned")
            ))
            .into()),
        }
    }
}

#[async_trait]
impl TradeDispatcher for JupiterDispatcher {
    async fn buy(&self, mint: &str, policy: &TradePolicy) -> Result<TradeReceipt> {
        info!(
            mint,
            sol = lamports_to_sol(policy.amount_lamports),
            slippage_bps = policy.slippage_bps,
            "📈 Requesting Jupiter quote"
        );
        let quote = self.get_quote(mint, policy).await?;
        let quoted_out_amount = parse_amount(&quote, "outAmount");
        debug!(quoted_out_amount, "Quote received");

        let swap_b64 = self.build_swap(&quote, policy).await?;
        let tx_bytes = BASE64
            .decode(swap_b64.as_bytes())
            .map_err(|e| AppError::swap_build_failed(format!("Swap transaction is not base64: {}", e)))?;

        let signed = self.signer.sign_transaction(&tx_bytes)?;
        let signature = self.rpc.send_transaction(&BASE64.encode(signed)).await?;

        info!(mint, signature = %signature, "🚀 Swap broadcast");
        Ok(TradeReceipt {
            signature,
            in_amount_lamports: policy.amount_lamports,
            quoted_out_amount,
        })
    }
}

/// `/swap` request body
pub fn swap_request_body(quote: &Value, user_pubkey: &str, policy: &TradePolicy) -> Value {
    json!({
        "quoteResponse": quote,
        "userPublicKey": user_pubkey,
        "wrapAndUnwrapSol": true,
        "dynamicComputeUnitLimit": true,
        "prioritizationFeeLamports": {
            "priorityLevelWithMaxLamports": {
                "maxLamports": policy.max_priority_fee_lamports,
                "priorityLevel": policy.priority_level.as_str()
            }
        }
    })
}

/// Jupiter reports failures as `error` or `message`
pub fn jupiter_error_message(body: &Value, fallback: &str) -> String {
    body.get("error")
        .and_then(Value::as_str)
        .or_else(|| body.get("message").and_then(Value::as_str))
        .unwrap_or(fallback)
        .to_string()
}

/// Jupiter encodes amounts as decimal strings
fn parse_amount(body: &Value, key: &str) -> u64 {
    body.get(key)
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::PriorityLevel;

    fn policy() -> TradePolicy {
        TradePolicy {
            amount_lamports: 10_000_000,
            max_priority_fee_lamports: 2_000_000,
            priority_level: PriorityLevel::VeryHigh,
            slippage_bps: 1500,
        }
    }

    #[test]
    fn test_swap_body_carries_fee_cap_and_priority() {
        let quote = json!({"outAmount": "123", "inputMint": WSOL_MINT});
        let body = swap_request_body(&quote, "Wa11et", &policy());

        assert_eq!(body["userPublicKey"], "Wa11et");
        assert_eq!(body["quoteResponse"]["outAmount"], "123");
        assert_eq!(body["wrapAndUnwrapSol"], true);
        let fee = &body["prioritizationFeeLamports"]["priorityLevelWithMaxLamports"];
        assert_eq!(fee["maxLamports"], 2_000_000);
        assert_eq!(fee["priorityLevel"], "veryHigh");
    }

    #[test]
    fn test_error_message_prefers_error_field() {
        let body = json!({"error": "Could not find any route", "message": "other"});
        assert_eq!(jupiter_error_message(&body, "x"), "Could not find any route");

        let body = json!({"message": "Rate limit exceeded"});
        assert_eq!(jupiter_error_message(&body, "x"), "Rate limit exceeded");

        assert_eq!(jupiter_error_message(&json!({}), "No route found"), "No route found");
    }

    #[test]
    fn test_parse_amount() {
        let quote = json!({"outAmount": "98765", "priceImpactPct": "0.1"});
        assert_eq!(parse_amount(&quote, "outAmount"), 98765);
        assert_eq!(parse_amount(&quote, "missing"), 0);
    }
}
