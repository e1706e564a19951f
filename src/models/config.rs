//! Configuration module for Ruster Sniper
//!
//! Everything comes from the environment. Defaults live in
//! utils/constants.rs; this file only reads and validates.

use serde::Deserialize;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::models::errors::{AppError, AppResult};
use crate::models::types::{PriorityLevel, TradePolicy};
use crate::utils::constants::{
    builtin_trade_policies, default_trade_policy, mask_url, sol_to_lamports,
    DEFAULT_JUPITER_API_URL, DEFAULT_OCR_API_URL, DEFAULT_PORT, DEFAULT_SOLANA_RPC_URL,
    LAMPORTS_PER_SOL, MAX_SLIPPAGE_BPS,
};

// ============================================
// Trade policy table
// ============================================

/// User id → trade policy, with a default branch for everyone else
#[derive(Debug, Clone)]
pub struct TradePolicyTable {
    policies: HashMap<String, TradePolicy>,
    default: TradePolicy,
}

impl Default for TradePolicyTable {
    fn default() -> Self {
        Self::new(default_trade_policy())
    }
}

impl TradePolicyTable {
    /// Table holding only a default policy
    pub fn new(default: TradePolicy) -> Self {
        Self {
            policies: HashMap::new(),
            default,
        }
    }

    /// Built-in user policies on top of the default one
    pub fn builtin() -> Self {
        let mut table = Self::default();
        for (user, policy) in builtin_trade_policies() {
            table.insert(user, policy);
        }
        table
    }

    /// User ids are matched case-insensitively
    pub fn insert(&mut self, user: &str, policy: TradePolicy) {
        self.policies.insert(user.trim().to_lowercase(), policy);
    }

    pub fn for_user(&self, user: Option<&str>) -> &TradePolicy {
        user.map(|u| u.trim().to_lowercase())
            .and_then(|u| self.policies.get(&u))
            .unwrap_or(&self.default)
    }

    pub fn default_policy(&self) -> &TradePolicy {
        &self.default
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Merge a JSON object `{"user": {...}, "default": {...}}` over the table
    pub fn merge_json(&mut self, raw: &str) -> AppResult<()> {
        let overrides: HashMap<String, PolicyOverride> = serde_json::from_str(raw)
            .map_err(|e| AppError::invalid_config(format!("TRADE_POLICIES is not valid JSON: {}", e)))?;

        for (user, patch) in overrides {
            if user.eq_ignore_ascii_case("default") {
                self.default = patch.apply(&self.default, &user)?;
            } else {
                let base = self.for_user(Some(&user)).clone();
                self.insert(&user, patch.apply(&base, &user)?);
            }
        }
        Ok(())
    }
}

/// Partial policy as written in TRADE_POLICIES; missing fields inherit
#[derive(Debug, Deserialize)]
struct PolicyOverride {
    amount_sol: Option<f64>,
    max_priority_fee_lamports: Option<u64>,
    priority_level: Option<PriorityLevel>,
    slippage_bps: Option<u16>,
}

impl PolicyOverride {
    fn apply(&self, base: &TradePolicy, user: &str) -> AppResult<TradePolicy> {
        let amount_lamports = match self.amount_sol {
            Some(sol) => amount_to_lamports(sol).ok_or_else(|| {
                AppError::invalid_config(format!(
                    "TRADE_POLICIES.{}.amount_sol must be a positive SOL amount, got {}",
                    user, sol
                ))
            })?,
            None => base.amount_lamports,
        };
        let slippage_bps = self.slippage_bps.unwrap_or(base.slippage_bps);
        if slippage_bps > MAX_SLIPPAGE_BPS {
            return Err(AppError::invalid_config(format!(
                "TRADE_POLICIES.{}.slippage_bps must be at most {}, got {}",
                user, MAX_SLIPPAGE_BPS, slippage_bps
            )));
        }

        Ok(TradePolicy {
            amount_lamports,
            max_priority_fee_lamports: self
                .max_priority_fee_lamports
                .unwrap_or(base.max_priority_fee_lamports),
            priority_level: self.priority_level.unwrap_or(base.priority_level),
            slippage_bps,
        })
    }
}

/// Finite, positive and representable in lamports
fn amount_to_lamports(sol: f64) -> Option<u64> {
    if !sol.is_finite() || sol <= 0.0 {
        return None;
    }
    let lamports = sol * LAMPORTS_PER_SOL as f64;
    if lamports < 1.0 || lamports >= u64::MAX as f64 {
        return None;
    }
    Some(sol_to_lamports(sol))
}

// ============================================
// Service configuration
// ============================================

/// Runtime configuration for the webhook service
#[derive(Clone)]
pub struct SniperConfig {
    pub host: String,
    pub port: u16,
    pub rpc_url: String,
    pub rpc_fallback_url: Option<String>,
    pub jupiter_api_url: String,
    pub jupiter_api_key: Option<String>,
    pub ocr_api_url: String,
    /// OCR is disabled when unset
    pub ocr_api_key: Option<String>,
    /// Signature verification is disabled when unset
    pub webhook_secret: Option<String>,
    /// Base58 64-byte keypair
    pub private_key: String,
    pub extra_blocklist: Vec<String>,
    pub policies: TradePolicyTable,
}

impl std::fmt::Debug for SniperConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Secrets never reach the logs
        f.debug_struct("SniperConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("rpc_url", &mask_url(&self.rpc_url))
            .field("jupiter_api_url", &self.jupiter_api_url)
            .field("ocr_enabled", &self.ocr_api_key.is_some())
            .field("signature_check", &self.webhook_secret.is_some())
            .field("extra_blocklist", &self.extra_blocklist.len())
            .field("policies", &self.policies.len())
            .finish()
    }
}

impl SniperConfig {
    /// Read configuration from process environment
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup (tests pass a map)
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match get("PORT").or_else(|| get("RUSTER_PORT")) {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| AppError::invalid_config(format!("Invalid port: {}", raw)))?,
            None => DEFAULT_PORT,
        };

        let private_key = get("SOLANA_PRIVATE_KEY").ok_or_else(|| AppError::missing_env("SOLANA_PRIVATE_KEY"))?;

        let mut policies = TradePolicyTable::builtin();
        if let Some(raw) = get("DEFAULT_SLIPPAGE_BPS") {
            let bps = raw
                .parse::<u16>()
                .map_err(|_| AppError::invalid_config(format!("Invalid DEFAULT_SLIPPAGE_BPS: {}", raw)))?;
            policies.merge_json(&format!(r#"{{"default": {{"slippage_bps": {}}}}}"#, bps))?;
        }
        if let Some(raw) = get("TRADE_POLICIES") {
            policies.merge_json(&raw)?;
        }

        let extra_blocklist = get("BLOCKLIST")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let config = Self {
            host: get("RUSTER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            rpc_url: get("SOLANA_RPC_URL").unwrap_or_else(|| DEFAULT_SOLANA_RPC_URL.to_string()),
            rpc_fallback_url: get("SOLANA_RPC_FALLBACK_URL"),
            jupiter_api_url: get("JUPITER_API_URL").unwrap_or_else(|| DEFAULT_JUPITER_API_URL.to_string()),
            jupiter_api_key: get("JUPITER_API_KEY"),
            ocr_api_url: get("OCR_API_URL").unwrap_or_else(|| DEFAULT_OCR_API_URL.to_string()),
            ocr_api_key: get("OCR_API_KEY"),
            webhook_secret: get("WEBHOOK_SECRET"),
            private_key,
            extra_blocklist,
            policies,
        };

        config.log_summary();
        Ok(config)
    }

    /// Degraded-mode notices, logged once at load
    pub fn startup_warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();
        if self.ocr_api_key.is_none() {
            warnings.push("OCR_API_KEY not set: images will be ignored");
        }
        if self.webhook_secret.is_none() {
            warnings.push("WEBHOOK_SECRET not set: webhook signatures will NOT be verified");
        }
        warnings
    }

    fn log_summary(&self) {
        info!("🔧 RPC: {}", mask_url(&self.rpc_url));
        if self.rpc_fallback_url.is_some() {
            info!("🔧 Fallback RPC configured");
        }
        if self.jupiter_api_key.is_some() {
            info!("🔑 JUPITER_API_KEY configured (key hidden)");
        }
        for warning in self.startup_warnings() {
            warn!("⚠️ {}", warning);
        }
        info!(
            "🔧 Default buy: {} lamports, {} user policies, {} extra block-list entries",
            self.policies.default_policy().amount_lamports,
            self.policies.len(),
            self.extra_blocklist.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_private_key_is_required() {
        let err = SniperConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err.code_str(), "CFG_MISSING_ENV");
    }

    #[test]
    fn test_defaults() {
        let config = SniperConfig::from_lookup(lookup(&[("SOLANA_PRIVATE_KEY", "key")])).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.rpc_url, DEFAULT_SOLANA_RPC_URL);
        assert!(config.webhook_secret.is_none());
        assert!(config.ocr_api_key.is_none());
        assert!(config.extra_blocklist.is_empty());
    }

    #[test]
    fn test_port_fallback_and_validation() {
        let config = SniperConfig::from_lookup(lookup(&[
            ("SOLANA_PRIVATE_KEY", "key"),
            ("RUSTER_PORT", "3000"),
        ]))
        .unwrap();
        assert_eq!(config.port, 3000);

        let err = SniperConfig::from_lookup(lookup(&[("SOLANA_PRIVATE_KEY", "key"), ("PORT", "http")]))
            .unwrap_err();
        assert_eq!(err.code_str(), "CFG_INVALID_VALUE");
    }

    #[test]
    fn test_missing_secret_warned_once() {
        let config = SniperConfig::from_lookup(lookup(&[("SOLANA_PRIVATE_KEY", "key")])).unwrap();
        let warnings = config.startup_warnings();
        assert_eq!(
            warnings.iter().filter(|w| w.starts_with("WEBHOOK_SECRET")).count(),
            1
        );

        let config = SniperConfig::from_lookup(lookup(&[
            ("SOLANA_PRIVATE_KEY", "key"),
            ("WEBHOOK_SECRET", "whsec_c2VjcmV0"),
            ("OCR_API_KEY", "ocr"),
        ]))
        .unwrap();
        assert!(config.startup_warnings().is_empty());
    }

    #[test]
    fn test_blocklist_parsing() {
        let config = SniperConfig::from_lookup(lookup(&[
            ("SOLANA_PRIVATE_KEY", "key"),
            ("BLOCKLIST", " aaa, ,bbb "),
        ]))
        .unwrap();
        assert_eq!(config.extra_blocklist, vec!["aaa", "bbb"]);
    }

    #[test]
    fn test_policy_lookup_falls_back_to_default() {
        let table = TradePolicyTable::builtin();
        assert_eq!(table.for_user(None), table.default_policy());
        assert_eq!(table.for_user(Some("nobody")), table.default_policy());
        assert_ne!(table.for_user(Some("WHALE")), table.default_policy());
    }

    #[test]
    fn test_trade_policies_json_merges() {
        let mut table = TradePolicyTable::builtin();
        table
            .merge_json(r#"{"alice": {"amount_sol": 0.25, "priority_level": "veryHigh"}, "default": {"slippage_bps": 300}}"#)
            .unwrap();

        let alice = table.for_user(Some("alice"));
        assert_eq!(alice.amount_lamports, 250_000_000);
        assert_eq!(alice.priority_level, PriorityLevel::VeryHigh);
        assert_eq!(table.default_policy().slippage_bps, 300);
    }

    #[test]
    fn test_trade_policies_reject_bad_amounts() {
        for amount in ["-1.0", "0", "1e30", "0.0000000001"] {
            let mut table = TradePolicyTable::builtin();
            let err = table
                .merge_json(&format!(r#"{{"alice": {{"amount_sol": {}}}}}"#, amount))
                .unwrap_err();
            assert_eq!(err.code_str(), "CFG_INVALID_VALUE", "amount {}", amount);
        }
        assert!(amount_to_lamports(f64::NAN).is_none());
        assert!(amount_to_lamports(f64::INFINITY).is_none());
    }

    #[test]
    fn test_trade_policies_reject_excess_slippage() {
        let mut table = TradePolicyTable::builtin();
        let err = table
            .merge_json(r#"{"default": {"slippage_bps": 10001}}"#)
            .unwrap_err();
        assert_eq!(err.code_str(), "CFG_INVALID_VALUE");
        assert_eq!(table.default_policy().slippage_bps, default_trade_policy().slippage_bps);
    }

    #[test]
    fn test_bad_policy_json_is_config_error() {
        let mut table = TradePolicyTable::default();
        let err = table.merge_json("not json").unwrap_err();
        assert_eq!(err.code_str(), "CFG_INVALID_VALUE");
    }

    #[test]
    fn test_debug_hides_private_key() {
        let config = SniperConfig::from_lookup(lookup(&[("SOLANA_PRIVATE_KEY", "supersecret")])).unwrap();
        assert!(!format!("{:?}", config).contains("supersecret"));
    }
}
