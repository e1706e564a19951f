//! Core data types shared by the pipeline, providers and API layer.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================
// Inbound notification
// ============================================

/// Notification delivered by the webhook relay.
///
/// Every field is optional; the relay forwards whatever the tweet-catcher
/// captured. `user` only selects the trade policy.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NotificationPayload {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub full_text: Option<String>,
    /// Image URL attached to the post
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
}

impl NotificationPayload {
    /// Image URL if present and non-blank
    pub fn image_url(&self) -> Option<&str> {
        self.image.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Which sources contributed text to the scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    #[serde(rename = "text only")]
    TextOnly,
    #[serde(rename = "text and image")]
    TextAndImage,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextOnly => "text only",
            Self::TextAndImage => "text and image",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================
// Token metadata
// ============================================

/// Parsed SPL mint account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub decimals: u8,
    /// Raw supply in base units
    pub supply: u64,
    pub is_initialized: bool,
    /// Owning program (Token or Token-2022)
    pub token_program: String,
    pub mint_authority: Option<String>,
    pub freeze_authority: Option<String>,
}

impl TokenMetadata {
    /// Zero-decimal or uninitialized accounts are not tradeable tokens
    pub fn is_token(&self) -> bool {
        self.is_initialized && self.decimals > 0
    }
}

/// The race winner: an address and its metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedToken {
    pub mint: String,
    pub metadata: TokenMetadata,
}

// ============================================
// Trade policy
// ============================================

/// Jupiter priority level for the prioritization fee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PriorityLevel {
    Medium,
    High,
    VeryHigh,
}

impl PriorityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Medium => "medium",
            Self::High => "high",
            Self::VeryHigh => "veryHigh",
        }
    }
}

/// Per-user trade sizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradePolicy {
    /// SOL spent per buy, in lamports
    pub amount_lamports: u64,
    pub max_priority_fee_lamports: u64,
    pub priority_level: PriorityLevel,
    pub slippage_bps: u16,
}

/// Result of a dispatched buy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeReceipt {
    pub signature: String,
    pub in_amount_lamports: u64,
    /// Quoted output in token base units
    pub quoted_out_amount: u64,
}

// ============================================
// Pipeline outcome & response
// ============================================

/// What a pipeline run ended with (errors travel separately as AppError)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Nothing Base58-like anywhere in the notification
    NoCandidates { source: SourceKind },
    /// Candidates existed but none validated or resolved
    NoValidToken { source: SourceKind },
    /// Token resolved and buy submitted
    Bought {
        source: SourceKind,
        token: ResolvedToken,
        receipt: TradeReceipt,
    },
}

/// Body returned to the webhook relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookResponse {
    /// "success" | "error"
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl WebhookResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            source: None,
            mint: None,
            signature: None,
        }
    }
}

impl From<PipelineOutcome> for WebhookResponse {
    fn from(outcome: PipelineOutcome) -> Self {
        match outcome {
            PipelineOutcome::NoCandidates { source } => Self {
                status: "success".to_string(),
                message: "Successfully processed notification: no token addresses mentioned"
                    .to_string(),
                source: Some(source),
                mint: None,
                signature: None,
            },
            PipelineOutcome::NoValidToken { source } => Self {
                status: "success".to_string(),
                message: "No valid token addresses found".to_string(),
                source: Some(source),
                mint: None,
                signature: None,
            },
            PipelineOutcome::Bought {
                source,
                token,
                receipt,
            } => Self {
                status: "success".to_string(),
                message: format!(
                    "Successfully processed notification: bought {} ({})",
                    token.mint, source
                ),
                source: Some(source),
                mint: Some(token.mint),
                signature: Some(receipt.signature),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_accepts_partial_json() {
        let payload: NotificationPayload =
            serde_json::from_str(r#"{"full_text": "hello", "user": "alice"}"#).unwrap();
        assert_eq!(payload.full_text.as_deref(), Some("hello"));
        assert!(payload.text.is_none());
        assert!(payload.image_url().is_none());
    }

    #[test]
    fn test_blank_image_is_ignored() {
        let payload = NotificationPayload {
            image: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(payload.image_url().is_none());
    }

    #[test]
    fn test_source_kind_serializes_human_readable() {
        let json = serde_json::to_string(&SourceKind::TextAndImage).unwrap();
        assert_eq!(json, "\"text and image\"");
    }

    #[test]
    fn test_zero_decimals_is_not_a_token() {
        let meta = TokenMetadata {
            decimals: 0,
            supply: 1,
            is_initialized: true,
            token_program: String::new(),
            mint_authority: None,
            freeze_authority: None,
        };
        assert!(!meta.is_token());
    }

    #[test]
    fn test_no_valid_token_response_is_success_shaped() {
        let resp: WebhookResponse = PipelineOutcome::NoValidToken {
            source: SourceKind::TextAndImage,
        }
        .into();
        assert_eq!(resp.status, "success");
        assert_eq!(resp.message, "No valid token addresses found");
    }
}
