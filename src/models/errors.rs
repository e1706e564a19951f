//! Centralized Error Handling Module
//!
//! Every failure that reaches the HTTP layer carries a unique error code so
//! production logs can be grepped by category.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - CFG_xxx: Configuration errors
//! - RPC_xxx: Solana RPC errors
//! - WEBHOOK_xxx: Inbound webhook errors
//! - SWAP_xxx: Jupiter / signing / broadcast errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::fmt;

use crate::models::types::WebhookResponse;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Configuration Errors
    // ============================================
    /// Missing environment variable
    ConfigMissingEnv,
    /// Invalid configuration value
    ConfigInvalidValue,

    // ============================================
    // RPC Errors
    // ============================================
    /// RPC connection failed
    RpcConnectionFailed,
    /// RPC returned error response
    RpcError,
    /// Invalid RPC response
    RpcInvalidResponse,

    // ============================================
    // Webhook Errors
    // ============================================
    /// Body is not a valid notification
    WebhookBadRequest,
    /// Signature headers missing or wrong
    WebhookInvalidSignature,
    /// Rate limit exceeded
    WebhookRateLimited,

    // ============================================
    // Swap Errors
    // ============================================
    /// Jupiter quote failed (no route, bad mint, ...)
    SwapQuoteFailed,
    /// Jupiter did not build a transaction
    SwapBuildFailed,
    /// Local signing failed
    SwapSigningFailed,
    /// sendTransaction rejected
    SwapBroadcastFailed,

    // ============================================
    // External Service Errors
    // ============================================
    /// External service timeout
    ExternalTimeout,

    // ============================================
    // Generic Errors
    // ============================================
    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigMissingEnv => "CFG_MISSING_ENV",
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",

            Self::RpcConnectionFailed => "RPC_CONNECTION_FAILED",
            Self::RpcError => "RPC_ERROR",
            Self::RpcInvalidResponse => "RPC_INVALID_RESPONSE",

            Self::WebhookBadRequest => "WEBHOOK_BAD_REQUEST",
            Self::WebhookInvalidSignature => "WEBHOOK_INVALID_SIGNATURE",
            Self::WebhookRateLimited => "WEBHOOK_RATE_LIMITED",

            Self::SwapQuoteFailed => "SWAP_QUOTE_FAILED",
            Self::SwapBuildFailed => "SWAP_BUILD_FAILED",
            Self::SwapSigningFailed => "SWAP_SIGNING_FAILED",
            Self::SwapBroadcastFailed => "SWAP_BROADCAST_FAILED",

            Self::ExternalTimeout => "EXTERNAL_TIMEOUT",

            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Get HTTP status code for API responses.
    /// Only inbound-request problems get a 4xx; everything else is a 500.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::WebhookBadRequest => 400,
            Self::WebhookInvalidSignature => 401,
            Self::WebhookRateLimited => 429,
            _ => 500,
        }
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// Missing environment variable
    pub fn missing_env(name: &str) -> Self {
        Self::new(
            ErrorCode::ConfigMissingEnv,
            format!("Missing environment variable: {}", name),
        )
    }

    /// Invalid configuration value
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalidValue, msg)
    }

    /// Webhook body could not be parsed
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::WebhookBadRequest, msg)
    }

    /// Webhook signature rejected
    pub fn invalid_signature(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::WebhookInvalidSignature, msg)
    }

    /// Rate limit exceeded
    pub fn rate_limited(reset_secs: u64) -> Self {
        Self::new(
            ErrorCode::WebhookRateLimited,
            format!("Rate limit exceeded. Retry after {} seconds", reset_secs),
        )
    }

    /// Jupiter quote failed
    pub fn quote_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::SwapQuoteFailed, msg)
    }

    /// Jupiter swap build failed
    pub fn swap_build_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::SwapBuildFailed, msg)
    }

    /// Signing failed
    pub fn signing_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::SwapSigningFailed, msg)
    }

    /// Broadcast failed
    pub fn broadcast_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::SwapBroadcastFailed, msg)
    }

    /// RPC error response
    pub fn rpc_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RpcError, msg)
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        // Collaborators may already have produced a coded error
        match err.downcast::<AppError>() {
            Ok(app) => app,
            Err(err) => Self::new(ErrorCode::Unknown, err.to_string()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorCode::Unknown, "IO error", err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ErrorCode::ExternalTimeout, "Request timeout")
        } else if err.is_connect() {
            Self::new(ErrorCode::RpcConnectionFailed, "Connection failed")
        } else {
            Self::new(ErrorCode::Unknown, err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::RpcInvalidResponse, "JSON parse error", err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = match self.code {
            ErrorCode::WebhookInvalidSignature => "Invalid webhook signature".to_string(),
            ErrorCode::WebhookRateLimited | ErrorCode::WebhookBadRequest => self.message.clone(),
            _ => format!("Error processing webhook: {}", self.message),
        };
        (status, Json(WebhookResponse::error(message))).into_response()
    }
}
