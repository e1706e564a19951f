//! API Response Types for the operational endpoints
//!
//! The webhook itself answers with `WebhookResponse` (models/types.rs);
//! health and stats use the `ApiResponse` wrapper.

use serde::{Deserialize, Serialize};

use crate::utils::telemetry::TelemetryStats;

/// API Response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

// ============================================
// Stats
// ============================================

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsData {
    pub pipeline: TelemetryStats,
    pub signature_check: bool,
    pub ocr_enabled: bool,
    pub uptime_seconds: u64,
    pub api_version: String,
}

// ============================================
// Health Check
// ============================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}
