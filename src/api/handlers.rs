//! API Request Handlers

use axum::{body::Bytes, extract::State, Json};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::signature::WebhookVerifier;
use super::types::*;
use crate::core::pipeline::SniperPipeline;
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{NotificationPayload, WebhookResponse};
use crate::utils::constants::APP_VERSION;
use crate::utils::telemetry::TelemetryCollector;

/// Shared application state
pub struct AppState {
    pub pipeline: SniperPipeline,
    pub telemetry: Arc<TelemetryCollector>,
    /// `None` disables signature verification
    pub verifier: Option<WebhookVerifier>,
    pub ocr_enabled: bool,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(pipeline: SniperPipeline, verifier: Option<WebhookVerifier>, ocr_enabled: bool) -> Self {
        Self {
            telemetry: pipeline.telemetry().clone(),
            pipeline,
            verifier,
            ocr_enabled,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "healthy".to_string(),
        version: APP_VERSION.to_string(),
        uptime_seconds: state.uptime_seconds(),
    };

    Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    ))
}

// ============================================
// Webhook
// ============================================

/// Run the sniper pipeline for one notification
pub async fn webhook(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> AppResult<Json<WebhookResponse>> {
    let payload: NotificationPayload = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "Malformed webhook payload");
        AppError::bad_request(format!("Invalid notification payload: {}", e))
    })?;

    info!(
        user = payload.user.as_deref().unwrap_or("-"),
        has_text = payload.text.is_some() || payload.full_text.is_some(),
        has_image = payload.image_url().is_some(),
        "📨 Notification received"
    );

    let outcome = state.pipeline.process(&payload).await?;
    Ok(Json(outcome.into()))
}

// ============================================
// Stats
// ============================================

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StatsData>> {
    let start = Instant::now();

    let data = StatsData {
        pipeline: state.telemetry.get_stats(),
        signature_check: state.verifier.is_some(),
        ocr_enabled: state.ocr_enabled,
        uptime_seconds: state.uptime_seconds(),
        api_version: APP_VERSION.to_string(),
    };

    Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    ))
}
