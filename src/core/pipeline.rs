//! Sniper Pipeline
//!
//! One run per notification:
//! OCR (optional) → normalize → scan → validate → resolve → buy.
//!
//! Collaborators sit behind traits so tests can swap in in-memory fakes.

use async_trait::async_trait;
use eyre::Result;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::core::normalizer::normalize_fragments;
use crate::core::resolver::{resolve_first, MetadataSource};
use crate::core::scanner::scan_candidates;
use crate::core::validator::{filter_candidates, BlockList};
use crate::models::config::TradePolicyTable;
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{
    NotificationPayload, PipelineOutcome, SourceKind, TradePolicy, TradeReceipt,
};
use crate::utils::telemetry::{RunOutcome, TelemetryCollector};

/// Image → text
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, image_url: &str) -> Result<String>;
}

/// Buys `mint` with SOL according to `policy`
#[async_trait]
pub trait TradeDispatcher: Send + Sync {
    async fn buy(&self, mint: &str, policy: &TradePolicy) -> Result<TradeReceipt>;
}

/// Shared, immutable pipeline wiring
#[derive(Clone)]
pub struct SniperPipeline {
    blocklist: Arc<BlockList>,
    policies: Arc<TradePolicyTable>,
    metadata: Arc<dyn MetadataSource>,
    ocr: Option<Arc<dyn TextExtractor>>,
    dispatcher: Arc<dyn TradeDispatcher>,
    telemetry: Arc<TelemetryCollector>,
}

impl SniperPipeline {
    pub fn new(
        blocklist: BlockList,
        policies: TradePolicyTable,
        metadata: Arc<dyn MetadataSource>,
        dispatcher: Arc<dyn TradeDispatcher>,
        telemetry: Arc<TelemetryCollector>,
    ) -> Self {
        Self {
            blocklist: Arc::new(blocklist),
            policies: Arc::new(policies),
            metadata,
            ocr: None,
            dispatcher,
            telemetry,
        }
    }

    /// Enable image text extraction
    pub fn with_ocr(mut self, ocr: Arc<dyn TextExtractor>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn telemetry(&self) -> &Arc<TelemetryCollector> {
        &self.telemetry
    }

    /// Run the full pipeline for one notification
    pub async fn process(&self, payload: &NotificationPayload) -> AppResult<PipelineOutcome> {
        let start = Instant::now();
        self.telemetry.record_notification();

        let result = self.run(payload).await;

        let latency_ms = start.elapsed().as_millis() as u64;
        let outcome = match &result {
            Ok(PipelineOutcome::NoCandidates { .. }) => RunOutcome::NoCandidates,
            Ok(PipelineOutcome::NoValidToken { .. }) => RunOutcome::NoValidToken,
            Ok(PipelineOutcome::Bought { .. }) => RunOutcome::Bought,
            Err(e) => {
                error!(code = e.code_str(), error = %e, "Pipeline failed");
                RunOutcome::Failed
            }
        };
        self.telemetry.record_run(outcome, latency_ms);
        debug!(latency_ms, ?outcome, "Pipeline finished");

        result
    }

    async fn run(&self, payload: &NotificationPayload) -> AppResult<PipelineOutcome> {
        let (image_text, source) = self.extract_image_text(payload).await;

        let text = normalize_fragments([
            payload.text.as_deref(),
            payload.full_text.as_deref(),
            image_text.as_deref(),
        ]);

        let candidates = scan_candidates(&text);
        if candidates.is_empty() {
            self.telemetry.record_scan(0, 0);
            info!(%source, "No token addresses mentioned");
            return Ok(PipelineOutcome::NoCandidates { source });
        }

        let validated = filter_candidates(&candidates, &self.blocklist);
        self.telemetry.record_scan(candidates.len(), validated.len());
        debug!(
            candidates = candidates.len(),
            validated = validated.len(),
            "Candidates filtered"
        );
        if validated.is_empty() {
            info!(%source, "No valid token addresses found");
            return Ok(PipelineOutcome::NoValidToken { source });
        }

        let token = match resolve_first(self.metadata.clone(), &validated).await {
            Ok(token) => token,
            Err(e) => {
                info!(%source, error = %e, "No valid token addresses found");
                return Ok(PipelineOutcome::NoValidToken { source });
            }
        };

        let policy = self.policies.for_user(payload.user.as_deref());
        info!(
            mint = %token.mint,
            amount_lamports = policy.amount_lamports,
            slippage_bps = policy.slippage_bps,
            priority = policy.priority_level.as_str(),
            "🛒 Dispatching buy"
        );

        let receipt = self
            .dispatcher
            .buy(&token.mint, policy)
            .await
            .map_err(AppError::from)?;

        info!(mint = %token.mint, signature = %receipt.signature, "✅ Buy submitted");
        Ok(PipelineOutcome::Bought {
            source,
            token,
            receipt,
        })
    }

    /// OCR failures degrade the run to text only
    async fn extract_image_text(&self, payload: &NotificationPayload) -> (Option<String>, SourceKind) {
        let (Some(url), Some(ocr)) = (payload.image_url(), self.ocr.as_ref()) else {
            return (None, SourceKind::TextOnly);
        };

        match ocr.extract_text(url).await {
            Ok(text) => {
                self.telemetry.record_image(true);
                debug!(chars = text.chars().count(), "Image text extracted");
                (Some(text), SourceKind::TextAndImage)
            }
            Err(e) => {
                self.telemetry.record_image(false);
                warn!(error = %e, "OCR failed, continuing with text only");
                (None, SourceKind::TextOnly)
            }
        }
    }
}
