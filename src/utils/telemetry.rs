//! Pipeline Telemetry
//!
//! Lock-free counters for every pipeline stage, exposed on `/v1/stats`.
//! No addresses, users or signatures are stored, only counts and latency.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// How a pipeline run ended, for counting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    NoCandidates,
    NoValidToken,
    Bought,
    Failed,
}

/// Aggregated statistics snapshot
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelemetryStats {
    pub notifications_received: u64,
    pub signatures_rejected: u64,
    pub images_processed: u64,
    pub ocr_failures: u64,
    pub candidates_scanned: u64,
    pub addresses_validated: u64,
    pub no_candidate_runs: u64,
    pub no_token_runs: u64,
    pub trades_dispatched: u64,
    pub errors: u64,
    pub avg_latency_ms: f64,
    pub period_start: u64,
}

/// Thread-safe counters shared by the pipeline and middleware
#[derive(Debug)]
pub struct TelemetryCollector {
    notifications_received: AtomicU64,
    signatures_rejected: AtomicU64,
    images_processed: AtomicU64,
    ocr_failures: AtomicU64,
    candidates_scanned: AtomicU64,
    addresses_validated: AtomicU64,
    no_candidate_runs: AtomicU64,
    no_token_runs: AtomicU64,
    trades_dispatched: AtomicU64,
    errors: AtomicU64,
    total_latency_ms: AtomicU64,
    completed_runs: AtomicU64,
    period_start: u64,
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryCollector {
    pub fn new() -> Self {
        Self {
            notifications_received: AtomicU64::new(0),
            signatures_rejected: AtomicU64::new(0),
            images_processed: AtomicU64::new(0),
            ocr_failures: AtomicU64::new(0),
            candidates_scanned: AtomicU64::new(0),
            addresses_validated: AtomicU64::new(0),
            no_candidate_runs: AtomicU64::new(0),
            no_token_runs: AtomicU64::new(0),
            trades_dispatched: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
            completed_runs: AtomicU64::new(0),
            period_start: current_timestamp(),
        }
    }

    pub fn record_notification(&self) {
        self.notifications_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_signature(&self) {
        self.signatures_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// `ok == false` means OCR failed and the run fell back to text only
    pub fn record_image(&self, ok: bool) {
        self.images_processed.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.ocr_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_scan(&self, candidates: usize, validated: usize) {
        self.candidates_scanned.fetch_add(candidates as u64, Ordering::Relaxed);
        self.addresses_validated.fetch_add(validated as u64, Ordering::Relaxed);
    }

    pub fn record_run(&self, outcome: RunOutcome, latency_ms: u64) {
        let counter = match outcome {
            RunOutcome::NoCandidates => &self.no_candidate_runs,
            RunOutcome::NoValidToken => &self.no_token_runs,
            RunOutcome::Bought => &self.trades_dispatched,
            RunOutcome::Failed => &self.errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
        self.completed_runs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> TelemetryStats {
        let runs = self.completed_runs.load(Ordering::Relaxed);
        let avg_latency_ms = if runs > 0 {
            self.total_latency_ms.load(Ordering::Relaxed) as f64 / runs as f64
        } else {
            0.0
        };

        TelemetryStats {
            notifications_received: self.notifications_received.load(Ordering::Relaxed),
            signatures_rejected: self.signatures_rejected.load(Ordering::Relaxed),
            images_processed: self.images_processed.load(Ordering::Relaxed),
            ocr_failures: self.ocr_failures.load(Ordering::Relaxed),
            candidates_scanned: self.candidates_scanned.load(Ordering::Relaxed),
            addresses_validated: self.addresses_validated.load(Ordering::Relaxed),
            no_candidate_runs: self.no_candidate_runs.load(Ordering::Relaxed),
            no_token_runs: self.no_token_runs.load(Ordering::Relaxed),
            trades_dispatched: self.trades_dispatched.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            avg_latency_ms,
            period_start: self.period_start,
        }
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
