//! Ruster Sniper webhook server
//!
//! Usage:
//!   cargo run --release
//!
//! Environment: see `SniperConfig::from_env`. `RUST_LOG` controls verbosity
//! (default: info).

use ruster_sniper::api::{create_router, start_cleanup_task, AppState, WebhookVerifier};
use ruster_sniper::core::{BlockList, SniperPipeline};
use ruster_sniper::providers::{JupiterDispatcher, OcrSpaceClient, SolanaRpcClient};
use ruster_sniper::utils::constants::{APP_NAME, APP_VERSION};
use ruster_sniper::{SniperConfig, TelemetryCollector, WalletSigner};

use eyre::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    info!("🎯 {} v{} starting", APP_NAME, APP_VERSION);

    let config = SniperConfig::from_env()?;

    let signer = Arc::new(WalletSigner::from_base58(&config.private_key)?);
    info!("👛 Trading wallet: {}", signer.pubkey());

    let rpc = SolanaRpcClient::new(config.rpc_url.clone(), config.rpc_fallback_url.clone())?;
    let dispatcher = JupiterDispatcher::new(
        config.jupiter_api_url.clone(),
        config.jupiter_api_key.clone(),
        signer,
        rpc.clone(),
    )?;

    let blocklist = BlockList::with_defaults(&config.extra_blocklist);
    info!("🚫 Block-list: {} addresses", blocklist.len());

    let telemetry = Arc::new(TelemetryCollector::new());
    let mut pipeline = SniperPipeline::new(
        blocklist,
        config.policies.clone(),
        Arc::new(rpc),
        Arc::new(dispatcher),
        telemetry.clone(),
    );

    let ocr_enabled = match config.ocr_api_key {
        Some(ref key) => {
            pipeline = pipeline.with_ocr(Arc::new(OcrSpaceClient::new(config.ocr_api_url.clone(), key.clone())?));
            true
        }
        None => false,
    };

    let verifier = config
        .webhook_secret
        .as_deref()
        .map(WebhookVerifier::new)
        .transpose()?;

    let state = Arc::new(AppState::new(pipeline, verifier, ocr_enabled));

    // Start background cleanup task for rate limiter
    start_cleanup_task();

    let app = create_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    info!("🚀 Listening on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /webhook, /v1/webhook  - Notification intake");
    info!("  GET  /v1/stats              - Pipeline statistics");
    info!("  GET  /health, /v1/health    - Health check");

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("🛑 Shutdown signal received");
    let stats = telemetry.get_stats();
    info!(
        "   Notifications: {}, trades: {}, no-token: {}, errors: {}",
        stats.notifications_received, stats.trades_dispatched, stats.no_token_runs, stats.errors
    );
    info!("👋 {} shutdown complete", APP_NAME);

    Ok(())
}
