//! API Route Configuration

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{self, AppState};
use super::middleware::{logging_middleware, rate_limit_middleware, signature_middleware};

/// In-flight webhook runs; further requests queue
const MAX_CONCURRENT_WEBHOOKS: usize = 64;

/// Create the API router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Signature check wraps only the webhook endpoints
    let webhook = Router::new()
        .route("/webhook", post(handlers::webhook))
        .route("/v1/webhook", post(handlers::webhook))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            signature_middleware,
        ))
        .route_layer(GlobalConcurrencyLimitLayer::new(MAX_CONCURRENT_WEBHOOKS));

    let api_v1 = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/stats", get(handlers::get_stats));

    // Build full router
    Router::new()
        .merge(webhook)
        .nest("/v1", api_v1)
        // Also expose at root for convenience
        .route("/health", get(handlers::health_check))
        .with_state(state)
        // Middleware (order matters - bottom runs first)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(rate_limit_middleware))
}
