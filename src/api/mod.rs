//! Ruster Sniper HTTP API
//! Webhook intake plus health and stats endpoints

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod signature;
pub mod types;

pub use handlers::AppState;
pub use middleware::start_cleanup_task;
pub use routes::create_router;
pub use signature::WebhookVerifier;
pub use types::*;
