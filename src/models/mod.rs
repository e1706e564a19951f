//! Models Module - Data Structures & Configuration
//!
//! Types shared between the pipeline, providers and API layer, plus the
//! environment-driven configuration and the crate-wide error type.

pub mod config;
pub mod errors;
pub mod types;

pub use config::*;
pub use errors::*;
pub use types::*;
