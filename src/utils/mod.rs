//! Utils Module - Constants, Telemetry & Signing

pub mod constants;
pub mod signer;
pub mod telemetry;

pub use constants::*;
pub use signer::WalletSigner;
pub use telemetry::*;
