//! Core Module - Address Extraction Pipeline
//!
//! Normalizer, scanner, validator and resolver are pure or trait-driven;
//! `pipeline` wires them to the OCR, metadata and trade collaborators.

pub mod normalizer;
pub mod pipeline;
pub mod resolver;
pub mod scanner;
pub mod validator;

pub use normalizer::{normalize_fragments, normalize_text};
pub use pipeline::{SniperPipeline, TextExtractor, TradeDispatcher};
pub use resolver::{resolve_first, MetadataSource, NoResolvableToken};
pub use scanner::scan_candidates;
pub use validator::{filter_candidates, is_canonical_address, validate_candidate, BlockList};
