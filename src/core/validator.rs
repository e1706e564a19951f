//! Address Validator
//!
//! A candidate is a ValidatedAddress when it is not block-listed, decodes
//! from Base58 to exactly 32 bytes, and re-encodes to the identical string.

use std::collections::HashSet;
use tracing::debug;

use crate::utils::constants::{DEFAULT_BLOCKLIST, PUBKEY_BYTES};

/// Addresses that are never resolved or bought.
///
/// Entries are stored lowercased; lookups lowercase the candidate.
#[derive(Debug, Clone, Default)]
pub struct BlockList {
    entries: HashSet<String>,
}

impl BlockList {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|e| e.as_ref().trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Built-in list plus operator extras
    pub fn with_defaults<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::new(DEFAULT_BLOCKLIST.iter());
        list.entries.extend(Self::new(extra).entries);
        list
    }

    #[inline]
    pub fn contains(&self, candidate: &str) -> bool {
        self.entries.contains(&candidate.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Canonical Base58 encoding of a 32-byte public key.
/// Decode errors are swallowed: an undecodable candidate is simply invalid.
pub fn is_canonical_address(candidate: &str) -> bool {
    match bs58::decode(candidate).into_vec() {
        Ok(bytes) if bytes.len() == PUBKEY_BYTES => bs58::encode(&bytes).into_string() == candidate,
        _ => false,
    }
}

/// Full check for a single candidate
pub fn validate_candidate(candidate: &str, blocklist: &BlockList) -> bool {
    if blocklist.contains(candidate) {
        debug!(candidate, "Candidate is block-listed");
        return false;
    }
    is_canonical_address(candidate)
}

/// Keep valid candidates in scan order; duplicates are preserved
pub fn filter_candidates(candidates: &[String], blocklist: &BlockList) -> Vec<String> {
    candidates
        .iter()
        .filter(|c| validate_candidate(c, blocklist))
        .cloned()
        .collect()
}
