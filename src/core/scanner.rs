//! Candidate Scanner
//!
//! Slides a 45-char window over normalized text and collects every Base58 run
//! of address length inside each window. Overlapping windows report the same
//! address more than once; downstream stages tolerate that.

use lazy_static::lazy_static;
use regex::Regex;

use crate::utils::constants::{ADDRESS_PATTERN, SCAN_WINDOW_CHARS};

lazy_static! {
    static ref ADDRESS_RE: Regex = Regex::new(ADDRESS_PATTERN).expect("address pattern is valid");
}

/// Shortest run the pattern accepts
const MIN_ADDRESS_CHARS: usize = 32;

/// Scan `text` and return candidates in left-to-right order
pub fn scan_candidates(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut candidates = Vec::new();

    if chars.len() < MIN_ADDRESS_CHARS {
        return candidates;
    }

    for start in 0..chars.len() {
        let end = (start + SCAN_WINDOW_CHARS).min(chars.len());
        if end - start < MIN_ADDRESS_CHARS {
            break;
        }
        let window: String = chars[start..end].iter().collect();
        candidates.extend(ADDRESS_RE.find_iter(&window).map(|m| m.as_str().to_string()));
    }

    candidates
}
