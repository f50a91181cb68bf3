//! Address normalization.
//!
//! # Responsibility
//! - Derive a stable storage key from free-text address input.
//! - Format the coordinate fallback label used when geocoding fails.
//!
//! # Invariants
//! - `normalize_address` is pure and total: every input maps to a key.
//! - Inputs differing only in case or punctuation share one key.

use crate::model::entry::Coordinates;
use once_cell::sync::Lazy;
use regex::Regex;

const KEY_SEPARATOR: char = '-';

static NON_KEY_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid key regex"));

/// Normalizes free-text address input into a storage key.
///
/// Rules:
/// - lower-case and trim the input;
/// - collapse every run of characters outside `[a-z0-9]` into one `-`;
/// - strip leading/trailing separators.
///
/// Empty or punctuation-only input yields the empty key, which is degenerate
/// but still valid.
pub fn normalize_address(address: &str) -> String {
    let lowered = address.trim().to_lowercase();
    let separator = KEY_SEPARATOR.to_string();
    let collapsed = NON_KEY_CHARS_RE.replace_all(&lowered, separator.as_str());
    collapsed.trim_matches(KEY_SEPARATOR).to_string()
}

/// Coordinate-literal address used when reverse geocoding is unavailable.
pub fn coordinate_label(location: Coordinates) -> String {
    format!("({:.4}, {:.4})", location.lat, location.lng)
}
