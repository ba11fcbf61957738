//! Condition-text normalisation.
//!
//! Free-text condition descriptions ("High chloride, intermittent wetting")
//! are canonicalised before embedding. The normalised string doubles as the
//! embedding cache key, so equivalent inputs that differ only in case,
//! punctuation, or spacing must map to the same key.

use std::sync::LazyLock;

use regex::Regex;

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9%.\- ]+").expect("static regex"));

/// Normalise a condition description.
///
/// # Algorithm
///
/// 1. Lower-case
/// 2. Replace `\n` and `\r` with spaces
/// 3. Drop every character outside `[a-z0-9%.\- ]`
/// 4. Collapse whitespace runs to a single space and trim
///
/// The result is idempotent: `normalize_condition(normalize_condition(x))`
/// equals `normalize_condition(x)`. An empty string is a valid output.
pub fn normalize_condition(text: &str) -> String {
    let lowered = text.to_lowercase().replace(['\n', '\r'], " ");
    let kept = DISALLOWED.replace_all(&lowered, "");
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}
