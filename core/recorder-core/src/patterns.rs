//! Compiled regex patterns shared by the label and host heuristics.
//!
//! Update these when the conferencing app changes its URL scheme.

use once_cell::sync::Lazy;
use regex::Regex;

pub static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Bare meeting code path, e.g. `/abc-defg-hij`. Scheduled meetings opened
/// from a calendar carry the same code, so this alone does not mean ad hoc.
pub static RE_MEETING_CODE_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/[a-z]{3}-[a-z]{4}-[a-z]{3}/?$").unwrap());

/// Lowercases and collapses runs of whitespace to single spaces.
pub fn normalize_label(raw: &str) -> String {
    RE_WHITESPACE
        .replace_all(raw.trim(), " ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_and_lowercases() {
        assert_eq!(
            normalize_label("  Start\n   Recording\t"),
            "start recording"
        );
    }

    #[test]
    fn meeting_code_path_matches_codes_only() {
        assert!(RE_MEETING_CODE_PATH.is_match("/abc-defg-hij"));
        assert!(!RE_MEETING_CODE_PATH.is_match("/lookup/abc"));
        assert!(!RE_MEETING_CODE_PATH.is_match("/"));
    }
}
