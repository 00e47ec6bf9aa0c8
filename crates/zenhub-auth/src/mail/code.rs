//! Verification code extraction.

use regex::Regex;
use std::sync::LazyLock;

static CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Verification code: ([0-9]+)").unwrap());

/// First code following `Verification code: ` in `body`.
pub fn extract_verification_code(body: &str) -> Option<&str> {
    CODE_PATTERN
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
