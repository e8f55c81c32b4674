//! Cleaning of extracted driver names and kart numbers before storage.

use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Strip markup, quote and backslash characters and control characters,
/// then collapse whitespace runs to single spaces.
pub fn sanitize_driver_name(name: &str) -> String {
    let without_tags = TAG_RE.replace_all(name, " ");
    let cleaned: String = without_tags
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .filter(|c| !matches!(c, '<' | '>' | '"' | '\\'))
        .collect();
    WHITESPACE_RE.replace_all(cleaned.trim(), " ").into_owned()
}

/// Keep ASCII letters, digits and dashes. `None` when nothing is left.
pub fn sanitize_kart_number(kart: &str) -> Option<String> {
    let cleaned: String = kart
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    (!cleaned.is_empty()).then_some(cleaned)
}
