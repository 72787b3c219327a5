// src/extract/normalize.rs
use once_cell::sync::Lazy;
use regex::Regex;

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Collapse every whitespace run (newlines, tabs, form feeds, NBSP) to a
/// single space. Idempotent; leading/trailing runs become one space too, so
/// a second pass finds nothing to change.
pub fn normalize_text(input: &str) -> String {
    RE_WS.replace_all(input, " ").into_owned()
}

/// Same as [`normalize_text`] for optional input; `None` yields `""`.
pub fn normalize_opt(input: Option<&str>) -> String {
    input.map(normalize_text).unwrap_or_default()
}
