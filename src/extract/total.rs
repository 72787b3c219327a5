// src/extract/total.rs
use once_cell::sync::Lazy;
use regex::Regex;

use super::{normalize_text, parse_amount};

static RE_TOTAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\btotal.*?(\d[\d,]*)").expect("total regex"));

/// Largest figure following any "Total" occurrence; `None` if there is none.
/// The grand total is assumed to be the biggest total-adjacent number.
/// Layout line breaks between label and figure are collapsed first.
pub fn extract_total_budget(text: &str) -> Option<f64> {
    let clean = normalize_text(text);
    let max = RE_TOTAL
        .captures_iter(&clean)
        .filter_map(|c| c.get(1).and_then(|m| parse_amount(m.as_str())))
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))));
    if max.is_none() {
        tracing::debug!("no total figure found");
    }
    max
}
