// src/extract/mod.rs
//! Regex-based pattern extractors over budget-document text.
//!
//! Each extractor is a pure function `text -> partial result`. A missing match
//! is not an error: it yields `None`/empty and is logged at debug level only.

pub mod keywords;
pub mod line_items;
pub mod normalize;
pub mod pdf;
pub mod programmes;
pub mod total;

pub use keywords::extract_numbers;
pub use line_items::{extract_agriculture, extract_line_items, LineItemPattern, LineItemTable};
pub use normalize::normalize_text;
pub use pdf::{extract_text, PdfError, RawDocumentText};
pub use programmes::{extract_climate_programmes, extract_coded_programmes};
pub use total::extract_total_budget;

/// One table amount: either thousands-grouped (`1,234,567`) or a plain digit run.
pub(crate) const AMOUNT: &str = r"\d{1,3}(?:,\d{3})+|\d+";

/// Separator between adjacent amount columns: whitespace or a comma.
pub(crate) const COLUMN_SEP: &str = r"(?:\s*,\s*|\s+)";

/// `n` consecutive amount columns captured as `c0..c{n-1}`.
pub(crate) fn amount_columns(n: usize) -> String {
    (0..n)
        .map(|i| format!("(?P<c{i}>{AMOUNT})"))
        .collect::<Vec<_>>()
        .join(COLUMN_SEP)
}

/// Between later columns: a plain separator or free text bounded by whitespace.
pub(crate) const COLUMN_GAP: &str = r"(?:\s*,\s*|\s+|\s.*?\s)";

/// Like [`amount_columns`], but every column after the second may be preceded
/// by free text such as `(revised)`.
pub(crate) fn gapped_amount_columns(n: usize) -> String {
    let mut out = String::new();
    for i in 0..n {
        match i {
            0 => {}
            1 => out.push_str(COLUMN_SEP),
            _ => out.push_str(COLUMN_GAP),
        }
        out.push_str(&format!("(?P<c{i}>{AMOUNT})"));
    }
    out
}

/// Strip thousands separators and parse.
pub(crate) fn parse_amount(s: &str) -> Option<f64> {
    let cleaned: String = s.chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Read the `c0..c{n-1}` captures of a match built with [`amount_columns`]
/// or [`gapped_amount_columns`].
pub(crate) fn captured_amounts(caps: &regex::Captures<'_>, n: usize) -> Option<Vec<f64>> {
    (0..n)
        .map(|i| caps.name(&format!("c{i}")).and_then(|m| parse_amount(m.as_str())))
        .collect()
}
