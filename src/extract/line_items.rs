// src/extract/line_items.rs
//! Programme tables of the shape `<name> <code> <amount> <amount> <amount>`.
//!
//! Columns are read most-recent year first. Rows that do not have the full
//! name/code/columns shape are skipped without notice; that is the accepted
//! precision/recall tradeoff for noisy PDF text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

use super::{amount_columns, captured_amounts};
use crate::config::extraction::ExtractionConfig;
use crate::record::ProgrammeLineItem;

static DEFAULT_PATTERN: Lazy<LineItemPattern> =
    Lazy::new(|| LineItemPattern::new(&ExtractionConfig::default().fiscal_years));

/// Matched rows plus column-wise sums per fiscal year.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LineItemTable {
    pub rows: Vec<ProgrammeLineItem>,
    pub totals: BTreeMap<u16, f64>,
}

/// Compiled row regex for a fiscal-year window.
#[derive(Debug, Clone)]
pub struct LineItemPattern {
    re: Regex,
    /// Newest first, in column order.
    years_desc: Vec<u16>,
}

impl LineItemPattern {
    pub fn new(fiscal_years: &[u16]) -> Self {
        let mut years_desc = fiscal_years.to_vec();
        years_desc.sort_unstable_by(|a, b| b.cmp(a));
        let pattern = format!(
            r"(?P<programme>[A-Za-z\s\-()]+)\s+\d+\s+{}",
            amount_columns(years_desc.len())
        );
        let re = Regex::new(&pattern).expect("line item regex");
        Self { re, years_desc }
    }

    /// Every row whose programme name contains `keyword` (case-insensitive).
    pub fn rows(&self, text: &str, keyword: &str) -> Vec<ProgrammeLineItem> {
        let keyword = keyword.to_lowercase();
        let n = self.years_desc.len();
        let mut rows = Vec::new();
        for caps in self.re.captures_iter(text) {
            let Some(name) = caps.name("programme").map(|m| m.as_str().trim()) else {
                continue;
            };
            if !name.to_lowercase().contains(&keyword) {
                continue;
            }
            let Some(amounts) = captured_amounts(&caps, n) else {
                continue;
            };
            let item = self
                .years_desc
                .iter()
                .zip(amounts)
                .fold(ProgrammeLineItem::new(name), |item, (y, v)| {
                    item.with_year(*y, v)
                });
            rows.push(item);
        }
        rows
    }
}

/// Rows matching `keyword` plus their per-year totals; `None` when no row matched.
pub fn extract_line_items(text: &str, keyword: &str, pattern: &LineItemPattern) -> Option<LineItemTable> {
    let rows = pattern.rows(text, keyword);
    if rows.is_empty() {
        tracing::debug!(keyword, "no line items matched");
        return None;
    }
    let mut totals: BTreeMap<u16, f64> = pattern.years_desc.iter().map(|y| (*y, 0.0)).collect();
    for row in &rows {
        for (y, v) in row.years() {
            *totals.entry(y).or_insert(0.0) += v;
        }
    }
    Some(LineItemTable { rows, totals })
}

/// Agriculture programme rows with the default year window and keyword.
pub fn extract_agriculture(text: &str) -> Option<LineItemTable> {
    extract_line_items(text, "agric", &DEFAULT_PATTERN)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str =
        "Energy 17 1000,500,400 Agriculture 18 2000,900,800 Total Budget: 5,000,000";

    #[test]
    fn agriculture_row_and_totals() {
        let table = extract_agriculture(SAMPLE).expect("agriculture row");
        assert_eq!(table.rows.len(), 1);
        let row = &table.rows[0];
        assert_eq!(row.programme, "Agriculture");
        assert_eq!(row.year(2024), Some(2000.0));
        assert_eq!(row.year(2023), Some(900.0));
        assert_eq!(row.year(2022), Some(800.0));
        assert_eq!(
            table.totals,
            BTreeMap::from([(2022, 800.0), (2023, 900.0), (2024, 2000.0)])
        );
    }

    #[test]
    fn sums_multiple_rows() {
        let text = "Agricultural Extension 04 1,000 2,000 3,000 \
                    Roads 05 9 9 9 \
                    Agriculture Credit (Rural) 06 10 20 30";
        let table = extract_agriculture(text).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].programme, "Agriculture Credit (Rural)");
        assert_eq!(table.totals[&2024], 1010.0);
        assert_eq!(table.totals[&2023], 2020.0);
        assert_eq!(table.totals[&2022], 3030.0);
    }

    #[test]
    fn short_rows_are_skipped() {
        assert!(extract_agriculture("Agriculture 18 2000 900").is_none());
        assert!(extract_agriculture("").is_none());
    }

    #[test]
    fn custom_window_and_keyword() {
        let pattern = LineItemPattern::new(&[2024, 2025]);
        let table = extract_line_items("Water Supply 3 70 60", "water", &pattern).unwrap();
        assert_eq!(table.rows[0].year(2025), Some(70.0));
        assert_eq!(table.rows[0].year(2024), Some(60.0));
    }
}
