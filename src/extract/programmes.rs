// src/extract/programmes.rs
use regex::Regex;
use std::collections::BTreeMap;

use super::{captured_amounts, gapped_amount_columns, normalize_text};
use crate::config::extraction::ExtractionConfig;
use crate::record::ProgrammeLineItem;

/// For each known code, take the FIRST place in the normalized text where the
/// code appears as a whole token followed by one amount per fiscal year
/// (oldest first). The first two amounts are adjacent; annotations may sit
/// before later ones. Later mentions of the same code are ignored.
pub fn extract_coded_programmes(
    text: &str,
    codes: &BTreeMap<String, String>,
    fiscal_years: &[u16],
) -> Option<Vec<ProgrammeLineItem>> {
    let clean = normalize_text(text);
    let mut years = fiscal_years.to_vec();
    years.sort_unstable();
    let columns = gapped_amount_columns(years.len());

    let mut rows = Vec::new();
    for (code, name) in codes {
        let pattern = format!(r"\b{}\b\s+{}", regex::escape(code), columns);
        let Ok(re) = Regex::new(&pattern) else {
            tracing::debug!(%code, "skipping programme code with invalid pattern");
            continue;
        };
        let Some(caps) = re.captures(&clean) else {
            tracing::debug!(%code, "programme code not found");
            continue;
        };
        let Some(amounts) = captured_amounts(&caps, years.len()) else {
            continue;
        };
        let item = years
            .iter()
            .zip(amounts)
            .fold(ProgrammeLineItem::new(format!("{code} - {name}")), |item, (y, v)| {
                item.with_year(*y, v)
            });
        rows.push(item);
    }

    if rows.is_empty() {
        None
    } else {
        Some(rows)
    }
}

/// Climate-tagged programmes using the default code table and year window.
pub fn extract_climate_programmes(text: &str) -> Option<Vec<ProgrammeLineItem>> {
    let cfg = ExtractionConfig::default();
    extract_coded_programmes(text, &cfg.programme_codes, &cfg.fiscal_years)
}
