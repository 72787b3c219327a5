// src/extract/keywords.rs
use regex::Regex;
use std::collections::BTreeMap;

use crate::config::extraction::DEFAULT_KEYWORDS;

/// For each keyword, find its first occurrence in the lower-cased text and
/// take the nearest following run of digits/commas/periods.
///
/// Keys are present only for keywords that matched; the value is `None`
/// when the captured run does not parse (e.g. `1.2.3`). An empty keyword
/// list falls back to the default set.
pub fn extract_numbers<S: AsRef<str>>(text: &str, keywords: &[S]) -> BTreeMap<String, Option<f64>> {
    let mut out = BTreeMap::new();
    if text.is_empty() {
        return out;
    }
    let haystack = text.to_lowercase();

    let owned: Vec<String> = if keywords.is_empty() {
        DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()
    } else {
        keywords
            .iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect()
    };

    for key in owned {
        let pattern = format!(r"{}[^0-9]*([\d,.]+)", regex::escape(&key));
        let Ok(re) = Regex::new(&pattern) else {
            tracing::debug!(keyword = %key, "skipping keyword with invalid pattern");
            continue;
        };
        match re.captures(&haystack).and_then(|c| c.get(1)) {
            Some(m) => {
                let raw = m.as_str().replace(',', "");
                out.insert(key, raw.parse::<f64>().ok().filter(|v| v.is_finite()));
            }
            None => tracing::debug!(keyword = %key, "keyword not found"),
        }
    }
    out
}
