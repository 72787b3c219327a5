// src/merge.rs
//! Reconciliation of model output with keyword-extractor output.
//!
//! The model result is the base (numeric leaves cleaned). A keyword value is
//! written only where the canonical field is absent or null in that base;
//! for sectors the check is per sector, not on the `Sectors` map as a whole.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::ai::ModelReply;
use crate::record::{number_or_null, BudgetRecord, Sector};

/// Where a keyword-extractor hit lands in the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalField {
    TotalBudget,
    Sector(Sector),
    Indicator(&'static str),
}

/// Fixed keyword -> field table. Unknown keywords map to `None`.
pub fn canonical_field(keyword: &str) -> Option<CanonicalField> {
    let k = keyword.trim().to_lowercase();
    let field = match k.as_str() {
        "total budget" | "total" => CanonicalField::TotalBudget,
        "public" => CanonicalField::Indicator("Public"),
        "adaptation" => CanonicalField::Indicator("Adaptation"),
        "mitigation" => CanonicalField::Indicator("Mitigation"),
        other => CanonicalField::Sector(Sector::from_name(other)?),
    };
    Some(field)
}

/// Base record from whatever the model chain produced.
pub fn record_from_reply(reply: &ModelReply) -> BudgetRecord {
    match reply {
        ModelReply::Structured(map) => BudgetRecord::from_model_object(map),
        ModelReply::Degraded(raw) => BudgetRecord {
            raw_reply: Some(raw.clone()),
            ..Default::default()
        },
        ModelReply::Empty => BudgetRecord::default(),
    }
}

/// Merge keyword hits into the model-derived record without overriding it.
pub fn reconcile(reply: &ModelReply, keyword_hits: &BTreeMap<String, Option<f64>>) -> BudgetRecord {
    let mut record = record_from_reply(reply);

    for (keyword, value) in keyword_hits {
        let Some(value) = *value else {
            continue;
        };
        let Some(field) = canonical_field(keyword) else {
            tracing::debug!(%keyword, "keyword has no canonical field");
            continue;
        };
        match field {
            CanonicalField::TotalBudget => {
                if record.total_budget.is_none() {
                    record.total_budget = Some(value);
                }
            }
            CanonicalField::Sector(sector) => {
                if record.sectors.get(sector).is_none() {
                    record.sectors.set(sector, Some(value));
                }
            }
            CanonicalField::Indicator(name) => {
                let slot = record.extra.entry(name.to_string()).or_insert(Value::Null);
                if slot.is_null() {
                    *slot = number_or_null(Some(value));
                }
            }
        }
    }
    record
}
