// src/ai/prompt.rs
use serde_json::{json, Map, Value};

use crate::record::{
    Sector, KEY_CLIMATE_PROJECTS, KEY_PROGRAMME, KEY_SECTORS, KEY_TOTAL_BUDGET,
};

/// Indicator keys the model is asked to fill besides totals and sectors.
pub const INDICATOR_KEYS: [&str; 3] = ["Public", "Adaptation", "Mitigation"];

const SYSTEM: &str = "You extract figures from national budget documents. \
Reply with ONE JSON object that follows the given schema and nothing else. \
Use plain numbers without currency symbols or thousands separators. \
Use null for any figure that is not stated in the document.";

/// Everything a provider needs for one extraction call.
#[derive(Debug, Clone)]
pub struct ExtractionPrompt {
    pub system: String,
    pub user: String,
    pub schema: Value,
}

impl ExtractionPrompt {
    /// `text` is cut to at most `max_chars` characters.
    pub fn new(text: &str, max_chars: usize, fiscal_years: &[u16]) -> Self {
        let schema = budget_schema(fiscal_years);
        let body = truncate_chars(text, max_chars);
        let user = format!(
            "JSON schema:\n{}\n\nBudget document text:\n{}",
            schema, body
        );
        Self {
            system: SYSTEM.to_string(),
            user,
            schema,
        }
    }
}

/// Cut on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn nullable_number() -> Value {
    json!({ "type": ["number", "null"] })
}

/// JSON schema of the record shape requested from the model.
pub fn budget_schema(fiscal_years: &[u16]) -> Value {
    let sectors: Map<String, Value> = Sector::ALL
        .iter()
        .map(|s| (s.name().to_string(), nullable_number()))
        .collect();

    let mut item_props = Map::new();
    item_props.insert(KEY_PROGRAMME.to_string(), json!({ "type": "string" }));
    for y in fiscal_years {
        item_props.insert(y.to_string(), nullable_number());
    }

    let mut props = Map::new();
    props.insert(KEY_TOTAL_BUDGET.to_string(), nullable_number());
    props.insert(
        KEY_SECTORS.to_string(),
        json!({ "type": "object", "properties": sectors }),
    );
    props.insert(
        KEY_CLIMATE_PROJECTS.to_string(),
        json!({
            "type": "array",
            "items": { "type": "object", "properties": item_props, "required": [KEY_PROGRAMME] }
        }),
    );
    for k in INDICATOR_KEYS {
        props.insert(k.to_string(), nullable_number());
    }

    json!({
        "type": "object",
        "properties": props,
        "required": [KEY_TOTAL_BUDGET, KEY_SECTORS, KEY_CLIMATE_PROJECTS]
    })
}
