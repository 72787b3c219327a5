// src/ai/repair.rs
//! Tolerant parsing of model replies that are supposed to be one JSON object.
//!
//! Steps: take the span from the first `{` to the last `}`, drop code-fence
//! markers, drop commas that directly precede `}` or `]` (outside strings),
//! then parse. Anything still unparseable is kept verbatim as `Degraded`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static RE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```[A-Za-z0-9_-]*").expect("fence regex"));

#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    Structured(Map<String, Value>),
    /// Reply text that could not be turned into an object.
    Degraded(String),
    Empty,
}

impl ModelReply {
    pub fn is_empty(&self) -> bool {
        matches!(self, ModelReply::Empty)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ModelReply::Structured(_) => "structured",
            ModelReply::Degraded(_) => "degraded",
            ModelReply::Empty => "empty",
        }
    }
}

pub fn parse_model_reply(raw: &str) -> ModelReply {
    if raw.trim().is_empty() {
        return ModelReply::Empty;
    }
    let Some(span) = outer_braces(raw) else {
        return ModelReply::Degraded(raw.to_string());
    };
    let unfenced = RE_FENCE.replace_all(span, "");
    let repaired = strip_trailing_commas(&unfenced);
    match serde_json::from_str::<Value>(&repaired) {
        Ok(Value::Object(map)) => ModelReply::Structured(map),
        _ => ModelReply::Degraded(raw.to_string()),
    }
}

/// First `{` through last `}`, inclusive.
fn outer_braces(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let end = s.rfind('}')?;
    (end > start).then(|| &s[start..=end])
}

/// Remove `,` when the next non-whitespace char is `}` or `]`, ignoring
/// anything inside string literals.
pub fn strip_trailing_commas(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_string = false;
    let mut escaped = false;
    // Byte offset in `out` of a comma that may still be dropped.
    let mut pending: Option<usize> = None;

    for c in s.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        if c.is_whitespace() {
            out.push(c);
            continue;
        }
        if let Some(pos) = pending.take() {
            if c == '}' || c == ']' {
                out.remove(pos);
            }
        }
        match c {
            '"' => in_string = true,
            ',' => pending = Some(out.len()),
            _ => {}
        }
        out.push(c);
    }
    out
}
