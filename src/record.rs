// src/record.rs
//! Canonical budget record and its numeric-cleaning rules.
//!
//! Every numeric leaf in a [`BudgetRecord`] is an `f64` or absent (`None` ->
//! JSON `null`). Strings coming from model replies are cleaned with
//! [`clean_numeric`] before they reach the record.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const KEY_TOTAL_BUDGET: &str = "Total Budget";
pub const KEY_SECTORS: &str = "Sectors";
pub const KEY_CLIMATE_PROJECTS: &str = "Climate Projects";
pub const KEY_PROGRAMME: &str = "Programme";
pub const KEY_RAW_REPLY: &str = "raw_reply";

static RE_NON_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9.\-]").expect("non-numeric regex"));

/// Strip every character outside `[0-9.-]` and parse the rest as `f64`.
///
/// `"1,234.50"` -> `Some(1234.5)`, `"abc"` -> `None`, `null` -> `None`.
pub fn clean_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => clean_numeric_str(s),
        _ => None,
    }
}

pub fn clean_numeric_str(s: &str) -> Option<f64> {
    let stripped = RE_NON_NUMERIC.replace_all(s, "");
    if stripped.is_empty() {
        return None;
    }
    stripped.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Walk a JSON tree and replace every scalar leaf with its cleaned number
/// (or `null`). Objects and arrays keep their shape.
pub fn coerce_numeric_tree(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), coerce_numeric_tree(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(coerce_numeric_tree).collect()),
        leaf => number_or_null(clean_numeric(leaf)),
    }
}

pub(crate) fn number_or_null(v: Option<f64>) -> Value {
    v.and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// The fixed sector set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Sector {
    Energy,
    Agriculture,
    Health,
    Transport,
    Water,
}

impl Sector {
    pub const ALL: [Sector; 5] = [
        Sector::Energy,
        Sector::Agriculture,
        Sector::Health,
        Sector::Transport,
        Sector::Water,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Sector::Energy => "Energy",
            Sector::Agriculture => "Agriculture",
            Sector::Health => "Health",
            Sector::Transport => "Transport",
            Sector::Water => "Water",
        }
    }

    /// Case-insensitive lookup by display name.
    pub fn from_name(name: &str) -> Option<Sector> {
        let name = name.trim();
        Sector::ALL
            .into_iter()
            .find(|s| s.name().eq_ignore_ascii_case(name))
    }
}

/// Sector allocations. Known sectors are typed; anything else the model
/// reports under `Sectors` is kept (coerced) in `other`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sectors {
    values: BTreeMap<Sector, Option<f64>>,
    pub other: BTreeMap<String, Option<f64>>,
}

impl Sectors {
    pub fn get(&self, sector: Sector) -> Option<f64> {
        self.values.get(&sector).copied().flatten()
    }

    pub fn set(&mut self, sector: Sector, value: Option<f64>) {
        self.values.insert(sector, value);
    }

    /// Sum of every present value (known and unrecognized sectors).
    pub fn sum(&self) -> f64 {
        self.values
            .values()
            .chain(self.other.values())
            .flatten()
            .sum()
    }

    fn from_value(value: &Value) -> Self {
        let mut out = Sectors::default();
        let Some(map) = value.as_object() else {
            return out;
        };
        for (k, v) in map {
            let n = clean_numeric(v);
            match Sector::from_name(k) {
                Some(s) => out.set(s, n),
                None => {
                    out.other.insert(k.clone(), n);
                }
            }
        }
        out
    }
}

impl Serialize for Sectors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Sector::ALL.len() + self.other.len()))?;
        for s in Sector::ALL {
            map.serialize_entry(s.name(), &self.get(s))?;
        }
        for (k, v) in &self.other {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// One programme row: a label plus one budget figure per fiscal year.
/// Year values are never negative.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgrammeLineItem {
    pub programme: String,
    years: BTreeMap<u16, f64>,
}

impl ProgrammeLineItem {
    pub fn new(programme: impl Into<String>) -> Self {
        Self {
            programme: programme.into(),
            years: BTreeMap::new(),
        }
    }

    /// Builder-style insert; negative or non-finite values are dropped.
    pub fn with_year(mut self, year: u16, value: f64) -> Self {
        self.set_year(year, value);
        self
    }

    pub fn set_year(&mut self, year: u16, value: f64) -> bool {
        if value.is_finite() && value >= 0.0 {
            self.years.insert(year, value);
            true
        } else {
            false
        }
    }

    pub fn year(&self, year: u16) -> Option<f64> {
        self.years.get(&year).copied()
    }

    pub fn years(&self) -> impl Iterator<Item = (u16, f64)> + '_ {
        self.years.iter().map(|(y, v)| (*y, *v))
    }

    pub fn total(&self) -> f64 {
        self.years.values().sum()
    }

    /// Read an item out of a model reply object. Keys that parse as a year
    /// become year values; the label comes from `Programme`.
    fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let programme = match map.get(KEY_PROGRAMME) {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        let mut item = ProgrammeLineItem::new(programme);
        for (k, v) in map {
            let Ok(year) = k.trim().parse::<u16>() else {
                continue;
            };
            if let Some(n) = clean_numeric(v) {
                if !item.set_year(year, n) {
                    tracing::debug!(year, value = n, "dropping negative programme value");
                }
            }
        }
        if item.programme.is_empty() && item.years.is_empty() {
            return None;
        }
        Some(item)
    }
}

impl Serialize for ProgrammeLineItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.years.len() + 1))?;
        map.serialize_entry(KEY_PROGRAMME, &self.programme)?;
        for (y, v) in &self.years {
            map.serialize_entry(&y.to_string(), v)?;
        }
        map.end()
    }
}

/// Canonical output of the extraction pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BudgetRecord {
    #[serde(rename = "Total Budget")]
    pub total_budget: Option<f64>,
    #[serde(rename = "Sectors")]
    pub sectors: Sectors,
    #[serde(rename = "Climate Projects")]
    pub climate_projects: Vec<ProgrammeLineItem>,
    /// Scalar indicators (`Adaptation`, `Mitigation`, `Public`, ...) and any
    /// other key the model returned, already coerced.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
    /// Verbatim model reply when it could not be parsed as JSON.
    #[serde(rename = "raw_reply", skip_serializing_if = "Option::is_none")]
    pub raw_reply: Option<String>,
}

impl BudgetRecord {
    /// Build a record from a (possibly partial) model reply object.
    /// Numeric leaves are cleaned; `Programme` labels stay text.
    pub fn from_model_object(map: &Map<String, Value>) -> Self {
        let mut rec = BudgetRecord::default();
        for (key, value) in map {
            match key.as_str() {
                KEY_TOTAL_BUDGET => rec.total_budget = clean_numeric(value),
                KEY_SECTORS => rec.sectors = Sectors::from_value(value),
                KEY_CLIMATE_PROJECTS => {
                    rec.climate_projects = value
                        .as_array()
                        .map(|items| {
                            items
                                .iter()
                                .filter_map(ProgrammeLineItem::from_value)
                                .collect()
                        })
                        .unwrap_or_default();
                }
                KEY_RAW_REPLY => {
                    rec.raw_reply = value.as_str().map(str::to_string);
                }
                _ => {
                    rec.extra.insert(key.clone(), coerce_numeric_tree(value));
                }
            }
        }
        rec
    }

    /// Scalar indicator by key (`None` when absent, null or non-numeric).
    pub fn indicator(&self, key: &str) -> Option<f64> {
        self.extra.get(key).and_then(Value::as_f64)
    }

    /// `true` when nothing at all was extracted.
    pub fn is_empty(&self) -> bool {
        self.total_budget.is_none()
            && Sector::ALL.iter().all(|s| self.sectors.get(*s).is_none())
            && self.sectors.other.values().all(Option::is_none)
            && self.climate_projects.is_empty()
            && self.extra.values().all(Value::is_null)
            && self.raw_reply.is_none()
    }
}
