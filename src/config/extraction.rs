// src/config/extraction.rs
//! Fixed lookup tables for the pattern extractors, optionally overridden from
//! `config/extraction.toml`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_EXTRACTION_CONFIG_PATH: &str = "config/extraction.toml";
pub const ENV_EXTRACTION_CONFIG_PATH: &str = "EXTRACTION_CONFIG_PATH";

/// Keywords searched by the keyword-number extractor when none are given.
pub const DEFAULT_KEYWORDS: [&str; 9] = [
    "total budget",
    "public",
    "adaptation",
    "mitigation",
    "energy",
    "agriculture",
    "health",
    "transport",
    "water",
];

fn default_fiscal_years() -> Vec<u16> {
    vec![2022, 2023, 2024]
}

fn default_programme_codes() -> BTreeMap<String, String> {
    [
        ("07", "Irrigation Development"),
        ("17", "Irrigation Development Support Programme"),
        ("18", "Farming Systems / SCRALA"),
        ("41", "Chiansi Water Development Project"),
        (
            "61",
            "Programme for Adaptation of Climate Change (PIDACC) Zambezi",
        ),
    ]
    .into_iter()
    .map(|(c, n)| (c.to_string(), n.to_string()))
    .collect()
}

fn default_agriculture_keyword() -> String {
    "agric".to_string()
}

fn default_keywords() -> Vec<String> {
    DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExtractionConfig {
    /// Consecutive fiscal years, oldest first.
    #[serde(default = "default_fiscal_years")]
    pub fiscal_years: Vec<u16>,
    /// Programme code -> display name.
    #[serde(default = "default_programme_codes")]
    pub programme_codes: BTreeMap<String, String>,
    /// Substring a line-item name must contain (case-insensitive).
    #[serde(default = "default_agriculture_keyword")]
    pub agriculture_keyword: String,
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    /// Page cap applied when reading uploaded PDFs.
    #[serde(default)]
    pub max_pages: Option<usize>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            fiscal_years: default_fiscal_years(),
            programme_codes: default_programme_codes(),
            agriculture_keyword: default_agriculture_keyword(),
            keywords: default_keywords(),
            max_pages: None,
        }
    }
}

impl ExtractionConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading extraction config from {}", path.display()))?;
        Self::from_toml_str(&data)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: ExtractionConfig = toml::from_str(s).context("parsing extraction config")?;
        cfg.fiscal_years.sort_unstable();
        cfg.fiscal_years.dedup();
        if cfg.fiscal_years.is_empty() {
            cfg.fiscal_years = default_fiscal_years();
        }
        cfg.keywords = cfg
            .keywords
            .into_iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Ok(cfg)
    }

    /// $EXTRACTION_CONFIG_PATH, then `config/extraction.toml`, then defaults.
    pub fn load_default() -> Result<Self> {
        let path = std::env::var(ENV_EXTRACTION_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_EXTRACTION_CONFIG_PATH));
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            tracing::debug!(path = %path.display(), "no extraction config, using defaults");
            Ok(Self::default())
        }
    }
}
