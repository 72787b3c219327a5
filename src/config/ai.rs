// src/config/ai.rs
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf};

pub const DEFAULT_AI_CONFIG_PATH: &str = "config/ai.json";
pub const ENV_AI_CONFIG_PATH: &str = "AI_CONFIG_PATH";

/// Comma-separated list of primary-provider keys (rotation order).
pub const ENV_PRIMARY_KEYS: &str = "OPENAI_API_KEYS";
pub const ENV_PRIMARY_KEY: &str = "OPENAI_API_KEY";
pub const ENV_SECONDARY_KEY: &str = "ANTHROPIC_API_KEY";

fn default_enabled() -> bool {
    true
}
fn default_max_chars() -> usize {
    12_000
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_primary_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_primary_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_secondary_model() -> String {
    "claude-3-5-haiku-latest".to_string()
}
fn default_secondary_base_url() -> String {
    "https://api.anthropic.com/v1".to_string()
}
fn env_marker() -> Vec<String> {
    vec!["ENV".to_string()]
}
fn env_marker_opt() -> Option<String> {
    Some("ENV".to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryConfig {
    #[serde(default = "default_primary_model")]
    pub model: String,
    #[serde(default = "default_primary_base_url")]
    pub base_url: String,
    /// Credential slots in rotation order. `"ENV"` expands to the keys found
    /// in `OPENAI_API_KEYS` / `OPENAI_API_KEY`.
    #[serde(default = "env_marker")]
    pub api_keys: Vec<String>,
}

impl Default for PrimaryConfig {
    fn default() -> Self {
        Self {
            model: default_primary_model(),
            base_url: default_primary_base_url(),
            api_keys: env_marker(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecondaryConfig {
    #[serde(default = "default_secondary_model")]
    pub model: String,
    #[serde(default = "default_secondary_base_url")]
    pub base_url: String,
    /// `"ENV"` means: read from `ANTHROPIC_API_KEY`.
    #[serde(default = "env_marker_opt")]
    pub api_key: Option<String>,
}

impl Default for SecondaryConfig {
    fn default() -> Self {
        Self {
            model: default_secondary_model(),
            base_url: default_secondary_base_url(),
            api_key: env_marker_opt(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub primary: PrimaryConfig,
    #[serde(default)]
    pub secondary: SecondaryConfig,
    /// Prompt budget: document text is cut to this many chars.
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    /// Client-side timeout for both providers.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            primary: PrimaryConfig::default(),
            secondary: SecondaryConfig::default(),
            max_chars: default_max_chars(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AiConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading AI config from {}", path.display()))?;
        Self::from_json_str(&data)
    }

    pub fn from_json_str(data: &str) -> anyhow::Result<Self> {
        let mut cfg: AiConfig = serde_json::from_str(data).context("parsing AI config")?;
        cfg.resolve_env_keys();
        Ok(cfg)
    }

    /// $AI_CONFIG_PATH, then `config/ai.json`, then defaults (keys from env).
    pub fn load_default() -> anyhow::Result<Self> {
        let path = env::var(ENV_AI_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_AI_CONFIG_PATH));
        if path.exists() {
            return Self::load_from_file(&path);
        }
        let mut cfg = AiConfig::default();
        cfg.resolve_env_keys();
        Ok(cfg)
    }

    /// Expand `"ENV"` markers and drop blank keys.
    pub fn resolve_env_keys(&mut self) {
        let mut keys = Vec::with_capacity(self.primary.api_keys.len());
        for k in self.primary.api_keys.drain(..) {
            if k.trim().eq_ignore_ascii_case("env") {
                keys.extend(primary_keys_from_env());
            } else {
                keys.push(k.trim().to_string());
            }
        }
        keys.retain(|k| !k.is_empty());
        self.primary.api_keys = keys;

        self.secondary.api_key = match self.secondary.api_key.take() {
            Some(k) if k.trim().eq_ignore_ascii_case("env") => env::var(ENV_SECONDARY_KEY).ok(),
            other => other,
        }
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty());
    }

    /// Enabled and at least one provider has a credential.
    pub fn is_usable(&self) -> bool {
        self.enabled && (!self.primary.api_keys.is_empty() || self.secondary.api_key.is_some())
    }
}

fn primary_keys_from_env() -> Vec<String> {
    if let Ok(list) = env::var(ENV_PRIMARY_KEYS) {
        let keys: Vec<String> = list
            .split(',')
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if !keys.is_empty() {
            return keys;
        }
    }
    env::var(ENV_PRIMARY_KEY).map(|k| vec![k]).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[test]
    fn env_markers_expand_in_order() {
        env::set_var(ENV_PRIMARY_KEYS, "k1, k2 ,,k3");
        env::set_var(ENV_SECONDARY_KEY, "s1");
        let cfg = AiConfig::from_json_str(
            r#"{"primary": {"api_keys": ["fixed", "ENV"]}, "secondary": {"api_key": "ENV"}}"#,
        )
        .unwrap();
        assert_eq!(cfg.primary.api_keys, vec!["fixed", "k1", "k2", "k3"]);
        assert_eq!(cfg.secondary.api_key.as_deref(), Some("s1"));
        assert_eq!(cfg.timeout_secs, 30);
        assert!(cfg.is_usable());
        env::remove_var(ENV_PRIMARY_KEYS);
        env::remove_var(ENV_SECONDARY_KEY);
    }

    #[serial_test::serial]
    #[test]
    fn missing_env_leaves_ai_unusable() {
        env::remove_var(ENV_PRIMARY_KEYS);
        env::remove_var(ENV_PRIMARY_KEY);
        env::remove_var(ENV_SECONDARY_KEY);
        let cfg = AiConfig::from_json_str("{}").unwrap();
        assert!(cfg.primary.api_keys.is_empty());
        assert!(cfg.secondary.api_key.is_none());
        assert!(!cfg.is_usable());
    }

    #[serial_test::serial]
    #[test]
    fn single_key_fallback() {
        env::remove_var(ENV_PRIMARY_KEYS);
        env::set_var(ENV_PRIMARY_KEY, "solo");
        let cfg = AiConfig::from_json_str(r#"{"enabled": false}"#).unwrap();
        assert_eq!(cfg.primary.api_keys, vec!["solo"]);
        assert!(!cfg.is_usable());
        env::remove_var(ENV_PRIMARY_KEY);
    }
}
