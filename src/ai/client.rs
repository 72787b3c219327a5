// src/ai/client.rs
//! Primary/secondary provider chain for structured budget extraction.
//!
//! Primary: at most one attempt per credential slot, starting from the shared
//! current slot. Auth or quota failures rotate to the next slot; any other
//! failure abandons the primary at once. A reply that is not valid JSON also
//! counts as a primary failure, but its raw text is kept.
//! Secondary: a single attempt with its own credential.
//! When nothing structured comes back the first degraded reply is returned,
//! otherwise `ModelReply::Empty`. Never an error.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tracing::{debug, info, warn};

use super::pool::{Credential, ProviderPool};
use super::prompt::ExtractionPrompt;
use super::providers::{AnthropicProvider, ChatProvider, OpenAiProvider, ProviderError};
use super::repair::{parse_model_reply, ModelReply};
use crate::config::ai::AiConfig;

pub type DynProvider = Arc<dyn ChatProvider>;

pub struct AiExtractor {
    primary: Option<(DynProvider, Arc<ProviderPool>)>,
    secondary: Option<(DynProvider, Credential)>,
    max_chars: usize,
    fiscal_years: Vec<u16>,
}

impl AiExtractor {
    pub fn new(max_chars: usize, fiscal_years: &[u16]) -> Self {
        Self {
            primary: None,
            secondary: None,
            max_chars,
            fiscal_years: fiscal_years.to_vec(),
        }
    }

    /// Attach the primary provider. An empty pool leaves it unset.
    pub fn with_primary(mut self, provider: DynProvider, pool: Arc<ProviderPool>) -> Self {
        if !pool.is_empty() {
            self.primary = Some((provider, pool));
        }
        self
    }

    pub fn with_secondary(mut self, provider: DynProvider, api_key: impl Into<String>) -> Self {
        self.secondary = Some((provider, Credential::new(0, api_key)));
        self
    }

    /// Build real HTTP providers from config. `Ok(None)` when AI is disabled
    /// or no credential is configured.
    pub fn from_config(cfg: &AiConfig, fiscal_years: &[u16]) -> anyhow::Result<Option<Self>> {
        if !cfg.is_usable() {
            info!(enabled = cfg.enabled, "AI extraction disabled");
            return Ok(None);
        }
        let timeout = Duration::from_secs(cfg.timeout_secs.max(1));
        let mut out = AiExtractor::new(cfg.max_chars, fiscal_years);

        if !cfg.primary.api_keys.is_empty() {
            let provider = OpenAiProvider::new(&cfg.primary.base_url, &cfg.primary.model, timeout)?;
            let pool = ProviderPool::new(cfg.primary.api_keys.iter().cloned());
            out = out.with_primary(Arc::new(provider), Arc::new(pool));
        }
        if let Some(key) = &cfg.secondary.api_key {
            let provider =
                AnthropicProvider::new(&cfg.secondary.base_url, &cfg.secondary.model, timeout)?;
            out = out.with_secondary(Arc::new(provider), key.clone());
        }

        // Safe diagnostics: slot count + which providers, never key material.
        info!(
            primary_slots = cfg.primary.api_keys.len(),
            secondary = cfg.secondary.api_key.is_some(),
            max_chars = cfg.max_chars,
            "AI extraction configured"
        );
        Ok(Some(out))
    }

    pub fn has_providers(&self) -> bool {
        self.primary.is_some() || self.secondary.is_some()
    }

    /// Run the provider chain over `text` and parse whatever comes back.
    pub async fn extract(&self, text: &str) -> ModelReply {
        let prompt = ExtractionPrompt::new(text, self.max_chars, &self.fiscal_years);
        let mut degraded: Option<ModelReply> = None;

        if let Some((provider, pool)) = &self.primary {
            if let Some(reply) = self.try_primary(provider.as_ref(), pool, &prompt).await {
                match self.parse(provider.name(), &reply) {
                    parsed @ ModelReply::Structured(_) => return parsed,
                    parsed @ ModelReply::Degraded(_) => degraded = Some(parsed),
                    ModelReply::Empty => {}
                }
            }
        }

        if let Some((provider, credential)) = &self.secondary {
            match provider.complete(credential, &prompt).await {
                Ok(reply) => match self.parse(provider.name(), &reply) {
                    parsed @ ModelReply::Structured(_) => return parsed,
                    parsed @ ModelReply::Degraded(_) => {
                        if degraded.is_none() {
                            degraded = Some(parsed);
                        }
                    }
                    ModelReply::Empty => {}
                },
                Err(e) => record_failure(provider.name(), credential.slot(), &e),
            }
        }

        match degraded {
            Some(reply) => reply,
            None => {
                warn!("all AI providers failed; continuing without model output");
                ModelReply::Empty
            }
        }
    }

    async fn try_primary(
        &self,
        provider: &dyn ChatProvider,
        pool: &ProviderPool,
        prompt: &ExtractionPrompt,
    ) -> Option<String> {
        let slots = pool.len();
        for attempt in 1..=slots {
            let credential = pool.current()?.clone();
            match provider.complete(&credential, prompt).await {
                Ok(reply) => return Some(reply),
                Err(e) if e.is_rotatable() => {
                    record_failure(provider.name(), credential.slot(), &e);
                    counter!("extract_ai_rotations_total").increment(1);
                    let next = pool.rotate()?;
                    if attempt == slots {
                        warn!(provider = provider.name(), slots, "every credential slot failed");
                        return None;
                    }
                    debug!(provider = provider.name(), slot = next.slot(), "rotated credential");
                }
                Err(e) => {
                    record_failure(provider.name(), credential.slot(), &e);
                    return None;
                }
            }
        }
        None
    }

    fn parse(&self, provider: &'static str, reply: &str) -> ModelReply {
        let parsed = parse_model_reply(reply);
        if let ModelReply::Degraded(_) = parsed {
            counter!("extract_ai_degraded_total", "provider" => provider).increment(1);
            warn!(provider, reply_len = reply.len(), "model reply is not valid JSON; keeping raw text");
        } else {
            debug!(provider, kind = parsed.kind(), "model reply parsed");
        }
        parsed
    }
}

fn record_failure(provider: &'static str, slot: usize, e: &ProviderError) {
    counter!("extract_ai_provider_errors_total", "provider" => provider, "kind" => e.kind())
        .increment(1);
    warn!(provider, slot, kind = e.kind(), error = %e, "AI provider call failed");
}
