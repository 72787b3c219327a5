// src/ai/providers.rs
//! Chat-completion providers used for structured extraction.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use super::pool::Credential;
use super::prompt::ExtractionPrompt;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("authentication rejected (HTTP {0})")]
    Auth(u16),

    #[error("rate limited or quota exhausted")]
    RateLimited,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected HTTP status {0}")]
    Http(u16),

    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Failures that another credential might get past.
    pub fn is_rotatable(&self) -> bool {
        matches!(self, ProviderError::Auth(_) | ProviderError::RateLimited)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Auth(_) => "auth",
            ProviderError::RateLimited => "rate_limited",
            ProviderError::Transport(_) => "transport",
            ProviderError::Http(_) => "http",
            ProviderError::Malformed(_) => "malformed",
        }
    }

    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            401 | 403 => ProviderError::Auth(status.as_u16()),
            429 => ProviderError::RateLimited,
            other => ProviderError::Http(other),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ProviderError::Malformed(e.to_string())
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}

/// One remote model that returns the raw reply text for a prompt.
#[async_trait::async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(
        &self,
        credential: &Credential,
        prompt: &ExtractionPrompt,
    ) -> Result<String, ProviderError>;

    fn name(&self) -> &'static str;
}

fn http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent("budget-extractor/0.1")
        .connect_timeout(Duration::from_secs(5).min(timeout))
        .timeout(timeout)
        .build()?;
    Ok(client)
}

// ------------------------------------------------------------
// Primary: OpenAI-compatible chat completions with a JSON schema
// ------------------------------------------------------------

pub struct OpenAiProvider {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl ChatProvider for OpenAiProvider {
    async fn complete(
        &self,
        credential: &Credential,
        prompt: &ExtractionPrompt,
    ) -> Result<String, ProviderError> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            response_format: Value,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: Option<String>,
        }

        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: &prompt.system,
                },
                Msg {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: 0.0,
            response_format: json!({
                "type": "json_schema",
                "json_schema": { "name": "budget_record", "schema": prompt.schema }
            }),
        };

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(credential.key())
            .json(&req)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ProviderError::from_status(resp.status()));
        }
        let body: Resp = resp.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::Malformed("no message content".into()))
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

// ------------------------------------------------------------
// Secondary: Anthropic messages API
// ------------------------------------------------------------

pub struct AnthropicProvider {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl AnthropicProvider {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl ChatProvider for AnthropicProvider {
    async fn complete(
        &self,
        credential: &Credential,
        prompt: &ExtractionPrompt,
    ) -> Result<String, ProviderError> {
        #[derive(Deserialize)]
        struct Resp {
            content: Vec<Block>,
        }
        #[derive(Deserialize)]
        struct Block {
            #[serde(default)]
            text: Option<String>,
        }

        let req = json!({
            "model": self.model,
            "max_tokens": 2048,
            "temperature": 0.0,
            "system": prompt.system,
            "messages": [{ "role": "user", "content": prompt.user }],
        });

        let resp = self
            .http
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", credential.key())
            .header("anthropic-version", "2023-06-01")
            .json(&req)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ProviderError::from_status(resp.status()));
        }
        let body: Resp = resp.json().await?;
        let text: String = body.content.into_iter().filter_map(|b| b.text).collect();
        if text.is_empty() {
            return Err(ProviderError::Malformed("no text blocks".into()));
        }
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(ProviderError::from_status(StatusCode::UNAUTHORIZED).is_rotatable());
        assert!(ProviderError::from_status(StatusCode::FORBIDDEN).is_rotatable());
        assert!(ProviderError::from_status(StatusCode::TOO_MANY_REQUESTS).is_rotatable());
        let e = ProviderError::from_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!e.is_rotatable());
        assert_eq!(e.kind(), "http");
        assert!(!ProviderError::Transport("timeout".into()).is_rotatable());
    }
}
