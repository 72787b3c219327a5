// src/ai/mod.rs
//! AI extraction: prompt, credential pool, providers, reply repair, and the
//! provider chain that ties them together.

pub mod client;
pub mod pool;
pub mod prompt;
pub mod providers;
pub mod repair;

pub use client::{AiExtractor, DynProvider};
pub use pool::{Credential, ProviderPool};
pub use prompt::ExtractionPrompt;
pub use providers::{AnthropicProvider, ChatProvider, OpenAiProvider, ProviderError};
pub use repair::{parse_model_reply, ModelReply};
