//! Text-generation provider abstractions for palate-runtime.
//!
//! The mapper talks to the model only through [`LlmProvider`]. Two
//! implementations ship with the crate:
//! - [`ReplayProvider`]: returns canned text (offline runs and tests)
//! - `AnthropicProvider`: the Messages API, behind the `anthropic` feature
//!
//! ## Security
//!
//! Providers hold API keys as [`ApiCredential`] values, which never print.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{ProviderConfig, ProviderKind};

mod replay;
pub mod secrets;

#[cfg(feature = "anthropic")]
mod anthropic;

pub use replay::ReplayProvider;
pub use secrets::{ApiCredential, CredentialSource};

#[cfg(feature = "anthropic")]
pub use anthropic::AnthropicProvider;

/// Default environment variable for the Anthropic API key.
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Errors from text-generation providers.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    ParseError(String),

    #[error("Authentication failed")]
    AuthError,

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// Configuration for a completion request.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Model to use
    pub model: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Sampling temperature; low values keep the JSON shape stable
    pub temperature: f32,

    /// Request timeout
    pub timeout: Duration,

    /// Cache the system prompt across calls (Anthropic-specific)
    pub prompt_caching: bool,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-5".to_string(),
            max_tokens: 1200,
            temperature: 0.2,
            timeout: Duration::from_secs(20),
            prompt_caching: true,
        }
    }
}

/// A chat message for completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user", or "assistant"
    pub role: String,

    /// Message content
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Response from a completion.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated content
    pub content: String,

    /// Token usage
    pub usage: TokenUsage,

    /// Model used
    pub model: String,

    /// Stop reason
    pub stop_reason: Option<String>,
}

/// Token usage from a completion.
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,

    /// Tokens in the completion
    pub completion_tokens: u32,

    /// Tokens read from cache (Anthropic)
    pub cache_read_tokens: u32,

    /// Tokens written to cache (Anthropic)
    pub cache_creation_tokens: u32,
}

impl TokenUsage {
    /// Total tokens used.
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Provider abstraction allows swapping text-generation backends.
///
/// The mapper is the only caller. The evaluator never reaches a provider.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Execute a chat completion.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Check if provider is usable.
    async fn health_check(&self) -> bool;

    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Estimate tokens for a prompt.
    fn estimate_tokens(&self, text: &str) -> u32 {
        // ~4 chars per token
        (text.len() / 4) as u32
    }
}

/// Build the provider selected by `config`.
///
/// `replay` carries the canned reply for [`ProviderKind::Replay`]; it is
/// ignored for other kinds.
pub fn create_provider(
    config: &ProviderConfig,
    replay: Option<String>,
) -> Result<Arc<dyn LlmProvider>, ProviderError> {
    match config.kind {
        ProviderKind::Replay => {
            let content = replay.ok_or_else(|| {
                ProviderError::NotConfigured("replay provider needs a reply file".to_string())
            })?;
            Ok(Arc::new(ReplayProvider::new(content)))
        }
        ProviderKind::Anthropic => anthropic_from_config(config),
    }
}

#[cfg(feature = "anthropic")]
fn anthropic_from_config(config: &ProviderConfig) -> Result<Arc<dyn LlmProvider>, ProviderError> {
    let credential = ApiCredential::resolve(
        config.api_key.as_deref(),
        &config.api_key_env,
        "Anthropic API key",
    )?;
    tracing::debug!(source = %credential.source(), "resolved Anthropic credential");
    let mut provider = AnthropicProvider::with_credential(credential)?;
    if let Some(url) = &config.base_url {
        provider = provider.with_base_url(url);
    }
    Ok(Arc::new(provider))
}

#[cfg(not(feature = "anthropic"))]
fn anthropic_from_config(_config: &ProviderConfig) -> Result<Arc<dyn LlmProvider>, ProviderError> {
    Err(ProviderError::NotConfigured(
        "Anthropic provider requires the 'anthropic' feature".to_string(),
    ))
}
