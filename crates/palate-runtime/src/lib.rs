//! # palate-runtime
//!
//! LLM-backed profile mapping for palate.
//!
//! This crate turns free-text onboarding answers into a validated
//! [`palate_core::UserProfileInput`] through a text-generation provider, then
//! hands the profile to the deterministic evaluator in `palate-core`.
//!
//! ## Important
//!
//! The model is consulted exactly once per mapping and its reply is never
//! trusted: every reply passes schema validation before any field is read.
//! Scoring stays in `palate-core` and never calls a provider.
//!
//! ## Example
//!
//! ```rust,ignore
//! use palate_runtime::{create_provider, MappingRequest, OnboardingPipeline, RuntimeConfig};
//!
//! let config = RuntimeConfig::from_yaml_file("palate.yaml")?;
//! let provider = create_provider(&config.provider, None)?;
//! let pipeline = OnboardingPipeline::builder()
//!     .provider(provider)
//!     .config(config)
//!     .build()?;
//!
//! let outcome = pipeline.run(&MappingRequest::new("u-1", tier, answers)).await?;
//! println!("{}", outcome.mapped.provenance);
//! ```

pub mod config;
pub mod mapper;
pub mod pipeline;
pub mod prompts;
pub mod providers;

pub use config::{ConfigError, MapperConfig, ProviderConfig, ProviderKind, RuntimeConfig};
pub use mapper::{
    MappedProfile, MappingError, MappingRequest, ProfileMapper, ProfileSource, Provenance,
};
pub use pipeline::{OnboardingOutcome, OnboardingPipeline, OnboardingPipelineBuilder, PipelineError};
pub use providers::{
    create_provider, ApiCredential, ChatMessage, CompletionConfig, CompletionResponse,
    CredentialSource, LlmProvider, ProviderError, ReplayProvider, TokenUsage,
};

#[cfg(feature = "anthropic")]
pub use providers::AnthropicProvider;
