//! Onboarding pipeline: map the answers, then score the mapped profile
//! against the same answers.
//!
//! The evaluator never sees the provider. It only receives the validated
//! profile and the original text.

use std::sync::Arc;

use palate_core::{ConsistencyEvaluator, Evaluation};
use serde::Serialize;
use thiserror::Error;

use crate::config::{ConfigError, RuntimeConfig};
use crate::mapper::{MappedProfile, MappingError, MappingRequest, ProfileMapper};
use crate::providers::LlmProvider;

/// Errors from assembling a pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Mapped profile and its evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct OnboardingOutcome {
    #[serde(flatten)]
    pub mapped: MappedProfile,
    pub evaluation: Evaluation,
}

pub struct OnboardingPipeline {
    mapper: ProfileMapper,
    evaluator: ConsistencyEvaluator,
}

impl OnboardingPipeline {
    /// Assemble a pipeline. The configuration is validated as a whole.
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        config: RuntimeConfig,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let mapper = ProfileMapper::with_config(provider, config.completion());
        let evaluator =
            ConsistencyEvaluator::with_config(config.evaluator).map_err(ConfigError::from)?;
        Ok(Self { mapper, evaluator })
    }

    pub fn builder() -> OnboardingPipelineBuilder {
        OnboardingPipelineBuilder::new()
    }

    /// Map then evaluate. Mapping errors propagate; evaluation cannot fail.
    pub async fn run(&self, request: &MappingRequest) -> Result<OnboardingOutcome, MappingError> {
        let mapped = self.mapper.map(request).await?;
        let evaluation = self.evaluator.evaluate(
            &mapped.profile,
            Some(&request.answers),
            Some(request.experience),
        );

        tracing::info!(
            user_id = %request.user_id,
            confidence = evaluation.confidence,
            failed = evaluation.failed_checks().count(),
            "onboarding profile evaluated"
        );

        Ok(OnboardingOutcome { mapped, evaluation })
    }

    pub fn mapper(&self) -> &ProfileMapper {
        &self.mapper
    }

    pub fn evaluator(&self) -> &ConsistencyEvaluator {
        &self.evaluator
    }
}

/// Builder for OnboardingPipeline.
pub struct OnboardingPipelineBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    config: RuntimeConfig,
}

impl OnboardingPipelineBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            config: RuntimeConfig::default(),
        }
    }

    /// Set the text-generation provider.
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the configuration.
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the pipeline.
    pub fn build(self) -> Result<OnboardingPipeline, PipelineError> {
        let provider = self
            .provider
            .ok_or_else(|| PipelineError::ProviderNotConfigured("No provider set".to_string()))?;

        OnboardingPipeline::new(provider, self.config)
    }
}

impl Default for OnboardingPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
