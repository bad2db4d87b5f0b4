//! Profile mapper: free-text answers to a validated profile.
//!
//! One mapping run is one outbound completion:
//! 1. Build the prompt (instruction, schema excerpt, few-shot examples, request)
//! 2. Call the provider once, under a timeout
//! 3. Parse the reply as JSON, substituting the neutral profile if it is noise
//! 4. Validate the candidate; a wrong-shape reply is `MappingFailed`
//!
//! There is no retry. A caller that wants one repeats the whole mapping.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use palate_core::{validate, Answers, ExperienceTier, SchemaViolation, UserProfileInput};

use crate::prompts;
use crate::providers::{CompletionConfig, LlmProvider, ProviderError};

lazy_static! {
    /// A reply wrapped in one markdown code fence, with optional language tag
    static ref CODE_FENCE: Regex =
        Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)\r?\n?```\s*$").unwrap();
}

/// Errors from a mapping run.
#[derive(Error, Debug)]
pub enum MappingError {
    /// The model produced valid JSON with the wrong shape.
    #[error("mapping failed: {0}")]
    MappingFailed(SchemaViolation),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("could not serialize mapping request: {0}")]
    Request(#[from] serde_json::Error),

    /// The request itself cannot describe a profile; no call was made.
    #[error("invalid mapping request: {0}")]
    InvalidRequest(String),
}

/// Input to one mapping run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingRequest {
    pub user_id: String,
    pub experience: ExperienceTier,
    pub answers: Answers,
}

impl MappingRequest {
    pub fn new(user_id: impl Into<String>, experience: ExperienceTier, answers: Answers) -> Self {
        Self {
            user_id: user_id.into(),
            experience,
            answers,
        }
    }
}

/// How the returned profile came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSource {
    /// Parsed from the model reply
    Model,
    /// The model reply was not JSON; the neutral profile was substituted
    DefaultFallback,
}

/// Short account of a mapping run, kept with the profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub source: ProfileSource,
    pub summary: String,
    pub fields_populated: usize,
    pub model: String,
    pub mapped_at: DateTime<Utc>,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary)
    }
}

/// A validated profile with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedProfile {
    pub profile: UserProfileInput,
    pub provenance: Provenance,
}

/// Maps onboarding answers to a profile through a text-generation provider.
///
/// Holds no per-run state; one mapper can serve concurrent runs.
pub struct ProfileMapper {
    provider: Arc<dyn LlmProvider>,
    completion: CompletionConfig,
}

impl ProfileMapper {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self::with_config(provider, CompletionConfig::default())
    }

    pub fn with_config(provider: Arc<dyn LlmProvider>, completion: CompletionConfig) -> Self {
        Self {
            provider,
            completion,
        }
    }

    pub fn completion_config(&self) -> &CompletionConfig {
        &self.completion
    }

    /// Run one mapping.
    pub async fn map(&self, request: &MappingRequest) -> Result<MappedProfile, MappingError> {
        // The neutral fallback copies userId, so it must satisfy the schema too
        if request.user_id.trim().is_empty() {
            return Err(MappingError::InvalidRequest(
                "userId must not be empty".to_string(),
            ));
        }

        let messages = prompts::build_messages(request)?;
        let timeout = self.completion.timeout;

        tracing::debug!(
            provider = self.provider.name(),
            user_id = %request.user_id,
            experience = %request.experience,
            answers = request.answers.len(),
            "requesting profile mapping"
        );

        let call = self.provider.complete(messages, &self.completion);
        let response = tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| MappingError::Timeout(timeout))??;

        let (candidate, source) = match parse_reply(&response.content) {
            Some(value) => (value, ProfileSource::Model),
            None => {
                tracing::warn!(
                    provider = self.provider.name(),
                    user_id = %request.user_id,
                    reply_len = response.content.len(),
                    "model reply is not JSON, substituting neutral profile"
                );
                let neutral = UserProfileInput::neutral(&request.user_id, request.experience);
                (serde_json::to_value(neutral)?, ProfileSource::DefaultFallback)
            }
        };

        let profile = validate(&candidate).map_err(|violation| {
            tracing::warn!(error = %violation, "model reply failed schema validation");
            MappingError::MappingFailed(violation)
        })?;
        check_identity(&profile, request)?;

        let provenance = provenance(&profile, request, source, response.model);
        tracing::info!(
            user_id = %request.user_id,
            source = ?provenance.source,
            fields = provenance.fields_populated,
            "profile mapped"
        );

        Ok(MappedProfile {
            profile,
            provenance,
        })
    }
}

/// Parse the model reply, tolerating one surrounding code fence.
fn parse_reply(content: &str) -> Option<Value> {
    let body = CODE_FENCE
        .captures(content)
        .and_then(|c| c.get(1))
        .map_or(content, |m| m.as_str());

    serde_json::from_str(body.trim()).ok()
}

/// The profile must describe the requested user at the requested tier.
fn check_identity(profile: &UserProfileInput, request: &MappingRequest) -> Result<(), MappingError> {
    if profile.user_id != request.user_id {
        return Err(MappingError::MappingFailed(SchemaViolation::new(
            "/userId",
            format!("expected '{}', got '{}'", request.user_id, profile.user_id),
        )));
    }

    if profile.wine_knowledge != request.experience {
        return Err(MappingError::MappingFailed(SchemaViolation::new(
            "/wineKnowledge",
            format!(
                "expected '{}', got '{}'",
                request.experience, profile.wine_knowledge
            ),
        )));
    }

    Ok(())
}

fn provenance(
    profile: &UserProfileInput,
    request: &MappingRequest,
    source: ProfileSource,
    model: String,
) -> Provenance {
    let fields_populated = profile.populated_fields();
    let origin = match source {
        ProfileSource::Model => "mapped from free text",
        ProfileSource::DefaultFallback => "default profile (unparseable model output)",
    };

    Provenance {
        source,
        summary: format!(
            "{}; experience={}; fields populated={}",
            origin, request.experience, fields_populated
        ),
        fields_populated,
        model,
        mapped_at: Utc::now(),
    }
}
