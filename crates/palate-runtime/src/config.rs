//! Runtime configuration loaded from YAML.
//!
//! ```yaml
//! provider:
//!   kind: anthropic
//!   model: claude-sonnet-4-5
//!   api_key_env: ANTHROPIC_API_KEY   # or api_key: sk-ant-...
//! mapper:
//!   max_tokens: 1200
//!   temperature: 0.2
//!   timeout: 20s
//! evaluator:
//!   coherence_tolerance: 0.2
//!   weights:
//!     reds_tannin: 2.0
//! ```
//!
//! Every section and field has a default, so an empty file is valid.

use palate_core::{EvaluatorConfig, InvalidConfig};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::providers::{CompletionConfig, ANTHROPIC_API_KEY_ENV};

/// Errors that can occur when loading runtime configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid config: {field} {reason}")]
    Invalid { field: String, reason: String },

    #[error(transparent)]
    Evaluator(#[from] InvalidConfig),
}

/// Which provider backs the mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Anthropic,
    Replay,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,

    pub model: String,

    /// Override of the provider's API endpoint
    pub base_url: Option<String>,

    /// API key given inline; takes precedence over `api_key_env`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_key_env", &self.api_key_env)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Anthropic,
            model: "claude-sonnet-4-5".to_string(),
            base_url: None,
            api_key: None,
            api_key_env: ANTHROPIC_API_KEY_ENV.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    pub max_tokens: u32,

    pub temperature: f32,

    /// Deadline for the single model call (e.g. "20s", "1m")
    #[serde(
        serialize_with = "serialize_duration",
        deserialize_with = "deserialize_duration"
    )]
    pub timeout: Duration,

    pub prompt_caching: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1200,
            temperature: 0.2,
            timeout: Duration::from_secs(20),
            prompt_caching: true,
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub provider: ProviderConfig,
    pub mapper: MapperConfig,
    pub evaluator: EvaluatorConfig,
}

impl RuntimeConfig {
    /// Parse and validate configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        // serde_yaml rejects an empty document instead of reading an empty map
        let config: RuntimeConfig = if yaml.trim().is_empty() {
            RuntimeConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let temperature = self.mapper.temperature;
        if !(0.0..=1.0).contains(&temperature) {
            return Err(ConfigError::Invalid {
                field: "mapper.temperature".to_string(),
                reason: format!("must lie in [0, 1], got {}", temperature),
            });
        }

        if self.mapper.max_tokens == 0 {
            return Err(ConfigError::Invalid {
                field: "mapper.max_tokens".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.mapper.timeout.is_zero() {
            return Err(ConfigError::Invalid {
                field: "mapper.timeout".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if let Some(url) = &self.provider.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::Invalid {
                    field: "provider.base_url".to_string(),
                    reason: "must start with http:// or https://".to_string(),
                });
            }
        }

        self.evaluator.validate()?;
        Ok(())
    }

    /// Completion settings for the mapper's model call.
    pub fn completion(&self) -> CompletionConfig {
        CompletionConfig {
            model: self.provider.model.clone(),
            max_tokens: self.mapper.max_tokens,
            temperature: self.mapper.temperature,
            timeout: self.mapper.timeout,
            prompt_caching: self.mapper.prompt_caching,
        }
    }
}

fn serialize_duration<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&humantime::format_duration(*value).to_string())
}

fn deserialize_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = RuntimeConfig::from_yaml("").unwrap();
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.mapper.timeout, Duration::from_secs(20));
        assert_eq!(config.provider.kind, ProviderKind::Anthropic);
    }

    #[test]
    fn test_partial_config() {
        let yaml = r#"
provider:
  kind: replay
mapper:
  timeout: 1m 30s
  temperature: 0.0
evaluator:
  weights:
    ctx_aperitif: 0.8
"#;
        let config = RuntimeConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.provider.kind, ProviderKind::Replay);
        assert_eq!(config.mapper.timeout, Duration::from_secs(90));
        assert_eq!(config.mapper.max_tokens, 1200);
        assert_eq!(config.evaluator.weights.ctx_aperitif, 0.8);
        assert_eq!(config.evaluator.weights.reds_tannin, 2.0);

        let completion = config.completion();
        assert_eq!(completion.timeout, Duration::from_secs(90));
        assert_eq!(completion.temperature, 0.0);
    }

    #[test]
    fn test_inline_api_key_is_never_written_or_printed() {
        let config = RuntimeConfig::from_yaml("provider:\n  api_key: sk-ant-inline-secret\n").unwrap();
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-ant-inline-secret"));

        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("sk-ant-inline-secret"));
        assert!(!format!("{:?}", config).contains("sk-ant-inline-secret"));
    }

    #[test]
    fn test_rejects_hot_temperature() {
        let err = RuntimeConfig::from_yaml("mapper:\n  temperature: 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "mapper.temperature"));
    }

    #[test]
    fn test_rejects_zero_tokens() {
        assert!(RuntimeConfig::from_yaml("mapper:\n  max_tokens: 0\n").is_err());
    }

    #[test]
    fn test_rejects_bad_duration() {
        let err = RuntimeConfig::from_yaml("mapper:\n  timeout: soon\n").unwrap_err();
        assert!(matches!(err, ConfigError::YamlError(_)));
    }

    #[test]
    fn test_rejects_invalid_evaluator_config() {
        let err = RuntimeConfig::from_yaml("evaluator:\n  neutral_confidence: 2.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Evaluator(_)));
    }

    #[test]
    fn test_duration_round_trips_as_text() {
        let yaml = serde_yaml::to_string(&RuntimeConfig::default()).unwrap();
        assert!(yaml.contains("20s"));
        let back: RuntimeConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, RuntimeConfig::default());
    }
}
