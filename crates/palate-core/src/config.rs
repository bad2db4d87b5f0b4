//! Evaluator weights and thresholds.
//!
//! The weights are empirically chosen constants. They are plain data so a
//! deployment can retune them from configuration without touching the rules.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Evaluator configuration rejected by [`EvaluatorConfig::validate`].
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid evaluator config: {field} {reason}")]
pub struct InvalidConfig {
    pub field: String,
    pub reason: String,
}

/// Weight of every check the evaluator can emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckWeights {
    pub reds_tannin: f64,
    pub reds_body: f64,
    pub reds_oak: f64,
    pub whites_minerality: f64,
    pub whites_acidity: f64,
    pub buttery_malolactic: f64,
    pub sparkling_intensity: f64,
    pub oak_aversion: f64,
    pub acid_tolerance: f64,
    pub balance_nonflat: f64,
    pub ctx_steak: f64,
    pub ctx_pizza: f64,
    pub ctx_celebration: f64,
    pub ctx_aperitif: f64,
    pub coherence_tannin: f64,
    pub coherence_body: f64,
    pub coherence_acidity: f64,
    pub coherence_oak: f64,
    pub coherence_bubbles: f64,
}

impl Default for CheckWeights {
    fn default() -> Self {
        Self {
            reds_tannin: 2.0,
            reds_body: 2.0,
            reds_oak: 1.2,
            whites_minerality: 1.2,
            whites_acidity: 1.0,
            buttery_malolactic: 1.0,
            sparkling_intensity: 1.0,
            oak_aversion: 1.2,
            acid_tolerance: 1.2,
            balance_nonflat: 1.0,
            ctx_steak: 1.0,
            ctx_pizza: 0.6,
            ctx_celebration: 0.6,
            ctx_aperitif: 0.4,
            coherence_tannin: 0.7,
            coherence_body: 0.6,
            coherence_acidity: 0.5,
            coherence_oak: 0.4,
            coherence_bubbles: 0.5,
        }
    }
}

impl CheckWeights {
    fn named(&self) -> [(&'static str, f64); 19] {
        [
            ("reds_tannin", self.reds_tannin),
            ("reds_body", self.reds_body),
            ("reds_oak", self.reds_oak),
            ("whites_minerality", self.whites_minerality),
            ("whites_acidity", self.whites_acidity),
            ("buttery_malolactic", self.buttery_malolactic),
            ("sparkling_intensity", self.sparkling_intensity),
            ("oak_aversion", self.oak_aversion),
            ("acid_tolerance", self.acid_tolerance),
            ("balance_nonflat", self.balance_nonflat),
            ("ctx_steak", self.ctx_steak),
            ("ctx_pizza", self.ctx_pizza),
            ("ctx_celebration", self.ctx_celebration),
            ("ctx_aperitif", self.ctx_aperitif),
            ("coherence_tannin", self.coherence_tannin),
            ("coherence_body", self.coherence_body),
            ("coherence_acidity", self.coherence_acidity),
            ("coherence_oak", self.coherence_oak),
            ("coherence_bubbles", self.coherence_bubbles),
        ]
    }
}

/// Tunables for [`crate::ConsistencyEvaluator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    pub weights: CheckWeights,

    /// Maximum absolute gap between a flavor-map value and its top-level axis
    pub coherence_tolerance: f64,

    /// Core palate variance must exceed this for a profile to count as non-flat
    pub nonflat_variance_min: f64,

    /// Confidence reported when no check fired
    pub neutral_confidence: f64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            weights: CheckWeights::default(),
            coherence_tolerance: 0.2,
            nonflat_variance_min: 0.004,
            neutral_confidence: 0.5,
        }
    }
}

impl EvaluatorConfig {
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        for (name, weight) in self.weights.named() {
            if !(weight > 0.0 && weight.is_finite()) {
                return Err(InvalidConfig {
                    field: format!("weights.{}", name),
                    reason: format!("must be a positive number, got {}", weight),
                });
            }
        }

        if !(self.coherence_tolerance >= 0.0 && self.coherence_tolerance.is_finite()) {
            return Err(InvalidConfig {
                field: "coherence_tolerance".to_string(),
                reason: "must be a non-negative number".to_string(),
            });
        }

        if !(self.nonflat_variance_min >= 0.0 && self.nonflat_variance_min.is_finite()) {
            return Err(InvalidConfig {
                field: "nonflat_variance_min".to_string(),
                reason: "must be a non-negative number".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&self.neutral_confidence) {
            return Err(InvalidConfig {
                field: "neutral_confidence".to_string(),
                reason: "must lie in [0, 1]".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EvaluatorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_weight_rejected() {
        let mut config = EvaluatorConfig::default();
        config.weights.ctx_aperitif = 0.0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.field, "weights.ctx_aperitif");
    }

    #[test]
    fn test_neutral_confidence_range() {
        let config = EvaluatorConfig {
            neutral_confidence: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config: EvaluatorConfig =
            serde_json::from_str(r#"{ "weights": { "reds_tannin": 3.0 } }"#).unwrap();
        assert_eq!(config.weights.reds_tannin, 3.0);
        assert_eq!(config.weights.reds_body, 2.0);
        assert_eq!(config.coherence_tolerance, 0.2);
    }
}
