//! # palate-core
//!
//! Deterministic palate profile validation and consistency evaluation.
//!
//! This crate answers two questions about a taste profile:
//! - Is it structurally valid?
//! - Do its numbers agree with what the user actually wrote?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same profile and answers always produce the same evaluation
//! 2. **No LLM calls**: Evaluation is rule-based; the model lives in `palate-runtime`
//! 3. **Single gate**: Every profile passes [`validate`] before any field access
//! 4. **Traceable**: Every check reports what it expected and what it found
//!
//! ## Example
//!
//! ```rust,ignore
//! use palate_core::{validate, ConsistencyEvaluator};
//!
//! let profile = validate(&serde_json::from_str(&raw)?)?;
//! let evaluation = ConsistencyEvaluator::new().evaluate(&profile, Some(&answers), None);
//! println!("{:.2}: {}", evaluation.confidence, evaluation.commentary);
//! ```

pub mod checks;
pub mod commentary;
pub mod config;
pub mod evaluator;
pub mod profile;
pub mod signals;

// Re-export main types at crate root
pub use checks::{Check, CheckGroup, CoherenceChecks, Condition, OccasionChecks, TasteChecks};
pub use commentary::Bucket;
pub use config::{CheckWeights, EvaluatorConfig, InvalidConfig};
pub use evaluator::{ConsistencyEvaluator, Evaluation};
pub use profile::{
    schema_json, validate, Answers, AromaAffinity, AromaFamily, Axis, BudgetTier,
    ContextWeightsEntry, DrynessBand, ExperienceTier, FlavorMapCategory, FlavorMaps,
    FoodProfile, Occasion, Preferences, SchemaViolation, SparklingOverrides, StablePalate,
    StyleLevers, UserProfileInput, WineCategory,
};
pub use signals::{NormalizedText, Signal, SignalHit, SignalSet};

/// Evaluate a profile with the default configuration.
///
/// Shorthand for `ConsistencyEvaluator::new().evaluate(..)`.
pub fn evaluate(
    profile: &UserProfileInput,
    answers: Option<&Answers>,
    experience: Option<ExperienceTier>,
) -> Evaluation {
    ConsistencyEvaluator::new().evaluate(profile, answers, experience)
}
