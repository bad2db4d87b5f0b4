//! Consistency evaluator: scores a profile against the text it came from.
//!
//! Evaluation is a pure function of (profile, answers, config). It never
//! fails for a validated profile; failed checks are reported as data.

use serde::{Deserialize, Serialize};

use crate::checks::{
    Check, CheckGroup, CoherenceChecks, EvaluationContext, OccasionChecks, TasteChecks,
};
use crate::commentary;
use crate::config::{EvaluatorConfig, InvalidConfig};
use crate::profile::{Answers, ExperienceTier, UserProfileInput};
use crate::signals::{NormalizedText, SignalSet};

/// Result of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Weighted share of passed checks, in [0, 1]
    pub confidence: f64,

    /// Every check that fired, in evaluation order
    pub checks: Vec<Check>,

    /// Short paragraph for direct display to the user
    pub commentary: String,
}

impl Evaluation {
    pub fn failed_checks(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

/// Stateless evaluator. Cheap to build; safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct ConsistencyEvaluator {
    config: EvaluatorConfig,
}

impl ConsistencyEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an evaluator from a custom configuration.
    ///
    /// The configuration is validated first, so every emitted check carries a
    /// positive weight.
    pub fn with_config(config: EvaluatorConfig) -> Result<Self, InvalidConfig> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Evaluate a profile against the onboarding answers.
    ///
    /// # Arguments
    ///
    /// * `profile` - A profile that passed schema validation
    /// * `answers` - The free-text answers; `None` fires no signals
    /// * `experience` - Declared tier, logged but never scored
    pub fn evaluate(
        &self,
        profile: &UserProfileInput,
        answers: Option<&Answers>,
        experience: Option<ExperienceTier>,
    ) -> Evaluation {
        let text = NormalizedText::from_answers(answers);
        let signals = SignalSet::detect(&text);

        let ctx = EvaluationContext {
            profile,
            signals: &signals,
            config: &self.config,
        };

        let groups: [&dyn CheckGroup; 3] =
            [&TasteChecks::new(), &OccasionChecks::new(), &CoherenceChecks::new()];

        let mut checks = Vec::new();
        for group in groups {
            let emitted = group.run(&ctx);
            tracing::debug!(group = group.name(), checks = emitted.len(), "check group ran");
            checks.extend(emitted);
        }

        let confidence = self.confidence(&checks);
        let commentary = commentary::compose(profile, &signals);

        tracing::debug!(
            user_id = %profile.user_id,
            experience = ?experience,
            signals = ?signals.fired().map(|s| s.id()).collect::<Vec<_>>(),
            confidence,
            "profile evaluated"
        );

        Evaluation {
            confidence,
            checks,
            commentary,
        }
    }

    fn confidence(&self, checks: &[Check]) -> f64 {
        let total: f64 = checks.iter().map(|c| c.weight).sum();
        if checks.is_empty() || total <= 0.0 {
            return self.config.neutral_confidence;
        }

        let passed: f64 = checks.iter().filter(|c| c.passed).map(|c| c.weight).sum();
        (passed / total).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{FlavorMapCategory, Occasion};
    use proptest::prelude::*;

    fn answers(pairs: &[(&str, &str)]) -> Answers {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn reds_answers() -> Answers {
        answers(&[(
            "free_enjoyed",
            "I love Napa Cabernet and Northern Rhône Syrah with steak",
        )])
    }

    fn profile_with(tannin: f64, body: f64, oak: f64) -> UserProfileInput {
        let mut profile = UserProfileInput::neutral("u-1", ExperienceTier::Intermediate);
        profile.stable_palate.tannin = tannin;
        profile.stable_palate.body = body;
        profile.style_levers.oak = oak;
        profile
    }

    fn find<'a>(evaluation: &'a Evaluation, id: &str) -> &'a Check {
        evaluation
            .checks
            .iter()
            .find(|c| c.id == id)
            .unwrap_or_else(|| panic!("missing check {}", id))
    }

    #[test]
    fn test_structured_reds_scenario() {
        let evaluation = ConsistencyEvaluator::new().evaluate(
            &profile_with(0.85, 0.82, 0.6),
            Some(&reds_answers()),
            Some(ExperienceTier::Intermediate),
        );

        assert!(find(&evaluation, "reds-tannin").passed);
        assert!(find(&evaluation, "reds-body").passed);
        assert!(find(&evaluation, "reds-oak").passed);
        assert!(evaluation.confidence >= 0.8, "confidence {}", evaluation.confidence);
    }

    #[test]
    fn test_contradicting_evidence_scenario() {
        let evaluation = ConsistencyEvaluator::new().evaluate(
            &profile_with(0.2, 0.3, 0.6),
            Some(&reds_answers()),
            None,
        );

        assert!(!find(&evaluation, "reds-tannin").passed);
        assert!(!find(&evaluation, "reds-body").passed);
        assert!(evaluation.confidence < 0.5, "confidence {}", evaluation.confidence);
    }

    #[test]
    fn test_coherence_violation_scenario() {
        let mut profile = profile_with(0.8, 0.5, 0.3);
        profile.flavor_maps.red = Some(FlavorMapCategory {
            tannin: Some(0.1),
            ..Default::default()
        });

        let evaluation = ConsistencyEvaluator::new().evaluate(&profile, None, None);
        assert!(!find(&evaluation, "coherence-red-tannin").passed);
    }

    #[test]
    fn test_empty_input_scenario() {
        let mut profile = UserProfileInput::neutral("u-1", ExperienceTier::Novice);
        profile.style_levers.oak = 0.5;

        let evaluation =
            ConsistencyEvaluator::new().evaluate(&profile, Some(&Answers::new()), None);

        assert_eq!(evaluation.checks.len(), 1);
        assert_eq!(evaluation.checks[0].id, "balance-nonflat");
        assert!(!evaluation.checks[0].passed);
        assert_eq!(evaluation.confidence, 0.0);
    }

    #[test]
    fn test_occasion_weights_count_toward_confidence() {
        let mut profile = profile_with(0.85, 0.82, 0.6);
        let without = ConsistencyEvaluator::new().evaluate(&profile, Some(&reds_answers()), None);

        profile.context_weights.push(crate::profile::ContextWeightsEntry {
            occasion: Occasion::SteakNight,
            weights: Default::default(),
        });
        let with = ConsistencyEvaluator::new().evaluate(&profile, Some(&reds_answers()), None);

        assert!(!find(&without, "ctx-steak").passed);
        assert!(find(&with, "ctx-steak").passed);
        assert_eq!(with.confidence, 1.0);
    }

    #[test]
    fn test_idempotent_output() {
        let evaluator = ConsistencyEvaluator::new();
        let profile = profile_with(0.6, 0.7, 0.5);
        let answers = answers(&[
            ("dislikes", "too oaky, and most whites are too acidic"),
            ("occasions", "pizza on weeknights, champagne for birthdays"),
        ]);

        let first = serde_json::to_string(&evaluator.evaluate(&profile, Some(&answers), None))
            .unwrap();
        let second = serde_json::to_string(&evaluator.evaluate(&profile, Some(&answers), None))
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_neutral_confidence_without_checks() {
        let evaluator = ConsistencyEvaluator::new();
        assert_eq!(evaluator.confidence(&[]), 0.5);
    }

    #[test]
    fn test_configured_weights_apply() {
        let mut config = EvaluatorConfig::default();
        config.weights.reds_tannin = 10.0;
        let evaluation = ConsistencyEvaluator::with_config(config).unwrap().evaluate(
            &profile_with(0.85, 0.3, 0.6),
            Some(&reds_answers()),
            None,
        );

        assert_eq!(find(&evaluation, "reds-tannin").weight, 10.0);
        assert!(evaluation.failed_checks().any(|c| c.id == "reds-body"));
    }

    #[test]
    fn test_non_positive_weight_rejected() {
        let mut config = EvaluatorConfig::default();
        config.weights.balance_nonflat = -1.0;
        let err = ConsistencyEvaluator::with_config(config).unwrap_err();
        assert!(err.field.contains("balance_nonflat"), "field was {}", err.field);

        let mut config = EvaluatorConfig::default();
        config.weights.ctx_aperitif = 0.0;
        assert!(ConsistencyEvaluator::with_config(config).is_err());
    }

    #[test]
    fn test_flat_profile_scores_zero_with_custom_config() {
        let mut config = EvaluatorConfig::default();
        config.weights.balance_nonflat = 3.0;
        let evaluator = ConsistencyEvaluator::with_config(config).unwrap();
        let profile = UserProfileInput::neutral("u-flat", ExperienceTier::Novice);

        let evaluation = evaluator.evaluate(&profile, None, None);
        assert_eq!(find(&evaluation, "balance-nonflat").weight, 3.0);
        assert_eq!(evaluation.confidence, 0.0);
    }

    const VOCABULARY: &[&str] = &[
        "cabernet", "sancerre", "buttery", "prosecco", "too acidic", "too oaky", "steak",
        "pizza", "birthday", "brunch", "moscato", "", "I like wine",
    ];

    prop_compose! {
        fn arb_profile()(
            core in prop::array::uniform5(0.0f64..=1.0),
            warmth in 0.0f64..=1.0,
            sparkle in prop::option::of(0.0f64..=1.0),
            levers in prop::array::uniform5(0.0f64..=1.0),
            red in prop::option::of(prop::array::uniform4(prop::option::of(0.0f64..=1.0))),
            bubbles in prop::option::of(0.0f64..=1.0),
        ) -> UserProfileInput {
            let mut p = UserProfileInput::neutral("u-prop", ExperienceTier::Novice);
            p.stable_palate.sweetness = core[0];
            p.stable_palate.acidity = core[1];
            p.stable_palate.tannin = core[2];
            p.stable_palate.bitterness = core[3];
            p.stable_palate.body = core[4];
            p.stable_palate.alcohol_warmth = warmth;
            p.stable_palate.sparkle_intensity = sparkle;
            p.style_levers.oak = levers[0];
            p.style_levers.malolactic_butter = levers[1];
            p.style_levers.oxidative = levers[2];
            p.style_levers.minerality = levers[3];
            p.style_levers.fruit_ripeness = levers[4];
            p.flavor_maps.red = red.map(|f| FlavorMapCategory {
                tannin: f[0],
                acidity: f[1],
                body: f[2],
                oak: f[3],
                ..Default::default()
            });
            p.flavor_maps.sparkling = bubbles.map(|b| FlavorMapCategory {
                bubble_intensity: Some(b),
                ..Default::default()
            });
            p
        }
    }

    proptest! {
        #[test]
        fn prop_confidence_in_unit_range(
            profile in arb_profile(),
            words in prop::collection::vec(prop::sample::select(VOCABULARY), 0..6),
            noise in "[ -~]{0,40}",
        ) {
            let mut answers = Answers::new();
            answers.insert("a".to_string(), words.join(" "));
            answers.insert("b".to_string(), noise);

            let evaluation = ConsistencyEvaluator::new().evaluate(&profile, Some(&answers), None);
            prop_assert!((0.0..=1.0).contains(&evaluation.confidence));
            prop_assert!(!evaluation.checks.is_empty());
            prop_assert!(evaluation.checks.iter().all(|c| c.weight > 0.0));
        }
    }
}
