//! Taste checks: do the palate and style scalars reflect what the user said
//! they drink?

use crate::profile::{Axis, UserProfileInput};
use crate::signals::Signal;

use super::{axis_check, Check, CheckGroup, Condition, EvaluationContext, EPSILON};

/// Checks driven by taste signals, plus the flat-profile guard.
pub struct TasteChecks;

impl TasteChecks {
    pub fn new() -> Self {
        Self
    }

    /// Population variance of the five core palate scalars.
    pub fn core_variance(profile: &UserProfileInput) -> f64 {
        let values = profile.stable_palate.core_scalars();
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
    }

    fn balance_check(&self, ctx: &EvaluationContext<'_>) -> Check {
        let threshold = ctx.config.nonflat_variance_min;
        let variance = Self::core_variance(ctx.profile);
        let passed = variance > threshold + EPSILON;

        let message = if passed {
            "Core palate scalars are differentiated".to_string()
        } else {
            "Core palate scalars cluster around one value; the profile may be an unexamined default"
                .to_string()
        };

        Check {
            id: "balance-nonflat".to_string(),
            passed,
            expected: format!("variance(core palate) > {:.4}", threshold),
            actual: format!("{:.4}", variance),
            weight: ctx.config.weights.balance_nonflat,
            message,
        }
    }
}

impl Default for TasteChecks {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckGroup for TasteChecks {
    fn name(&self) -> &'static str {
        "taste"
    }

    fn run(&self, ctx: &EvaluationContext<'_>) -> Vec<Check> {
        let profile = ctx.profile;
        let weights = &ctx.config.weights;
        let mut checks = Vec::new();

        if let Some(hit) = ctx.signals.hit(Signal::StructuredReds) {
            checks.push(axis_check(
                "reds-tannin",
                Axis::Tannin,
                Condition::AtLeast(0.70),
                weights.reds_tannin,
                profile,
                hit,
            ));
            checks.push(axis_check(
                "reds-body",
                Axis::Body,
                Condition::AtLeast(0.70),
                weights.reds_body,
                profile,
                hit,
            ));
            checks.push(axis_check(
                "reds-oak",
                Axis::Oak,
                Condition::Between(0.55, 0.75),
                weights.reds_oak,
                profile,
                hit,
            ));
        }

        if let Some(hit) = ctx.signals.hit(Signal::MineralWhites) {
            checks.push(axis_check(
                "whites-minerality",
                Axis::Minerality,
                Condition::AtLeast(0.60),
                weights.whites_minerality,
                profile,
                hit,
            ));
            checks.push(axis_check(
                "whites-acidity",
                Axis::Acidity,
                Condition::AtLeast(0.55),
                weights.whites_acidity,
                profile,
                hit,
            ));
        }

        if let Some(hit) = ctx.signals.hit(Signal::ButteryWhites) {
            checks.push(axis_check(
                "buttery-malolactic",
                Axis::MalolacticButter,
                Condition::AtLeast(0.55),
                weights.buttery_malolactic,
                profile,
                hit,
            ));
        }

        if let Some(hit) = ctx.signals.hit(Signal::SparklingFan) {
            checks.push(axis_check(
                "sparkling-intensity",
                Axis::SparkleIntensity,
                Condition::AtLeast(0.55),
                weights.sparkling_intensity,
                profile,
                hit,
            ));
        }

        if let Some(hit) = ctx.signals.hit(Signal::DislikesOak) {
            checks.push(axis_check(
                "oak-aversion",
                Axis::Oak,
                Condition::AtMost(0.40),
                weights.oak_aversion,
                profile,
                hit,
            ));
        }

        // The acidity aversion check replaces the general balance guard
        match ctx.signals.hit(Signal::DislikesHighAcidity) {
            Some(hit) => checks.push(axis_check(
                "acid-tolerance",
                Axis::Acidity,
                Condition::AtMost(0.65),
                weights.acid_tolerance,
                profile,
                hit,
            )),
            None => checks.push(self.balance_check(ctx)),
        }

        checks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvaluatorConfig;
    use crate::profile::ExperienceTier;
    use crate::signals::{NormalizedText, SignalSet};

    fn run(profile: &UserProfileInput, text: &str) -> Vec<Check> {
        let config = EvaluatorConfig::default();
        let signals = SignalSet::detect(&NormalizedText::new(text));
        let ctx = EvaluationContext {
            profile,
            signals: &signals,
            config: &config,
        };
        TasteChecks::new().run(&ctx)
    }

    fn find<'a>(checks: &'a [Check], id: &str) -> &'a Check {
        checks
            .iter()
            .find(|c| c.id == id)
            .unwrap_or_else(|| panic!("missing check {}", id))
    }

    fn bold_red_profile() -> UserProfileInput {
        let mut profile = UserProfileInput::neutral("u-1", ExperienceTier::Expert);
        profile.stable_palate.tannin = 0.85;
        profile.stable_palate.body = 0.82;
        profile.stable_palate.sweetness = 0.2;
        profile.style_levers.oak = 0.6;
        profile
    }

    #[test]
    fn test_structured_reds_checks_pass() {
        let checks = run(&bold_red_profile(), "napa cabernet");
        assert!(find(&checks, "reds-tannin").passed);
        assert!(find(&checks, "reds-body").passed);
        assert!(find(&checks, "reds-oak").passed);
        assert_eq!(find(&checks, "reds-tannin").weight, 2.0);
    }

    #[test]
    fn test_structured_reds_checks_fail_on_light_profile() {
        let mut profile = bold_red_profile();
        profile.stable_palate.tannin = 0.2;
        profile.stable_palate.body = 0.3;

        let checks = run(&profile, "napa cabernet");
        assert!(!find(&checks, "reds-tannin").passed);
        assert!(!find(&checks, "reds-body").passed);
    }

    #[test]
    fn test_acid_aversion_replaces_balance_check() {
        let mut profile = bold_red_profile();
        profile.stable_palate.acidity = 0.8;

        let checks = run(&profile, "whites are too acidic");
        assert!(!find(&checks, "acid-tolerance").passed);
        assert!(checks.iter().all(|c| c.id != "balance-nonflat"));
    }

    #[test]
    fn test_balance_check_flags_flat_profile() {
        let profile = UserProfileInput::neutral("u-1", ExperienceTier::Novice);
        let checks = run(&profile, "");
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].id, "balance-nonflat");
        assert!(!checks[0].passed);
        assert_eq!(checks[0].actual, "0.0000");
    }

    #[test]
    fn test_balance_check_passes_differentiated_profile() {
        let checks = run(&bold_red_profile(), "");
        assert!(find(&checks, "balance-nonflat").passed);
    }

    #[test]
    fn test_core_variance() {
        let mut profile = UserProfileInput::neutral("u-1", ExperienceTier::Novice);
        profile.stable_palate.sweetness = 0.0;
        profile.stable_palate.acidity = 1.0;
        // values 0, 1, .5, .5, .5 -> mean .5, variance (0.25 + 0.25) / 5
        assert!((TasteChecks::core_variance(&profile) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_mineral_and_buttery_whites() {
        let mut profile = UserProfileInput::neutral("u-1", ExperienceTier::Intermediate);
        profile.style_levers.minerality = 0.8;
        profile.stable_palate.acidity = 0.7;

        let checks = run(&profile, "sancerre and buttery chardonnay");
        assert!(find(&checks, "whites-minerality").passed);
        assert!(find(&checks, "whites-acidity").passed);
        assert!(!find(&checks, "buttery-malolactic").passed);
    }

    #[test]
    fn test_oak_aversion_and_sparkling() {
        let profile = UserProfileInput::neutral("u-1", ExperienceTier::Novice);
        let checks = run(&profile, "champagne, never anything too oaky");
        assert!(find(&checks, "oak-aversion").passed);
        assert!(!find(&checks, "sparkling-intensity").passed);
    }
}
