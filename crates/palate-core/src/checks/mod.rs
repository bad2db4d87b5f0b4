//! Weighted consistency checks.
//!
//! A check is a single pass/fail comparison between a condition implied by
//! the onboarding text (or by the profile's own structure) and a profile
//! value. Failed checks are data, not errors.
//!
//! Checks are grouped by the evidence they weigh:
//! - [`TasteChecks`]: taste signals against palate and style scalars
//! - [`OccasionChecks`]: occasion signals against context weights
//! - [`CoherenceChecks`]: flavor maps against their top-level counterparts

mod coherence;
mod occasion;
mod taste;

pub use coherence::CoherenceChecks;
pub use occasion::OccasionChecks;
pub use taste::TasteChecks;

use serde::{Deserialize, Serialize};

use crate::config::EvaluatorConfig;
use crate::profile::{Axis, UserProfileInput};
use crate::signals::{SignalHit, SignalSet};

/// Slack allowed on every numeric comparison.
pub(crate) const EPSILON: f64 = 1e-9;

/// Outcome of one weighted check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    /// Stable identifier (e.g., "reds-tannin")
    pub id: String,

    pub passed: bool,

    /// The condition that was tested
    pub expected: String,

    /// What the profile actually holds
    pub actual: String,

    /// Contribution to the confidence denominator (always > 0)
    pub weight: f64,

    /// Human-readable explanation
    pub message: String,
}

/// A numeric condition on a single value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Condition {
    AtLeast(f64),
    AtMost(f64),
    Between(f64, f64),
}

impl Condition {
    pub fn holds(&self, value: f64) -> bool {
        match *self {
            Condition::AtLeast(min) => value >= min - EPSILON,
            Condition::AtMost(max) => value <= max + EPSILON,
            Condition::Between(min, max) => value >= min - EPSILON && value <= max + EPSILON,
        }
    }

    pub fn describe(&self, subject: &str) -> String {
        match *self {
            Condition::AtLeast(min) => format!("{} >= {:.2}", subject, min),
            Condition::AtMost(max) => format!("{} <= {:.2}", subject, max),
            Condition::Between(min, max) => format!("{:.2} <= {} <= {:.2}", min, subject, max),
        }
    }
}

/// Everything a check group may look at.
pub struct EvaluationContext<'a> {
    pub profile: &'a UserProfileInput,
    pub signals: &'a SignalSet,
    pub config: &'a EvaluatorConfig,
}

/// A family of checks evaluated together.
///
/// Groups are independent: none reads another's output, and each returns
/// its checks in a fixed order.
pub trait CheckGroup {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    fn run(&self, ctx: &EvaluationContext<'_>) -> Vec<Check>;
}

/// Compare one top-level axis against a condition implied by a signal.
///
/// An absent axis value fails: the text implies a value the profile does
/// not carry.
pub(crate) fn axis_check(
    id: &str,
    axis: Axis,
    condition: Condition,
    weight: f64,
    profile: &UserProfileInput,
    evidence: &SignalHit,
) -> Check {
    let value = axis.value_in(profile);
    let passed = value.map_or(false, |v| condition.holds(v));
    let actual = value.map_or_else(|| "absent".to_string(), |v| format!("{:.2}", v));

    let message = if passed {
        format!(
            "{} {} is consistent with the mention of '{}'",
            axis.name(),
            actual,
            evidence.token
        )
    } else {
        format!(
            "{} {} does not match the mention of '{}' (expected {})",
            axis.name(),
            actual,
            evidence.token,
            condition.describe(axis.name())
        )
    };

    Check {
        id: id.to_string(),
        passed,
        expected: condition.describe(axis.name()),
        actual,
        weight,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ExperienceTier;
    use crate::signals::Signal;

    fn hit(token: &str) -> SignalHit {
        SignalHit {
            signal: Signal::StructuredReds,
            token: token.to_string(),
            start: 0,
            end: token.len(),
        }
    }

    #[test]
    fn test_condition_bounds_are_inclusive() {
        assert!(Condition::AtLeast(0.7).holds(0.7));
        assert!(!Condition::AtLeast(0.7).holds(0.69));
        assert!(Condition::AtMost(0.65).holds(0.65));
        assert!(Condition::Between(0.55, 0.75).holds(0.55));
        assert!(Condition::Between(0.55, 0.75).holds(0.75));
        assert!(!Condition::Between(0.55, 0.75).holds(0.76));
    }

    #[test]
    fn test_condition_description() {
        assert_eq!(Condition::AtLeast(0.7).describe("tannin"), "tannin >= 0.70");
        assert_eq!(
            Condition::Between(0.55, 0.75).describe("oak"),
            "0.55 <= oak <= 0.75"
        );
    }

    #[test]
    fn test_axis_check_pass_and_fail() {
        let profile = UserProfileInput::neutral("u-1", ExperienceTier::Novice);

        let check = axis_check(
            "reds-tannin",
            Axis::Tannin,
            Condition::AtLeast(0.7),
            2.0,
            &profile,
            &hit("cabernet"),
        );
        assert!(!check.passed);
        assert_eq!(check.actual, "0.50");
        assert!(check.message.contains("cabernet"));

        let check = axis_check(
            "oak-aversion",
            Axis::Oak,
            Condition::AtMost(0.4),
            1.2,
            &profile,
            &hit("too oaky"),
        );
        assert!(check.passed);
        assert_eq!(check.weight, 1.2);
    }

    #[test]
    fn test_absent_axis_fails() {
        let mut profile = UserProfileInput::neutral("u-1", ExperienceTier::Novice);
        profile.stable_palate.sparkle_intensity = None;

        let check = axis_check(
            "sparkling-intensity",
            Axis::SparkleIntensity,
            Condition::AtLeast(0.55),
            1.0,
            &profile,
            &hit("champagne"),
        );
        assert!(!check.passed);
        assert_eq!(check.actual, "absent");
    }
}
