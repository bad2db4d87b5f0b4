//! Occasion checks: occasions named in the text should show up in the
//! profile's context weights.

use crate::config::CheckWeights;
use crate::profile::Occasion;
use crate::signals::Signal;

use super::{Check, CheckGroup, EvaluationContext};

/// One occasion rule: a signal and the occasion codes that satisfy it.
struct OccasionRule {
    id: &'static str,
    signal: Signal,
    accepted: &'static [Occasion],
    weight: fn(&CheckWeights) -> f64,
}

const OCCASION_RULES: [OccasionRule; 4] = [
    OccasionRule {
        id: "ctx-steak",
        signal: Signal::SteakOccasion,
        accepted: &[Occasion::SteakNight],
        weight: |w| w.ctx_steak,
    },
    OccasionRule {
        id: "ctx-pizza",
        signal: Signal::PizzaOccasion,
        accepted: &[Occasion::PizzaBurger, Occasion::Weeknight],
        weight: |w| w.ctx_pizza,
    },
    OccasionRule {
        id: "ctx-celebration",
        signal: Signal::CelebrationOccasion,
        accepted: &[Occasion::Celebration, Occasion::DateNight],
        weight: |w| w.ctx_celebration,
    },
    OccasionRule {
        id: "ctx-aperitif",
        signal: Signal::BrunchOccasion,
        accepted: &[Occasion::Brunch, Occasion::Aperitif],
        weight: |w| w.ctx_aperitif,
    },
];

pub struct OccasionChecks;

impl OccasionChecks {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OccasionChecks {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckGroup for OccasionChecks {
    fn name(&self) -> &'static str {
        "occasion"
    }

    fn run(&self, ctx: &EvaluationContext<'_>) -> Vec<Check> {
        let present: Vec<&str> = ctx
            .profile
            .context_weights
            .iter()
            .map(|entry| entry.occasion.as_str())
            .collect();

        OCCASION_RULES
            .iter()
            .filter_map(|rule| {
                let hit = ctx.signals.hit(rule.signal)?;
                let passed = ctx.profile.has_any_occasion(rule.accepted);
                let accepted = rule
                    .accepted
                    .iter()
                    .map(Occasion::as_str)
                    .collect::<Vec<_>>()
                    .join(" | ");

                let message = if passed {
                    format!("Context weights cover the '{}' occasion", hit.token)
                } else {
                    format!(
                        "'{}' was mentioned but no matching occasion is weighted",
                        hit.token
                    )
                };

                Some(Check {
                    id: rule.id.to_string(),
                    passed,
                    expected: format!("contextWeights contains {}", accepted),
                    actual: if present.is_empty() {
                        "none".to_string()
                    } else {
                        present.join(", ")
                    },
                    weight: (rule.weight)(&ctx.config.weights),
                    message,
                })
            })
            .collect()
    }
}
