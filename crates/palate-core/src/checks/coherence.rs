//! Coherence checks: per-category flavor maps must not contradict the
//! category-independent baseline.

use crate::config::CheckWeights;
use crate::profile::{Axis, FlavorMapCategory, WineCategory};

use super::{Check, CheckGroup, EvaluationContext, EPSILON};

/// A flavor-map field mirrored by a top-level axis.
struct MirroredField {
    field: &'static str,
    axis: Axis,
    read: fn(&FlavorMapCategory) -> Option<f64>,
    weight: fn(&CheckWeights) -> f64,
}

const MIRRORED_FIELDS: [MirroredField; 4] = [
    MirroredField {
        field: "tannin",
        axis: Axis::Tannin,
        read: |m| m.tannin,
        weight: |w| w.coherence_tannin,
    },
    MirroredField {
        field: "body",
        axis: Axis::Body,
        read: |m| m.body,
        weight: |w| w.coherence_body,
    },
    MirroredField {
        field: "acidity",
        axis: Axis::Acidity,
        read: |m| m.acidity,
        weight: |w| w.coherence_acidity,
    },
    MirroredField {
        field: "oak",
        axis: Axis::Oak,
        read: |m| m.oak,
        weight: |w| w.coherence_oak,
    },
];

pub struct CoherenceChecks;

impl CoherenceChecks {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CoherenceChecks {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckGroup for CoherenceChecks {
    fn name(&self) -> &'static str {
        "coherence"
    }

    fn run(&self, ctx: &EvaluationContext<'_>) -> Vec<Check> {
        let tolerance = ctx.config.coherence_tolerance;
        let mut checks = Vec::new();

        for (category, map) in ctx.profile.flavor_maps.populated() {
            for mirrored in &MIRRORED_FIELDS {
                checks.push(compare(
                    format!("coherence-{}-{}", category.as_str(), mirrored.field),
                    &format!("flavorMaps.{}.{}", category.as_str(), mirrored.field),
                    (mirrored.read)(map),
                    mirrored.axis.name(),
                    mirrored.axis.value_in(ctx.profile),
                    tolerance,
                    (mirrored.weight)(&ctx.config.weights),
                ));
            }

            if category == WineCategory::Sparkling {
                checks.push(compare(
                    "coherence-sparkling-bubbles".to_string(),
                    "flavorMaps.sparkling.bubbleIntensity",
                    map.bubble_intensity,
                    Axis::SparkleIntensity.name(),
                    Axis::SparkleIntensity.value_in(ctx.profile),
                    tolerance,
                    ctx.config.weights.coherence_bubbles,
                ));
            }
        }

        checks
    }
}

/// Compare a flavor-map value against its baseline.
///
/// Nothing to contradict when either side is absent, so the check passes.
fn compare(
    id: String,
    subject: &str,
    value: Option<f64>,
    baseline_name: &str,
    baseline: Option<f64>,
    tolerance: f64,
    weight: f64,
) -> Check {
    let expected = format!("|{} - {}| <= {:.2}", subject, baseline_name, tolerance);

    let (passed, actual, message) = match (value, baseline) {
        (Some(v), Some(b)) => {
            let gap = (v - b).abs();
            let passed = gap <= tolerance + EPSILON;
            let message = if passed {
                format!("{} {:.2} agrees with {} {:.2}", subject, v, baseline_name, b)
            } else {
                format!(
                    "{} {:.2} contradicts {} {:.2} (gap {:.2})",
                    subject, v, baseline_name, b, gap
                )
            };
            (passed, format!("{:.2}", gap), message)
        }
        _ => (
            true,
            "absent".to_string(),
            format!("{} has no counterpart to compare", subject),
        ),
    };

    Check {
        id,
        passed,
        expected,
        actual,
        weight,
        message,
    }
}
