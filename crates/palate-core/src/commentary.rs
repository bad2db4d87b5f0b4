//! Templated commentary for a scored profile.
//!
//! Three clauses, each chosen from fixed wording: red structure, whites,
//! and a pairing tip. Output depends only on the profile and the signals.

use std::fmt;

use crate::profile::UserProfileInput;
use crate::signals::{Signal, SignalSet};

/// Qualitative band for a unit scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    High,
    Moderate,
    Medium,
    Low,
}

impl Bucket {
    pub fn of(value: f64) -> Self {
        if value >= 0.75 {
            Bucket::High
        } else if value >= 0.55 {
            Bucket::Moderate
        } else if value >= 0.35 {
            Bucket::Medium
        } else {
            Bucket::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::High => "high",
            Bucket::Moderate => "moderate",
            Bucket::Medium => "medium",
            Bucket::Low => "low",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the commentary paragraph.
pub fn compose(profile: &UserProfileInput, signals: &SignalSet) -> String {
    [
        red_clause(profile),
        white_clause(profile, signals),
        pairing_tip(signals),
    ]
    .join(" ")
}

fn red_clause(profile: &UserProfileInput) -> String {
    let palate = &profile.stable_palate;
    let structure = Bucket::of((palate.tannin + palate.body) / 2.0);
    let oak = Bucket::of(profile.style_levers.oak);

    let shape = match structure {
        Bucket::High => "firm, full-bodied",
        Bucket::Moderate => "structured but not heavy",
        Bucket::Medium => "medium-weight",
        Bucket::Low => "light, gentle",
    };

    format!(
        "For reds you lean toward {} wines ({} structure) with {} oak.",
        shape, structure, oak
    )
}

fn white_clause(profile: &UserProfileInput, signals: &SignalSet) -> String {
    let acidity = Bucket::of(profile.stable_palate.acidity);
    let sweetness = Bucket::of(profile.stable_palate.sweetness);

    if signals.fires(Signal::MineralWhites) {
        format!(
            "In whites you reach for crisp, mineral styles: {} acidity and {} sweetness.",
            acidity, sweetness
        )
    } else {
        format!(
            "In whites your profile points to {} acidity and {} sweetness.",
            acidity, sweetness
        )
    }
}

fn pairing_tip(signals: &SignalSet) -> String {
    if signals.fires(Signal::SteakOccasion) {
        "Pairing tip: with grilled red meat, pick a tannic red so the fat softens the grip."
            .to_string()
    } else {
        "Pairing tip: match the wine's weight to the dish, lighter food with lighter wine."
            .to_string()
    }
}
