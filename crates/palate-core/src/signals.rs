//! Taste and occasion signal detectors.
//!
//! Each detector is a named predicate over the normalized onboarding text:
//! it fires when the text contains any token from a fixed set tied to one
//! taste concept or drinking occasion. Detectors know nothing about the
//! profile; checks decide what a firing signal implies.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::profile::Answers;

lazy_static! {
    // =========================================================================
    // TASTE SIGNALS
    // =========================================================================

    /// Structured, tannic red varietals and regions
    static ref STRUCTURED_REDS: Regex = Regex::new(
        r"\b(cabernet|cab sauv|bordeaux|pauillac|margaux|merlot|syrah|shiraz|hermitage|c[oô]te[- ]r[oô]tie|cornas|crozes|saint[- ]joseph|northern rh[oô]ne|malbec|nebbiolo|barolo|tannat)"
    ).unwrap();

    /// Crisp, mineral or balanced whites
    static ref MINERAL_WHITES: Regex = Regex::new(
        r"\b(sancerre|pouilly[- ]fum[eé]|pinot gris|pinot grigio|sauvignon blanc|chablis|albari[nñ]o|gr[uü]ner|muscadet|assyrtiko|mineral)"
    ).unwrap();

    /// Rich, buttery, oak-aged whites
    static ref BUTTERY_WHITES: Regex = Regex::new(
        r"\b(buttery|butter|creamy chardonnay|oaky chardonnay|oaked chardonnay|california chardonnay|malolactic)"
    ).unwrap();

    /// Sparkling wine enthusiasm
    static ref SPARKLING_FAN: Regex = Regex::new(
        r"\b(champagne|prosecco|cava|cr[eé]mant|franciacorta|sparkling|bubbly|bubbles|pet[- ]nat)"
    ).unwrap();

    /// Explicit aversion to high acidity
    static ref DISLIKES_HIGH_ACIDITY: Regex = Regex::new(
        r"\b(too (acidic|sour|tart|sharp)|(hate|dislike|don't like|do not like|can't stand|avoid)\s+(\w+\s+)?(acidic|acidity|sour|tart|high[- ]acid)|heartburn|acid reflux|not a fan of (acid|sour|tart))"
    ).unwrap();

    /// Explicit aversion to oak
    static ref DISLIKES_OAK: Regex = Regex::new(
        r"\b(too oaky|(hate|dislike|don't like|do not like|can't stand|avoid)\s+(\w+\s+)?(oak|oaky|oaked)|unoaked)"
    ).unwrap();

    // =========================================================================
    // OCCASION SIGNALS
    // =========================================================================

    static ref STEAK_OCCASION: Regex = Regex::new(
        r"\b(steaks?|grill|grilled|grilling|bbq|barbecue|ribeye|brisket|lamb chops?)"
    ).unwrap();

    static ref PIZZA_OCCASION: Regex = Regex::new(
        r"\b(pizza|burgers?|tacos?|wings)\b"
    ).unwrap();

    static ref CELEBRATION_OCCASION: Regex = Regex::new(
        r"\b(celebrat\w*|anniversar\w*|birthday|date night|special occasion|wedding|new year)"
    ).unwrap();

    static ref BRUNCH_OCCASION: Regex = Regex::new(
        r"\b(brunch|picnic|patio|lunch|ap[eé]ritif|aperitivo|light bites)"
    ).unwrap();
}

/// A named taste or occasion signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    StructuredReds,
    MineralWhites,
    ButteryWhites,
    SparklingFan,
    DislikesHighAcidity,
    DislikesOak,
    SteakOccasion,
    PizzaOccasion,
    CelebrationOccasion,
    BrunchOccasion,
}

impl Signal {
    pub const ALL: [Signal; 10] = [
        Signal::StructuredReds,
        Signal::MineralWhites,
        Signal::ButteryWhites,
        Signal::SparklingFan,
        Signal::DislikesHighAcidity,
        Signal::DislikesOak,
        Signal::SteakOccasion,
        Signal::PizzaOccasion,
        Signal::CelebrationOccasion,
        Signal::BrunchOccasion,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Signal::StructuredReds => "structured_reds",
            Signal::MineralWhites => "mineral_whites",
            Signal::ButteryWhites => "buttery_whites",
            Signal::SparklingFan => "sparkling_fan",
            Signal::DislikesHighAcidity => "dislikes_high_acidity",
            Signal::DislikesOak => "dislikes_oak",
            Signal::SteakOccasion => "steak_occasion",
            Signal::PizzaOccasion => "pizza_occasion",
            Signal::CelebrationOccasion => "celebration_occasion",
            Signal::BrunchOccasion => "brunch_occasion",
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            Signal::StructuredReds => &STRUCTURED_REDS,
            Signal::MineralWhites => &MINERAL_WHITES,
            Signal::ButteryWhites => &BUTTERY_WHITES,
            Signal::SparklingFan => &SPARKLING_FAN,
            Signal::DislikesHighAcidity => &DISLIKES_HIGH_ACIDITY,
            Signal::DislikesOak => &DISLIKES_OAK,
            Signal::SteakOccasion => &STEAK_OCCASION,
            Signal::PizzaOccasion => &PIZZA_OCCASION,
            Signal::CelebrationOccasion => &CELEBRATION_OCCASION,
            Signal::BrunchOccasion => &BRUNCH_OCCASION,
        }
    }

    /// Test the signal against normalized text, returning the first match.
    pub fn detect(&self, text: &NormalizedText) -> Option<SignalHit> {
        self.pattern().find(text.as_str()).map(|m| SignalHit {
            signal: *self,
            token: m.as_str().to_string(),
            start: m.start(),
            end: m.end(),
        })
    }
}

/// Where a signal fired in the normalized text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalHit {
    pub signal: Signal,

    /// The matched token
    pub token: String,

    /// Byte range of the token in the normalized text
    pub start: usize,
    pub end: usize,
}

/// All answer values joined into one lower-cased string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedText(String);

impl NormalizedText {
    pub fn new(text: &str) -> Self {
        Self(text.to_lowercase())
    }

    /// Join answer values in key order.
    pub fn from_answers(answers: Option<&Answers>) -> Self {
        let joined = answers
            .map(|a| a.values().map(String::as_str).collect::<Vec<_>>().join(" "))
            .unwrap_or_default();
        Self::new(&joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// The signals that fired for one piece of text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalSet {
    hits: BTreeMap<Signal, SignalHit>,
}

impl SignalSet {
    /// Run every detector over the text.
    pub fn detect(text: &NormalizedText) -> Self {
        let hits = Signal::ALL
            .iter()
            .filter_map(|signal| signal.detect(text).map(|hit| (*signal, hit)))
            .collect();
        Self { hits }
    }

    /// Check whether a signal fired.
    pub fn fires(&self, signal: Signal) -> bool {
        self.hits.contains_key(&signal)
    }

    pub fn hit(&self, signal: Signal) -> Option<&SignalHit> {
        self.hits.get(&signal)
    }

    /// Fired signals in declaration order.
    pub fn fired(&self) -> impl Iterator<Item = Signal> + '_ {
        self.hits.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fires(signal: Signal, text: &str) -> bool {
        signal.detect(&NormalizedText::new(text)).is_some()
    }

    #[test]
    fn test_structured_reds_detection() {
        assert!(fires(Signal::StructuredReds, "I love Napa Cabernet"));
        assert!(fires(Signal::StructuredReds, "Northern Rhône Syrah with steak"));
        assert!(fires(Signal::StructuredReds, "a big Aussie shiraz"));
        assert!(fires(Signal::StructuredReds, "Côte-Rôtie when I can afford it"));
        assert!(!fires(Signal::StructuredReds, "light pinot noir and gamay"));
    }

    #[test]
    fn test_mineral_whites_detection() {
        assert!(fires(Signal::MineralWhites, "Sancerre on the patio"));
        assert!(fires(Signal::MineralWhites, "pinot gris, sauvignon blanc"));
        assert!(fires(Signal::MineralWhites, "Albariño with oysters"));
        assert!(!fires(Signal::MineralWhites, "moscato is my jam"));
    }

    #[test]
    fn test_acidity_aversion_detection() {
        assert!(fires(Signal::DislikesHighAcidity, "Most whites are too acidic for me"));
        assert!(fires(Signal::DislikesHighAcidity, "I hate sour wine"));
        assert!(fires(Signal::DislikesHighAcidity, "I avoid really acidic stuff"));
        assert!(fires(Signal::DislikesHighAcidity, "white wine gives me heartburn"));
        assert!(!fires(Signal::DislikesHighAcidity, "I like bright acidity"));
    }

    #[test]
    fn test_oak_aversion_detection() {
        assert!(fires(Signal::DislikesOak, "too oaky for me"));
        assert!(fires(Signal::DislikesOak, "I prefer unoaked chardonnay"));
        assert!(!fires(Signal::DislikesOak, "I love oak"));
    }

    #[test]
    fn test_occasion_detection() {
        assert!(fires(Signal::SteakOccasion, "grilled ribeye on fridays"));
        assert!(fires(Signal::PizzaOccasion, "pizza and burgers"));
        assert!(!fires(Signal::PizzaOccasion, "pizzazz"));
        assert!(fires(Signal::CelebrationOccasion, "our anniversary dinner"));
        assert!(fires(Signal::CelebrationOccasion, "Date night"));
        assert!(fires(Signal::BrunchOccasion, "Sunday brunch"));
        assert!(fires(Signal::BrunchOccasion, "an apéritif before dinner"));
    }

    #[test]
    fn test_hit_reports_token_and_span() {
        let text = NormalizedText::new("We drink Merlot.");
        let hit = Signal::StructuredReds.detect(&text).unwrap();
        assert_eq!(hit.token, "merlot");
        assert_eq!(&text.as_str()[hit.start..hit.end], "merlot");
    }

    #[test]
    fn test_normalization_joins_answers_in_key_order() {
        let mut answers = Answers::new();
        answers.insert("b_dislikes".to_string(), "Too SOUR".to_string());
        answers.insert("a_enjoyed".to_string(), "Syrah".to_string());

        let text = NormalizedText::from_answers(Some(&answers));
        assert_eq!(text.as_str(), "syrah too sour");
    }

    #[test]
    fn test_missing_answers_fire_nothing() {
        let text = NormalizedText::from_answers(None);
        assert!(text.is_blank());
        assert!(SignalSet::detect(&text).is_empty());
    }

    #[test]
    fn test_signal_set_collects_all_hits() {
        let text = NormalizedText::new("cabernet with steak for a birthday");
        let set = SignalSet::detect(&text);
        assert!(set.fires(Signal::StructuredReds));
        assert!(set.fires(Signal::SteakOccasion));
        assert!(set.fires(Signal::CelebrationOccasion));
        assert!(!set.fires(Signal::MineralWhites));
        assert_eq!(set.fired().count(), 3);
    }
}
