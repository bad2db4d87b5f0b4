//! Typed palate profile aggregate.
//!
//! Field names serialize to the camelCase wire names used by the JSON Schema
//! and by downstream persistence. All types are plain values: a new mapping
//! run produces a new `UserProfileInput` that replaces the previous one.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::schema::SchemaViolation;

/// Free-text onboarding answers keyed by question identifier.
///
/// A `BTreeMap` keeps iteration order stable, which keeps text normalization
/// and prompt serialization deterministic.
pub type Answers = BTreeMap<String, String>;

/// Declared wine-knowledge tier of the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceTier {
    Novice,
    Intermediate,
    Expert,
}

impl ExperienceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceTier::Novice => "novice",
            ExperienceTier::Intermediate => "intermediate",
            ExperienceTier::Expert => "expert",
        }
    }
}

impl fmt::Display for ExperienceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExperienceTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "novice" => Ok(ExperienceTier::Novice),
            "intermediate" => Ok(ExperienceTier::Intermediate),
            "expert" => Ok(ExperienceTier::Expert),
            other => Err(format!(
                "unknown experience tier '{}': expected novice, intermediate or expert",
                other
            )),
        }
    }
}

/// Long-lived, category-independent taste baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StablePalate {
    pub sweetness: f64,
    pub acidity: f64,
    pub tannin: f64,
    pub bitterness: f64,
    pub body: f64,
    pub alcohol_warmth: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sparkle_intensity: Option<f64>,
}

impl StablePalate {
    /// The five core scalars used by the flat-profile check.
    pub fn core_scalars(&self) -> [f64; 5] {
        [
            self.sweetness,
            self.acidity,
            self.tannin,
            self.bitterness,
            self.body,
        ]
    }
}

/// Winemaking-style sensitivities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StyleLevers {
    pub oak: f64,
    pub malolactic_butter: f64,
    pub oxidative: f64,
    pub minerality: f64,
    pub fruit_ripeness: f64,
}

/// Aroma families a user can be drawn to or put off by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AromaFamily {
    RedFruit,
    BlackFruit,
    Citrus,
    StoneFruit,
    Tropical,
    Floral,
    Herbal,
    PepperSpice,
    EarthMineral,
    OakVanilla,
    SavoryUmami,
    NuttyOxidative,
}

/// Affinity for one aroma family, in [-1, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AromaAffinity {
    pub family: AromaFamily,
    pub affinity: f64,
}

/// Situations that shift what the user wants in the glass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occasion {
    Weeknight,
    SteakNight,
    PizzaBurger,
    Seafood,
    SpicyFood,
    Celebration,
    DateNight,
    Brunch,
    Aperitif,
    CheeseBoard,
}

impl Occasion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Occasion::Weeknight => "weeknight",
            Occasion::SteakNight => "steak_night",
            Occasion::PizzaBurger => "pizza_burger",
            Occasion::Seafood => "seafood",
            Occasion::SpicyFood => "spicy_food",
            Occasion::Celebration => "celebration",
            Occasion::DateNight => "date_night",
            Occasion::Brunch => "brunch",
            Occasion::Aperitif => "aperitif",
            Occasion::CheeseBoard => "cheese_board",
        }
    }
}

/// A palate or style scalar, addressable by its wire name.
///
/// Used as the key of context weight overrides and to read profile values
/// generically in checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Axis {
    Sweetness,
    Acidity,
    Tannin,
    Bitterness,
    Body,
    AlcoholWarmth,
    SparkleIntensity,
    Oak,
    MalolacticButter,
    Oxidative,
    Minerality,
    FruitRipeness,
}

impl Axis {
    /// Wire name of the axis.
    pub fn name(&self) -> &'static str {
        match self {
            Axis::Sweetness => "sweetness",
            Axis::Acidity => "acidity",
            Axis::Tannin => "tannin",
            Axis::Bitterness => "bitterness",
            Axis::Body => "body",
            Axis::AlcoholWarmth => "alcoholWarmth",
            Axis::SparkleIntensity => "sparkleIntensity",
            Axis::Oak => "oak",
            Axis::MalolacticButter => "malolacticButter",
            Axis::Oxidative => "oxidative",
            Axis::Minerality => "minerality",
            Axis::FruitRipeness => "fruitRipeness",
        }
    }

    /// JSON pointer of the top-level field backing this axis.
    pub fn pointer(&self) -> String {
        match self {
            Axis::Oak
            | Axis::MalolacticButter
            | Axis::Oxidative
            | Axis::Minerality
            | Axis::FruitRipeness => format!("/styleLevers/{}", self.name()),
            _ => format!("/stablePalate/{}", self.name()),
        }
    }

    /// Read the top-level value of this axis from a profile.
    ///
    /// Only `SparkleIntensity` can be absent.
    pub fn value_in(&self, profile: &UserProfileInput) -> Option<f64> {
        let palate = &profile.stable_palate;
        let style = &profile.style_levers;
        match self {
            Axis::Sweetness => Some(palate.sweetness),
            Axis::Acidity => Some(palate.acidity),
            Axis::Tannin => Some(palate.tannin),
            Axis::Bitterness => Some(palate.bitterness),
            Axis::Body => Some(palate.body),
            Axis::AlcoholWarmth => Some(palate.alcohol_warmth),
            Axis::SparkleIntensity => palate.sparkle_intensity,
            Axis::Oak => Some(style.oak),
            Axis::MalolacticButter => Some(style.malolactic_butter),
            Axis::Oxidative => Some(style.oxidative),
            Axis::Minerality => Some(style.minerality),
            Axis::FruitRipeness => Some(style.fruit_ripeness),
        }
    }
}

/// How the ideal wine shifts for one occasion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContextWeightsEntry {
    pub occasion: Occasion,
    #[serde(default)]
    pub weights: BTreeMap<Axis, f64>,
}

/// Food habits that inform pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FoodProfile {
    /// JSON Schema `integer` admits `2.0`, so whole-valued floats are accepted
    #[serde(deserialize_with = "deserialize_whole_number")]
    pub heat_level: u8,
    pub salt: f64,
    pub fat: f64,
    pub sauce_sweetness: f64,
    pub sauce_acidity: f64,
    #[serde(default)]
    pub cuisines: Vec<String>,
    #[serde(default)]
    pub proteins: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetTier {
    Weeknight,
    Weekend,
    Celebration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Preferences {
    pub novelty: f64,
    pub budget_tier: BudgetTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

/// Sparkling dryness scale, driest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrynessBand {
    BrutNature,
    ExtraBrut,
    Brut,
    ExtraDry,
    Dry,
    DemiSec,
    Doux,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SparklingOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dryness_band: Option<DrynessBand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bubble_intensity: Option<f64>,
}

impl SparklingOverrides {
    pub fn is_empty(&self) -> bool {
        self.dryness_band.is_none() && self.bubble_intensity.is_none()
    }
}

/// Category-specific projection of palate and style values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FlavorMapCategory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tannin: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oak: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fruit_ripeness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_aromas: Option<Vec<AromaFamily>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dryness_band: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bubble_intensity: Option<f64>,
}

/// Wine categories with their own flavor map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WineCategory {
    Red,
    White,
    Sparkling,
}

impl WineCategory {
    pub const ALL: [WineCategory; 3] = [
        WineCategory::Red,
        WineCategory::White,
        WineCategory::Sparkling,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WineCategory::Red => "red",
            WineCategory::White => "white",
            WineCategory::Sparkling => "sparkling",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlavorMaps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub red: Option<FlavorMapCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub white: Option<FlavorMapCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sparkling: Option<FlavorMapCategory>,
}

impl FlavorMaps {
    pub fn get(&self, category: WineCategory) -> Option<&FlavorMapCategory> {
        match category {
            WineCategory::Red => self.red.as_ref(),
            WineCategory::White => self.white.as_ref(),
            WineCategory::Sparkling => self.sparkling.as_ref(),
        }
    }

    /// Populated categories in fixed red, white, sparkling order.
    pub fn populated(&self) -> impl Iterator<Item = (WineCategory, &FlavorMapCategory)> {
        WineCategory::ALL
            .into_iter()
            .filter_map(move |c| self.get(c).map(|m| (c, m)))
    }

    pub fn is_empty(&self) -> bool {
        self.red.is_none() && self.white.is_none() && self.sparkling.is_none()
    }
}

/// The complete taste profile produced by one mapping run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserProfileInput {
    pub user_id: String,
    pub stable_palate: StablePalate,
    pub aroma_affinities: Vec<AromaAffinity>,
    pub style_levers: StyleLevers,
    pub context_weights: Vec<ContextWeightsEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_profile: Option<FoodProfile>,
    pub preferences: Preferences,
    pub dislikes: Vec<String>,
    pub sparkling_overrides: SparklingOverrides,
    pub wine_knowledge: ExperienceTier,
    pub flavor_maps: FlavorMaps,
}

impl UserProfileInput {
    /// Neutral profile used when the model output cannot be parsed.
    pub fn neutral(user_id: impl Into<String>, tier: ExperienceTier) -> Self {
        Self {
            user_id: user_id.into(),
            stable_palate: StablePalate {
                sweetness: 0.5,
                acidity: 0.5,
                tannin: 0.5,
                bitterness: 0.5,
                body: 0.5,
                alcohol_warmth: 0.5,
                sparkle_intensity: Some(0.5),
            },
            aroma_affinities: Vec::new(),
            style_levers: StyleLevers {
                oak: 0.3,
                malolactic_butter: 0.2,
                oxidative: 0.2,
                minerality: 0.5,
                fruit_ripeness: 0.5,
            },
            context_weights: Vec::new(),
            food_profile: None,
            preferences: Preferences {
                novelty: 0.5,
                budget_tier: BudgetTier::Weekend,
                values: None,
            },
            dislikes: Vec::new(),
            sparkling_overrides: SparklingOverrides::default(),
            wine_knowledge: tier,
            flavor_maps: FlavorMaps::default(),
        }
    }

    /// Whether any context weight entry is for one of `occasions`.
    pub fn has_any_occasion(&self, occasions: &[Occasion]) -> bool {
        self.context_weights
            .iter()
            .any(|entry| occasions.contains(&entry.occasion))
    }

    /// Number of top-level fields that carry information.
    pub fn populated_fields(&self) -> usize {
        let flags = [
            !self.user_id.is_empty(),
            true, // stablePalate
            !self.aroma_affinities.is_empty(),
            true, // styleLevers
            !self.context_weights.is_empty(),
            self.food_profile.is_some(),
            true, // preferences
            !self.dislikes.is_empty(),
            !self.sparkling_overrides.is_empty(),
            true, // wineKnowledge
            !self.flavor_maps.is_empty(),
        ];
        flags.iter().filter(|set| **set).count()
    }

    /// Re-check every numeric bound on the typed value.
    ///
    /// Profiles that came through [`crate::validate`] already satisfy this;
    /// it exists for producers that build profiles in memory.
    pub fn check_bounds(&self) -> Result<(), SchemaViolation> {
        if self.user_id.is_empty() {
            return Err(SchemaViolation::new("/userId", "must be a non-empty string"));
        }

        let palate = &self.stable_palate;
        unit("/stablePalate/sweetness", palate.sweetness)?;
        unit("/stablePalate/acidity", palate.acidity)?;
        unit("/stablePalate/tannin", palate.tannin)?;
        unit("/stablePalate/bitterness", palate.bitterness)?;
        unit("/stablePalate/body", palate.body)?;
        unit("/stablePalate/alcoholWarmth", palate.alcohol_warmth)?;
        opt_unit("/stablePalate/sparkleIntensity", palate.sparkle_intensity)?;

        for (i, aroma) in self.aroma_affinities.iter().enumerate() {
            bounded(
                &format!("/aromaAffinities/{}/affinity", i),
                aroma.affinity,
                -1.0,
                1.0,
            )?;
        }

        let style = &self.style_levers;
        unit("/styleLevers/oak", style.oak)?;
        unit("/styleLevers/malolacticButter", style.malolactic_butter)?;
        unit("/styleLevers/oxidative", style.oxidative)?;
        unit("/styleLevers/minerality", style.minerality)?;
        unit("/styleLevers/fruitRipeness", style.fruit_ripeness)?;

        for (i, entry) in self.context_weights.iter().enumerate() {
            for (axis, weight) in &entry.weights {
                unit(
                    &format!("/contextWeights/{}/weights/{}", i, axis.name()),
                    *weight,
                )?;
            }
        }

        if let Some(food) = &self.food_profile {
            if food.heat_level > 5 {
                return Err(SchemaViolation::new(
                    "/foodProfile/heatLevel",
                    format!("{} is not an integer in [0, 5]", food.heat_level),
                ));
            }
            unit("/foodProfile/salt", food.salt)?;
            unit("/foodProfile/fat", food.fat)?;
            unit("/foodProfile/sauceSweetness", food.sauce_sweetness)?;
            unit("/foodProfile/sauceAcidity", food.sauce_acidity)?;
        }

        unit("/preferences/novelty", self.preferences.novelty)?;
        opt_unit(
            "/sparklingOverrides/bubbleIntensity",
            self.sparkling_overrides.bubble_intensity,
        )?;

        for (category, map) in self.flavor_maps.populated() {
            let base = format!("/flavorMaps/{}", category.as_str());
            opt_unit(&format!("{}/tannin", base), map.tannin)?;
            opt_unit(&format!("{}/acidity", base), map.acidity)?;
            opt_unit(&format!("{}/body", base), map.body)?;
            opt_unit(&format!("{}/oak", base), map.oak)?;
            opt_unit(&format!("{}/fruitRipeness", base), map.fruit_ripeness)?;
            opt_unit(&format!("{}/bubbleIntensity", base), map.bubble_intensity)?;
        }

        Ok(())
    }
}

fn bounded(path: &str, value: f64, min: f64, max: f64) -> Result<(), SchemaViolation> {
    // NaN fails both comparisons and is rejected here.
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(SchemaViolation::new(
            path,
            format!("{} is not a number in [{}, {}]", value, min, max),
        ))
    }
}

fn unit(path: &str, value: f64) -> Result<(), SchemaViolation> {
    bounded(path, value, 0.0, 1.0)
}

fn opt_unit(path: &str, value: Option<f64>) -> Result<(), SchemaViolation> {
    value.map_or(Ok(()), |v| unit(path, v))
}

fn deserialize_whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let raw = f64::deserialize(deserializer)?;
    if raw.fract() == 0.0 && (0.0..=f64::from(u8::MAX)).contains(&raw) {
        Ok(raw as u8)
    } else {
        Err(serde::de::Error::custom(format!("{} is not a whole number in [0, 255]", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_profile_values() {
        let profile = UserProfileInput::neutral("u-1", ExperienceTier::Novice);
        assert_eq!(profile.stable_palate.core_scalars(), [0.5; 5]);
        assert_eq!(profile.style_levers.oak, 0.3);
        assert_eq!(profile.style_levers.malolactic_butter, 0.2);
        assert_eq!(profile.style_levers.oxidative, 0.2);
        assert_eq!(profile.style_levers.minerality, 0.5);
        assert_eq!(profile.wine_knowledge, ExperienceTier::Novice);
        assert!(profile.flavor_maps.is_empty());
        assert!(profile.check_bounds().is_ok());
    }

    #[test]
    fn test_wire_names_are_camel_case() {
        let profile = UserProfileInput::neutral("u-1", ExperienceTier::Expert);
        let value = serde_json::to_value(&profile).unwrap();

        assert!(value.get("userId").is_some());
        assert!(value["stablePalate"].get("alcoholWarmth").is_some());
        assert!(value["styleLevers"].get("malolacticButter").is_some());
        assert_eq!(value["wineKnowledge"], "expert");
        // Absent optionals are omitted rather than serialized as null
        assert!(value.get("foodProfile").is_none());
    }

    #[test]
    fn test_axis_reads_profile() {
        let profile = UserProfileInput::neutral("u-1", ExperienceTier::Novice);
        assert_eq!(Axis::Oak.value_in(&profile), Some(0.3));
        assert_eq!(Axis::Tannin.pointer(), "/stablePalate/tannin");
        assert_eq!(Axis::Minerality.pointer(), "/styleLevers/minerality");
    }

    #[test]
    fn test_check_bounds_rejects_out_of_range() {
        let mut profile = UserProfileInput::neutral("u-1", ExperienceTier::Novice);
        profile.style_levers.oak = 1.01;
        let err = profile.check_bounds().unwrap_err();
        assert_eq!(err.path, "/styleLevers/oak");
    }

    #[test]
    fn test_check_bounds_rejects_nan() {
        let mut profile = UserProfileInput::neutral("u-1", ExperienceTier::Novice);
        profile.stable_palate.body = f64::NAN;
        assert!(profile.check_bounds().is_err());
    }

    #[test]
    fn test_populated_field_count() {
        let mut profile = UserProfileInput::neutral("u-1", ExperienceTier::Novice);
        assert_eq!(profile.populated_fields(), 5);

        profile.dislikes.push("retsina".to_string());
        profile.flavor_maps.red = Some(FlavorMapCategory::default());
        assert_eq!(profile.populated_fields(), 7);
    }

    #[test]
    fn test_experience_tier_from_str() {
        assert_eq!("Expert".parse::<ExperienceTier>(), Ok(ExperienceTier::Expert));
        assert!("sommelier".parse::<ExperienceTier>().is_err());
    }
}
