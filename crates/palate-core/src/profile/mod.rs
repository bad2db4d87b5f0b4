//! Palate profile data model and schema validation.
//!
//! Profiles are structured data validated against an embedded JSON Schema.
//! This module holds the typed aggregate and the single validation entry
//! point every producer goes through.

mod model;
mod schema;

pub use model::{
    Answers, AromaAffinity, AromaFamily, Axis, BudgetTier, ContextWeightsEntry, DrynessBand,
    ExperienceTier, FlavorMapCategory, FlavorMaps, FoodProfile, Occasion, Preferences,
    SparklingOverrides, StablePalate, StyleLevers, UserProfileInput, WineCategory,
};
pub use schema::{schema_json, validate, SchemaViolation};
