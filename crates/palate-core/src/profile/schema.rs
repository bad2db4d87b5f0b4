//! JSON Schema validation for palate profiles.
//!
//! Candidates are validated against `schemas/user_profile.schema.json`,
//! embedded at compile time, before any field is read. Validation is one
//! unit: a candidate either becomes a full `UserProfileInput` or fails with
//! a single `SchemaViolation`.

use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

use super::model::UserProfileInput;

/// Embedded profile schema (loaded at compile time).
const PROFILE_SCHEMA_JSON: &str = include_str!("../../schemas/user_profile.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// A candidate profile failed structural, range or enumeration validation.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("schema violation at {path}: {constraint}")]
pub struct SchemaViolation {
    /// JSON pointer of the offending value ("/" for the root)
    pub path: String,

    /// The constraint that was not met
    pub constraint: String,

    /// Further violations found in the same candidate
    pub additional: usize,
}

impl SchemaViolation {
    pub fn new(path: impl Into<String>, constraint: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            path: if path.is_empty() { "/".to_string() } else { path },
            constraint: constraint.into(),
            additional: 0,
        }
    }
}

/// Get or initialize the compiled schema validator.
fn get_validator() -> Result<&'static jsonschema::Validator, SchemaViolation> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: Value = serde_json::from_str(PROFILE_SCHEMA_JSON)
            .map_err(|e| format!("Invalid schema JSON: {}", e))?;

        jsonschema::options()
            .build(&schema_value)
            .map_err(|e| format!("Failed to compile schema: {}", e))
    });

    result
        .as_ref()
        .map_err(|e| SchemaViolation::new("/", format!("schema unavailable: {}", e)))
}

/// The raw profile schema, for introspection or client-side validation.
pub fn schema_json() -> &'static str {
    PROFILE_SCHEMA_JSON
}

/// Validate a candidate and convert it into a typed profile.
///
/// # Returns
///
/// * `Ok(UserProfileInput)` - every field present, typed and in range
/// * `Err(SchemaViolation)` - the first violation found, with the count of
///   any others
pub fn validate(candidate: &Value) -> Result<UserProfileInput, SchemaViolation> {
    let validator = get_validator()?;

    let mut errors = validator
        .iter_errors(candidate)
        .map(|e| SchemaViolation::new(e.instance_path.to_string(), e.to_string()));

    if let Some(mut first) = errors.next() {
        first.additional = errors.count();
        return Err(first);
    }

    let profile: UserProfileInput = serde_json::from_value(candidate.clone())
        .map_err(|e| SchemaViolation::new("/", e.to_string()))?;

    profile.check_bounds()?;

    Ok(profile)
}
