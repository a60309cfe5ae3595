//! Parsing entry points. A scenario is supplied as either YAML or JSON text; both deserialize
//! through [`crate::document::Scenario`]'s single `serde` model, so the two wire forms are
//! guaranteed to parse to identical in-memory values.

use crate::document::Scenario;
use crate::error::ScenarioError;

/// Parses `text` as a YAML scenario document.
pub fn parse_yaml(text: &str) -> Result<Scenario, ScenarioError> {
    serde_yaml::from_str(text).map_err(|e| ScenarioError::Parse(e.to_string()))
}

/// Parses `text` as a JSON scenario document.
pub fn parse_json(text: &str) -> Result<Scenario, ScenarioError> {
    serde_json::from_str(text).map_err(|e| ScenarioError::Parse(e.to_string()))
}

/// Parses `text`, trying JSON first (a cheap syntax check: does it start with `{`) and falling
/// back to YAML otherwise. Useful for a CLI that accepts a scenario file without requiring the
/// caller to name its format.
pub fn parse_auto(text: &str) -> Result<Scenario, ScenarioError> {
    if text.trim_start().starts_with('{') {
        parse_json(text)
    } else {
        parse_yaml(text)
    }
}
