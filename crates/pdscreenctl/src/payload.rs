//! Build `/predict` payloads from command-line input.
//!
//! Produces the flat payload shape: numeric features and symptom fields
//! side by side in one JSON object.

use anyhow::{anyhow, bail, Context, Result};
use clap::ValueEnum;
use pdscreen_common::features::{COMMON_SYMPTOMS_KEY, NESTED_FEATURES_KEY, SEVERITY_KEY, SYMPTOM_TEXT_KEY};
use pdscreen_common::FEATURE_NAMES;
use serde_json::{Map, Number, Value};
use std::fs;
use std::path::Path;

/// Reported symptom severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        }
    }
}

#[derive(Debug, Default)]
pub struct PayloadBuilder {
    fields: Map<String, Value>,
}

impl PayloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Free-text symptoms, trimmed and lower-cased
    pub fn symptoms(mut self, text: &str) -> Self {
        self.fields.insert(
            SYMPTOM_TEXT_KEY.to_string(),
            Value::String(text.trim().to_lowercase()),
        );
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.fields.insert(
            SEVERITY_KEY.to_string(),
            Value::String(severity.as_str().to_string()),
        );
        self
    }

    pub fn common_symptoms(mut self, symptoms: &[String]) -> Self {
        self.fields.insert(
            COMMON_SYMPTOMS_KEY.to_string(),
            Value::Array(symptoms.iter().cloned().map(Value::String).collect()),
        );
        self
    }

    /// Merge numeric features from a JSON file (flat or `{"features": {...}}`)
    pub fn features_file(mut self, path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("{} is not valid JSON", path.display()))?;

        let map = match value {
            Value::Object(mut map) => match map.remove(NESTED_FEATURES_KEY) {
                Some(Value::Object(nested)) => nested,
                Some(other) => {
                    map.insert(NESTED_FEATURES_KEY.to_string(), other);
                    map
                }
                None => map,
            },
            _ => bail!("{} must contain a JSON object", path.display()),
        };

        self.fields.extend(map);
        Ok(self)
    }

    /// Set one feature from a `name=value` pair
    pub fn feature(mut self, assignment: &str) -> Result<Self> {
        let (name, value) = parse_assignment(assignment)?;
        self.fields.insert(name, value);
        Ok(self)
    }

    pub fn build(self) -> Value {
        Value::Object(self.fields)
    }
}

/// Parse `name=value`, checking the name against the canonical features.
///
/// Numeric values are sent as JSON numbers; anything else is sent as a
/// string so the daemon reports it.
pub fn parse_assignment(assignment: &str) -> Result<(String, Value)> {
    let (name, raw) = assignment
        .split_once('=')
        .ok_or_else(|| anyhow!("expected name=value, got '{}'", assignment))?;
    let name = name.trim();

    if !FEATURE_NAMES.contains(&name) {
        bail!(
            "unknown feature '{}' (expected one of: {})",
            name,
            FEATURE_NAMES.join(", ")
        );
    }

    let raw = raw.trim();
    let value = raw
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(raw.to_string()));

    Ok((name.to_string(), value))
}
