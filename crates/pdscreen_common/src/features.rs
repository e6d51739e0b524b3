//! Feature extraction from loosely-structured request payloads.
//!
//! A payload is either the feature mapping itself (`{"mdvp_fo": 119.9, ...}`)
//! or wraps it under a `features` key (`{"features": {"mdvp_fo": 119.9}}`).
//! Both shapes are accepted and extract identically. Anything that is not a
//! JSON object degrades to an empty feature source.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Number of acoustic features the classifier consumes.
pub const FEATURE_COUNT: usize = 22;

/// Canonical feature names, in vector order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "mdvp_fo",
    "mdvp_fhi",
    "mdvp_flo",
    "mdvp_jitter",
    "mdvp_jitter_abs",
    "mdvp_rap",
    "mdvp_ppq",
    "jitter_ddp",
    "mdvp_shimmer",
    "mdvp_shimmer_db",
    "shimmer_apq3",
    "shimmer_apq5",
    "mdvp_apq",
    "shimmer_dda",
    "nhr",
    "hnr",
    "rpde",
    "dfa",
    "spread1",
    "spread2",
    "d2",
    "ppe",
];

/// Key under which a payload may nest its feature mapping.
pub const NESTED_FEATURES_KEY: &str = "features";

pub const SYMPTOM_TEXT_KEY: &str = "symptomText";
pub const SEVERITY_KEY: &str = "severity";
pub const COMMON_SYMPTOMS_KEY: &str = "commonSymptoms";

/// Fixed-length numeric input for the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn zeros() -> Self {
        Self([0.0; FEATURE_COUNT])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up a value by canonical feature name
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|idx| self.0[idx])
    }

    /// Count of values that are not exactly 0.0
    pub fn non_zero_count(&self) -> usize {
        self.0.iter().filter(|v| **v != 0.0).count()
    }

    /// Iterate `(name, value)` pairs in vector order
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }
}

impl From<[f64; FEATURE_COUNT]> for FeatureVector {
    fn from(values: [f64; FEATURE_COUNT]) -> Self {
        Self::new(values)
    }
}

/// Text and categorical signals consumed by the heuristic classifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signals {
    /// Free-text symptom description, lower-cased
    pub symptom_text: String,
    /// Severity as reported, lower-cased (`mild`, `moderate`, `severe` or empty)
    pub severity: String,
    /// Structured symptom checklist, kept verbatim
    pub common_symptoms: Vec<String>,
}

/// Everything the decision policy needs from one payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub vector: FeatureVector,
    pub signals: Signals,
    pub non_zero_count: usize,
}

/// Where feature values are read from, resolved once per payload.
#[derive(Debug, Clone, Copy)]
pub enum FeatureSource<'a> {
    Mapping(&'a Map<String, Value>),
    NonMapping,
}

impl<'a> FeatureSource<'a> {
    /// Pick the nested `features` object if present, else the payload itself.
    pub fn resolve(payload: &'a Value) -> Self {
        match payload {
            Value::Object(map) => match map.get(NESTED_FEATURES_KEY) {
                Some(Value::Object(nested)) => FeatureSource::Mapping(nested),
                _ => FeatureSource::Mapping(map),
            },
            _ => FeatureSource::NonMapping,
        }
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        match self {
            FeatureSource::Mapping(map) => map.get(key),
            FeatureSource::NonMapping => None,
        }
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, FeatureSource::Mapping(_))
    }
}

/// Extract the feature vector and signals from a raw payload.
///
/// Missing numeric fields default to 0.0. A field that is present but cannot
/// be read as a number fails the whole extraction.
pub fn extract(payload: &Value) -> Result<Extraction, PipelineError> {
    let source = FeatureSource::resolve(payload);
    if !source.is_mapping() {
        debug!("Payload is not a JSON object, using empty feature source");
    }

    let mut values = [0.0; FEATURE_COUNT];
    for (slot, name) in values.iter_mut().zip(FEATURE_NAMES.iter()) {
        if let Some(raw) = source.get(name) {
            *slot = coerce(name, raw)?;
        }
    }

    let vector = FeatureVector::new(values);
    let non_zero_count = vector.non_zero_count();
    let signals = extract_signals(&source);

    debug!(
        "Extracted features: non_zero={}, severity='{}', common_symptoms={:?}",
        non_zero_count, signals.severity, signals.common_symptoms
    );

    Ok(Extraction {
        vector,
        signals,
        non_zero_count,
    })
}

/// Convert one JSON value into a float.
fn coerce(field: &str, value: &Value) -> Result<f64, PipelineError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };

    parsed.ok_or_else(|| PipelineError::FeatureCoercion {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn extract_signals(source: &FeatureSource<'_>) -> Signals {
    Signals {
        symptom_text: text_signal(source.get(SYMPTOM_TEXT_KEY)),
        severity: text_signal(source.get(SEVERITY_KEY)),
        common_symptoms: list_signal(source.get(COMMON_SYMPTOMS_KEY)),
    }
}

fn text_signal(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.to_lowercase(),
        Some(other) => other.to_string().to_lowercase(),
    }
}

fn list_signal(value: Option<&Value>) -> Vec<String> {
    match value {
        None => Vec::new(),
        Some(v) if is_falsy(v) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        Some(_) => Vec::new(),
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}
