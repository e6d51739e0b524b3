//! Wire schemas shared by the daemon and the control client.

use crate::model::ModelInfo;
use serde::{Deserialize, Serialize};

/// Final answer for one request.
///
/// Serializes as the `/predict` success body: `{"prediction": 0|1, "probability": p}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(rename = "prediction")]
    pub label: u8,
    pub probability: f64,
}

impl Decision {
    /// Default answer when neither the heuristic nor the model applies
    pub const NEGATIVE: Decision = Decision {
        label: 0,
        probability: 0.0,
    };

    pub fn new(label: u8, probability: f64) -> Self {
        Self { label, probability }
    }

    pub fn is_positive(&self) -> bool {
        self.label == 1
    }
}

/// Error body returned with 4xx/5xx responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub detail: String,
}

impl ErrorBody {
    pub const INVALID_FEATURES: &'static str = "Invalid numeric feature values";
    pub const MODEL_FAILED: &'static str = "Model prediction failed";
    pub const INVALID_JSON: &'static str = "Invalid JSON payload";

    pub fn new(error: &str, detail: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            detail: detail.into(),
        }
    }
}

/// Response for `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub model: ModelInfo,
}
