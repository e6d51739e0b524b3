//! Error types for the prediction pipeline.

use thiserror::Error;

/// Request-scoped failures raised by the decision pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("could not convert feature '{field}' to a number (got {value})")]
    FeatureCoercion { field: String, value: String },

    #[error("model invocation failed: {0}")]
    ModelInvocation(#[from] ModelError),
}

impl PipelineError {
    /// Stable short name, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::FeatureCoercion { .. } => "feature_coercion",
            PipelineError::ModelInvocation(_) => "model_invocation",
        }
    }

    /// True when the caller sent bad input (as opposed to a server fault).
    pub fn is_client_error(&self) -> bool {
        matches!(self, PipelineError::FeatureCoercion { .. })
    }
}

/// Failures raised while running a loaded classifier.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("expected {expected} input features, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("input contains NaN or infinity at feature '{field}'")]
    NonFinite { field: String },

    #[error("model returned label {0}, expected 0 or 1")]
    InvalidLabel(i64),

    #[error("model returned no output for the input batch")]
    EmptyOutput,

    #[error("model does not support probability estimates")]
    ProbabilityUnsupported,

    #[error("numerical error: {0}")]
    Numerical(String),
}

/// Failures raised while loading a model artifact at startup.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("model file not found or unreadable: {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("model file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid model artifact: {0}")]
    Invalid(String),
}
