//! pdscreen common - Parkinson's disease risk screening pipeline.
//!
//! Shared by the `pdscreend` HTTP daemon and the `pdscreenctl` client.
//! A raw JSON payload goes through feature extraction, the keyword
//! heuristic, and (when enough numeric signal is present) a linear model.

pub mod error;
pub mod features;
pub mod heuristic;
pub mod model;
pub mod policy;
pub mod schemas;

pub use error::{ArtifactError, ModelError, PipelineError};
pub use features::{extract, Extraction, FeatureVector, Signals, FEATURE_COUNT, FEATURE_NAMES};
pub use heuristic::HeuristicClassifier;
pub use model::{load_classifier, Classifier, LinearKind, LinearModel, ModelAdapter, ModelInfo};
pub use policy::{DecisionPolicy, DecisionSource, Evaluation, NUMERIC_THRESHOLD};
pub use schemas::{Decision, ErrorBody, HealthResponse};
