//! Statistical model capability and the adapter the policy talks to.
//!
//! A `Classifier` is loaded once at startup and shared read-only across
//! requests. Probability estimation is optional: a classifier advertises it
//! through `supports_probability`, and the adapter falls back to a fixed
//! score of 1.0 when it is missing.

use crate::error::{ArtifactError, ModelError};
use crate::features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use crate::schemas::Decision;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Score reported when the classifier cannot estimate probabilities.
pub const UNCALIBRATED_PROBABILITY: f64 = 1.0;

/// Descriptive metadata about a loaded classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub kind: String,
    pub version: String,
    pub supports_probability: bool,
    pub feature_count: usize,
}

/// Batch classifier over fixed-length feature vectors.
pub trait Classifier: Send + Sync {
    /// Predict a 0/1 label for every vector in the batch
    fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<u8>, ModelError>;

    /// Whether `predict_probability` is implemented
    fn supports_probability(&self) -> bool {
        false
    }

    /// `[negative, positive]` class scores for every vector in the batch
    fn predict_probability(&self, batch: &[FeatureVector]) -> Result<Vec<[f64; 2]>, ModelError> {
        let _ = batch;
        Err(ModelError::ProbabilityUnsupported)
    }

    fn info(&self) -> ModelInfo;
}

/// Single-vector view over a shared classifier.
#[derive(Clone)]
pub struct ModelAdapter {
    model: Arc<dyn Classifier>,
}

impl ModelAdapter {
    pub fn new(model: Arc<dyn Classifier>) -> Self {
        Self { model }
    }

    pub fn info(&self) -> ModelInfo {
        self.model.info()
    }

    pub fn supports_probability(&self) -> bool {
        self.model.supports_probability()
    }

    pub fn predict_label(&self, vector: &FeatureVector) -> Result<u8, ModelError> {
        check_finite(vector)?;
        let labels = self.model.predict(std::slice::from_ref(vector))?;
        let label = *labels.first().ok_or(ModelError::EmptyOutput)?;
        if label > 1 {
            return Err(ModelError::InvalidLabel(i64::from(label)));
        }
        Ok(label)
    }

    pub fn predict_probability_of_positive(&self, vector: &FeatureVector) -> Result<f64, ModelError> {
        if !self.model.supports_probability() {
            debug!("Classifier has no probability estimates, reporting {}", UNCALIBRATED_PROBABILITY);
            return Ok(UNCALIBRATED_PROBABILITY);
        }
        check_finite(vector)?;
        let scores = self.model.predict_probability(std::slice::from_ref(vector))?;
        let [_, positive] = *scores.first().ok_or(ModelError::EmptyOutput)?;
        if !positive.is_finite() {
            return Err(ModelError::Numerical(format!(
                "positive class score is {}",
                positive
            )));
        }
        Ok(positive.clamp(0.0, 1.0))
    }

    /// Label and positive-class probability for one vector
    pub fn predict(&self, vector: &FeatureVector) -> Result<Decision, ModelError> {
        let label = self.predict_label(vector)?;
        let probability = self.predict_probability_of_positive(vector)?;
        Ok(Decision::new(label, probability))
    }
}

impl std::fmt::Debug for ModelAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelAdapter")
            .field("model", &self.model.info())
            .finish()
    }
}

fn check_finite(vector: &FeatureVector) -> Result<(), ModelError> {
    match vector.named().find(|(_, v)| !v.is_finite()) {
        Some((field, _)) => Err(ModelError::NonFinite {
            field: field.to_string(),
        }),
        None => Ok(()),
    }
}

// ============================================================================
// Linear model artifact
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinearKind {
    /// Logistic regression, provides probabilities
    Logistic,
    /// Linear SVM, labels only
    LinearSvm,
}

impl LinearKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinearKind::Logistic => "logistic",
            LinearKind::LinearSvm => "linear_svm",
        }
    }
}

/// Per-feature standardization applied before the linear layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Linear classifier exported from a trained model as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub kind: LinearKind,
    #[serde(default = "default_version")]
    pub version: String,
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub scaler: Option<Scaler>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

fn default_version() -> String {
    "unversioned".to_string()
}

impl LinearModel {
    /// Load and validate an artifact from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let model = Self::from_json(&content)?;
        info!(
            "Loaded {} model {} from {}",
            model.kind.as_str(),
            model.version,
            path.display()
        );
        Ok(model)
    }

    pub fn from_json(content: &str) -> Result<Self, ArtifactError> {
        let model: LinearModel = serde_json::from_str(content)?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.feature_names.len() != FEATURE_COUNT
            || self
                .feature_names
                .iter()
                .zip(FEATURE_NAMES.iter())
                .any(|(have, want)| have != want)
        {
            return Err(ArtifactError::Invalid(format!(
                "feature_names must be the {} canonical features in order",
                FEATURE_COUNT
            )));
        }

        if self.coefficients.len() != FEATURE_COUNT {
            return Err(ArtifactError::Invalid(format!(
                "expected {} coefficients, found {}",
                FEATURE_COUNT,
                self.coefficients.len()
            )));
        }

        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ArtifactError::Invalid(
                "coefficients and intercept must be finite".to_string(),
            ));
        }

        if let Some(scaler) = &self.scaler {
            if scaler.mean.len() != FEATURE_COUNT || scaler.scale.len() != FEATURE_COUNT {
                return Err(ArtifactError::Invalid(format!(
                    "scaler mean/scale must have {} entries",
                    FEATURE_COUNT
                )));
            }
            if scaler.scale.iter().any(|s| *s == 0.0 || !s.is_finite())
                || scaler.mean.iter().any(|m| !m.is_finite())
            {
                return Err(ArtifactError::Invalid(
                    "scaler entries must be finite and scale must be non-zero".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Signed distance from the decision boundary
    pub fn decision_function(&self, vector: &FeatureVector) -> Result<f64, ModelError> {
        if vector.len() != self.coefficients.len() {
            return Err(ModelError::ShapeMismatch {
                expected: self.coefficients.len(),
                got: vector.len(),
            });
        }

        let mut z = self.intercept;
        for (idx, (x, w)) in vector.as_slice().iter().zip(&self.coefficients).enumerate() {
            let x = match &self.scaler {
                Some(s) => (x - s.mean[idx]) / s.scale[idx],
                None => *x,
            };
            z += x * w;
        }

        if !z.is_finite() {
            return Err(ModelError::Numerical(format!(
                "decision function evaluated to {}",
                z
            )));
        }
        Ok(z)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl Classifier for LinearModel {
    fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<u8>, ModelError> {
        batch
            .iter()
            .map(|v| self.decision_function(v).map(|z| u8::from(z >= 0.0)))
            .collect()
    }

    fn supports_probability(&self) -> bool {
        self.kind == LinearKind::Logistic
    }

    fn predict_probability(&self, batch: &[FeatureVector]) -> Result<Vec<[f64; 2]>, ModelError> {
        if !self.supports_probability() {
            return Err(ModelError::ProbabilityUnsupported);
        }
        batch
            .iter()
            .map(|v| {
                self.decision_function(v).map(|z| {
                    let p = sigmoid(z);
                    [1.0 - p, p]
                })
            })
            .collect()
    }

    fn info(&self) -> ModelInfo {
        ModelInfo {
            kind: self.kind.as_str().to_string(),
            version: self.version.clone(),
            supports_probability: self.supports_probability(),
            feature_count: FEATURE_COUNT,
        }
    }
}

/// Load the classifier artifact used by the daemon and the offline CLI
pub fn load_classifier(path: impl AsRef<Path>) -> Result<Arc<dyn Classifier>, ArtifactError> {
    let model = LinearModel::load(path)?;
    Ok(Arc::new(model))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    fn linear(kind: LinearKind, weight: f64, intercept: f64) -> LinearModel {
        let mut coefficients = vec![0.0; FEATURE_COUNT];
        coefficients[0] = weight;
        LinearModel {
            kind,
            version: "test".to_string(),
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            scaler: None,
            coefficients,
            intercept,
        }
    }

    fn vector_with_first(value: f64) -> FeatureVector {
        let mut values = [0.0; FEATURE_COUNT];
        values[0] = value;
        FeatureVector::new(values)
    }

    #[test]
    fn test_logistic_probability() {
        let model = linear(LinearKind::Logistic, 1.0, 0.0);
        let adapter = ModelAdapter::new(Arc::new(model));

        let decision = adapter.predict(&vector_with_first(0.0)).unwrap();
        assert_eq!(decision.label, 1);
        assert_relative_eq!(decision.probability, 0.5, epsilon = 1e-12);

        let decision = adapter.predict(&vector_with_first(-3.0)).unwrap();
        assert_eq!(decision.label, 0);
        assert_relative_eq!(decision.probability, sigmoid(-3.0), epsilon = 1e-12);
    }

    #[test]
    fn test_svm_falls_back_to_fixed_probability() {
        let adapter = ModelAdapter::new(Arc::new(linear(LinearKind::LinearSvm, -1.0, 0.0)));
        assert!(!adapter.supports_probability());

        let decision = adapter.predict(&vector_with_first(5.0)).unwrap();
        assert_eq!(decision.label, 0);
        assert_eq!(decision.probability, UNCALIBRATED_PROBABILITY);
    }

    #[test]
    fn test_scaler_applied() {
        let mut model = linear(LinearKind::Logistic, 1.0, 0.0);
        let mut mean = vec![0.0; FEATURE_COUNT];
        mean[0] = 100.0;
        model.scaler = Some(Scaler {
            mean,
            scale: vec![10.0; FEATURE_COUNT],
        });
        let z = model.decision_function(&vector_with_first(120.0)).unwrap();
        assert_relative_eq!(z, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let adapter = ModelAdapter::new(Arc::new(linear(LinearKind::Logistic, 1.0, 0.0)));
        let err = adapter.predict_label(&vector_with_first(f64::NAN)).unwrap_err();
        assert_eq!(
            err,
            ModelError::NonFinite {
                field: "mdvp_fo".to_string()
            }
        );
    }

    #[test]
    fn test_overflow_is_numerical_error() {
        let adapter = ModelAdapter::new(Arc::new(linear(LinearKind::Logistic, f64::MAX, 0.0)));
        let err = adapter.predict_label(&vector_with_first(f64::MAX)).unwrap_err();
        assert!(matches!(err, ModelError::Numerical(_)));
    }

    #[test]
    fn test_validate_rejects_wrong_feature_names() {
        let mut model = linear(LinearKind::Logistic, 1.0, 0.0);
        model.feature_names.swap(0, 1);
        assert!(matches!(model.validate(), Err(ArtifactError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_short_coefficients() {
        let mut model = linear(LinearKind::Logistic, 1.0, 0.0);
        model.coefficients.pop();
        assert!(matches!(model.validate(), Err(ArtifactError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_zero_scale() {
        let mut model = linear(LinearKind::Logistic, 1.0, 0.0);
        model.scaler = Some(Scaler {
            mean: vec![0.0; FEATURE_COUNT],
            scale: vec![0.0; FEATURE_COUNT],
        });
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_load_round_trip_from_disk() {
        let model = linear(LinearKind::LinearSvm, 0.5, -1.0);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&model).unwrap()).unwrap();

        let loaded = LinearModel::load(file.path()).unwrap();
        assert_eq!(loaded, model);
        assert_eq!(loaded.info().kind, "linear_svm");
        assert!(!loaded.info().supports_probability);
    }

    #[test]
    fn test_load_missing_file() {
        let err = LinearModel::load("/nonexistent/classifier.json").unwrap_err();
        assert!(matches!(err, ArtifactError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/classifier.json"));
    }

    #[test]
    fn test_version_defaults_when_absent() {
        let names: Vec<&str> = FEATURE_NAMES.to_vec();
        let json = serde_json::json!({
            "kind": "logistic",
            "feature_names": names,
            "coefficients": vec![0.0; FEATURE_COUNT],
            "intercept": 0.0,
        });
        let model = LinearModel::from_json(&json.to_string()).unwrap();
        assert_eq!(model.version, "unversioned");
        assert!(model.scaler.is_none());
    }
}
