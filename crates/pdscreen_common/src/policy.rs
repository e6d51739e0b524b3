//! Layered decision policy.
//!
//! Evaluation order, terminal on the first stage that answers:
//! 1. keyword heuristic
//! 2. statistical model, only when enough numeric features are non-zero
//! 3. default negative
//!
//! A model failure in stage 2 is returned as an error and never turned into
//! a negative answer.

use crate::error::PipelineError;
use crate::features::{extract, Extraction};
use crate::heuristic::HeuristicClassifier;
use crate::model::{Classifier, ModelAdapter, ModelInfo};
use crate::schemas::Decision;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Minimum non-zero numeric features before the model is trusted.
pub const NUMERIC_THRESHOLD: usize = 5;

/// Which stage produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    Heuristic,
    Model,
    Fallback,
}

impl DecisionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionSource::Heuristic => "heuristic",
            DecisionSource::Model => "model",
            DecisionSource::Fallback => "fallback",
        }
    }
}

/// A decision plus how it was reached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub decision: Decision,
    pub source: DecisionSource,
    pub non_zero_count: usize,
}

#[derive(Debug, Clone)]
pub struct DecisionPolicy {
    heuristic: HeuristicClassifier,
    model: ModelAdapter,
    numeric_threshold: usize,
}

impl DecisionPolicy {
    pub fn new(model: Arc<dyn Classifier>) -> Self {
        Self {
            heuristic: HeuristicClassifier::new(),
            model: ModelAdapter::new(model),
            numeric_threshold: NUMERIC_THRESHOLD,
        }
    }

    pub fn with_numeric_threshold(mut self, threshold: usize) -> Self {
        self.numeric_threshold = threshold;
        self
    }

    pub fn numeric_threshold(&self) -> usize {
        self.numeric_threshold
    }

    pub fn model_info(&self) -> ModelInfo {
        self.model.info()
    }

    /// Run the full pipeline on a raw payload.
    pub fn evaluate(&self, payload: &Value) -> Result<Evaluation, PipelineError> {
        let extraction = extract(payload)?;
        self.evaluate_extraction(&extraction)
    }

    /// Run the policy on an already extracted payload.
    pub fn evaluate_extraction(&self, extraction: &Extraction) -> Result<Evaluation, PipelineError> {
        let non_zero_count = extraction.non_zero_count;

        if let Some(decision) = self.heuristic.evaluate(&extraction.signals) {
            debug!("Heuristic fired: probability={:.2}", decision.probability);
            return Ok(Evaluation {
                decision,
                source: DecisionSource::Heuristic,
                non_zero_count,
            });
        }

        if non_zero_count >= self.numeric_threshold {
            let decision = self.model.predict(&extraction.vector)?;
            debug!(
                "Model decided: label={}, probability={:.4}",
                decision.label, decision.probability
            );
            return Ok(Evaluation {
                decision,
                source: DecisionSource::Model,
                non_zero_count,
            });
        }

        debug!(
            "Insufficient numeric signal ({} < {}) and no heuristic match",
            non_zero_count, self.numeric_threshold
        );
        Ok(Evaluation {
            decision: Decision::NEGATIVE,
            source: DecisionSource::Fallback,
            non_zero_count,
        })
    }

    /// Decision only, without provenance
    pub fn decide(&self, payload: &Value) -> Result<Decision, PipelineError> {
        self.evaluate(payload).map(|e| e.decision)
    }
}
