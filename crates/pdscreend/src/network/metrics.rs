//! Prometheus metrics for the prediction endpoint

use pdscreen_common::Evaluation;
use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, Encoder, Histogram, HistogramTimer, IntCounter,
    IntCounterVec, Registry, TextEncoder,
};
use std::sync::Arc;

/// Prediction metrics, registered on a private registry
#[derive(Clone)]
pub struct PredictionMetrics {
    /// Decisions served, by stage (heuristic, model, fallback)
    pub predictions_total: IntCounterVec,
    /// Failed requests, by error kind
    pub prediction_errors_total: IntCounterVec,
    pub positive_predictions_total: IntCounter,
    pub prediction_duration_seconds: Histogram,

    registry: Arc<Registry>,
}

impl PredictionMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let predictions_total = register_int_counter_vec_with_registry!(
            "pdscreen_predictions_total",
            "Total number of predictions served by decision source",
            &["source"],
            registry
        )?;

        let prediction_errors_total = register_int_counter_vec_with_registry!(
            "pdscreen_prediction_errors_total",
            "Total number of failed prediction requests by error kind",
            &["kind"],
            registry
        )?;

        let positive_predictions_total = register_int_counter_with_registry!(
            "pdscreen_positive_predictions_total",
            "Total number of predictions with a positive label",
            registry
        )?;

        let prediction_duration_seconds = register_histogram_with_registry!(
            "pdscreen_prediction_duration_seconds",
            "Time spent handling a prediction request",
            vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1],
            registry
        )?;

        Ok(Self {
            predictions_total,
            prediction_errors_total,
            positive_predictions_total,
            prediction_duration_seconds,
            registry: Arc::new(registry),
        })
    }

    /// Record a served decision
    pub fn record_decision(&self, evaluation: &Evaluation) {
        self.predictions_total
            .with_label_values(&[evaluation.source.as_str()])
            .inc();
        if evaluation.decision.is_positive() {
            self.positive_predictions_total.inc();
        }
    }

    /// Record a failed request
    pub fn record_error(&self, kind: &str) {
        self.prediction_errors_total
            .with_label_values(&[kind])
            .inc();
    }

    /// Timer that observes the request duration when dropped
    pub fn start_timer(&self) -> HistogramTimer {
        self.prediction_duration_seconds.start_timer()
    }

    /// Export metrics in Prometheus text format
    pub fn export(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
