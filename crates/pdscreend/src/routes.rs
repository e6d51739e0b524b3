//! API routes for pdscreend
//!
//! POST /predict  - risk decision for one payload
//! GET  /health   - liveness and model info
//! GET  /metrics  - Prometheus exposition

use crate::server::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use pdscreen_common::{ErrorBody, HealthResponse, PipelineError};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

type AppStateArc = Arc<AppState>;

// ============================================================================
// Predict Routes
// ============================================================================

pub fn predict_routes() -> Router<AppStateArc> {
    Router::new().route("/predict", post(predict))
}

/// Parse the body as JSON regardless of Content-Type, then run the policy.
async fn predict(State(state): State<AppStateArc>, body: Bytes) -> Response {
    let _timer = state.metrics.start_timer();
    let request_id = Uuid::new_v4();

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("[PREDICT] {} rejected, body is not JSON: {}", request_id, e);
            state.metrics.record_error("invalid_json");
            return error_response(
                StatusCode::BAD_REQUEST,
                ErrorBody::new(ErrorBody::INVALID_JSON, e.to_string()),
            );
        }
    };
    debug!("[PREDICT] {} payload: {}", request_id, payload);

    match state.policy.evaluate(&payload) {
        Ok(evaluation) => {
            info!(
                "[PREDICT] {} source={} prediction={} probability={:.4} non_zero={}",
                request_id,
                evaluation.source.as_str(),
                evaluation.decision.label,
                evaluation.decision.probability,
                evaluation.non_zero_count
            );
            state.metrics.record_decision(&evaluation);
            (StatusCode::OK, Json(evaluation.decision)).into_response()
        }
        Err(e) => {
            state.metrics.record_error(e.kind());
            pipeline_error_response(request_id, &e)
        }
    }
}

fn pipeline_error_response(request_id: Uuid, err: &PipelineError) -> Response {
    if err.is_client_error() {
        warn!("[PREDICT] {} invalid features: {}", request_id, err);
        error_response(
            StatusCode::BAD_REQUEST,
            ErrorBody::new(ErrorBody::INVALID_FEATURES, err.to_string()),
        )
    } else {
        error!("[MODEL] {} prediction failed: {}", request_id, err);
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorBody::new(ErrorBody::MODEL_FAILED, err.to_string()),
        )
    }
}

fn error_response(status: StatusCode, body: ErrorBody) -> Response {
    (status, Json(body)).into_response()
}

// ============================================================================
// Health Routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/health", get(health_check))
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        model: state.policy.model_info(),
    })
}

// ============================================================================
// Metrics Routes
// ============================================================================

pub fn metrics_routes() -> Router<AppStateArc> {
    Router::new().route("/metrics", get(metrics))
}

async fn metrics(State(state): State<AppStateArc>) -> Response {
    match state.metrics.export() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            error!("Metrics export failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
