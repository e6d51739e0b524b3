//! HTTP server for pdscreend

use crate::config::ServerConfig;
use crate::network::{body_size_limit, BodyLimit, PredictionMetrics};
use crate::routes;
use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::{middleware, Router};
use pdscreen_common::DecisionPolicy;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers
pub struct AppState {
    /// Read-only after startup; the model inside is shared by every request
    pub policy: DecisionPolicy,
    pub metrics: PredictionMetrics,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(policy: DecisionPolicy, metrics: PredictionMetrics) -> Self {
        Self {
            policy,
            metrics,
            start_time: Instant::now(),
        }
    }
}

/// Assemble the router with all routes and layers
pub fn build_router(state: Arc<AppState>, config: &ServerConfig) -> Result<Router> {
    let app = Router::new()
        .merge(routes::predict_routes())
        .merge(routes::health_routes())
        .merge(routes::metrics_routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(middleware::from_fn_with_state(
            BodyLimit(config.max_body_bytes),
            body_size_limit,
        ))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(cors_layer(&config.allowed_origins)?)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.is_empty() {
        return Ok(layer.allow_origin(Any));
    }

    let origins = origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin '{}'", o))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(layer.allow_origin(origins))
}

/// Run the HTTP server
pub async fn run(state: AppState, config: &ServerConfig) -> Result<()> {
    let state = Arc::new(state);
    let app = build_router(state, config)?;

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("[BOOT] Listening on http://{}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down gracefully");
    }
}
