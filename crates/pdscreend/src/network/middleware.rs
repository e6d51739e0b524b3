//! Request middleware for body limits

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::warn;

/// Default maximum body size: 64 KiB
pub const MAX_BODY_SIZE: usize = 64 * 1024;

/// Body size limit, carried as middleware state
#[derive(Debug, Clone, Copy)]
pub struct BodyLimit(pub usize);

impl Default for BodyLimit {
    fn default() -> Self {
        Self(MAX_BODY_SIZE)
    }
}

/// Body size limit middleware
///
/// Checks the Content-Length header and rejects requests over the limit
/// before the body is read. Chunked bodies are capped by `DefaultBodyLimit`
/// on the router.
pub async fn body_size_limit(
    State(limit): State<BodyLimit>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if let Some(length) = content_length(&request) {
        if length > limit.0 {
            warn!(
                "Request body too large: {} bytes (max: {})",
                length, limit.0
            );
            return Err(StatusCode::PAYLOAD_TOO_LARGE);
        }
    }

    Ok(next.run(request).await)
}

fn content_length(request: &Request) -> Option<usize> {
    request
        .headers()
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse::<usize>()
        .ok()
}
