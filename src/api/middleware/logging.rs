//! Logging middleware for request/response tracing.
//!
//! Logs requests and responses with timing, correlated by request ID, and
//! feeds the per-endpoint HTTP request counter.

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::info;

use super::RequestId;
use crate::state::AppState;

/// Logs request/response information and records `http_requests_total`.
///
/// The counter's endpoint label uses the matched route pattern (e.g.
/// `/api/v1/jobs/{id}`) rather than the concrete URI, keeping label
/// cardinality bounded.
pub async fn logging_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_else(|| "unknown".to_string());

    info!(
        method = %method,
        path = %uri.path(),
        request_id = %request_id,
        "Request received"
    );

    let start = Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed();

    state
        .metrics
        .http_requests
        .with_label_values(&[
            method.as_str(),
            endpoint.as_str(),
            response.status().as_str(),
        ])
        .inc();

    info!(
        status = %response.status().as_u16(),
        duration_ms = %duration.as_millis(),
        request_id = %request_id,
        "Response sent"
    );

    response
}
