//! Prometheus metrics endpoint.

use crate::api::doc::METRICS_TAG;
use crate::error::AppResult;
use crate::state::AppState;
use axum::extract::State;
use axum::http::header;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Creates the metrics exposition route.
pub fn metrics_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(metrics))
}

/// GET /metrics - Prometheus text exposition
#[utoipa::path(
    get,
    path = "/metrics",
    responses(
        (status = 200, description = "Metrics in Prometheus text format", content_type = "text/plain")
    ),
    tag = METRICS_TAG
)]
pub async fn metrics(
    State(state): State<AppState>,
) -> AppResult<([(header::HeaderName, &'static str); 1], String)> {
    let body = state.metrics.encode_text()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}
