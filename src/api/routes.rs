//! Router configuration for the API.

use crate::api::doc::ApiDoc;
use crate::api::handlers;
use crate::api::middleware::{logging_middleware, request_id_middleware};
use crate::state::AppState;
use axum::{middleware, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

/// Creates the main application router with all routes and middleware.
///
/// Middleware is applied in reverse order of declaration (last added runs
/// first): request IDs are assigned before logging so every log line
/// carries one.
///
/// # Routes
/// - `/api/v1/jobs` - submission, lookup, listing, cancellation
/// - `/health` - liveness check
/// - `/metrics` - Prometheus exposition
/// - `/swagger-ui` - interactive API documentation
pub fn create_router(state: AppState) -> Router {
    let api_routes = OpenApiRouter::new().nest("/jobs", handlers::jobs::job_routes());

    let (router, openapi) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api/v1", api_routes)
        .merge(handlers::health::health_routes())
        .merge(handlers::metrics::metrics_routes())
        .split_for_parts();

    router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi.clone()))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            logging_middleware,
        ))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
