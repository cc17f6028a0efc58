//! OpenAPI document definition.

use utoipa::OpenApi;

pub const JOB_TAG: &str = "jobs";
pub const HEALTH_TAG: &str = "health";
pub const METRICS_TAG: &str = "metrics";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Orchestrix API",
        description = "Durable job orchestration: submit jobs, track their lifecycle, cancel them."
    ),
    tags(
        (name = JOB_TAG, description = "Job submission and lifecycle"),
        (name = HEALTH_TAG, description = "Service health"),
        (name = METRICS_TAG, description = "Prometheus metrics")
    )
)]
pub struct ApiDoc;
