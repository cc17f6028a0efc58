//! Job submission and lifecycle request handlers.

use crate::api::doc::JOB_TAG;
use crate::api::dto::{CreateJobRequest, JobResponse, ListJobsParams, ListJobsResponse};
use crate::error::{AppError, AppResult};
use crate::jobs::state::JobState;
use crate::state::AppState;
use crate::utils::validate::ValidatedJson;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Creates job-related routes.
pub fn job_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_jobs, create_job))
        .routes(routes!(get_job, cancel_job))
}

/// POST /api/v1/jobs - Submit a new job
#[utoipa::path(
    post,
    path = "/",
    tag = JOB_TAG,
    request_body = CreateJobRequest,
    responses(
        (status = 201, description = "Job created", body = JobResponse),
        (status = 400, description = "Missing type or malformed payload")
    )
)]
async fn create_job(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateJobRequest>,
) -> AppResult<(StatusCode, Json<JobResponse>)> {
    let job = state.services.jobs.create(&req.job_type, req.payload).await?;
    state.metrics.jobs_created.inc();
    Ok((StatusCode::CREATED, Json(JobResponse::from(job))))
}

/// GET /api/v1/jobs/{id} - Get job by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = JOB_TAG,
    params(
        ("id" = String, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job found", body = JobResponse),
        (status = 404, description = "Job not found")
    )
)]
async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<JobResponse>> {
    let job = state.services.jobs.get(&id).await?;
    Ok(Json(JobResponse::from(job)))
}

/// GET /api/v1/jobs - List jobs by state
#[utoipa::path(
    get,
    path = "/",
    tag = JOB_TAG,
    params(ListJobsParams),
    responses(
        (status = 200, description = "Jobs in the requested state", body = ListJobsResponse),
        (status = 400, description = "Unknown state")
    )
)]
async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<ListJobsParams>,
) -> AppResult<Json<ListJobsResponse>> {
    let job_state = match params.state.as_deref() {
        None | Some("") => JobState::Pending,
        Some(value) => value.parse().map_err(|e: crate::jobs::state::ParseJobStateError| {
            AppError::BadRequest {
                message: e.to_string(),
            }
        })?,
    };
    let limit = params.limit.unwrap_or(10);

    let jobs = state.services.jobs.list_by_state(job_state, limit).await?;
    let jobs: Vec<JobResponse> = jobs.into_iter().map(JobResponse::from).collect();

    Ok(Json(ListJobsResponse {
        total: jobs.len(),
        jobs,
    }))
}

/// DELETE /api/v1/jobs/{id} - Cancel a job
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = JOB_TAG,
    params(
        ("id" = String, Path, description = "Job ID")
    ),
    responses(
        (status = 204, description = "Job cancelled"),
        (status = 400, description = "Job already terminal"),
        (status = 404, description = "Job not found")
    )
)]
async fn cancel_job(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<StatusCode> {
    state.services.jobs.cancel(&id).await?;
    state.metrics.jobs_cancelled.inc();
    Ok(StatusCode::NO_CONTENT)
}
