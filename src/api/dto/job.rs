//! Job-related DTOs.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::jobs::model::Job;

/// Request body for submitting a job.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[schema(example = json!({
    "type": "demo_job",
    "payload": {
        "message": "test"
    }
}))]
pub struct CreateJobRequest {
    /// Job type, used to resolve an executor.
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 100, message = "Job type must be between 1 and 100 characters"))]
    #[schema(example = "demo_job")]
    pub job_type: String,

    /// Executor-specific parameters.
    #[schema(value_type = Option<Object>, example = json!({"message": "test"}))]
    pub payload: Option<JsonValue>,
}

/// Query parameters for listing jobs.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListJobsParams {
    /// Lifecycle state filter. Defaults to PENDING.
    #[param(example = "PENDING")]
    pub state: Option<String>,

    /// Maximum number of jobs to return. Defaults to 10.
    #[param(example = 10)]
    pub limit: Option<i64>,
}

/// A job in API responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct JobResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub state: String,
    pub attempt: i32,
    pub max_attempts: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            job_type: job.job_type,
            state: job.state.to_string(),
            attempt: job.attempt,
            max_attempts: job.max_attempts,
            last_error: job.last_error,
            created_at: format_timestamp(job.created_at),
            scheduled_at: job.scheduled_at.map(format_timestamp),
            started_at: job.started_at.map(format_timestamp),
            completed_at: job.completed_at.map(format_timestamp),
        }
    }
}

/// Response body for job listings.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListJobsResponse {
    pub jobs: Vec<JobResponse>,
    pub total: usize,
}
