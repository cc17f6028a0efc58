//! The `Job` entity: one row in the `jobs` table, one unit of asynchronous
//! work tracked through its lifecycle.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{AppError, AppResult};
use crate::jobs::state::JobState;
use crate::schema::jobs;

/// A unit of work to be executed by the orchestrator.
///
/// Mutated exclusively through the job service; workers and the scheduler
/// never write fields directly.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset, Serialize)]
#[diesel(table_name = jobs)]
#[diesel(treat_none_as_null = true)]
pub struct Job {
    /// ULID, time-ordered and unique.
    pub id: String,
    /// Resolves the executor that performs the work.
    pub job_type: String,
    /// Executor-specific parameters. `None` when the job carries no payload.
    pub payload: Option<JsonValue>,
    pub state: JobState,
    /// Current attempt number, 1-indexed. First retry is attempt 2.
    pub attempt: i32,
    /// Attempts allowed before the job fails permanently. Immutable.
    pub max_attempts: i32,
    /// Message from the most recent failure, replacing older ones.
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Set each time the scheduler claims the job.
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Set when a worker begins executing.
    pub started_at: Option<DateTime<Utc>>,
    /// Set on entry to any terminal state.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Builds a fresh PENDING job on its first attempt.
    pub fn new(
        id: String,
        job_type: String,
        payload: Option<JsonValue>,
        max_attempts: i32,
    ) -> Self {
        Self {
            id,
            job_type,
            payload,
            state: JobState::Pending,
            attempt: 1,
            max_attempts,
            last_error: None,
            created_at: Utc::now(),
            scheduled_at: None,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Whether another attempt remains after a failure.
    pub fn can_retry(&self) -> bool {
        self.attempt < self.max_attempts
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    /// Checks the row-level invariants that must hold after every durable
    /// write. The database CHECK constraints mirror these.
    pub fn validate(&self) -> AppResult<()> {
        if self.id.is_empty() {
            return Err(AppError::Validation {
                field: "id".to_string(),
                reason: "job id is required".to_string(),
            });
        }
        if self.job_type.is_empty() {
            return Err(AppError::Validation {
                field: "type".to_string(),
                reason: "job type is required".to_string(),
            });
        }
        if self.max_attempts < 1 {
            return Err(AppError::Validation {
                field: "max_attempts".to_string(),
                reason: format!("must be at least 1, got {}", self.max_attempts),
            });
        }
        if self.attempt < 1 || self.attempt > self.max_attempts {
            return Err(AppError::Validation {
                field: "attempt".to_string(),
                reason: format!(
                    "must be between 1 and {}, got {}",
                    self.max_attempts, self.attempt
                ),
            });
        }
        if self.is_terminal() && self.completed_at.is_none() {
            return Err(AppError::Validation {
                field: "completed_at".to_string(),
                reason: format!("must be set in terminal state {}", self.state),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Job {
        Job::new(
            "01J0000000000000000000TEST".to_string(),
            "send_email".to_string(),
            Some(json!({"to": "user@example.com"})),
            3,
        )
    }

    #[test]
    fn new_job_defaults() {
        let job = sample();
        assert_eq!(job.state, JobState::Pending);
        assert_eq!(job.attempt, 1);
        assert_eq!(job.max_attempts, 3);
        assert!(job.last_error.is_none());
        assert!(job.scheduled_at.is_none());
        assert!(job.started_at.is_none());
        assert!(job.completed_at.is_none());
        job.validate().unwrap();
    }

    #[test]
    fn can_retry_tracks_attempts() {
        let mut job = sample();
        assert!(job.can_retry());
        job.attempt = 3;
        assert!(!job.can_retry());
    }

    #[test]
    fn validate_rejects_empty_type() {
        let mut job = sample();
        job.job_type = String::new();
        assert!(job.validate().is_err());
    }

    #[test]
    fn validate_rejects_attempt_overflow() {
        let mut job = sample();
        job.attempt = 4;
        assert!(job.validate().is_err());
        job.attempt = 0;
        assert!(job.validate().is_err());
    }

    #[test]
    fn validate_rejects_nonpositive_max_attempts() {
        let mut job = sample();
        job.max_attempts = 0;
        assert!(job.validate().is_err());
    }

    #[test]
    fn validate_requires_completed_at_when_terminal() {
        let mut job = sample();
        job.state = JobState::Succeeded;
        assert!(job.validate().is_err());
        job.completed_at = Some(Utc::now());
        job.validate().unwrap();
    }

    #[test]
    fn record_error_replaces_previous() {
        let mut job = sample();
        job.record_error("first failure");
        job.record_error("second failure");
        assert_eq!(job.last_error.as_deref(), Some("second failure"));
    }
}
