//! Job business logic: creation, lookups, validated state transitions,
//! failure handling, and cancellation.
//!
//! All lifecycle mutations flow through this service; the scheduler and
//! workers never write job rows directly except through the store's claim
//! primitive.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value as JsonValue;
use tracing::instrument;

use crate::error::{AppError, AppResult};
use crate::jobs::idgen::IdGenerator;
use crate::jobs::model::Job;
use crate::jobs::retry::RetryPolicy;
use crate::jobs::state::{validate_transition, JobState};
use crate::repositories::JobStore;

/// Fallback page size when a caller passes a non-positive limit.
const DEFAULT_LIST_LIMIT: i64 = 10;

#[derive(Clone)]
pub struct JobService {
    store: Arc<dyn JobStore>,
    id_generator: Arc<IdGenerator>,
    retry_policy: RetryPolicy,
    default_max_attempts: i32,
}

impl JobService {
    pub fn new(
        store: Arc<dyn JobStore>,
        retry_policy: RetryPolicy,
        default_max_attempts: i32,
    ) -> Self {
        Self {
            store,
            id_generator: Arc::new(IdGenerator::new()),
            retry_policy,
            default_max_attempts,
        }
    }

    pub fn store(&self) -> Arc<dyn JobStore> {
        Arc::clone(&self.store)
    }

    /// Creates a new PENDING job on attempt 1.
    #[instrument(name = "jobs.create", skip(self, payload), err)]
    pub async fn create(&self, job_type: &str, payload: Option<JsonValue>) -> AppResult<Job> {
        if job_type.is_empty() {
            return Err(AppError::Validation {
                field: "type".to_string(),
                reason: "job type is required".to_string(),
            });
        }

        let job = Job::new(
            self.id_generator.generate(),
            job_type.to_string(),
            payload,
            self.default_max_attempts,
        );
        job.validate()?;

        self.store.create(&job).await?;
        tracing::info!(job_id = %job.id, job_type = %job.job_type, "job created");
        Ok(job)
    }

    /// Fetches a job, turning absence into a `NotFound` error.
    #[instrument(name = "jobs.get", skip(self), err)]
    pub async fn get(&self, id: &str) -> AppResult<Job> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::job_not_found(id))
    }

    /// Jobs in a given state, oldest first. Non-positive limits fall back
    /// to a page of 10.
    pub async fn list_by_state(&self, state: JobState, limit: i64) -> AppResult<Vec<Job>> {
        let limit = if limit <= 0 { DEFAULT_LIST_LIMIT } else { limit };
        self.store.list_by_state(state, limit).await
    }

    /// Applies a validated state transition and its side-effect timestamps,
    /// then persists the full row.
    #[instrument(name = "jobs.transition_state", skip(self), err)]
    pub async fn transition_state(&self, id: &str, new_state: JobState) -> AppResult<Job> {
        let mut job = self.get(id).await?;

        validate_transition(job.state, new_state)?;
        job.state = new_state;

        let now = Utc::now();
        match new_state {
            JobState::Scheduled => job.scheduled_at = Some(now),
            JobState::Running => job.started_at = Some(now),
            JobState::Succeeded | JobState::Failed | JobState::Cancelled => {
                job.completed_at = Some(now)
            }
            _ => {}
        }

        self.store.update(&job).await?;
        Ok(job)
    }

    /// Records a failed attempt: retries if attempts remain, otherwise
    /// fails the job permanently.
    ///
    /// The backoff is computed for telemetry only. RETRYING rows sit until
    /// the scheduler's next claim tick, so the effective retry delay floor
    /// is the poll interval.
    #[instrument(name = "jobs.handle_failure", skip(self, error_message), err)]
    pub async fn handle_failure(&self, id: &str, error_message: &str) -> AppResult<Job> {
        let mut job = self.get(id).await?;
        job.record_error(error_message);

        if job.can_retry() {
            job.attempt += 1;
            job.state = JobState::Retrying;

            let backoff = self.retry_policy.backoff(job.attempt as u32);
            tracing::info!(
                job_id = %job.id,
                attempt = job.attempt,
                max_attempts = job.max_attempts,
                backoff_ms = backoff.as_millis() as u64,
                "job failed, will retry"
            );
        } else {
            job.state = JobState::Failed;
            job.completed_at = Some(Utc::now());
            tracing::warn!(
                job_id = %job.id,
                attempt = job.attempt,
                "job failed permanently, attempts exhausted"
            );
        }

        self.store.update(&job).await?;
        Ok(job)
    }

    /// Cancels a job that has not yet reached a terminal state.
    #[instrument(name = "jobs.cancel", skip(self), err)]
    pub async fn cancel(&self, id: &str) -> AppResult<Job> {
        let mut job = self.get(id).await?;

        if job.is_terminal() {
            return Err(AppError::AlreadyTerminal {
                state: job.state.to_string(),
            });
        }
        validate_transition(job.state, JobState::Cancelled)?;

        job.state = JobState::Cancelled;
        job.completed_at = Some(Utc::now());

        self.store.update(&job).await?;
        tracing::info!(job_id = %job.id, "job cancelled");
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::InMemoryJobStore;
    use serde_json::json;
    use std::time::Duration;

    fn service() -> JobService {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
            max_jitter: Duration::ZERO,
        };
        JobService::new(Arc::new(InMemoryJobStore::new()), policy, 3)
    }

    #[tokio::test]
    async fn create_sets_initial_fields() {
        let service = service();
        let job = service
            .create("send_email", Some(json!({"to": "user@example.com"})))
            .await
            .unwrap();

        assert_eq!(job.state, JobState::Pending);
        assert_eq!(job.attempt, 1);
        assert_eq!(job.max_attempts, 3);
        assert_eq!(job.id.len(), 26);

        let stored = service.get(&job.id).await.unwrap();
        assert_eq!(stored, job);
    }

    #[tokio::test]
    async fn create_rejects_empty_type() {
        let service = service();
        assert!(matches!(
            service.create("", Some(json!({}))).await,
            Err(AppError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let service = service();
        assert!(matches!(
            service.get("01J0MISSING000000000000000").await,
            Err(AppError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn transition_stamps_timestamps() {
        let service = service();
        let job = service.create("demo_job", None).await.unwrap();

        let job = service
            .transition_state(&job.id, JobState::Scheduled)
            .await
            .unwrap();
        assert!(job.scheduled_at.is_some());

        let job = service
            .transition_state(&job.id, JobState::Running)
            .await
            .unwrap();
        assert!(job.started_at.is_some());

        let job = service
            .transition_state(&job.id, JobState::Succeeded)
            .await
            .unwrap();
        assert!(job.completed_at.is_some());
        assert_eq!(job.state, JobState::Succeeded);
    }

    #[tokio::test]
    async fn forbidden_transition_leaves_state_unchanged() {
        let service = service();
        let job = service.create("demo_job", None).await.unwrap();

        let result = service.transition_state(&job.id, JobState::Running).await;
        assert!(matches!(result, Err(AppError::InvalidTransition(_))));

        let unchanged = service.get(&job.id).await.unwrap();
        assert_eq!(unchanged.state, JobState::Pending);
    }

    #[tokio::test]
    async fn handle_failure_retries_until_exhausted() {
        let service = service();
        let job = service.create("failing_job", None).await.unwrap();
        service
            .transition_state(&job.id, JobState::Scheduled)
            .await
            .unwrap();
        service
            .transition_state(&job.id, JobState::Running)
            .await
            .unwrap();

        let job = service.handle_failure(&job.id, "boom 1").await.unwrap();
        assert_eq!(job.state, JobState::Retrying);
        assert_eq!(job.attempt, 2);
        assert_eq!(job.last_error.as_deref(), Some("boom 1"));

        let job = service.handle_failure(&job.id, "boom 2").await.unwrap();
        assert_eq!(job.state, JobState::Retrying);
        assert_eq!(job.attempt, 3);

        let job = service.handle_failure(&job.id, "boom 3").await.unwrap();
        assert_eq!(job.state, JobState::Failed);
        assert_eq!(job.attempt, 3, "attempt never exceeds max_attempts");
        assert_eq!(job.last_error.as_deref(), Some("boom 3"));
        assert!(job.completed_at.is_some());
    }

    #[tokio::test]
    async fn cancel_pending_job() {
        let service = service();
        let job = service.create("demo_job", None).await.unwrap();

        let job = service.cancel(&job.id).await.unwrap();
        assert_eq!(job.state, JobState::Cancelled);
        assert!(job.completed_at.is_some());

        // A second cancel reports the terminal state.
        assert!(matches!(
            service.cancel(&job.id).await,
            Err(AppError::AlreadyTerminal { .. })
        ));
    }

    #[tokio::test]
    async fn list_by_state_defaults_limit() {
        let service = service();
        for _ in 0..12 {
            service.create("demo_job", None).await.unwrap();
        }

        let listed = service.list_by_state(JobState::Pending, 0).await.unwrap();
        assert_eq!(listed.len(), 10);

        let listed = service.list_by_state(JobState::Pending, 20).await.unwrap();
        assert_eq!(listed.len(), 12);
    }
}
