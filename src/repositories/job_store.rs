use async_trait::async_trait;

use crate::error::AppResult;
use crate::jobs::model::Job;
use crate::jobs::state::JobState;

/// Contract for job persistence backends.
///
/// The one hard primitive is [`claim_pending`](JobStore::claim_pending):
/// two concurrent claimants on the same store must never receive
/// overlapping jobs, and must never block indefinitely on each other
/// (skip, don't wait). Everything else is plain CRUD.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Inserts a new job. Fails with `Duplicate` if the id already exists.
    async fn create(&self, job: &Job) -> AppResult<()>;

    /// Fetches a job by id. Absence is `None`, not an error.
    async fn get_by_id(&self, id: &str) -> AppResult<Option<Job>>;

    /// Partial update of the state column only. Fails with `NotFound` if
    /// the id does not exist.
    async fn update_state(&self, id: &str, state: JobState) -> AppResult<()>;

    /// Full-row update of every column except the id. Fails with
    /// `NotFound` if the id does not exist.
    async fn update(&self, job: &Job) -> AppResult<()>;

    /// Jobs in the given state, oldest `created_at` first. Read-only,
    /// takes no locks.
    async fn list_by_state(&self, state: JobState, limit: i64) -> AppResult<Vec<Job>>;

    /// Removes a job. Test and cleanup paths only.
    async fn delete(&self, id: &str) -> AppResult<()>;

    /// Atomically claims up to `limit` runnable jobs (PENDING or RETRYING):
    /// transitions them to SCHEDULED, stamps `scheduled_at`, and returns
    /// snapshots already reflecting the new state, ordered by
    /// `(created_at, id)` ascending.
    ///
    /// On error nothing is claimed; callers must not assume partial
    /// success.
    async fn claim_pending(&self, limit: i64) -> AppResult<Vec<Job>>;

    /// Crash recovery: rewrites jobs stranded in SCHEDULED or RUNNING by a
    /// previous process back to PENDING so the scheduler picks them up
    /// again. Safe because executors are idempotent by contract. Returns
    /// the number of requeued jobs.
    async fn requeue_interrupted(&self) -> AppResult<usize>;
}
