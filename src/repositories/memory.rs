//! In-memory job store.
//!
//! Implements the full [`JobStore`] contract over a mutex-guarded map. The
//! claim is atomic because the whole operation runs under one lock, which
//! satisfies the disjointness guarantee the same way row locks do in
//! Postgres. Used by the end-to-end test suite and handy for local
//! experiments without a database.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{AppError, AppResult};
use crate::jobs::model::Job;
use crate::jobs::state::JobState;
use crate::repositories::JobStore;

#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: Mutex<HashMap<String, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Job>> {
        self.jobs.lock().expect("job store mutex poisoned")
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, job: &Job) -> AppResult<()> {
        let mut jobs = self.lock();
        if jobs.contains_key(&job.id) {
            return Err(AppError::Duplicate {
                entity: "jobs".to_string(),
                field: "id".to_string(),
                value: job.id.clone(),
            });
        }
        jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> AppResult<Option<Job>> {
        Ok(self.lock().get(id).cloned())
    }

    async fn update_state(&self, id: &str, state: JobState) -> AppResult<()> {
        let mut jobs = self.lock();
        match jobs.get_mut(id) {
            Some(job) => {
                job.state = state;
                Ok(())
            }
            None => Err(AppError::job_not_found(id)),
        }
    }

    async fn update(&self, job: &Job) -> AppResult<()> {
        let mut jobs = self.lock();
        if !jobs.contains_key(&job.id) {
            return Err(AppError::job_not_found(&job.id));
        }
        jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn list_by_state(&self, state: JobState, limit: i64) -> AppResult<Vec<Job>> {
        let jobs = self.lock();
        let mut matching: Vec<Job> = jobs
            .values()
            .filter(|job| job.state == state)
            .cloned()
            .collect();
        matching.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        matching.truncate(limit.max(0) as usize);
        Ok(matching)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let mut jobs = self.lock();
        if jobs.remove(id).is_none() {
            return Err(AppError::job_not_found(id));
        }
        Ok(())
    }

    async fn claim_pending(&self, limit: i64) -> AppResult<Vec<Job>> {
        let mut jobs = self.lock();

        let mut candidate_ids: Vec<(chrono::DateTime<Utc>, String)> = jobs
            .values()
            .filter(|job| matches!(job.state, JobState::Pending | JobState::Retrying))
            .map(|job| (job.created_at, job.id.clone()))
            .collect();
        candidate_ids.sort();
        candidate_ids.truncate(limit.max(0) as usize);

        let now = Utc::now();
        let mut claimed = Vec::with_capacity(candidate_ids.len());
        for (_, id) in candidate_ids {
            let job = jobs.get_mut(&id).expect("candidate id disappeared");
            job.state = JobState::Scheduled;
            job.scheduled_at = Some(now);
            claimed.push(job.clone());
        }
        Ok(claimed)
    }

    async fn requeue_interrupted(&self) -> AppResult<usize> {
        let mut jobs = self.lock();
        let mut requeued = 0;
        for job in jobs.values_mut() {
            if matches!(job.state, JobState::Scheduled | JobState::Running) {
                job.state = JobState::Pending;
                requeued += 1;
            }
        }
        Ok(requeued)
    }
}
