//! PostgreSQL-backed job store.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::pooled_connection::bb8::PooledConnection;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::jobs::model::Job;
use crate::jobs::state::JobState;
use crate::repositories::JobStore;
use crate::schema::jobs;

#[derive(Clone)]
pub struct PostgresJobStore {
    pool: AsyncDbPool,
}

impl PostgresJobStore {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> AppResult<PooledConnection<'_, AsyncPgConnection>> {
        self.pool.get().await.map_err(|e| AppError::ConnectionPool {
            source: anyhow::Error::from(e),
        })
    }
}

#[async_trait]
impl JobStore for PostgresJobStore {
    async fn create(&self, job: &Job) -> AppResult<()> {
        let mut conn = self.conn().await?;

        diesel::insert_into(jobs::table)
            .values(job)
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> AppResult<Option<Job>> {
        let mut conn = self.conn().await?;

        jobs::table
            .find(id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    async fn update_state(&self, id: &str, state: JobState) -> AppResult<()> {
        let mut conn = self.conn().await?;

        let updated = diesel::update(jobs::table.find(id))
            .set(jobs::state.eq(state))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;

        if updated == 0 {
            Err(AppError::job_not_found(id))
        } else {
            Ok(())
        }
    }

    async fn update(&self, job: &Job) -> AppResult<()> {
        let mut conn = self.conn().await?;

        let updated = diesel::update(jobs::table.find(&job.id))
            .set(job)
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;

        if updated == 0 {
            Err(AppError::job_not_found(&job.id))
        } else {
            Ok(())
        }
    }

    async fn list_by_state(&self, state: JobState, limit: i64) -> AppResult<Vec<Job>> {
        let mut conn = self.conn().await?;

        jobs::table
            .filter(jobs::state.eq(state))
            .order(jobs::created_at.asc())
            .limit(limit)
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let mut conn = self.conn().await?;

        let deleted = diesel::delete(jobs::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;

        if deleted == 0 {
            Err(AppError::job_not_found(id))
        } else {
            Ok(())
        }
    }

    /// Claims runnable jobs inside a single transaction.
    ///
    /// `FOR UPDATE SKIP LOCKED` is what lets concurrent schedulers make
    /// progress against the same table: rows locked by another claimant
    /// are skipped rather than waited on, so two claim calls can never
    /// return overlapping jobs and never block each other. The locks (and
    /// any partial work) release on rollback if the update fails.
    async fn claim_pending(&self, limit: i64) -> AppResult<Vec<Job>> {
        let mut conn = self.conn().await?;

        let mut claimed = conn
            .transaction::<Vec<Job>, diesel::result::Error, _>(|conn| {
                async move {
                    let candidate_ids: Vec<String> = jobs::table
                        .select(jobs::id)
                        .filter(jobs::state.eq_any([JobState::Pending, JobState::Retrying]))
                        .order((jobs::created_at.asc(), jobs::id.asc()))
                        .limit(limit)
                        .for_update()
                        .skip_locked()
                        .load(conn)
                        .await?;

                    if candidate_ids.is_empty() {
                        return Ok(Vec::new());
                    }

                    diesel::update(jobs::table.filter(jobs::id.eq_any(&candidate_ids)))
                        .set((
                            jobs::state.eq(JobState::Scheduled),
                            jobs::scheduled_at.eq(Utc::now()),
                        ))
                        .get_results(conn)
                        .await
                }
                .scope_boxed()
            })
            .await
            .map_err(AppError::from)?;

        // RETURNING does not guarantee row order; restore the claim order.
        claimed.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok(claimed)
    }

    async fn requeue_interrupted(&self) -> AppResult<usize> {
        let mut conn = self.conn().await?;

        diesel::update(
            jobs::table.filter(jobs::state.eq_any([JobState::Scheduled, JobState::Running])),
        )
        .set(jobs::state.eq(JobState::Pending))
        .execute(&mut conn)
        .await
        .map_err(AppError::from)
    }
}
