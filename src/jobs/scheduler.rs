//! Claim-and-dispatch scheduler.
//!
//! A single long-running task on a fixed tick. Each tick atomically claims
//! a batch of runnable jobs through the store and publishes them on the
//! bounded dispatch queue for the worker pool.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::jobs::model::Job;
use crate::metrics::Metrics;
use crate::repositories::JobStore;

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Claim tick interval.
    pub poll_interval: Duration,
    /// Maximum jobs claimed per tick.
    pub batch_size: i64,
    /// How long a bounded send into the dispatch queue may block before
    /// the job is abandoned to crash recovery.
    pub dispatch_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            batch_size: 10,
            dispatch_timeout: Duration::from_secs(5),
        }
    }
}

pub struct Scheduler {
    store: Arc<dyn JobStore>,
    config: SchedulerConfig,
    dispatch_tx: mpsc::Sender<Job>,
    metrics: Arc<Metrics>,
    shutdown: CancellationToken,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn JobStore>,
        config: SchedulerConfig,
        dispatch_tx: mpsc::Sender<Job>,
        metrics: Arc<Metrics>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            store,
            config,
            dispatch_tx,
            metrics,
            shutdown,
        }
    }

    /// Spawns the scheduling loop. The task exits on shutdown; jobs already
    /// moved to SCHEDULED are not unclaimed on the way out.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        tracing::info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            batch_size = self.config.batch_size,
            "scheduler started"
        );

        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => {
                    tracing::info!("scheduler stopping");
                    break;
                }
                _ = ticker.tick() => {
                    self.poll_and_dispatch().await;
                }
            }
        }
    }

    /// One tick: claim a batch, hand each job to the workers.
    ///
    /// Claim errors are logged and the tick ends; the next tick retries.
    async fn poll_and_dispatch(&self) {
        let jobs = match self.store.claim_pending(self.config.batch_size).await {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::error!(error = %e, "failed to claim pending jobs");
                return;
            }
        };

        if jobs.is_empty() {
            return;
        }
        tracing::debug!(count = jobs.len(), "claimed jobs for dispatch");

        for job in jobs {
            let job_id = job.id.clone();
            let job_type = job.job_type.clone();

            match self
                .dispatch_tx
                .send_timeout(job, self.config.dispatch_timeout)
                .await
            {
                Ok(()) => {
                    self.metrics.queue_depth.inc();
                    tracing::debug!(job_id = %job_id, job_type = %job_type, "job dispatched");
                }
                Err(SendTimeoutError::Timeout(_)) => {
                    // The job stays SCHEDULED; startup crash recovery will
                    // requeue it if no worker ever picks it up.
                    tracing::warn!(
                        job_id = %job_id,
                        "dispatch queue full, abandoning job"
                    );
                }
                Err(SendTimeoutError::Closed(_)) => {
                    tracing::warn!(job_id = %job_id, "dispatch queue closed, dropping job");
                    return;
                }
            }
        }
    }
}
