//! Worker pool: consumes the dispatch queue and executes jobs.
//!
//! Workers are symmetrical tasks sharing one receiver. A worker never dies
//! because of a single job: executor errors consume an attempt, panics are
//! contained and fail the job permanently, timeouts abort the attempt.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::jobs::executor::ExecutionContext;
use crate::jobs::model::Job;
use crate::jobs::registry::ExecutorRegistry;
use crate::jobs::state::JobState;
use crate::metrics::Metrics;
use crate::services::JobService;

#[derive(Debug, Clone, Copy)]
pub struct WorkerPoolConfig {
    /// Number of concurrent workers.
    pub workers: usize,
    /// Wall-clock bound on a single executor invocation.
    pub job_timeout: Duration,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            job_timeout: Duration::from_secs(10),
        }
    }
}

pub struct WorkerPool {
    service: JobService,
    registry: Arc<ExecutorRegistry>,
    metrics: Arc<Metrics>,
    config: WorkerPoolConfig,
    shutdown: CancellationToken,
}

/// How a finished attempt is fed back into the lifecycle.
enum Outcome {
    Success,
    /// Consumes an attempt; the job may come back as RETRYING.
    Retryable(String),
    /// No attempt accounting: the job goes straight to FAILED.
    Permanent(String),
}

impl WorkerPool {
    pub fn new(
        service: JobService,
        registry: Arc<ExecutorRegistry>,
        metrics: Arc<Metrics>,
        config: WorkerPoolConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            service,
            registry,
            metrics,
            config,
            shutdown,
        }
    }

    /// Spawns the worker tasks over a shared receiver. Returns their join
    /// handles; workers exit once the shutdown token fires or the queue
    /// closes, finishing any in-flight job first.
    pub fn start(self, receiver: mpsc::Receiver<Job>) -> Vec<JoinHandle<()>> {
        let pool = Arc::new(self);
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));

        tracing::info!(workers = pool.config.workers, "worker pool started");

        (0..pool.config.workers)
            .map(|worker_id| {
                let pool = Arc::clone(&pool);
                let receiver = Arc::clone(&receiver);
                tokio::spawn(async move { pool.worker_loop(worker_id, receiver).await })
            })
            .collect()
    }

    async fn worker_loop(
        &self,
        worker_id: usize,
        receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<Job>>>,
    ) {
        tracing::debug!(worker_id, "worker started");

        loop {
            let job = {
                let mut rx = receiver.lock().await;
                tokio::select! {
                    biased;

                    _ = self.shutdown.cancelled() => None,
                    job = rx.recv() => job,
                }
            };

            let Some(job) = job else {
                tracing::debug!(worker_id, "worker stopping");
                return;
            };

            self.metrics.queue_depth.dec();
            self.execute_job(worker_id, job).await;
        }
    }

    async fn execute_job(&self, worker_id: usize, job: Job) {
        tracing::info!(
            worker_id,
            job_id = %job.id,
            job_type = %job.job_type,
            attempt = job.attempt,
            "executing job"
        );

        // The job arrives in SCHEDULED; move it to RUNNING before touching
        // the executor. If this write fails the job is left as-is for
        // crash recovery or operator intervention.
        let job = match self.service.transition_state(&job.id, JobState::Running).await {
            Ok(job) => job,
            Err(e) => {
                tracing::error!(
                    worker_id,
                    job_id = %job.id,
                    error = %e,
                    "failed to transition job to RUNNING, dropping"
                );
                return;
            }
        };

        let executor = match self.registry.get(&job.job_type) {
            Ok(executor) => executor,
            Err(e) => {
                // Retrying cannot conjure a registered executor, so this is
                // a permanent classification.
                tracing::error!(worker_id, job_id = %job.id, job_type = %job.job_type, error = %e, "no executor for job type");
                self.finish(&job, Outcome::Permanent(e.to_string())).await;
                return;
            }
        };

        let ctx = ExecutionContext {
            job_id: job.id.clone(),
            attempt: job.attempt,
            cancellation_token: self.shutdown.child_token(),
        };
        let payload = job.payload.clone();

        // The executor runs in its own task so a panic unwinds there and
        // surfaces as a JoinError instead of killing this worker.
        let mut task = tokio::spawn(async move { executor.execute(ctx, payload.as_ref()).await });

        let started = Instant::now();
        let outcome = match tokio::time::timeout(self.config.job_timeout, &mut task).await {
            Err(_) => {
                task.abort();
                Outcome::Retryable(format!(
                    "execution timed out after {}s",
                    self.config.job_timeout.as_secs()
                ))
            }
            Ok(Ok(Ok(()))) => Outcome::Success,
            Ok(Ok(Err(e))) => Outcome::Retryable(e.to_string()),
            Ok(Err(join_error)) if join_error.is_panic() => {
                Outcome::Permanent(format!("panic: {}", panic_message(join_error.into_panic())))
            }
            Ok(Err(_)) => Outcome::Retryable("executor task cancelled".to_string()),
        };
        let duration = started.elapsed();
        self.metrics.job_duration.observe(duration.as_secs_f64());

        tracing::info!(
            worker_id,
            job_id = %job.id,
            duration_ms = duration.as_millis() as u64,
            success = matches!(outcome, Outcome::Success),
            "job finished"
        );

        self.finish(&job, outcome).await;
    }

    /// Feeds the attempt outcome back through the service and bumps the
    /// terminal counters.
    async fn finish(&self, job: &Job, outcome: Outcome) {
        match outcome {
            Outcome::Success => {
                match self.service.transition_state(&job.id, JobState::Succeeded).await {
                    Ok(_) => self.metrics.jobs_succeeded.inc(),
                    Err(e) => {
                        tracing::error!(job_id = %job.id, error = %e, "failed to mark job SUCCEEDED");
                    }
                }
            }
            Outcome::Permanent(message) => {
                tracing::error!(job_id = %job.id, error = %message, "job failed permanently");
                match self.service.transition_state(&job.id, JobState::Failed).await {
                    Ok(_) => self.metrics.jobs_failed.inc(),
                    Err(e) => {
                        tracing::error!(job_id = %job.id, error = %e, "failed to mark job FAILED");
                    }
                }
            }
            Outcome::Retryable(message) => {
                match self.service.handle_failure(&job.id, &message).await {
                    Ok(updated) => {
                        // RETRYING goes back to the claim pool; only an
                        // exhausted job counts as failed.
                        if updated.state == JobState::Failed {
                            self.metrics.jobs_failed.inc();
                        }
                    }
                    Err(e) => {
                        tracing::error!(job_id = %job.id, error = %e, "failed to record job failure");
                    }
                }
            }
        }
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::executor::{DemoExecutor, Executor};
    use crate::jobs::retry::RetryPolicy;
    use crate::repositories::{InMemoryJobStore, JobStore};
    use async_trait::async_trait;
    use serde_json::Value as JsonValue;

    struct PanickingExecutor;

    #[async_trait]
    impl Executor for PanickingExecutor {
        async fn execute(
            &self,
            _ctx: ExecutionContext,
            _payload: Option<&JsonValue>,
        ) -> anyhow::Result<()> {
            panic!("executor blew up");
        }
    }

    struct SlowExecutor;

    #[async_trait]
    impl Executor for SlowExecutor {
        async fn execute(
            &self,
            _ctx: ExecutionContext,
            _payload: Option<&JsonValue>,
        ) -> anyhow::Result<()> {
            tokio::time::sleep(Duration::from_secs(300)).await;
            Ok(())
        }
    }

    struct Harness {
        service: JobService,
        store: Arc<dyn JobStore>,
        metrics: Arc<Metrics>,
        tx: mpsc::Sender<Job>,
        handles: Vec<JoinHandle<()>>,
        shutdown: CancellationToken,
    }

    fn harness(registry: ExecutorRegistry, job_timeout: Duration) -> Harness {
        let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            max_jitter: Duration::ZERO,
        };
        let service = JobService::new(Arc::clone(&store), policy, 3);
        let metrics = Arc::new(Metrics::new().unwrap());
        let shutdown = CancellationToken::new();

        let (tx, rx) = mpsc::channel(16);
        let pool = WorkerPool::new(
            service.clone(),
            Arc::new(registry),
            Arc::clone(&metrics),
            WorkerPoolConfig {
                workers: 1,
                job_timeout,
            },
            shutdown.clone(),
        );
        let handles = pool.start(rx);

        Harness {
            service,
            store,
            metrics,
            tx,
            handles,
            shutdown,
        }
    }

    impl Harness {
        /// Creates a job, claims it (PENDING -> SCHEDULED), and hands it to
        /// the pool the way the scheduler would.
        async fn submit(&self, job_type: &str) -> String {
            let job = self.service.create(job_type, None).await.unwrap();
            let claimed = self.store.claim_pending(10).await.unwrap();
            let job = claimed.into_iter().find(|j| j.id == job.id).unwrap();
            let id = job.id.clone();
            self.tx.send(job).await.unwrap();
            id
        }

        async fn wait_for_terminal(&self, id: &str) -> Job {
            for _ in 0..200 {
                let job = self.service.get(id).await.unwrap();
                if job.is_terminal() {
                    return job;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            panic!("job {id} never reached a terminal state");
        }

        async fn stop(self) {
            self.shutdown.cancel();
            for handle in self.handles {
                handle.await.unwrap();
            }
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn successful_job_is_marked_succeeded() {
        let mut registry = ExecutorRegistry::new();
        registry.register("demo_job", Arc::new(DemoExecutor::new(Duration::from_millis(20))));
        let harness = harness(registry, Duration::from_secs(5));

        let id = harness.submit("demo_job").await;
        let job = harness.wait_for_terminal(&id).await;

        assert_eq!(job.state, JobState::Succeeded);
        assert_eq!(job.attempt, 1);
        assert!(job.completed_at.is_some());
        assert_eq!(harness.metrics.jobs_succeeded.get(), 1);
        harness.stop().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_executor_fails_permanently() {
        let harness = harness(ExecutorRegistry::new(), Duration::from_secs(5));

        let id = harness.submit("unregistered").await;
        let job = harness.wait_for_terminal(&id).await;

        assert_eq!(job.state, JobState::Failed);
        assert_eq!(job.attempt, 1, "permanent failures consume no retries");
        assert_eq!(harness.metrics.jobs_failed.get(), 1);
        harness.stop().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn panicking_executor_fails_permanently_and_worker_survives() {
        let mut registry = ExecutorRegistry::new();
        registry.register("explosive", Arc::new(PanickingExecutor));
        registry.register("demo_job", Arc::new(DemoExecutor::new(Duration::from_millis(10))));
        let harness = harness(registry, Duration::from_secs(5));

        let panicked = harness.submit("explosive").await;
        let job = harness.wait_for_terminal(&panicked).await;
        assert_eq!(job.state, JobState::Failed);

        // The same (single) worker must still be alive to run this one.
        let ok = harness.submit("demo_job").await;
        let job = harness.wait_for_terminal(&ok).await;
        assert_eq!(job.state, JobState::Succeeded);
        harness.stop().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn timeout_consumes_an_attempt() {
        let mut registry = ExecutorRegistry::new();
        registry.register("slow", Arc::new(SlowExecutor));
        let harness = harness(registry, Duration::from_millis(50));

        let id = harness.submit("slow").await;

        // First attempt times out and the job returns to the claim pool.
        for _ in 0..200 {
            let job = harness.service.get(&id).await.unwrap();
            if job.state == JobState::Retrying {
                assert_eq!(job.attempt, 2);
                assert!(job
                    .last_error
                    .as_deref()
                    .unwrap()
                    .contains("timed out"));
                harness.stop().await;
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job never entered RETRYING after timeout");
    }
}
