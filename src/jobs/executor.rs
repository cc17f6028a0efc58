//! Executor contract and the reference executors used by the end-to-end
//! tests.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio_util::sync::CancellationToken;

/// Context handed to an executor for a single attempt.
///
/// The cancellation token fires on shutdown or when the attempt's timeout
/// elapses; executors that block for long stretches should honor it.
#[derive(Clone)]
pub struct ExecutionContext {
    pub job_id: String,
    pub attempt: i32,
    pub cancellation_token: CancellationToken,
}

/// A type-specific implementation that performs a job's work.
///
/// Executors must be idempotent: the orchestrator guarantees at-least-once
/// execution, not exactly-once. A returned error consumes an attempt; a
/// panic fails the job permanently.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, ctx: ExecutionContext, payload: Option<&JsonValue>)
        -> anyhow::Result<()>;
}

impl std::fmt::Debug for dyn Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Executor")
    }
}

/// Simulates work by sleeping for a configured duration, or stops early
/// when the context is cancelled.
pub struct DemoExecutor {
    simulated_duration: Duration,
}

impl DemoExecutor {
    pub fn new(simulated_duration: Duration) -> Self {
        Self { simulated_duration }
    }
}

#[async_trait]
impl Executor for DemoExecutor {
    async fn execute(
        &self,
        ctx: ExecutionContext,
        payload: Option<&JsonValue>,
    ) -> anyhow::Result<()> {
        tracing::debug!(job_id = %ctx.job_id, attempt = ctx.attempt, ?payload, "demo executor running");

        tokio::select! {
            _ = tokio::time::sleep(self.simulated_duration) => Ok(()),
            _ = ctx.cancellation_token.cancelled() => {
                anyhow::bail!("execution cancelled")
            }
        }
    }
}

/// Always fails. Exercises the retry and exhaustion paths.
pub struct FailingExecutor;

#[async_trait]
impl Executor for FailingExecutor {
    async fn execute(
        &self,
        _ctx: ExecutionContext,
        _payload: Option<&JsonValue>,
    ) -> anyhow::Result<()> {
        anyhow::bail!("simulated failure")
    }
}
