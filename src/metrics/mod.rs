//! Prometheus metrics for the orchestrator.
//!
//! Each [`Metrics`] instance owns its own registry, so tests can build as
//! many as they like without duplicate-registration panics. All metric
//! handles use interior mutability and are cheap to clone.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    /// Jobs accepted through the submission facade.
    pub jobs_created: IntCounter,
    /// Jobs that reached SUCCEEDED.
    pub jobs_succeeded: IntCounter,
    /// Jobs that reached FAILED (attempts exhausted or permanent failure).
    pub jobs_failed: IntCounter,
    /// Jobs cancelled through the facade.
    pub jobs_cancelled: IntCounter,
    /// Executor wall time, observed on every terminal transition out of
    /// RUNNING.
    pub job_duration: Histogram,
    /// Current number of jobs sitting in the dispatch queue.
    pub queue_depth: IntGauge,
    /// HTTP requests by method, endpoint, and status.
    pub http_requests: IntCounterVec,
}

impl Metrics {
    pub fn new() -> AppResult<Self> {
        let registry = Registry::new();

        let jobs_created = IntCounter::with_opts(Opts::new(
            "orchestrix_jobs_created_total",
            "Total number of jobs created",
        ))
        .map_err(Self::registration_error)?;

        let jobs_succeeded = IntCounter::with_opts(Opts::new(
            "orchestrix_jobs_succeeded_total",
            "Total number of jobs that succeeded",
        ))
        .map_err(Self::registration_error)?;

        let jobs_failed = IntCounter::with_opts(Opts::new(
            "orchestrix_jobs_failed_total",
            "Total number of jobs that failed",
        ))
        .map_err(Self::registration_error)?;

        let jobs_cancelled = IntCounter::with_opts(Opts::new(
            "orchestrix_jobs_cancelled_total",
            "Total number of jobs cancelled",
        ))
        .map_err(Self::registration_error)?;

        let job_duration = Histogram::with_opts(HistogramOpts::new(
            "orchestrix_job_duration_seconds",
            "Job execution duration in seconds",
        ))
        .map_err(Self::registration_error)?;

        let queue_depth = IntGauge::with_opts(Opts::new(
            "orchestrix_queue_depth",
            "Current number of jobs in the dispatch queue",
        ))
        .map_err(Self::registration_error)?;

        let http_requests = IntCounterVec::new(
            Opts::new(
                "orchestrix_http_requests_total",
                "Total HTTP requests by endpoint and status",
            ),
            &["method", "endpoint", "status"],
        )
        .map_err(Self::registration_error)?;

        registry
            .register(Box::new(jobs_created.clone()))
            .and_then(|_| registry.register(Box::new(jobs_succeeded.clone())))
            .and_then(|_| registry.register(Box::new(jobs_failed.clone())))
            .and_then(|_| registry.register(Box::new(jobs_cancelled.clone())))
            .and_then(|_| registry.register(Box::new(job_duration.clone())))
            .and_then(|_| registry.register(Box::new(queue_depth.clone())))
            .and_then(|_| registry.register(Box::new(http_requests.clone())))
            .map_err(Self::registration_error)?;

        Ok(Self {
            registry,
            jobs_created,
            jobs_succeeded,
            jobs_failed,
            jobs_cancelled,
            job_duration,
            queue_depth,
            http_requests,
        })
    }

    fn registration_error(error: prometheus::Error) -> AppError {
        AppError::Internal {
            source: anyhow::Error::from(error),
        }
    }

    /// Renders all metrics in the Prometheus text exposition format.
    pub fn encode_text(&self) -> AppResult<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;
        String::from_utf8(buffer).map_err(|e| AppError::Internal {
            source: anyhow::Error::from(e),
        })
    }
}
