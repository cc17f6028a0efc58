//! Server lifecycle: initialization, startup, and graceful shutdown.
//!
//! Startup order matters: crash recovery runs before the scheduler's first
//! tick so jobs stranded by an abnormal shutdown re-enter the claim pool,
//! and the executor registry is frozen before any worker can receive work.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::api::routes::create_router;
use crate::config::{Environment, Settings};
use crate::db::establish_async_connection_pool;
use crate::jobs::executor::{DemoExecutor, FailingExecutor};
use crate::jobs::registry::ExecutorRegistry;
use crate::jobs::scheduler::Scheduler;
use crate::jobs::worker::WorkerPool;
use crate::metrics::Metrics;
use crate::repositories::{JobStore, PostgresJobStore};
use crate::services::{JobService, Services};
use crate::state::AppState;

/// HTTP server and orchestration runtime manager.
pub struct Server {
    settings: Settings,
}

impl Server {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    fn log_startup_config(&self) {
        tracing::info!(
            app_name = %self.settings.application.name,
            app_version = %self.settings.application.version,
            environment = %Environment::from_env(),
            "Application starting"
        );

        tracing::info!(
            host = %self.settings.server.host,
            port = %self.settings.server.port,
            poll_interval_ms = self.settings.scheduler.poll_interval_ms,
            batch_size = self.settings.scheduler.batch_size,
            workers = self.settings.worker.count,
            job_timeout_secs = self.settings.worker.job_timeout_secs,
            "Configuration loaded"
        );
    }

    /// Registers the executors shipped with the service.
    ///
    /// The registry is consumed into an `Arc` afterwards and stays
    /// read-only for the life of the process.
    fn build_registry() -> ExecutorRegistry {
        let mut registry = ExecutorRegistry::new();
        registry.register("demo_job", Arc::new(DemoExecutor::new(Duration::from_secs(1))));
        registry.register("failing_job", Arc::new(FailingExecutor));
        registry
    }

    /// Start the server and run until a shutdown signal arrives.
    pub async fn run(self) -> anyhow::Result<()> {
        self.log_startup_config();

        tracing::info!("Initializing database connection pool...");
        let pool = establish_async_connection_pool(&self.settings.database).await?;
        tracing::info!("Database connection pool initialized");

        let store: Arc<dyn JobStore> = Arc::new(PostgresJobStore::new(pool));

        // Jobs left SCHEDULED or RUNNING by a crashed process have no live
        // worker; put them back in the claim pool before polling begins.
        let requeued = store.requeue_interrupted().await?;
        if requeued > 0 {
            tracing::warn!(count = requeued, "requeued jobs interrupted by previous shutdown");
        }

        let service = JobService::new(
            Arc::clone(&store),
            self.settings.retry.to_retry_policy(),
            self.settings.retry.max_attempts,
        );

        let registry = Arc::new(Self::build_registry());
        tracing::info!(types = ?registry.registered_types(), "Registered executors");

        let metrics = Arc::new(Metrics::new()?);
        let shutdown = CancellationToken::new();

        let (dispatch_tx, dispatch_rx) = mpsc::channel(self.settings.scheduler.queue_capacity);

        let scheduler = Scheduler::new(
            Arc::clone(&store),
            self.settings.scheduler.to_scheduler_config(),
            dispatch_tx,
            Arc::clone(&metrics),
            shutdown.clone(),
        );
        let scheduler_handle = scheduler.start();

        let worker_pool = WorkerPool::new(
            service.clone(),
            registry,
            Arc::clone(&metrics),
            self.settings.worker.to_worker_pool_config(),
            shutdown.clone(),
        );
        let worker_handles = worker_pool.start(dispatch_rx);

        let state = AppState::new(Services::new(service), metrics);
        let router = create_router(state);
        tracing::info!("Router configured");

        let address = self.settings.server.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, address = %address, "Failed to bind to address");
            anyhow::anyhow!("Failed to bind to {}: {}", address, e)
        })?;
        tracing::info!(address = %format!("http://{address}"), "Server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        // HTTP is down; stop the orchestration runtime. The scheduler exits
        // on its next select, workers finish their in-flight job first.
        tracing::info!("Stopping scheduler and worker pool");
        shutdown.cancel();

        if let Err(e) = scheduler_handle.await {
            tracing::error!(error = %e, "scheduler task join error");
        }
        for handle in worker_handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "worker task join error");
            }
        }

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
