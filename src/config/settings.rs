//! Configuration settings structures.
//!
//! Every field carries a serde default so the service starts with an empty
//! configuration directory; files and `ORCHESTRIX_*` variables only
//! override what they name.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::jobs::retry::RetryPolicy;
use crate::jobs::scheduler::SchedulerConfig;
use crate::jobs::worker::WorkerPoolConfig;

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "orchestrix".to_string()
}

fn default_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_batch_size() -> i64 {
    10
}

fn default_queue_capacity() -> usize {
    100
}

fn default_dispatch_timeout_ms() -> u64 {
    5000
}

fn default_worker_count() -> usize {
    5
}

fn default_job_timeout_secs() -> u64 {
    10
}

fn default_base_delay_ms() -> u64 {
    2000
}

fn default_max_delay_ms() -> u64 {
    300_000
}

fn default_max_jitter_ms() -> u64 {
    1000
}

fn default_max_attempts() -> i32 {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

// ============================================================================
// Sections
// ============================================================================

/// Application identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default = "default_app_name")]
    pub name: String,

    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// Full bind address as "host:port".
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Diesel connection pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds.
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,

    /// Run pending migrations on startup.
    #[serde(default)]
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout: default_connection_timeout(),
            auto_migrate: false,
        }
    }
}

/// Claim scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerSettings {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_batch_size")]
    pub batch_size: i64,

    /// Dispatch queue capacity shared with the worker pool.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(default = "default_dispatch_timeout_ms")]
    pub dispatch_timeout_ms: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            batch_size: default_batch_size(),
            queue_capacity: default_queue_capacity(),
            dispatch_timeout_ms: default_dispatch_timeout_ms(),
        }
    }
}

impl SchedulerSettings {
    pub fn to_scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            batch_size: self.batch_size,
            dispatch_timeout: Duration::from_millis(self.dispatch_timeout_ms),
        }
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSettings {
    #[serde(default = "default_worker_count")]
    pub count: usize,

    #[serde(default = "default_job_timeout_secs")]
    pub job_timeout_secs: u64,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            count: default_worker_count(),
            job_timeout_secs: default_job_timeout_secs(),
        }
    }
}

impl WorkerSettings {
    pub fn to_worker_pool_config(&self) -> WorkerPoolConfig {
        WorkerPoolConfig {
            workers: self.count,
            job_timeout: Duration::from_secs(self.job_timeout_secs),
        }
    }
}

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_max_jitter_ms")]
    pub max_jitter_ms: u64,

    /// Default attempt budget for newly created jobs.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_jitter_ms: default_max_jitter_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl RetrySettings {
    pub fn to_retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            max_jitter: Duration::from_millis(self.max_jitter_ms),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// One of: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// One of: text, json.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Root settings structure.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub scheduler: SchedulerSettings,

    #[serde(default)]
    pub worker: WorkerSettings,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub logger: LoggerSettings,
}

impl Settings {
    /// Checks cross-field constraints that serde defaults cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::validation("server.port must be non-zero"));
        }
        if self.scheduler.batch_size < 1 {
            return Err(ConfigError::validation(
                "scheduler.batch_size must be at least 1",
            ));
        }
        if self.scheduler.queue_capacity == 0 {
            return Err(ConfigError::validation(
                "scheduler.queue_capacity must be at least 1",
            ));
        }
        if self.scheduler.poll_interval_ms == 0 {
            return Err(ConfigError::validation(
                "scheduler.poll_interval_ms must be positive",
            ));
        }
        if self.worker.count == 0 {
            return Err(ConfigError::validation("worker.count must be at least 1"));
        }
        if self.worker.job_timeout_secs == 0 {
            return Err(ConfigError::validation(
                "worker.job_timeout_secs must be positive",
            ));
        }
        if self.retry.max_attempts < 1 {
            return Err(ConfigError::validation(
                "retry.max_attempts must be at least 1",
            ));
        }
        match self.logger.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::validation(format!(
                    "logger.level must be one of trace|debug|info|warn|error, got '{other}'"
                )));
            }
        }
        match self.logger.format.as_str() {
            "text" | "json" => {}
            other => {
                return Err(ConfigError::validation(format!(
                    "logger.format must be 'text' or 'json', got '{other}'"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        settings.validate().unwrap();

        assert_eq!(settings.server.address(), "127.0.0.1:8080");
        assert_eq!(settings.scheduler.batch_size, 10);
        assert_eq!(settings.worker.count, 5);
        assert_eq!(settings.retry.max_attempts, 3);
    }

    #[test]
    fn conversion_to_runtime_configs() {
        let settings = Settings::default();

        let scheduler = settings.scheduler.to_scheduler_config();
        assert_eq!(scheduler.poll_interval, Duration::from_secs(1));
        assert_eq!(scheduler.dispatch_timeout, Duration::from_secs(5));

        let workers = settings.worker.to_worker_pool_config();
        assert_eq!(workers.workers, 5);
        assert_eq!(workers.job_timeout, Duration::from_secs(10));

        let retry = settings.retry.to_retry_policy();
        assert_eq!(retry.base_delay, Duration::from_secs(2));
        assert_eq!(retry.max_delay, Duration::from_secs(300));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.worker.count = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.logger.format = "xml".to_string();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.scheduler.batch_size = 0;
        assert!(settings.validate().is_err());
    }
}
