//! Configuration management.
//!
//! Layered loading with support for TOML files and environment variable
//! overrides:
//!
//! 1. `default.toml` - base defaults (optional; serde defaults apply)
//! 2. `{environment}.toml` - environment-specific configuration
//! 3. `local.toml` - local overrides (not committed)
//! 4. `ORCHESTRIX_*` environment variables (highest priority)

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;

pub use environment::Environment;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use settings::{
    DatabaseConfig, LoggerSettings, RetrySettings, SchedulerSettings, ServerConfig, Settings,
    WorkerSettings,
};
