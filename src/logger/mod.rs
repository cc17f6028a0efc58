//! Logging initialization.
//!
//! Structured logging through `tracing`, configured by the `logger`
//! settings section: a level filter (overridable with `RUST_LOG`) and a
//! text or JSON output format.

use tracing_subscriber::EnvFilter;

use crate::config::error::ConfigError;
use crate::config::LoggerSettings;

/// Installs the global tracing subscriber.
///
/// Fails if a subscriber is already installed, so call it once at process
/// start before any other initialization logs.
pub fn init_logger(settings: &LoggerSettings) -> Result<(), ConfigError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.clone()));

    let result = match settings.format.as_str() {
        "json" => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .try_init(),
        _ => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
    };

    result.map_err(|e| ConfigError::validation(format!("failed to initialize logger: {e}")))
}
