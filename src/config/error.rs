//! Configuration error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration value: {0}")]
    ValidationError(String),

    #[error("{0}")]
    MutualExclusivityError(String),
}

impl ConfigError {
    pub fn file_not_found(message: impl Into<String>) -> Self {
        ConfigError::FileNotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ConfigError::ValidationError(message.into())
    }

    pub fn mutual_exclusivity(message: impl Into<String>) -> Self {
        ConfigError::MutualExclusivityError(message.into())
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(error: config::ConfigError) -> Self {
        ConfigError::ParseError(error.to_string())
    }
}
