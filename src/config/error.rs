//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Invalid matching options: {0}")]
    InvalidMatching(String),

    #[error("Transfer concurrency must be between 1 and {max}, got {actual}")]
    InvalidConcurrency { max: usize, actual: usize },

    #[error("Transfer max_attempts must be at least 1")]
    InvalidAttempts,

    #[error("initial_backoff_ms exceeds max_backoff_ms")]
    InvalidBackoff,

    #[error("Unknown log format '{0}'")]
    InvalidLogFormat(String),
}
