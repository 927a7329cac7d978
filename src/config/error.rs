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
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid completion base URL: must start with http:// or https://")]
    InvalidBaseUrl,

    #[error("Invalid request timeout (must be 1-300 seconds)")]
    InvalidTimeout,

    #[error("Invalid retry attempts (must be 1-10)")]
    InvalidRetryAttempts,

    #[error("Retry base delay exceeds max delay")]
    InvalidRetryDelay,

    #[error("Output directory must not be empty")]
    EmptyOutputDir,
}
