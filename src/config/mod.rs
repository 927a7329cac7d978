//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `AFFECT_LAB` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use affect_lab::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Writing results to {}", config.output.dir.display());
//! ```

mod completion;
mod error;
mod logging;
mod output;

pub use completion::{CompletionConfig, RetryConfig};
pub use error::{ConfigError, ValidationError};
pub use logging::{LogFormat, LoggingConfig};
pub use output::OutputConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults; only the API key must be supplied before a run.
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Completion service (endpoint, key, model, timeout, retry)
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Result output location
    #[serde(default)]
    pub output: OutputConfig,

    /// Log filter and format
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `AFFECT_LAB` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `AFFECT_LAB__COMPLETION__API_KEY=...` -> `completion.api_key = ...`
    /// - `AFFECT_LAB__COMPLETION__RETRY__MAX_ATTEMPTS=5` -> `completion.retry.max_attempts = 5`
    /// - `AFFECT_LAB__OUTPUT__DIR=results` -> `output.dir = results`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("AFFECT_LAB")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate the configuration needed to run experiments
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the API key is missing or any value is out of range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.completion.validate()?;
        self.output.validate()?;
        Ok(())
    }
}
