//! Completion service configuration

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::ai::DEFAULT_BASE_URL;
use crate::application::RetryPolicy;
use crate::domain::experiment::DEFAULT_MODEL;

/// Completion service configuration
#[derive(Debug, Deserialize)]
pub struct CompletionConfig {
    /// API key for the OpenAI-compatible endpoint
    pub api_key: Option<SecretString>,

    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used by presets unless overridden
    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Rate-limit retry settings
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Rate-limit retry settings
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total calls per turn, first attempt included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial backoff in milliseconds when no retry-after is given
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound on any single wait, in seconds
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
}

impl CompletionConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if an API key is configured
    pub fn has_api_key(&self) -> bool {
        use secrecy::ExposeSecret;
        self.api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().is_empty())
    }

    /// Validate completion configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_api_key() {
            return Err(ValidationError::MissingRequired("AFFECT_LAB__COMPLETION__API_KEY"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidBaseUrl);
        }

        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }

        self.retry.validate()
    }
}

impl RetryConfig {
    /// Validate retry settings
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_attempts == 0 || self.max_attempts > 10 {
            return Err(ValidationError::InvalidRetryAttempts);
        }
        if Duration::from_millis(self.base_delay_ms) > Duration::from_secs(self.max_delay_secs) {
            return Err(ValidationError::InvalidRetryDelay);
        }
        Ok(())
    }

    /// Convert to the runner's retry policy
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.base_delay_ms),
            Duration::from_secs(self.max_delay_secs),
        )
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout(),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_secs() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_key() -> CompletionConfig {
        CompletionConfig {
            api_key: Some(SecretString::new("gsk_test".to_string())),
            ..Default::default()
        }
    }

    #[test]
    fn test_completion_config_defaults() {
        let config = CompletionConfig::default();
        assert_eq!(config.base_url, "https://api.groq.com/openai/v1");
        assert_eq!(config.model, "llama3-8b-8192");
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_timeout_duration() {
        let config = CompletionConfig {
            timeout_secs: 15,
            ..Default::default()
        };
        assert_eq!(config.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_validation_requires_api_key() {
        assert_eq!(
            CompletionConfig::default().validate(),
            Err(ValidationError::MissingRequired("AFFECT_LAB__COMPLETION__API_KEY"))
        );
        let empty = CompletionConfig {
            api_key: Some(SecretString::new(String::new())),
            ..Default::default()
        };
        assert!(empty.validate().is_err());
        assert!(with_key().validate().is_ok());
    }

    #[test]
    fn test_validation_base_url_scheme() {
        let config = CompletionConfig {
            base_url: "ftp://example.com".to_string(),
            ..with_key()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidBaseUrl));
    }

    #[test]
    fn test_validation_timeout_bounds() {
        for timeout_secs in [0, 301] {
            let config = CompletionConfig {
                timeout_secs,
                ..with_key()
            };
            assert_eq!(config.validate(), Err(ValidationError::InvalidTimeout));
        }
    }

    #[test]
    fn test_validation_retry_bounds() {
        let config = CompletionConfig {
            retry: RetryConfig {
                max_attempts: 11,
                ..Default::default()
            },
            ..with_key()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidRetryAttempts));

        let inverted = RetryConfig {
            base_delay_ms: 5_000,
            max_delay_secs: 1,
            ..Default::default()
        };
        assert_eq!(inverted.validate(), Err(ValidationError::InvalidRetryDelay));
    }

    #[test]
    fn test_retry_policy_conversion() {
        let policy = RetryConfig::default().policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
        assert_eq!(policy.max_delay, Duration::from_secs(60));
    }
}
