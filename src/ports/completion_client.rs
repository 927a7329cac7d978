//! Completion Client Port - Interface for text-completion services.
//!
//! This port abstracts the language-model endpoint the experiment runner
//! talks to. One prompt in, one completion out; streaming is never used.
//!
//! # Design
//!
//! - Deterministic sampling parameters travel with every request
//! - Failures are classified (connectivity, rate limit, rejection, ...) so
//!   the runner can record them per turn instead of aborting the run
//! - Retrying is not the adapter's job; see `application::retry`
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//!
//! struct EchoClient;
//!
//! #[async_trait]
//! impl CompletionClient for EchoClient {
//!     async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, CompletionError> {
//!         Ok(CompletionResponse::text(request.prompt, request.model))
//!     }
//!
//!     fn client_info(&self) -> ClientInfo {
//!         ClientInfo::new("echo")
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::experiment::{FailureKind, SamplingConfig};

/// Port for completion-service interactions.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Generates one completion for a prompt. Makes exactly one attempt.
    async fn complete(&self, request: CompletionRequest)
        -> Result<CompletionResponse, CompletionError>;

    /// Describes the client (for logs).
    fn client_info(&self) -> ClientInfo;
}

/// Request for a single completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Full prompt text, sent as a single user message.
    pub prompt: String,
    /// Model identifier.
    pub model: String,
    /// Sampling parameters.
    pub sampling: SamplingConfig,
}

impl CompletionRequest {
    /// Creates a request with default deterministic sampling.
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            sampling: SamplingConfig::default(),
        }
    }

    /// Sets the sampling parameters.
    pub fn with_sampling(mut self, sampling: SamplingConfig) -> Self {
        self.sampling = sampling;
        self
    }
}

/// Response from a completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    /// Generated text.
    pub content: String,
    /// Model that generated the response.
    pub model: String,
    /// Why the model stopped generating.
    pub finish_reason: FinishReason,
    /// Token usage.
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// Creates a plain response with no usage information.
    pub fn text(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            finish_reason: FinishReason::Stop,
            usage: TokenUsage::default(),
        }
    }
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Creates new token usage.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural stop (end of response).
    Stop,
    /// Hit max_tokens limit.
    Length,
    /// Content was filtered for safety.
    ContentFilter,
}

/// Client information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    /// Client name (e.g., "openai-compatible", "mock").
    pub name: String,
    /// Endpoint base URL, when there is one.
    pub endpoint: Option<String>,
}

impl ClientInfo {
    /// Creates client info without an endpoint.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: None,
        }
    }

    /// Sets the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

/// Completion service errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    /// The service could not be reached.
    #[error("connection failed: {0}")]
    Connectivity(String),

    /// The service asked the caller to back off.
    #[error("rate limited: {message}")]
    RateLimited {
        /// Seconds the service asked us to wait, when it said.
        retry_after_secs: Option<u32>,
        /// Error details.
        message: String,
    },

    /// Non-2xx response that is not a rate limit.
    #[error("request rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Error details.
        message: String,
    },

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u64,
    },

    /// A success response that could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl CompletionError {
    /// Creates a connectivity error.
    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::Connectivity(message.into())
    }

    /// Creates a rate limited error.
    pub fn rate_limited(retry_after_secs: Option<u32>, message: impl Into<String>) -> Self {
        Self::RateLimited {
            retry_after_secs,
            message: message.into(),
        }
    }

    /// Creates a rejected-request error.
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    /// Returns true if the runner's retry policy should try again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Returns true for failures caused by service conditions rather than the request.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Connectivity(_) | Self::RateLimited { .. } | Self::Timeout { .. }
        )
    }

    /// Retry-after hint, for rate limits that carry one.
    pub fn retry_after_secs(&self) -> Option<u32> {
        match self {
            Self::RateLimited {
                retry_after_secs, ..
            } => *retry_after_secs,
            _ => None,
        }
    }

    /// Failure category recorded in the result table.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Connectivity(_) => FailureKind::Connectivity,
            Self::RateLimited { .. } => FailureKind::RateLimited,
            Self::Rejected { .. } => FailureKind::Rejected,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::InvalidResponse(_) => FailureKind::InvalidResponse,
        }
    }
}
