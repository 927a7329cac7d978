//! Bounded retry of completion calls.
//!
//! Only rate-limit failures are retried. The wait before each retry is the
//! provider's retry-after hint when given, else exponential from the base
//! delay, and never more than the policy's maximum delay.

use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{CompletionClient, CompletionError, CompletionRequest, CompletionResponse};

/// How often and how long to back off on rate limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total calls allowed for one turn, first attempt included.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// A policy that makes a single attempt.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// Wait before retry number `retry` (0-based) after `error`.
    pub fn delay_for(&self, retry: u32, error: &CompletionError) -> Duration {
        let delay = match error.retry_after_secs() {
            Some(secs) => Duration::from_secs(u64::from(secs)),
            None => {
                let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
                self.base_delay.saturating_mul(factor)
            }
        };
        delay.min(self.max_delay)
    }
}

/// Result of a completion call after retries.
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub result: Result<CompletionResponse, CompletionError>,
    /// Calls made, retries included.
    pub attempts: u32,
    /// Last retry-after hint seen, in seconds.
    pub retry_after_secs: Option<u32>,
}

impl CallOutcome {
    pub fn retried(&self) -> bool {
        self.attempts > 1
    }
}

/// Calls `client`, retrying rate limits under `policy`.
///
/// Never fails: the final error, if any, is carried in the outcome.
pub async fn complete_with_retry<P: ?Sized + CompletionClient>(
    client: &P,
    request: CompletionRequest,
    policy: &RetryPolicy,
) -> CallOutcome {
    let mut attempts = 0;
    let mut retry_after_secs = None;

    loop {
        attempts += 1;
        let err = match client.complete(request.clone()).await {
            Ok(response) => {
                return CallOutcome {
                    result: Ok(response),
                    attempts,
                    retry_after_secs,
                }
            }
            Err(err) => err,
        };

        if let Some(secs) = err.retry_after_secs() {
            retry_after_secs = Some(secs);
        }
        if !err.is_retryable() || attempts >= policy.max_attempts {
            return CallOutcome {
                result: Err(err),
                attempts,
                retry_after_secs,
            };
        }

        let delay = policy.delay_for(attempts - 1, &err);
        tracing::warn!(
            attempt = attempts,
            max_attempts = policy.max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Completion rate limited, retrying"
        );
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockCompletionClient;

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO, Duration::ZERO)
    }

    fn request() -> CompletionRequest {
        CompletionRequest::new("prompt", "model")
    }

    #[test]
    fn delay_prefers_retry_after_hint() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1), Duration::from_secs(30));
        let err = CompletionError::rate_limited(Some(7), "slow down");
        assert_eq!(policy.delay_for(0, &err), Duration::from_secs(7));
    }

    #[test]
    fn delay_grows_exponentially_and_is_capped() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1), Duration::from_secs(5));
        let err = CompletionError::rate_limited(None, "slow down");
        assert_eq!(policy.delay_for(0, &err), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1, &err), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2, &err), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3, &err), Duration::from_secs(5));
        assert_eq!(policy.delay_for(40, &err), Duration::from_secs(5));

        let hinted = CompletionError::rate_limited(Some(120), "slow down");
        assert_eq!(policy.delay_for(0, &hinted), Duration::from_secs(5));
    }

    #[test]
    fn zero_attempts_means_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO, Duration::ZERO).max_attempts, 1);
    }

    #[tokio::test]
    async fn success_needs_one_attempt() {
        let client = MockCompletionClient::new().with_response("[delight]");
        let outcome = complete_with_retry(&client, request(), &instant_policy(3)).await;

        assert!(!outcome.retried());
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.result.unwrap().content, "[delight]");
    }

    #[tokio::test]
    async fn rate_limit_then_success_is_retried() {
        let client = MockCompletionClient::new()
            .with_error(CompletionError::rate_limited(Some(0), "slow down"))
            .with_response("[engagement]");
        let outcome = complete_with_retry(&client, request(), &instant_policy(3)).await;

        assert!(outcome.result.is_ok());
        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.retry_after_secs, Some(0));
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn rate_limit_stops_at_max_attempts() {
        let client = MockCompletionClient::new()
            .with_error(CompletionError::rate_limited(None, "a"))
            .with_error(CompletionError::rate_limited(None, "b"))
            .with_error(CompletionError::rate_limited(None, "c"))
            .with_response("[delight]");
        let outcome = complete_with_retry(&client, request(), &instant_policy(3)).await;

        assert!(matches!(outcome.result, Err(CompletionError::RateLimited { .. })));
        assert_eq!(outcome.attempts, 3);
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn rejected_requests_are_not_retried() {
        let client = MockCompletionClient::new()
            .with_error(CompletionError::rejected(400, "bad request"))
            .with_response("[delight]");
        let outcome = complete_with_retry(&client, request(), &instant_policy(3)).await;

        assert!(matches!(outcome.result, Err(CompletionError::Rejected { status: 400, .. })));
        assert_eq!(outcome.attempts, 1);
    }

    #[tokio::test]
    async fn connectivity_failures_are_not_retried() {
        let client = MockCompletionClient::new()
            .with_error(CompletionError::connectivity("refused"));
        let outcome = complete_with_retry(&client, request(), &instant_policy(3)).await;

        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.retry_after_secs, None);
    }
}
