//! Mock Completion Client for testing.
//!
//! Provides a scripted implementation of the CompletionClient port, allowing
//! experiments to run without calling a real completion service.
//!
//! # Features
//!
//! - Pre-configured responses, consumed in order
//! - Error injection for failure-path testing
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let client = MockCompletionClient::new()
//!     .with_response("The student is likely [engagement].")
//!     .with_error(CompletionError::rate_limited(Some(1), "slow down"));
//!
//! let response = client.complete(request).await?;
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::ports::{
    ClientInfo, CompletionClient, CompletionError, CompletionRequest, CompletionResponse,
};

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a successful completion with this text.
    Success(String),
    /// Return an error.
    Error(CompletionError),
}

/// Mock completion client for testing.
#[derive(Debug, Clone)]
pub struct MockCompletionClient {
    /// Pre-configured responses (consumed in order).
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    /// Returned once the queue is empty.
    default_response: MockResponse,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl Default for MockCompletionClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCompletionClient {
    /// Creates a new mock client with default settings.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            default_response: MockResponse::Success("Mock response".to_string()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a successful response to the queue.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockResponse::Success(content.into()));
        self
    }

    /// Adds an error response to the queue.
    pub fn with_error(self, error: CompletionError) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockResponse::Error(error));
        self
    }

    /// Sets the response returned once the queue is exhausted.
    pub fn with_default_response(mut self, response: MockResponse) -> Self {
        self.default_response = response;
        self
    }

    /// Returns the number of calls made to this client.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Prompts of all recorded calls, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|call| call.prompt.clone())
            .collect()
    }

    /// Clears the call history.
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Gets the next response or the default.
    fn next_response(&self) -> MockResponse {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.default_response.clone())
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        let model = request.model.clone();
        self.calls.lock().unwrap().push(request);

        match self.next_response() {
            MockResponse::Success(content) => Ok(CompletionResponse::text(content, model)),
            MockResponse::Error(err) => Err(err),
        }
    }

    fn client_info(&self) -> ClientInfo {
        ClientInfo::new("mock")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_request() -> CompletionRequest {
        CompletionRequest::new("Which state?", "mock-model")
    }

    #[tokio::test]
    async fn mock_client_returns_responses_in_order() {
        let client = MockCompletionClient::new()
            .with_response("[boredom]")
            .with_response("[delight]");

        let first = client.complete(test_request()).await.unwrap();
        let second = client.complete(test_request()).await.unwrap();

        assert_eq!(first.content, "[boredom]");
        assert_eq!(second.content, "[delight]");
        assert_eq!(second.model, "mock-model");
    }

    #[tokio::test]
    async fn mock_client_returns_default_after_exhausted() {
        let client = MockCompletionClient::new()
            .with_default_response(MockResponse::Success("[neutral]".to_string()));

        let response = client.complete(test_request()).await.unwrap();
        assert_eq!(response.content, "[neutral]");
    }

    #[tokio::test]
    async fn mock_client_returns_configured_error() {
        let client =
            MockCompletionClient::new().with_error(CompletionError::rejected(401, "bad key"));

        let result = client.complete(test_request()).await;
        assert_eq!(result.unwrap_err(), CompletionError::rejected(401, "bad key"));
    }

    #[tokio::test]
    async fn mock_client_tracks_calls() {
        let client = MockCompletionClient::new();
        assert_eq!(client.call_count(), 0);

        client.complete(test_request()).await.unwrap();
        client.complete(CompletionRequest::new("second", "m")).await.unwrap();

        assert_eq!(client.call_count(), 2);
        assert_eq!(client.prompts(), vec!["Which state?", "second"]);

        client.clear_calls();
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn clones_share_queue_and_history() {
        let client = MockCompletionClient::new().with_response("[surprise]");
        let clone = client.clone();

        let response = clone.complete(test_request()).await.unwrap();
        assert_eq!(response.content, "[surprise]");
        assert_eq!(client.call_count(), 1);
    }
}
