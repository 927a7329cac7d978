//! OpenAI-compatible Client - Implementation of CompletionClient over HTTP.
//!
//! Talks to any service exposing the `/chat/completions` endpoint (Groq,
//! OpenAI, vLLM, ...). Each prompt is sent as a single user message with
//! streaming disabled.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIConfig::new(api_key)
//!     .with_base_url("https://api.groq.com/openai/v1")
//!     .with_timeout(Duration::from_secs(60));
//!
//! let client = OpenAIClient::new(config)?;
//! ```
//!
//! # Failure classification
//!
//! - send failures: timeout -> `Timeout`, everything else -> `Connectivity`
//! - 429 -> `RateLimited`, with the `retry-after` header or the
//!   "try again in 1m30s" style hint from the error body
//! - any other non-2xx -> `Rejected`
//! - unreadable 2xx body -> `InvalidResponse`

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{
    ClientInfo, CompletionClient, CompletionError, CompletionRequest, CompletionResponse,
    FinishReason, TokenUsage,
};

/// Default endpoint: Groq's OpenAI-compatible API.
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Configuration for the OpenAI-compatible client.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Base URL for the API.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl OpenAIConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenAI-compatible completion client.
pub struct OpenAIClient {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// Builds the chat completions endpoint URL.
    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    /// Converts our request to the wire format.
    fn to_wire_request(request: &CompletionRequest) -> ChatRequest {
        ChatRequest {
            model: request.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(request.prompt.clone()),
            }],
            temperature: request.sampling.temperature,
            top_p: request.sampling.top_p,
            max_tokens: request.sampling.max_tokens,
            stream: false,
        }
    }

    /// Sends a request.
    async fn send_request(&self, request: &CompletionRequest) -> Result<Response, CompletionError> {
        self.client
            .post(self.completions_url())
            .bearer_auth(self.config.api_key())
            .json(&Self::to_wire_request(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout {
                        timeout_secs: self.config.timeout.as_secs(),
                    }
                } else {
                    CompletionError::connectivity(e.to_string())
                }
            })
    }

    /// Maps non-success statuses to errors.
    async fn handle_response_status(response: Response) -> Result<Response, CompletionError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let header_retry_after = Self::retry_after_header(response.headers());
        let error_body = response.text().await.unwrap_or_default();
        let message = Self::error_message(&error_body);

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = header_retry_after.or_else(|| Self::parse_retry_after(&message));
            return Err(CompletionError::rate_limited(retry_after, message));
        }

        Err(CompletionError::rejected(status.as_u16(), message))
    }

    /// Reads the `retry-after` header as whole seconds, rounding up.
    fn retry_after_header(headers: &HeaderMap) -> Option<u32> {
        let value = headers.get(RETRY_AFTER)?.to_str().ok()?;
        let secs: f64 = value.trim().parse().ok()?;
        (secs >= 0.0).then(|| secs.ceil() as u32)
    }

    /// Pulls `error.message` out of a JSON error body, else returns the body.
    fn error_message(body: &str) -> String {
        serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|parsed| {
                parsed
                    .get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| body.to_string())
    }

    /// Finds a "try again in ..." hint in an error message and returns it as
    /// whole seconds, rounding up. Accepts compound durations such as `1m30s`,
    /// `7.66s`, `450ms` and `30 seconds`; a bare number is seconds.
    fn parse_retry_after(message: &str) -> Option<u32> {
        const PREFIX: &str = "try again in ";
        let idx = message.find(PREFIX)?;
        let mut rest = &message[idx + PREFIX.len()..];
        let mut total_ms = 0.0_f64;
        let mut matched = false;

        loop {
            rest = rest.trim_start();
            let number_end = rest
                .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                .unwrap_or(rest.len());
            let value: f64 = match rest[..number_end].trim_end_matches('.').parse() {
                Ok(value) => value,
                Err(_) => break,
            };

            let after = rest[number_end..].trim_start();
            let unit_end = after
                .find(|c: char| !c.is_ascii_alphabetic())
                .unwrap_or(after.len());
            let unit_ms = match &after[..unit_end] {
                "ms" | "millisecond" | "milliseconds" => Some(1.0),
                "s" | "sec" | "secs" | "second" | "seconds" => Some(1_000.0),
                "m" | "min" | "mins" | "minute" | "minutes" => Some(60_000.0),
                "h" | "hour" | "hours" => Some(3_600_000.0),
                _ => None,
            };

            matched = true;
            match unit_ms {
                Some(scale) => {
                    total_ms += value * scale;
                    rest = &after[unit_end..];
                }
                None => {
                    total_ms += value * 1_000.0;
                    break;
                }
            }
        }

        matched.then(|| (total_ms / 1_000.0).ceil() as u32)
    }

    /// Parses a success response.
    async fn parse_response(response: Response) -> Result<CompletionResponse, CompletionError> {
        let response = Self::handle_response_status(response).await?;

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::invalid_response(format!("Failed to parse response: {}", e)))?;

        let choice = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::invalid_response("No choices in response"))?;

        let content = choice
            .message
            .content
            .ok_or_else(|| CompletionError::invalid_response("Choice has no content"))?;

        let finish_reason = match choice.finish_reason.as_deref() {
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::Stop,
        };

        let usage = chat_response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(CompletionResponse {
            content,
            model: chat_response.model,
            finish_reason,
            usage,
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAIClient {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        let response = self.send_request(&request).await?;
        Self::parse_response(response).await
    }

    fn client_info(&self) -> ClientInfo {
        ClientInfo::new("openai-compatible").with_endpoint(&self.config.base_url)
    }
}

// ----- Wire Types -----

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: String,
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::experiment::SamplingConfig;
    use reqwest::header::HeaderValue;

    #[test]
    fn config_builder_works() {
        let config = OpenAIConfig::new("test-key")
            .with_base_url("https://custom.api.com/v1/")
            .with_timeout(Duration::from_secs(30));

        assert_eq!(config.base_url, "https://custom.api.com/v1");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn config_debug_hides_api_key() {
        let config = OpenAIConfig::new("sk-very-secret");
        assert!(!format!("{:?}", config).contains("sk-very-secret"));
    }

    #[test]
    fn wire_request_carries_sampling_and_disables_streaming() {
        let request = CompletionRequest::new("Which state?", "llama3-8b-8192").with_sampling(
            SamplingConfig {
                temperature: 0.0,
                top_p: 1.0,
                max_tokens: 512,
            },
        );
        let json = serde_json::to_value(OpenAIClient::to_wire_request(&request)).unwrap();

        assert_eq!(json["model"], "llama3-8b-8192");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Which state?");
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["top_p"], 1.0);
        assert_eq!(json["max_tokens"], 512);
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn completions_url_joins_base() {
        let client = OpenAIClient::new(OpenAIConfig::new("k").with_base_url("http://localhost:9")).unwrap();
        assert_eq!(client.completions_url(), "http://localhost:9/chat/completions");
        assert_eq!(
            client.client_info().endpoint.as_deref(),
            Some("http://localhost:9")
        );
    }

    #[test]
    fn parse_retry_after_from_message() {
        let message = "Rate limit reached. Please try again in 30 seconds.";
        assert_eq!(OpenAIClient::parse_retry_after(message), Some(30));
    }

    #[test]
    fn parse_retry_after_rounds_fractional_up() {
        let message = "Please try again in 7.66s. Visit the docs";
        assert_eq!(OpenAIClient::parse_retry_after(message), Some(8));
    }

    #[test]
    fn parse_retry_after_adds_minutes_and_seconds() {
        let message = "Please try again in 1m30s. Visit the docs";
        assert_eq!(OpenAIClient::parse_retry_after(message), Some(90));
        let message = "Please try again in 2m4.5s.";
        assert_eq!(OpenAIClient::parse_retry_after(message), Some(125));
    }

    #[test]
    fn parse_retry_after_rounds_milliseconds_up_to_one_second() {
        let message = "Please try again in 450ms. Visit the docs";
        assert_eq!(OpenAIClient::parse_retry_after(message), Some(1));
    }

    #[test]
    fn parse_retry_after_reads_bare_minutes() {
        assert_eq!(OpenAIClient::parse_retry_after("try again in 2m"), Some(120));
    }

    #[test]
    fn parse_retry_after_absent() {
        assert_eq!(OpenAIClient::parse_retry_after("Something went wrong"), None);
    }

    #[test]
    fn retry_after_header_parses_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("2.5"));
        assert_eq!(OpenAIClient::retry_after_header(&headers), Some(3));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(OpenAIClient::retry_after_header(&headers), None);
    }

    #[test]
    fn error_message_prefers_json_message() {
        let body = r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error"}}"#;
        assert_eq!(OpenAIClient::error_message(body), "Invalid API Key");
        assert_eq!(OpenAIClient::error_message("plain text"), "plain text");
    }
}
