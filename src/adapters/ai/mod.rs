//! Completion Client Adapters.
//!
//! Implementations of the CompletionClient port.
//!
//! ## Available Adapters
//!
//! - `OpenAIClient` - any OpenAI-compatible `/chat/completions` service (Groq by default)
//! - `MockCompletionClient` - Scripted client for testing

mod mock_client;
mod openai_client;

pub use mock_client::{MockCompletionClient, MockResponse};
pub use openai_client::{OpenAIClient, OpenAIConfig, DEFAULT_BASE_URL};
