//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `CompletionClient` - the language-model completion service
//! - `ResultSink` - the flat result table written at the end of a run

mod completion_client;
mod result_sink;

pub use completion_client::{
    ClientInfo, CompletionClient, CompletionError, CompletionRequest, CompletionResponse,
    FinishReason, TokenUsage,
};
pub use result_sink::{ResultSink, SinkError};
