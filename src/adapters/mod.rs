//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Completion clients (OpenAI-compatible HTTP, mock)
//! - `dataset` - JSON-records dataset loading and covariate augmentation
//! - `output` - Result sinks (CSV files, in-memory)

pub mod ai;
pub mod dataset;
pub mod output;

pub use ai::{MockCompletionClient, MockResponse, OpenAIClient, OpenAIConfig};
pub use dataset::{augment_file, load_records, DatasetError};
pub use output::{CsvResultSink, InMemoryResultSink};
