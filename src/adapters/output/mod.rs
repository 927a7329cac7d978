//! Result Sink Adapters.
//!
//! - `CsvResultSink` - one CSV file per experiment
//! - `InMemoryResultSink` - keeps tables in memory for tests

mod csv_sink;
mod in_memory_sink;

pub use csv_sink::CsvResultSink;
pub use in_memory_sink::InMemoryResultSink;
