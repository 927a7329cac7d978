//! Application layer - orchestrates domain operations through the ports.
//!
//! - `ExperimentRunner` - runs an experiment definition over a dataset
//! - `retry` - bounded rate-limit retry around completion calls

pub mod experiment_runner;
pub mod retry;

pub use experiment_runner::{ExperimentError, ExperimentReport, ExperimentRunner};
pub use retry::{complete_with_retry, CallOutcome, RetryPolicy};
