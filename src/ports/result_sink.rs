//! Result Sink Port - where a finished run's table goes.
//!
//! A run is fully materialized in memory and handed to the sink exactly once.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::experiment::TurnResult;

/// Errors writing a result table.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize results: {0}")]
    Serialization(String),
}

impl SinkError {
    /// Creates an I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SinkError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Port for persisting a run's results.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Writes the whole table for `experiment` and returns where it went.
    async fn write(&self, experiment: &str, results: &[TurnResult]) -> Result<String, SinkError>;
}
