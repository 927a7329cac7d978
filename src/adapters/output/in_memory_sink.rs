//! In-memory Result Sink Adapter
//!
//! Keeps every written table, keyed by experiment name. Used by tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::domain::experiment::TurnResult;
use crate::ports::{ResultSink, SinkError};

/// In-memory sink.
#[derive(Debug, Clone, Default)]
pub struct InMemoryResultSink {
    tables: Arc<Mutex<HashMap<String, Vec<TurnResult>>>>,
    writes: Arc<Mutex<usize>>,
}

impl InMemoryResultSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// The table last written for `experiment`.
    pub fn table(&self, experiment: &str) -> Option<Vec<TurnResult>> {
        self.tables.lock().unwrap().get(experiment).cloned()
    }

    /// Number of write calls received.
    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap()
    }
}

#[async_trait]
impl ResultSink for InMemoryResultSink {
    async fn write(&self, experiment: &str, results: &[TurnResult]) -> Result<String, SinkError> {
        self.tables
            .lock()
            .unwrap()
            .insert(experiment.to_string(), results.to_vec());
        *self.writes.lock().unwrap() += 1;
        Ok(format!("memory://{}", experiment))
    }
}
