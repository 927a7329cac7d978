//! CSV Result Sink Adapter
//!
//! Writes a run's turn results as `<dir>/<experiment>.csv`, one row per
//! turn, with a header row taken from the `TurnResult` field names.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::experiment::TurnResult;
use crate::ports::{ResultSink, SinkError};

/// File-based CSV sink.
#[derive(Debug, Clone)]
pub struct CsvResultSink {
    output_dir: PathBuf,
}

impl CsvResultSink {
    /// Create a sink writing into `output_dir`
    ///
    /// # Example
    /// ```ignore
    /// let sink = CsvResultSink::new("./data/output");
    /// ```
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the file written for `experiment`
    pub fn file_path(&self, experiment: &str) -> PathBuf {
        self.output_dir.join(format!("{}.csv", experiment))
    }

    /// Serialize results to CSV bytes
    fn to_csv(results: &[TurnResult]) -> Result<Vec<u8>, SinkError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for result in results {
            writer
                .serialize(result)
                .map_err(|e| SinkError::Serialization(e.to_string()))?;
        }
        writer
            .into_inner()
            .map_err(|e| SinkError::Serialization(e.to_string()))
    }
}

#[async_trait]
impl ResultSink for CsvResultSink {
    async fn write(&self, experiment: &str, results: &[TurnResult]) -> Result<String, SinkError> {
        fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| SinkError::io(&self.output_dir, e))?;

        let path = self.file_path(experiment);
        let bytes = Self::to_csv(results)?;
        fs::write(&path, bytes)
            .await
            .map_err(|e| SinkError::io(&path, e))?;

        Ok(path.display().to_string())
    }
}
