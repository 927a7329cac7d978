//! Dataset adapter errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors reading or writing a dataset file.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid dataset {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid dataset {path}: {reason}")]
    Shape { path: PathBuf, reason: String },

    #[error("output file already exists: {0}")]
    OutputExists(PathBuf),
}

impl DatasetError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DatasetError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        DatasetError::Json {
            path: path.into(),
            source,
        }
    }

    pub fn shape(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        DatasetError::Shape {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
