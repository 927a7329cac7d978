//! Result output configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Where result tables are written
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving one `<experiment>.csv` per run
    #[serde(default = "default_dir")]
    pub dir: PathBuf,
}

impl OutputConfig {
    /// Validate output configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.dir.as_os_str().is_empty() {
            return Err(ValidationError::EmptyOutputDir);
        }
        Ok(())
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { dir: default_dir() }
    }
}

fn default_dir() -> PathBuf {
    PathBuf::from("data/output")
}
