//! Error types for prompt construction.

use thiserror::Error;

use super::PromptMode;
use crate::domain::dialogue::CovariateField;

/// Configuration errors raised while parsing or filling a prompt template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("Unbalanced brace at byte {position}")]
    UnbalancedBrace { position: usize },

    #[error("Invalid placeholder '{{{placeholder}}}'")]
    InvalidPlaceholder { placeholder: String },

    #[error("Template references '{field}', which is not supplied in {mode} mode")]
    UnknownField { field: String, mode: PromptMode },

    #[error("Template requires '{field}' but student {student_id} has no value and no placeholder is configured")]
    MissingCovariate {
        field: CovariateField,
        student_id: usize,
    },

    #[error("No value supplied for '{field}'")]
    MissingValue { field: String },
}

impl TemplateError {
    /// Creates a missing value error.
    pub fn missing_value(field: impl Into<String>) -> Self {
        TemplateError::MissingValue { field: field.into() }
    }
}
