//! Prompt module - templates and the state-dependent prompt builder.

mod builder;
mod errors;
mod template;

pub use builder::{
    CovariatePolicy, PromptBuilder, PromptContext, PromptMode, Transcript, TranscriptOrder,
};
pub use errors::TemplateError;
pub use template::PromptTemplate;
