//! Affect module - emotional states and label extraction.

mod emotion;
mod extractor;

pub use emotion::{
    EmotionLabel, EmotionalState, LabelSet, LabelSetError, DEFAULT_LABELS, UNKNOWN_LABEL,
};
pub use extractor::{EmotionLabelExtractor, Extraction};
