//! Emotion label extraction from free-text completions.
//!
//! The model is asked to write its answer inside square brackets. The first
//! bracketed token is taken; anything that is not a member of the label set
//! becomes the unknown sentinel.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{EmotionalState, LabelSet};

static BRACKETED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(.*?)\]").expect("bracket pattern is valid"));

/// Result of extracting a label from one completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Raw text of the first bracketed token, if any.
    pub token: Option<String>,
    /// Validated state; unknown when no token or not a member.
    pub state: EmotionalState,
}

/// Parses completions against a fixed label set.
#[derive(Debug, Clone)]
pub struct EmotionLabelExtractor {
    labels: LabelSet,
}

impl EmotionLabelExtractor {
    /// Creates an extractor for the given label set.
    pub fn new(labels: LabelSet) -> Self {
        Self { labels }
    }

    /// The accepted labels.
    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Extracts the first bracketed token and validates it.
    pub fn extract(&self, completion: &str) -> Extraction {
        let token = BRACKETED
            .captures(completion)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());

        let state = token
            .as_deref()
            .and_then(|raw| self.labels.lookup(raw))
            .cloned()
            .map(EmotionalState::Known)
            .unwrap_or(EmotionalState::Unknown);

        Extraction { token, state }
    }

    /// Extracts only the validated state.
    pub fn label(&self, completion: &str) -> EmotionalState {
        self.extract(completion).state
    }
}
