//! Emotional states and the closed label set they are drawn from.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Text written wherever a state could not be determined.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Labels used by the original tutoring study.
pub const DEFAULT_LABELS: [&str; 7] = [
    "boredom",
    "engagement",
    "confusion",
    "frustration",
    "delight",
    "surprise",
    "neutral",
];

/// Errors building a label set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelSetError {
    #[error("Label set cannot be empty")]
    Empty,

    #[error("Label cannot be blank")]
    BlankLabel,

    #[error("Label '{0}' contains a bracket or comma")]
    InvalidCharacters(String),

    #[error("Label '{0}' is reserved for unparseable output")]
    Reserved(String),

    #[error("Label '{0}' appears more than once")]
    Duplicate(String),
}

/// A validated, lowercase emotion label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmotionLabel(String);

impl EmotionLabel {
    /// Creates a label, trimming and lowercasing the input.
    pub fn new(value: impl AsRef<str>) -> Result<Self, LabelSetError> {
        let normalized = value.as_ref().trim().to_lowercase();
        if normalized.is_empty() {
            return Err(LabelSetError::BlankLabel);
        }
        if normalized.contains(['[', ']', ',']) {
            return Err(LabelSetError::InvalidCharacters(normalized));
        }
        if normalized == UNKNOWN_LABEL {
            return Err(LabelSetError::Reserved(normalized));
        }
        Ok(Self(normalized))
    }

    /// Returns the label text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EmotionLabel {
    type Error = LabelSetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        EmotionLabel::new(value)
    }
}

impl From<EmotionLabel> for String {
    fn from(label: EmotionLabel) -> Self {
        label.0
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The closed enumeration of labels an experiment accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct LabelSet {
    labels: Vec<EmotionLabel>,
}

impl LabelSet {
    /// Builds a label set, rejecting empty sets and duplicates.
    pub fn new<I, S>(labels: I) -> Result<Self, LabelSetError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut validated: Vec<EmotionLabel> = Vec::new();
        for raw in labels {
            let label = EmotionLabel::new(raw)?;
            if validated.contains(&label) {
                return Err(LabelSetError::Duplicate(label.0));
            }
            validated.push(label);
        }
        if validated.is_empty() {
            return Err(LabelSetError::Empty);
        }
        Ok(Self { labels: validated })
    }

    /// Labels in declaration order.
    pub fn labels(&self) -> &[EmotionLabel] {
        &self.labels
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always false; a label set holds at least one label.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Finds the member matching `candidate`, ignoring case and surrounding whitespace.
    pub fn lookup(&self, candidate: &str) -> Option<&EmotionLabel> {
        let normalized = candidate.trim().to_lowercase();
        self.labels.iter().find(|label| label.0 == normalized)
    }

    /// Uniformly draws one label.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> &EmotionLabel {
        // A LabelSet is never empty, so choose always yields a label.
        self.labels
            .choose(rng)
            .unwrap_or(&self.labels[0])
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        Self {
            labels: DEFAULT_LABELS
                .iter()
                .map(|label| EmotionLabel(label.to_string()))
                .collect(),
        }
    }
}

impl TryFrom<Vec<String>> for LabelSet {
    type Error = LabelSetError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        LabelSet::new(value)
    }
}

impl From<LabelSet> for Vec<String> {
    fn from(set: LabelSet) -> Self {
        set.labels.into_iter().map(String::from).collect()
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, label) in self.labels.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            f.write_str(label.as_str())?;
        }
        Ok(())
    }
}

/// A student's emotional state: a member of the label set, or unknown.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EmotionalState {
    Known(EmotionLabel),
    Unknown,
}

impl EmotionalState {
    /// True for the unknown sentinel.
    pub fn is_unknown(&self) -> bool {
        matches!(self, EmotionalState::Unknown)
    }

    /// Returns the label when known.
    pub fn label(&self) -> Option<&EmotionLabel> {
        match self {
            EmotionalState::Known(label) => Some(label),
            EmotionalState::Unknown => None,
        }
    }

    /// Text form used in prompts and output.
    pub fn as_str(&self) -> &str {
        match self {
            EmotionalState::Known(label) => label.as_str(),
            EmotionalState::Unknown => UNKNOWN_LABEL,
        }
    }
}

impl From<EmotionLabel> for EmotionalState {
    fn from(label: EmotionLabel) -> Self {
        EmotionalState::Known(label)
    }
}

impl fmt::Display for EmotionalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EmotionalState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
