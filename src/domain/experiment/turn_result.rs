//! Turn results: one immutable row per processed student/tutor pair.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::affect::EmotionalState;
use crate::domain::dialogue::MathLevel;
use crate::domain::foundation::Level;

/// Why a completion call produced no usable text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Host unreachable or connection dropped.
    Connectivity,
    /// Provider asked us to back off; retries were exhausted.
    RateLimited,
    /// Non-2xx response that is not a rate limit (auth, bad request, ...).
    Rejected,
    /// No response within the configured timeout.
    Timeout,
    /// A 2xx response whose body could not be understood.
    InvalidResponse,
}

impl FailureKind {
    /// Stable snake_case name, as written to output.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Connectivity => "connectivity",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::Rejected => "rejected",
            FailureKind::Timeout => "timeout",
            FailureKind::InvalidResponse => "invalid_response",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the result table.
///
/// Column order is the serialization order of the fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnResult {
    /// Repetition index, starting at 0.
    pub run: u32,
    /// 1-based position of the record in the dataset.
    pub student_id: usize,
    /// 1-based raw pair position in the conversation.
    pub time_step: u32,
    pub student_response: String,
    pub tutor_response: String,
    /// Prediction of the previous emitted turn; empty for the first.
    pub previous_state: Option<EmotionalState>,
    /// State presented to the model.
    pub current_state: EmotionalState,
    /// True when `current_state` was drawn at random.
    pub state_seeded: bool,
    /// Parsed prediction, or the unknown sentinel.
    pub next_state: EmotionalState,
    /// Raw first bracketed token of the completion.
    pub extracted_token: Option<String>,
    /// Rating or subject name.
    pub math_level: Option<MathLevel>,
    pub skill_level: Option<Level>,
    pub math_anxiety_level: Option<Level>,
    pub prompt: String,
    /// Completion text; empty when the call failed.
    pub llm_response: Option<String>,
    pub failure: Option<FailureKind>,
    pub failure_detail: Option<String>,
    /// Calls made for this turn, retries included.
    pub attempts: u32,
    /// Last retry-after hint given by the provider, in seconds.
    pub retry_after_secs: Option<u32>,
}

impl TurnResult {
    /// True when the completion call failed.
    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }

    /// True when the call was retried at least once.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }
}
