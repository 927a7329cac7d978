//! Per-conversation lifecycle and the state carried between turns.

use rand::Rng;

use crate::domain::affect::{EmotionalState, LabelSet};
use crate::domain::dialogue::TurnPair;
use crate::domain::foundation::{StateMachine, ValidationError};
use crate::domain::prompt::Transcript;

/// Lifecycle of one conversation within one repetition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConversationStatus {
    #[default]
    NotStarted,
    InProgress,
    Done,
}

impl StateMachine for ConversationStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConversationStatus::*;
        matches!(
            (self, target),
            (NotStarted, InProgress)
                | (NotStarted, Done)
                | (InProgress, InProgress)
                | (InProgress, Done)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConversationStatus::*;
        match self {
            NotStarted => vec![InProgress, Done],
            InProgress => vec![InProgress, Done],
            Done => vec![],
        }
    }
}

/// The state presented to the model for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedState {
    pub state: EmotionalState,
    /// True when drawn at random because no prior prediction exists.
    pub seeded: bool,
}

/// Running state of one conversation.
///
/// Carries the last prediction forward as the next turn's current state and
/// accumulates the transcript.
#[derive(Debug, Clone, Default)]
pub struct ConversationProgress {
    status: ConversationStatus,
    initial_state: Option<EmotionalState>,
    previous_state: Option<EmotionalState>,
    transcript: Transcript,
}

impl ConversationProgress {
    /// Starts a fresh conversation with no prior state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a conversation from an externally supplied state, presented on
    /// the first turn instead of a random draw.
    pub fn with_initial_state(state: EmotionalState) -> Self {
        Self {
            initial_state: Some(state),
            ..Self::default()
        }
    }

    pub fn status(&self) -> ConversationStatus {
        self.status
    }

    /// Prediction of the last processed turn, if any.
    pub fn previous_state(&self) -> Option<&EmotionalState> {
        self.previous_state.as_ref()
    }

    /// Pairs processed so far.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// The previous prediction, else the initial state, else a uniform draw
    /// from `labels`.
    pub fn current_state<R: Rng + ?Sized>(&self, labels: &LabelSet, rng: &mut R) -> PresentedState {
        match self.previous_state.as_ref().or(self.initial_state.as_ref()) {
            Some(state) => PresentedState {
                state: state.clone(),
                seeded: false,
            },
            None => PresentedState {
                state: EmotionalState::Known(labels.choose(rng).clone()),
                seeded: true,
            },
        }
    }

    /// Records a processed turn: appends the pair and carries the prediction.
    pub fn record_turn(
        &mut self,
        pair: TurnPair<'_>,
        predicted: EmotionalState,
    ) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(ConversationStatus::InProgress)?;
        self.transcript.push(pair);
        self.previous_state = Some(predicted);
        Ok(())
    }

    /// Marks the conversation finished.
    pub fn finish(&mut self) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(ConversationStatus::Done)?;
        Ok(())
    }
}
