//! Experiment module - definitions, presets, per-conversation state and results.

mod definition;
mod presets;
mod status;
mod turn_result;

pub use definition::{ExperimentDefinition, SamplingConfig, DEFAULT_MODEL, MAX_REPETITIONS};
pub use presets::{preset, preset_names};
pub use status::{ConversationProgress, ConversationStatus, PresentedState};
pub use turn_result::{FailureKind, TurnResult};
