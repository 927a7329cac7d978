//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, error types and the state machine trait
//! that form the vocabulary of the experiment domain.

mod errors;
mod level;
mod state_machine;

pub use errors::ValidationError;
pub use level::Level;
pub use state_machine::StateMachine;
