//! Domain layer - the vocabulary of affect-prediction experiments.
//!
//! Nothing in here performs I/O; the completion service and the result
//! table are reached through [`crate::ports`].

pub mod affect;
pub mod dialogue;
pub mod experiment;
pub mod foundation;
pub mod prompt;
