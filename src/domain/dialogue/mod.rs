//! Dialogue module - tutoring conversations and the students behind them.

mod conversation;
mod student;

pub use conversation::{Conversation, MalformedPair, PairAttempt, Role, Turn, TurnPair};
pub use student::{CovariateField, Covariates, MathLevel, StudentRecord};
