//! Conversation transcript and turn pairing.
//!
//! A conversation is an ordered list of turns that is expected to alternate
//! student (`user`) and tutor (`assistant`). Pairing walks it two turns at a
//! time; malformed positions are reported, never fatal.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who produced a turn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// The student.
    User,
    /// The tutor.
    Assistant,
    /// Any other role found in the data (e.g. `system`).
    Other(String),
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            _ => Role::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Other(other) => write!(f, "{}", other),
        }
    }
}

/// A single utterance in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

impl Turn {
    /// Creates a new turn.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a student turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates a tutor turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// One student utterance immediately followed by one tutor utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnPair<'a> {
    pub student: &'a str,
    pub tutor: &'a str,
}

/// Why a pair position produced no turn pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedPair {
    /// The turn at the student position is not a `user` turn, or is empty.
    MissingStudentTurn,
    /// The conversation ends on the student turn.
    MissingTutorTurn,
    /// The turn at the tutor position is not an `assistant` turn, or is empty.
    TutorRoleMismatch,
}

impl fmt::Display for MalformedPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            MalformedPair::MissingStudentTurn => "missing student turn",
            MalformedPair::MissingTutorTurn => "missing tutor turn",
            MalformedPair::TutorRoleMismatch => "tutor role mismatch",
        };
        write!(f, "{}", reason)
    }
}

/// One attempted pair position in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairAttempt<'a> {
    /// 1-based position among attempted pairs, skipped ones included.
    pub time_step: u32,
    pub outcome: Result<TurnPair<'a>, MalformedPair>,
}

/// Ordered sequence of turns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// Creates a conversation from turns.
    pub fn new(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    /// Returns the turns in order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// True when there are no turns.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Walks positions (0, 1), (2, 3), ... yielding one attempt per position.
    pub fn pair_attempts(&self) -> impl Iterator<Item = PairAttempt<'_>> + '_ {
        self.turns
            .chunks(2)
            .enumerate()
            .map(|(index, chunk)| PairAttempt {
                time_step: index as u32 + 1,
                outcome: pair_from_chunk(chunk),
            })
    }

    /// Only the well-formed pairs, in order.
    pub fn turn_pairs(&self) -> impl Iterator<Item = TurnPair<'_>> + '_ {
        self.pair_attempts().filter_map(|attempt| attempt.outcome.ok())
    }
}

fn pair_from_chunk(chunk: &[Turn]) -> Result<TurnPair<'_>, MalformedPair> {
    let student = &chunk[0];
    if student.role != Role::User || student.content.is_empty() {
        return Err(MalformedPair::MissingStudentTurn);
    }

    let tutor = chunk.get(1).ok_or(MalformedPair::MissingTutorTurn)?;
    if tutor.role != Role::Assistant || tutor.content.is_empty() {
        return Err(MalformedPair::TutorRoleMismatch);
    }

    Ok(TurnPair {
        student: &student.content,
        tutor: &tutor.content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_known_and_other_values() {
        assert_eq!(Role::from("user".to_string()), Role::User);
        assert_eq!(Role::from("assistant".to_string()), Role::Assistant);
        assert_eq!(
            Role::from("system".to_string()),
            Role::Other("system".to_string())
        );
    }

    #[test]
    fn turn_deserializes_from_role_content_object() {
        let turn: Turn =
            serde_json::from_str(r#"{"role":"assistant","content":"Let's try"}"#).unwrap();
        assert_eq!(turn, Turn::assistant("Let's try"));
    }

    #[test]
    fn well_formed_conversation_yields_every_pair() {
        let conversation = Conversation::new(vec![
            Turn::user("a"),
            Turn::assistant("b"),
            Turn::user("c"),
            Turn::assistant("d"),
        ]);

        let pairs: Vec<_> = conversation.turn_pairs().collect();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1], TurnPair { student: "c", tutor: "d" });
    }

    #[test]
    fn trailing_user_turn_is_skipped_but_counted() {
        let conversation = Conversation::new(vec![
            Turn::user("I don't get this"),
            Turn::assistant("Let's try again"),
            Turn::user("ok"),
        ]);

        let attempts: Vec<_> = conversation.pair_attempts().collect();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].time_step, 1);
        assert!(attempts[0].outcome.is_ok());
        assert_eq!(attempts[1].time_step, 2);
        assert_eq!(attempts[1].outcome, Err(MalformedPair::MissingTutorTurn));
    }

    #[test]
    fn role_mismatch_keeps_raw_positions() {
        let conversation = Conversation::new(vec![
            Turn::assistant("hello"),
            Turn::user("hi"),
            Turn::user("question"),
            Turn::assistant("answer"),
        ]);

        let attempts: Vec<_> = conversation.pair_attempts().collect();
        assert_eq!(attempts[0].outcome, Err(MalformedPair::MissingStudentTurn));
        assert_eq!(attempts[1].time_step, 2);
        assert_eq!(
            attempts[1].outcome,
            Ok(TurnPair { student: "question", tutor: "answer" })
        );
    }

    #[test]
    fn empty_tutor_content_is_malformed() {
        let conversation = Conversation::new(vec![Turn::user("x"), Turn::assistant("")]);
        let attempt = conversation.pair_attempts().next().unwrap();
        assert_eq!(attempt.outcome, Err(MalformedPair::TutorRoleMismatch));
    }

    #[test]
    fn empty_conversation_has_no_attempts() {
        assert_eq!(Conversation::default().pair_attempts().count(), 0);
    }
}
