//! Prompt builder: fills a template from the runner's per-turn state.
//!
//! Fields available to every template: `math_level`, `skill_level`,
//! `math_anxiety_level`, `states`, `current_state`. Single-turn mode adds
//! `s_response` and `t_response`; transcript mode adds `transcript`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{PromptTemplate, TemplateError};
use crate::domain::affect::{EmotionalState, LabelSet};
use crate::domain::dialogue::{CovariateField, Covariates, TurnPair};

const COMMON_FIELDS: [&str; 5] = [
    "math_level",
    "skill_level",
    "math_anxiety_level",
    "states",
    "current_state",
];
const SINGLE_TURN_FIELDS: [&str; 2] = ["s_response", "t_response"];
const TRANSCRIPT_FIELDS: [&str; 1] = ["transcript"];

/// Which dialogue context the model sees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptMode {
    /// Only the latest student/tutor pair.
    #[default]
    SingleTurn,
    /// Every pair so far, as a transcript.
    Transcript,
}

impl PromptMode {
    /// Returns true if `field` is supplied in this mode.
    pub fn supplies(&self, field: &str) -> bool {
        let specific: &[&str] = match self {
            PromptMode::SingleTurn => &SINGLE_TURN_FIELDS,
            PromptMode::Transcript => &TRANSCRIPT_FIELDS,
        };
        COMMON_FIELDS.contains(&field) || specific.contains(&field)
    }
}

impl fmt::Display for PromptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptMode::SingleTurn => write!(f, "single_turn"),
            PromptMode::Transcript => write!(f, "transcript"),
        }
    }
}

/// Whether the pair being predicted is already part of the transcript.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptOrder {
    /// Prompt shows pairs strictly before the current one.
    #[default]
    PriorPairs,
    /// Prompt shows prior pairs followed by the current one.
    ThroughCurrent,
}

/// What to substitute when a referenced covariate is absent.
///
/// Written in YAML as `require` or as `placeholder: <text>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PolicyRepr", into = "PolicyRepr")]
pub enum CovariatePolicy {
    /// Substitute this text.
    Placeholder(String),
    /// Refuse to run; every record must carry the referenced covariates.
    Require,
}

impl Default for CovariatePolicy {
    fn default() -> Self {
        CovariatePolicy::Placeholder("N/A".to_string())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PolicyRepr {
    Named(String),
    Placeholder { placeholder: String },
}

impl TryFrom<PolicyRepr> for CovariatePolicy {
    type Error = String;

    fn try_from(repr: PolicyRepr) -> Result<Self, Self::Error> {
        match repr {
            PolicyRepr::Named(name) if name == "require" => Ok(CovariatePolicy::Require),
            PolicyRepr::Named(other) => Err(format!(
                "unknown covariate policy '{}', expected 'require' or 'placeholder: <text>'",
                other
            )),
            PolicyRepr::Placeholder { placeholder } => Ok(CovariatePolicy::Placeholder(placeholder)),
        }
    }
}

impl From<CovariatePolicy> for PolicyRepr {
    fn from(policy: CovariatePolicy) -> Self {
        match policy {
            CovariatePolicy::Require => PolicyRepr::Named("require".to_string()),
            CovariatePolicy::Placeholder(placeholder) => PolicyRepr::Placeholder { placeholder },
        }
    }
}

/// Accumulated student/tutor pairs of one conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    pairs: Vec<(String, String)>,
}

impl Transcript {
    /// Creates an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pair.
    pub fn push(&mut self, pair: TurnPair<'_>) {
        self.pairs
            .push((pair.student.to_string(), pair.tutor.to_string()));
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True when no pair has been appended.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Renders the pairs as `Student: ...\nTutor: ...` blocks.
    pub fn render(&self) -> String {
        self.render_with(None)
    }

    fn render_with(&self, current: Option<TurnPair<'_>>) -> String {
        let prior = self
            .pairs
            .iter()
            .map(|(student, tutor)| format_pair(student, tutor));
        let current = current.map(|pair| format_pair(pair.student, pair.tutor));
        prior.chain(current).collect::<Vec<_>>().join("\n")
    }
}

fn format_pair(student: &str, tutor: &str) -> String {
    format!("Student: {}\nTutor: {}", student, tutor)
}

/// Per-turn inputs to the builder.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub covariates: &'a Covariates,
    pub current_state: &'a EmotionalState,
    pub pair: TurnPair<'a>,
    pub transcript: &'a Transcript,
}

/// Builds prompts for one experiment.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    template: PromptTemplate,
    mode: PromptMode,
    order: TranscriptOrder,
    covariate_policy: CovariatePolicy,
    labels: LabelSet,
}

impl PromptBuilder {
    /// Creates a builder, failing if the template references a field the mode
    /// does not supply.
    pub fn new(
        template: PromptTemplate,
        mode: PromptMode,
        labels: LabelSet,
    ) -> Result<Self, TemplateError> {
        if let Some(field) = template.fields().into_iter().find(|f| !mode.supplies(f)) {
            return Err(TemplateError::UnknownField {
                field: field.to_string(),
                mode,
            });
        }

        Ok(Self {
            template,
            mode,
            order: TranscriptOrder::default(),
            covariate_policy: CovariatePolicy::default(),
            labels,
        })
    }

    /// Sets the transcript order (transcript mode only).
    pub fn with_transcript_order(mut self, order: TranscriptOrder) -> Self {
        self.order = order;
        self
    }

    /// Sets the missing-covariate policy.
    pub fn with_covariate_policy(mut self, policy: CovariatePolicy) -> Self {
        self.covariate_policy = policy;
        self
    }

    /// The prompt mode.
    pub fn mode(&self) -> PromptMode {
        self.mode
    }

    /// The transcript order.
    pub fn transcript_order(&self) -> TranscriptOrder {
        self.order
    }

    /// Covariates the template references.
    pub fn referenced_covariates(&self) -> Vec<CovariateField> {
        CovariateField::ALL
            .into_iter()
            .filter(|field| self.template.references(field.name()))
            .collect()
    }

    /// Checks that a record can be rendered under the covariate policy.
    pub fn check_covariates(
        &self,
        covariates: &Covariates,
        student_id: usize,
    ) -> Result<(), TemplateError> {
        if !matches!(self.covariate_policy, CovariatePolicy::Require) {
            return Ok(());
        }
        match self
            .referenced_covariates()
            .into_iter()
            .find(|field| !covariates.is_present(*field))
        {
            Some(field) => Err(TemplateError::MissingCovariate { field, student_id }),
            None => Ok(()),
        }
    }

    /// Renders the prompt for one turn.
    pub fn build(&self, context: PromptContext<'_>) -> Result<String, TemplateError> {
        let mut values: BTreeMap<&str, String> = BTreeMap::new();

        for field in CovariateField::ALL {
            match (context.covariates.render(field), &self.covariate_policy) {
                (Some(value), _) => {
                    values.insert(field.name(), value);
                }
                (None, CovariatePolicy::Placeholder(text)) => {
                    values.insert(field.name(), text.clone());
                }
                // Left out so rendering fails if the template needs it.
                (None, CovariatePolicy::Require) => {}
            }
        }

        values.insert("states", self.labels.to_string());
        values.insert("current_state", context.current_state.to_string());

        match self.mode {
            PromptMode::SingleTurn => {
                values.insert("s_response", context.pair.student.to_string());
                values.insert("t_response", context.pair.tutor.to_string());
            }
            PromptMode::Transcript => {
                let current = match self.order {
                    TranscriptOrder::PriorPairs => None,
                    TranscriptOrder::ThroughCurrent => Some(context.pair),
                };
                values.insert("transcript", context.transcript.render_with(current));
            }
        }

        self.template.render(&values)
    }
}
