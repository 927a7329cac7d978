//! Student records: one conversation plus optional covariates.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Conversation;
use crate::domain::foundation::Level;

/// The covariates a prompt template may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CovariateField {
    MathLevel,
    SkillLevel,
    MathAnxietyLevel,
}

impl CovariateField {
    /// All covariate fields, in output column order.
    pub const ALL: [CovariateField; 3] = [
        CovariateField::MathLevel,
        CovariateField::SkillLevel,
        CovariateField::MathAnxietyLevel,
    ];

    /// Field name as used in datasets and templates.
    pub fn name(&self) -> &'static str {
        match self {
            CovariateField::MathLevel => "math_level",
            CovariateField::SkillLevel => "skill_level",
            CovariateField::MathAnxietyLevel => "math_anxiety_level",
        }
    }

    /// Looks a field up by its dataset/template name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }
}

impl fmt::Display for CovariateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A student's math level: a 1..=5 rating, or the subject being worked on
/// (for example "Algebra") when the dataset records it as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MathLevel {
    Level(Level),
    Subject(String),
}

impl MathLevel {
    /// The rating, if this is one.
    pub fn level(&self) -> Option<Level> {
        match self {
            MathLevel::Level(level) => Some(*level),
            MathLevel::Subject(_) => None,
        }
    }
}

impl From<Level> for MathLevel {
    fn from(level: Level) -> Self {
        MathLevel::Level(level)
    }
}

impl fmt::Display for MathLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MathLevel::Level(level) => write!(f, "{}", level),
            MathLevel::Subject(subject) => f.write_str(subject),
        }
    }
}

/// Optional per-student covariates. Skill and anxiety are on a 1..=5 scale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Covariates {
    pub math_level: Option<MathLevel>,
    pub skill_level: Option<Level>,
    pub math_anxiety_level: Option<Level>,
}

impl Covariates {
    /// True when the covariate has a value.
    pub fn is_present(&self, field: CovariateField) -> bool {
        match field {
            CovariateField::MathLevel => self.math_level.is_some(),
            CovariateField::SkillLevel => self.skill_level.is_some(),
            CovariateField::MathAnxietyLevel => self.math_anxiety_level.is_some(),
        }
    }

    /// The covariate as it appears in a prompt.
    pub fn render(&self, field: CovariateField) -> Option<String> {
        match field {
            CovariateField::MathLevel => self.math_level.as_ref().map(ToString::to_string),
            CovariateField::SkillLevel => self.skill_level.map(|l| l.to_string()),
            CovariateField::MathAnxietyLevel => self.math_anxiety_level.map(|l| l.to_string()),
        }
    }

    /// Sets one covariate to a rating.
    pub fn set_level(&mut self, field: CovariateField, value: Option<Level>) {
        match field {
            CovariateField::MathLevel => self.math_level = value.map(MathLevel::Level),
            CovariateField::SkillLevel => self.skill_level = value,
            CovariateField::MathAnxietyLevel => self.math_anxiety_level = value,
        }
    }

    /// Fields that are absent.
    pub fn missing(&self) -> Vec<CovariateField> {
        CovariateField::ALL
            .into_iter()
            .filter(|field| !self.is_present(*field))
            .collect()
    }
}

/// One conversation plus optional covariates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentRecord {
    pub conversation: Conversation,
    pub covariates: Covariates,
}

impl StudentRecord {
    /// Creates a record without covariates.
    pub fn new(conversation: Conversation) -> Self {
        Self {
            conversation,
            covariates: Covariates::default(),
        }
    }

    /// Sets the covariates.
    pub fn with_covariates(mut self, covariates: Covariates) -> Self {
        self.covariates = covariates;
        self
    }
}
