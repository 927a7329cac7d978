//! Experiment definitions: everything a run needs, as one explicit value.

use serde::{Deserialize, Serialize};

use crate::domain::affect::{EmotionLabel, LabelSet};
use crate::domain::foundation::ValidationError;
use crate::domain::prompt::{
    CovariatePolicy, PromptBuilder, PromptMode, PromptTemplate, TemplateError, TranscriptOrder,
};

/// Model used by the original study.
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";

/// Upper bound on repetitions of one dataset pass.
pub const MAX_REPETITIONS: u32 = 100;

/// Deterministic sampling parameters sent with every completion request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_top_p() -> f32 {
    1.0
}

fn default_max_tokens() -> u32 {
    512
}

/// A named experiment: model, prompt, labels and run shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentDefinition {
    /// Output file stem; must be a plain file name.
    pub name: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub template: PromptTemplate,
    #[serde(default)]
    pub labels: LabelSet,
    #[serde(default)]
    pub mode: PromptMode,
    #[serde(default)]
    pub transcript_order: TranscriptOrder,
    #[serde(default)]
    pub covariate_policy: CovariatePolicy,
    /// State presented on every conversation's first turn; a random label
    /// from `labels` when absent.
    #[serde(default)]
    pub initial_state: Option<EmotionLabel>,
    #[serde(default = "default_repetitions")]
    pub repetitions: u32,
    /// Seed for random seed-state selection; entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub sampling: SamplingConfig,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_repetitions() -> u32 {
    1
}

impl ExperimentDefinition {
    /// Creates a definition with defaults for everything but name and template.
    pub fn new(name: impl Into<String>, template: PromptTemplate, mode: PromptMode) -> Self {
        Self {
            name: name.into(),
            model: default_model(),
            template,
            labels: LabelSet::default(),
            mode,
            transcript_order: TranscriptOrder::default(),
            covariate_policy: CovariatePolicy::default(),
            initial_state: None,
            repetitions: default_repetitions(),
            seed: None,
            sampling: SamplingConfig::default(),
        }
    }

    /// Parses a definition from YAML.
    pub fn from_yaml(source: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(source)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_labels(mut self, labels: LabelSet) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_transcript_order(mut self, order: TranscriptOrder) -> Self {
        self.transcript_order = order;
        self
    }

    pub fn with_covariate_policy(mut self, policy: CovariatePolicy) -> Self {
        self.covariate_policy = policy;
        self
    }

    pub fn with_initial_state(mut self, label: EmotionLabel) -> Self {
        self.initial_state = Some(label);
        self
    }

    pub fn with_repetitions(mut self, repetitions: u32) -> Self {
        self.repetitions = repetitions;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates scalar fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(ValidationError::invalid_format(
                "name",
                "must be a plain file name",
            ));
        }
        if self.model.trim().is_empty() {
            return Err(ValidationError::empty_field("model"));
        }
        if let Some(label) = &self.initial_state {
            if self.labels.lookup(label.as_str()).is_none() {
                return Err(ValidationError::invalid_format(
                    "initial_state",
                    "must be one of the experiment's labels",
                ));
            }
        }
        if self.repetitions == 0 || self.repetitions > MAX_REPETITIONS {
            return Err(ValidationError::out_of_range(
                "repetitions",
                1,
                MAX_REPETITIONS as i64,
                self.repetitions as i64,
            ));
        }
        if self.sampling.max_tokens == 0 {
            return Err(ValidationError::out_of_range(
                "sampling.max_tokens",
                1,
                u32::MAX as i64,
                0,
            ));
        }
        Ok(())
    }

    /// Builds the prompt builder this definition describes.
    pub fn prompt_builder(&self) -> Result<PromptBuilder, TemplateError> {
        Ok(
            PromptBuilder::new(self.template.clone(), self.mode, self.labels.clone())?
                .with_transcript_order(self.transcript_order)
                .with_covariate_policy(self.covariate_policy.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition() -> ExperimentDefinition {
        ExperimentDefinition::new(
            "exp",
            PromptTemplate::parse("[{current_state}] {s_response} {t_response}").unwrap(),
            PromptMode::SingleTurn,
        )
    }

    #[test]
    fn defaults_are_deterministic_sampling() {
        let sampling = SamplingConfig::default();
        assert_eq!(sampling.temperature, 0.0);
        assert_eq!(sampling.top_p, 1.0);
        assert_eq!(sampling.max_tokens, 512);
    }

    #[test]
    fn valid_definition_passes() {
        assert!(definition().validate().is_ok());
        assert!(definition().prompt_builder().is_ok());
    }

    #[test]
    fn name_must_be_plain_file_name() {
        let def = ExperimentDefinition {
            name: "../escape".to_string(),
            ..definition()
        };
        assert!(matches!(
            def.validate(),
            Err(ValidationError::InvalidFormat { .. })
        ));

        let def = ExperimentDefinition {
            name: "  ".to_string(),
            ..definition()
        };
        assert_eq!(def.validate(), Err(ValidationError::empty_field("name")));
    }

    #[test]
    fn repetitions_must_be_positive() {
        let def = definition().with_repetitions(0);
        assert!(matches!(
            def.validate(),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn initial_state_must_be_a_member_label() {
        let def = definition().with_initial_state(EmotionLabel::new("Delight").unwrap());
        assert!(def.validate().is_ok());

        let def = definition().with_initial_state(EmotionLabel::new("serenity").unwrap());
        assert!(matches!(
            def.validate(),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn yaml_definition_fills_defaults() {
        let yaml = r#"
name: experiment_custom
template: "Current: [{current_state}]\n{transcript}\nChoose from {states}"
mode: transcript
repetitions: 2
seed: 42
"#;
        let def = ExperimentDefinition::from_yaml(yaml).unwrap();
        assert_eq!(def.name, "experiment_custom");
        assert_eq!(def.model, DEFAULT_MODEL);
        assert_eq!(def.mode, PromptMode::Transcript);
        assert_eq!(def.transcript_order, TranscriptOrder::PriorPairs);
        assert_eq!(def.repetitions, 2);
        assert_eq!(def.seed, Some(42));
        assert_eq!(def.labels, LabelSet::default());
        assert_eq!(def.sampling, SamplingConfig::default());
        assert_eq!(def.initial_state, None);
    }

    #[test]
    fn yaml_definition_reads_covariate_policy() {
        let yaml = "name: x\ntemplate: \"{math_level}\"\ncovariate_policy:\n  placeholder: unknown\n";
        let def = ExperimentDefinition::from_yaml(yaml).unwrap();
        assert_eq!(def.covariate_policy, CovariatePolicy::Placeholder("unknown".to_string()));

        let yaml = "name: x\ntemplate: \"{math_level}\"\ncovariate_policy: require\n";
        let def = ExperimentDefinition::from_yaml(yaml).unwrap();
        assert_eq!(def.covariate_policy, CovariatePolicy::Require);
    }

    #[test]
    fn yaml_with_bad_template_fails_to_parse() {
        let yaml = "name: x\ntemplate: \"{unclosed\"\n";
        assert!(ExperimentDefinition::from_yaml(yaml).is_err());
    }

    #[test]
    fn mode_mismatch_surfaces_from_prompt_builder() {
        let def = ExperimentDefinition::new(
            "exp",
            PromptTemplate::parse("{transcript}").unwrap(),
            PromptMode::SingleTurn,
        );
        assert!(matches!(
            def.prompt_builder(),
            Err(TemplateError::UnknownField { .. })
        ));
    }
}
