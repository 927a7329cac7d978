//! Built-in experiment presets from the tutoring affect study.
//!
//! `*_model1` presets show the model only the latest pair; `*_model2`
//! presets show the transcript so far. Experiment 1 has no current state,
//! experiment 2 adds it, experiment 3 adds the student covariates.

use super::ExperimentDefinition;
use crate::domain::prompt::{PromptMode, PromptTemplate, TemplateError};

const EXPERIMENT_1_SINGLE: &str = "
A student is using an intelligent tutoring system on math problem solving.
The system adjusts its guidance based on the student's responses.

Here's the dialog:
    - Student: {s_response}
    - Tutor: {t_response}

Based on their transcript, which emotional state is the student most likely to feel next?
Choose only one from the following options: {states}
    - Format: Write the answer inside square brackets.
    - Reasoning: Briefly explain why this emotional state is the most likely.
";

const EXPERIMENT_1_TRANSCRIPT: &str = "
A student is using an intelligent tutoring system on math problem solving.
The system adjusts its guidance based on the student's responses.

Here's the dialog:
{transcript}

Based on their transcript, which emotional state is the student most likely to feel next?
Choose only one from the following options: {states}
- Format: Write the answer inside square brackets.
- Reasoning: Briefly explain why this emotional state is the most likely.
";

const EXPERIMENT_2_SINGLE: &str = "
A student is using an intelligent tutoring system on math problem solving.
The system adjusts its guidance based on the student's responses and their current emotion state.

Here's the student's:
    - Current emotional state: [{current_state}]
    - Dialogue:
        Student: {s_response}
        Tutor: {t_response}

Based on the conversation, predict the student's most likely next emotional state.
Choose one from the following options: {states}
    - Format: Write the answer inside square brackets (e.g., [Emotion]).
    - Reasoning: Briefly explain why this emotional state is the most likely.
";

const EXPERIMENT_2_TRANSCRIPT: &str = "
The system adapts its guidance based on the student's responses and emotional state.
Here's the student's:
    - Current emotional state: [{current_state}]
    - Dialogue:
{transcript}

Based on the conversation, predict the student's most likely next emotional state.
Choose one from the following options: {states}
    - Format: Write the answer inside square brackets (e.g., [Emotion]).
    - Reasoning: Briefly explain why this emotional state is the most likely.
";

const EXPERIMENT_3_SINGLE: &str = "
Here's a student who is interacting with an intelligent tutoring system on a {math_level} problem-solving task
Their skill levels (each skill is rated on a scale from 1 to 5):
    1. Problem-solving skill level: {skill_level}
    2. Math anxiety level: {math_anxiety_level}

The system adapts its guidance based on the student's responses and emotional state.
Here's the student's:
    - Current emotional state: [{current_state}]
    - Dialogue:
        Student: {s_response}
        Tutor: {t_response}

Based on the conversation, predict the student's most likely next emotional state.
Choose one from the following options: {states}
    - Format: Write the answer inside square brackets (e.g., [Emotion]).
    - Reasoning: Briefly explain why this emotional state is the most likely.
";

const EXPERIMENT_3_TRANSCRIPT: &str = "
Here's a student who is interacting with an intelligent tutoring system on a {math_level} problem-solving task
Their skill levels (each skill is rated on a scale from 1 to 5):
    1. Problem-solving skill level: {skill_level}
    2. Math anxiety level: {math_anxiety_level}

The system adapts its guidance based on the student's responses and emotional state.
Here's the student's:
    - Current emotional state: [{current_state}]
    - Dialogue:
{transcript}

Based on the conversation, predict the student's most likely next emotional state.
Choose one from the following options: {states}
    - Format: Write the answer inside square brackets (e.g., [Emotion]).
    - Reasoning: Briefly explain why this emotional state is the most likely.
";

/// (name, mode, template) for every preset.
const PRESETS: [(&str, PromptMode, &str); 6] = [
    ("experiment_1_model1", PromptMode::SingleTurn, EXPERIMENT_1_SINGLE),
    ("experiment_1_model2", PromptMode::Transcript, EXPERIMENT_1_TRANSCRIPT),
    ("experiment_2_model1", PromptMode::SingleTurn, EXPERIMENT_2_SINGLE),
    ("experiment_2_model2", PromptMode::Transcript, EXPERIMENT_2_TRANSCRIPT),
    ("experiment_3_model1", PromptMode::SingleTurn, EXPERIMENT_3_SINGLE),
    ("experiment_3_model2", PromptMode::Transcript, EXPERIMENT_3_TRANSCRIPT),
];

/// Names and modes of every preset, in study order.
pub fn preset_names() -> impl Iterator<Item = (&'static str, PromptMode)> {
    PRESETS.iter().map(|(name, mode, _)| (*name, *mode))
}

/// Looks up a preset by name.
pub fn preset(name: &str) -> Option<Result<ExperimentDefinition, TemplateError>> {
    PRESETS
        .iter()
        .find(|(preset_name, _, _)| *preset_name == name)
        .map(|(preset_name, mode, source)| {
            PromptTemplate::parse(*source)
                .map(|template| ExperimentDefinition::new(*preset_name, template, *mode))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dialogue::CovariateField;

    #[test]
    fn every_preset_parses_and_fits_its_mode() {
        for (name, mode) in preset_names() {
            let definition = preset(name).unwrap().unwrap();
            assert_eq!(definition.name, name);
            assert_eq!(definition.mode, mode);
            assert!(definition.validate().is_ok(), "{} invalid", name);
            assert!(definition.prompt_builder().is_ok(), "{} builder failed", name);
        }
    }

    #[test]
    fn unknown_preset_is_none() {
        assert!(preset("experiment_9").is_none());
    }

    #[test]
    fn experiment_three_references_covariates() {
        let builder = preset("experiment_3_model2")
            .unwrap()
            .unwrap()
            .prompt_builder()
            .unwrap();
        assert_eq!(builder.referenced_covariates(), CovariateField::ALL.to_vec());
    }

    #[test]
    fn experiment_one_has_no_current_state() {
        let definition = preset("experiment_1_model1").unwrap().unwrap();
        assert!(!definition.template.references("current_state"));
    }
}
