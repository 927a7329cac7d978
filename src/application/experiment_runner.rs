//! ExperimentRunner - walks every conversation turn by turn, carrying the
//! predicted emotional state from one turn into the next.
//!
//! A run is: pre-flight configuration checks, then for each repetition and
//! each student record, one completion call per well-formed student/tutor
//! pair, then a single write of the full result table. Only the pre-flight
//! checks and the final write can fail the run; service failures and
//! malformed pairs are recorded and the loop moves on.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use thiserror::Error;

use crate::application::retry::{complete_with_retry, CallOutcome, RetryPolicy};
use crate::domain::affect::{EmotionLabelExtractor, EmotionalState, Extraction};
use crate::domain::dialogue::{StudentRecord, TurnPair};
use crate::domain::experiment::{ConversationProgress, ExperimentDefinition, TurnResult};
use crate::domain::foundation::ValidationError;
use crate::domain::prompt::{PromptBuilder, PromptContext, TemplateError};
use crate::ports::{CompletionClient, CompletionRequest, ResultSink, SinkError};

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum ExperimentError {
    /// The experiment definition itself is invalid.
    #[error("invalid experiment definition: {0}")]
    Definition(#[source] ValidationError),

    /// Template or covariates do not fit the definition.
    #[error("configuration error: {0}")]
    Configuration(#[from] TemplateError),

    /// Per-conversation lifecycle was violated.
    #[error("conversation lifecycle error: {0}")]
    Lifecycle(#[source] ValidationError),

    /// The result table could not be written.
    #[error("failed to write results: {0}")]
    Sink(#[from] SinkError),
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentReport {
    pub experiment: String,
    /// Every emitted row, in processing order.
    pub results: Vec<TurnResult>,
    /// Malformed pairs that produced no row.
    pub pairs_skipped: usize,
    /// Rows whose prediction is the unknown sentinel.
    pub unknown_predictions: usize,
    /// Rows whose completion call failed.
    pub failed_calls: usize,
    /// Extra calls made because of rate limits.
    pub retries: u32,
    /// Where the sink wrote the table.
    pub location: String,
}

impl ExperimentReport {
    pub fn turns_emitted(&self) -> usize {
        self.results.len()
    }
}

#[derive(Debug, Default)]
struct RunTally {
    results: Vec<TurnResult>,
    pairs_skipped: usize,
}

/// Runs one experiment definition over a dataset.
pub struct ExperimentRunner<P: ?Sized + CompletionClient> {
    definition: ExperimentDefinition,
    builder: PromptBuilder,
    extractor: EmotionLabelExtractor,
    client: Arc<P>,
    sink: Arc<dyn ResultSink>,
    retry: RetryPolicy,
    rng: StdRng,
}

impl<P: ?Sized + CompletionClient> std::fmt::Debug for ExperimentRunner<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExperimentRunner")
            .field("experiment", &self.definition.name)
            .field("client", &self.client.client_info().name)
            .field("retry", &self.retry)
            .finish()
    }
}

impl<P: ?Sized + CompletionClient> ExperimentRunner<P> {
    /// Validates the definition and prepares the prompt builder.
    ///
    /// The random source is seeded from the definition's seed when present.
    pub fn new(
        definition: ExperimentDefinition,
        client: Arc<P>,
        sink: Arc<dyn ResultSink>,
    ) -> Result<Self, ExperimentError> {
        definition.validate().map_err(ExperimentError::Definition)?;
        let builder = definition.prompt_builder()?;
        let extractor = EmotionLabelExtractor::new(definition.labels.clone());
        let rng = match definition.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            definition,
            builder,
            extractor,
            client,
            sink,
            retry: RetryPolicy::default(),
            rng,
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replaces the random source used to seed first-turn states.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn definition(&self) -> &ExperimentDefinition {
        &self.definition
    }

    /// Runs every repetition over `records` and writes the table once.
    ///
    /// Student ids are 1-based positions in `records`.
    pub async fn run(
        &mut self,
        records: &[StudentRecord],
    ) -> Result<ExperimentReport, ExperimentError> {
        self.preflight(records)?;

        tracing::info!(
            experiment = %self.definition.name,
            model = %self.definition.model,
            mode = %self.builder.mode(),
            records = records.len(),
            repetitions = self.definition.repetitions,
            client = %self.client.client_info().name,
            "Starting experiment"
        );

        let mut tally = RunTally::default();
        for run in 0..self.definition.repetitions {
            for (index, record) in records.iter().enumerate() {
                self.run_conversation(run, index + 1, record, &mut tally)
                    .await?;
            }
        }

        let location = self
            .sink
            .write(&self.definition.name, &tally.results)
            .await?;

        let report = ExperimentReport {
            experiment: self.definition.name.clone(),
            unknown_predictions: tally
                .results
                .iter()
                .filter(|r| r.next_state.is_unknown())
                .count(),
            failed_calls: tally.results.iter().filter(|r| r.is_failure()).count(),
            retries: tally
                .results
                .iter()
                .map(|r| r.attempts.saturating_sub(1))
                .sum(),
            pairs_skipped: tally.pairs_skipped,
            results: tally.results,
            location,
        };

        tracing::info!(
            experiment = %report.experiment,
            turns = report.turns_emitted(),
            skipped = report.pairs_skipped,
            unknown = report.unknown_predictions,
            failed_calls = report.failed_calls,
            retries = report.retries,
            output = %report.location,
            "Experiment finished"
        );
        Ok(report)
    }

    /// Configuration checks that must pass before any completion call.
    fn preflight(&self, records: &[StudentRecord]) -> Result<(), ExperimentError> {
        for (index, record) in records.iter().enumerate() {
            self.builder
                .check_covariates(&record.covariates, index + 1)?;
        }
        Ok(())
    }

    async fn run_conversation(
        &mut self,
        run: u32,
        student_id: usize,
        record: &StudentRecord,
        tally: &mut RunTally,
    ) -> Result<(), ExperimentError> {
        let mut progress = match &self.definition.initial_state {
            Some(label) => {
                ConversationProgress::with_initial_state(EmotionalState::Known(label.clone()))
            }
            None => ConversationProgress::new(),
        };

        for attempt in record.conversation.pair_attempts() {
            let pair = match attempt.outcome {
                Ok(pair) => pair,
                Err(reason) => {
                    tracing::debug!(
                        run,
                        student_id,
                        time_step = attempt.time_step,
                        %reason,
                        "Skipping malformed pair"
                    );
                    tally.pairs_skipped += 1;
                    continue;
                }
            };

            let presented = progress.current_state(self.extractor.labels(), &mut self.rng);
            let prompt = self.builder.build(PromptContext {
                covariates: &record.covariates,
                current_state: &presented.state,
                pair,
                transcript: progress.transcript(),
            })?;

            let request = CompletionRequest::new(prompt.clone(), self.definition.model.clone())
                .with_sampling(self.definition.sampling);
            let outcome = complete_with_retry(self.client.as_ref(), request, &self.retry).await;

            let result = self.turn_result(TurnInputs {
                run,
                student_id,
                time_step: attempt.time_step,
                record,
                pair,
                previous_state: progress.previous_state().cloned(),
                current_state: presented.state,
                seeded: presented.seeded,
                prompt,
                outcome,
            });

            progress
                .record_turn(pair, result.next_state.clone())
                .map_err(ExperimentError::Lifecycle)?;
            tally.results.push(result);
        }

        progress.finish().map_err(ExperimentError::Lifecycle)?;
        Ok(())
    }

    fn turn_result(&self, inputs: TurnInputs<'_>) -> TurnResult {
        let TurnInputs {
            run,
            student_id,
            time_step,
            record,
            pair,
            previous_state,
            current_state,
            seeded,
            prompt,
            outcome,
        } = inputs;
        let CallOutcome {
            result,
            attempts,
            retry_after_secs,
        } = outcome;

        let (llm_response, extraction, failure, failure_detail) = match result {
            Ok(response) => {
                let extraction = self.extractor.extract(&response.content);
                (Some(response.content), extraction, None, None)
            }
            Err(err) => {
                tracing::warn!(
                    run,
                    student_id,
                    time_step,
                    attempts,
                    kind = %err.kind(),
                    error = %err,
                    "Completion failed, recording unknown"
                );
                let extraction = Extraction {
                    token: None,
                    state: EmotionalState::Unknown,
                };
                (None, extraction, Some(err.kind()), Some(err.to_string()))
            }
        };

        tracing::debug!(
            run,
            student_id,
            time_step,
            current = %current_state,
            predicted = %extraction.state,
            attempts,
            "Turn processed"
        );
        tracing::trace!(%prompt, response = ?llm_response, "Turn exchange");

        TurnResult {
            run,
            student_id,
            time_step,
            student_response: pair.student.to_string(),
            tutor_response: pair.tutor.to_string(),
            previous_state,
            current_state,
            state_seeded: seeded,
            next_state: extraction.state,
            extracted_token: extraction.token,
            math_level: record.covariates.math_level.clone(),
            skill_level: record.covariates.skill_level,
            math_anxiety_level: record.covariates.math_anxiety_level,
            prompt,
            llm_response,
            failure,
            failure_detail,
            attempts,
            retry_after_secs,
        }
    }
}

struct TurnInputs<'a> {
    run: u32,
    student_id: usize,
    time_step: u32,
    record: &'a StudentRecord,
    pair: TurnPair<'a>,
    previous_state: Option<EmotionalState>,
    current_state: EmotionalState,
    seeded: bool,
    prompt: String,
    outcome: CallOutcome,
}
