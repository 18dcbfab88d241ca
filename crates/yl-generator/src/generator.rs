//! Lyrics generator with validation and corrective retry.
//!
//! Drives the pure retry machine from `yl_core::retry`: each step is either a
//! generator call (after backoff), a validation, or a prompt correction. Only
//! `generation_unavailable` and `invalid_structure` escape to the caller.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use yl_core::{
    transition, validate, Event, FailureKind, GenerationRequest, Phase, RetryState, Step,
    ValidationOutcome, Violation, SECTIONS_COUNT,
};

use crate::client::{GenerationClient, GenerationError};
use crate::config::GeneratorConfig;
use crate::prompt::PromptSynthesizer;

const MAX_OUTPUT_LOG_CHARS: usize = 2_000;

/// Waits between transport attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real sleeping on the tokio timer. Blocks only the calling task.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Fatal outcome of one generation request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LyricsError {
    /// A transport cycle ran out of attempts.
    #[error("generation_unavailable after {attempts} attempts: {last_error}")]
    GenerationUnavailable {
        /// Generator calls made across all cycles.
        attempts: u32,
        corrections_used: u32,
        last_error: GenerationError,
    },

    /// Output still broke the grammar after the correction budget was spent.
    #[error("invalid_structure after {corrections_used} corrections: {violation}")]
    InvalidStructure {
        corrections_used: u32,
        violation: Violation,
    },
}

impl LyricsError {
    /// Stable reason code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            LyricsError::GenerationUnavailable { .. } => FailureKind::GenerationUnavailable,
            LyricsError::InvalidStructure { .. } => FailureKind::InvalidStructure,
        }
    }
}

/// What happened on a single generator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Transport(GenerationError),
    Invalid(Violation),
    Valid,
}

/// Record of a single generator call.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// 0 for the initial cycle, n for the n-th correction.
    pub cycle: u32,
    /// Attempt number within the cycle (1-indexed)
    pub attempt: u32,
    pub outcome: AttemptOutcome,
    /// Duration of the call (excluding backoff)
    pub duration: Duration,
}

/// Successful generation.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    /// Sanitized lyrics that passed every structural check.
    pub lyrics: String,
    /// Generator calls made.
    pub transport_attempts: u32,
    pub corrections_used: u32,
    /// Total duration, including backoff.
    pub duration: Duration,
    pub attempt_history: Vec<AttemptRecord>,
}

impl GenerationReport {
    /// Format as a summary string.
    pub fn format_summary(&self) -> String {
        let mut summary = format!(
            "[SUCCESS] Generation completed in {:.2}s\n",
            self.duration.as_secs_f64()
        );
        summary.push_str(&format!("  Generator calls: {}\n", self.transport_attempts));
        summary.push_str(&format!("  Corrections used: {}\n", self.corrections_used));

        for record in &self.attempt_history {
            let outcome = match &record.outcome {
                AttemptOutcome::Transport(err) => err.to_string(),
                AttemptOutcome::Invalid(violation) => violation.to_string(),
                AttemptOutcome::Valid => "valid".to_string(),
            };
            summary.push_str(&format!(
                "  cycle {} attempt {}: {} ({:.2}s)\n",
                record.cycle,
                record.attempt,
                outcome,
                record.duration.as_secs_f64()
            ));
        }

        summary.push_str(&format!("\nGenerated {} lines.\n", self.lyrics.lines().count()));
        summary
    }
}

/// Produces structurally valid lyrics from an unreliable generator.
///
/// Holds no per-request state; one instance serves concurrent requests.
pub struct LyricsGenerator<C, S = TokioSleeper> {
    client: C,
    sleeper: S,
    config: GeneratorConfig,
}

impl<C: GenerationClient> LyricsGenerator<C, TokioSleeper> {
    /// Create a generator that sleeps on the tokio timer.
    pub fn new(client: C, config: GeneratorConfig) -> Self {
        Self::with_sleeper(client, TokioSleeper, config)
    }
}

impl<C: GenerationClient, S: Sleeper> LyricsGenerator<C, S> {
    /// Create with a custom sleeper (simulated time in tests).
    pub fn with_sleeper(client: C, sleeper: S, config: GeneratorConfig) -> Self {
        Self {
            client,
            sleeper,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate lyrics for a request.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationReport, LyricsError> {
        let prompt = PromptSynthesizer::synthesize(request);
        self.generate_from_prompt(prompt).await
    }

    /// Generate lyrics from a ready-made prompt.
    pub async fn generate_from_prompt(
        &self,
        prompt: String,
    ) -> Result<GenerationReport, LyricsError> {
        let policy = &self.config.policy;
        let start = Instant::now();

        let mut state = RetryState::new(policy, prompt);
        let mut attempt_history: Vec<AttemptRecord> = Vec::new();
        let mut candidate: Option<String> = None;
        let mut accepted: Option<String> = None;
        let mut last_error: Option<GenerationError> = None;
        let mut last_violation: Option<Violation> = None;

        info!(
            prompt_len = state.prompt.len(),
            attempts_max = policy.transport_attempts_max(),
            "lyrics generation started"
        );
        debug!(prompt = %truncate(&state.prompt, MAX_OUTPUT_LOG_CHARS), "synthesized prompt");

        loop {
            let event = match state.next_step(policy) {
                Step::Generate { backoff } => {
                    if let Some(delay) = backoff {
                        debug!(
                            cycle = state.cycle,
                            delay_ms = delay.as_millis() as u64,
                            "backing off before retry"
                        );
                        self.sleeper.sleep(delay).await;
                    }

                    let attempt_start = Instant::now();
                    let result = self.client.generate(&state.prompt).await;
                    let attempt = state.attempts_in_cycle + 1;

                    match result {
                        Ok(text) => {
                            debug!(
                                cycle = state.cycle,
                                attempt,
                                output = %truncate(&text, MAX_OUTPUT_LOG_CHARS),
                                "generator returned text"
                            );
                            candidate = Some(text);
                            // Outcome is filled in after validation.
                            attempt_history.push(AttemptRecord {
                                cycle: state.cycle,
                                attempt,
                                outcome: AttemptOutcome::Valid,
                                duration: attempt_start.elapsed(),
                            });
                            Event::TransportSucceeded
                        }
                        Err(err) => {
                            warn!(
                                cycle = state.cycle,
                                attempt,
                                code = err.code(),
                                error = %err,
                                "generator call failed"
                            );
                            attempt_history.push(AttemptRecord {
                                cycle: state.cycle,
                                attempt,
                                outcome: AttemptOutcome::Transport(err.clone()),
                                duration: attempt_start.elapsed(),
                            });
                            last_error = Some(err);
                            Event::TransportFailed
                        }
                    }
                }

                Step::Validate => {
                    let raw = candidate.take().unwrap_or_default();
                    let outcome = validate(&raw);
                    match outcome {
                        ValidationOutcome::Valid(text) => {
                            accepted = Some(text);
                            Event::ValidationPassed
                        }
                        ValidationOutcome::Invalid(violation) => {
                            warn!(
                                cycle = state.cycle,
                                code = violation.code(),
                                violation = %violation,
                                "generated lyrics failed validation"
                            );
                            if let Some(record) = attempt_history.last_mut() {
                                record.outcome = AttemptOutcome::Invalid(violation.clone());
                            }
                            last_violation = Some(violation);
                            Event::ValidationFailed
                        }
                    }
                }

                Step::Correct => {
                    info!(
                        cycle = state.cycle + 1,
                        "requesting corrective regeneration"
                    );
                    Event::CorrectionIssued
                }

                Step::Done => break,
            };

            state = transition(policy, &state, event);
        }

        let duration = start.elapsed();

        match (state.phase, accepted) {
            (Phase::Success, Some(lyrics)) => {
                info!(
                    attempts = state.transport_attempts_count,
                    corrections = state.corrections_used(),
                    elapsed_ms = duration.as_millis() as u64,
                    "lyrics generation succeeded"
                );
                Ok(GenerationReport {
                    lyrics,
                    transport_attempts: state.transport_attempts_count,
                    corrections_used: state.corrections_used(),
                    duration,
                    attempt_history,
                })
            }
            (Phase::Failure(FailureKind::GenerationUnavailable), _) => {
                let last_error = last_error
                    .unwrap_or_else(|| GenerationError::Transport("no attempt made".to_string()));
                warn!(
                    attempts = state.transport_attempts_count,
                    code = last_error.code(),
                    "lyrics generation unavailable"
                );
                Err(LyricsError::GenerationUnavailable {
                    attempts: state.transport_attempts_count,
                    corrections_used: state.corrections_used(),
                    last_error,
                })
            }
            _ => {
                let violation = last_violation.unwrap_or(Violation::SectionCount {
                    expected: SECTIONS_COUNT,
                    found: 0,
                });
                warn!(
                    corrections = state.corrections_used(),
                    code = violation.code(),
                    "lyrics failed validation after correction"
                );
                Err(LyricsError::InvalidStructure {
                    corrections_used: state.corrections_used(),
                    violation,
                })
            }
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...<truncated>", &text[..cut]),
        None => text.to_string(),
    }
}
