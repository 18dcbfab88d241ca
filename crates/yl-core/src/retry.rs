//! Retry state machine for generation against an unreliable producer.
//!
//! The machine is pure: [`transition`] maps a state and an observed event to
//! the next state, and [`RetryState::next_step`] tells the driver what to do.
//! Attempt-budget bookkeeping lives here, so it can be tested and model
//! checked without a network or a clock.
//!
//! ```text
//!              TransportFailed (budget left)
//!                 ┌──────────┐
//!                 ▼          │
//!  start ──> AttemptingTransport ──TransportFailed (exhausted)──> Failure(generation_unavailable)
//!                 │     ▲
//!   TransportSucceeded  └──────────────CorrectionIssued─────────┐
//!                 ▼                                             │
//!            Validating ──ValidationFailed (budget left)──> Correcting
//!                 │
//!                 ├──ValidationPassed──> Success
//!                 └──ValidationFailed (exhausted)──> Failure(invalid_structure)
//! ```

use std::time::Duration;

/// Suffix appended to the prompt before a corrective regeneration.
pub const CORRECTIVE_INSTRUCTION: &str =
    "\n\nIMPORTANT: Your previous output violated structure. Rewrite and strictly follow ALL rules.";

/// Attempt budgets and backoff for one end-to-end generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Transport attempts in the first cycle.
    pub initial_attempts_max: u32,
    /// Transport attempts in each corrective cycle.
    pub corrective_attempts_max: u32,
    /// Corrective regenerations allowed after a structural failure.
    pub corrections_max: u32,
    /// Delay before the second attempt of a cycle.
    pub backoff_base: Duration,
    /// Added to the delay for every further attempt.
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_attempts_max: 3,
            corrective_attempts_max: 2,
            corrections_max: 1,
            backoff_base: Duration::from_millis(600),
            backoff_step: Duration::from_millis(300),
        }
    }
}

impl RetryPolicy {
    /// More transport attempts, same single correction.
    #[must_use]
    pub fn patient() -> Self {
        Self {
            initial_attempts_max: 5,
            corrective_attempts_max: 3,
            ..Default::default()
        }
    }

    /// Transport attempts allowed in `cycle` (0 is the initial cycle).
    #[must_use]
    pub fn attempts_for_cycle(&self, cycle: u32) -> u32 {
        if cycle == 0 {
            self.initial_attempts_max
        } else {
            self.corrective_attempts_max
        }
    }

    /// Delay to wait before the attempt with the given zero-based index.
    ///
    /// The first attempt of a cycle never waits.
    #[must_use]
    pub fn backoff_before(&self, attempt_index: u32) -> Option<Duration> {
        if attempt_index == 0 {
            return None;
        }
        Some(self.backoff_base + self.backoff_step * (attempt_index - 1))
    }

    /// Sum of all backoff delays if every attempt of every cycle fails.
    #[must_use]
    pub fn worst_case_backoff(&self) -> Duration {
        (0..=self.corrections_max)
            .flat_map(|cycle| 0..self.attempts_for_cycle(cycle))
            .filter_map(|attempt| self.backoff_before(attempt))
            .sum()
    }

    /// Upper bound on generator calls for one request.
    #[must_use]
    pub fn transport_attempts_max(&self) -> u32 {
        self.initial_attempts_max + self.corrections_max * self.corrective_attempts_max
    }
}

/// Why the machine gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Every transport attempt of a cycle failed.
    GenerationUnavailable,
    /// Validation failed with no correction budget left.
    InvalidStructure,
}

impl FailureKind {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            FailureKind::GenerationUnavailable => "generation_unavailable",
            FailureKind::InvalidStructure => "invalid_structure",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    AttemptingTransport,
    Validating,
    Correcting,
    Success,
    Failure(FailureKind),
}

impl Phase {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Success | Phase::Failure(_))
    }
}

/// Something the driver observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    TransportSucceeded,
    TransportFailed,
    ValidationPassed,
    ValidationFailed,
    /// The driver acknowledged the correction and will regenerate.
    CorrectionIssued,
}

/// What the driver should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Wait for `backoff` (if any), then call the generator with the current prompt.
    Generate { backoff: Option<Duration> },
    /// Sanitize and validate the last generated text.
    Validate,
    /// Issue [`Event::CorrectionIssued`].
    Correct,
    Done,
}

/// Bookkeeping for one end-to-end call. Never shared between calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RetryState {
    pub phase: Phase,
    /// Prompt for the next generator call.
    pub prompt: String,
    /// 0 for the initial cycle, n for the n-th correction.
    pub cycle: u32,
    /// Transport attempts made in the current cycle.
    pub attempts_in_cycle: u32,
    /// Transport attempts left in the current cycle.
    pub attempts_remaining: u32,
    pub corrections_remaining: u32,
    /// Transport attempts made across all cycles.
    pub transport_attempts_count: u32,
    /// Validator runs across all cycles.
    pub validations_count: u32,
}

impl RetryState {
    /// Initial state for a fresh request.
    #[must_use]
    ///
    /// A zero attempt budget starts the machine exhausted.
    pub fn new(policy: &RetryPolicy, prompt: impl Into<String>) -> Self {
        let phase = if policy.initial_attempts_max == 0 {
            Phase::Failure(FailureKind::GenerationUnavailable)
        } else {
            Phase::AttemptingTransport
        };

        Self {
            phase,
            prompt: prompt.into(),
            cycle: 0,
            attempts_in_cycle: 0,
            attempts_remaining: policy.initial_attempts_max,
            corrections_remaining: policy.corrections_max,
            transport_attempts_count: 0,
            validations_count: 0,
        }
    }

    /// Corrective regenerations issued so far.
    #[must_use]
    pub fn corrections_used(&self) -> u32 {
        self.cycle
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// The action the driver should take in the current phase.
    #[must_use]
    pub fn next_step(&self, policy: &RetryPolicy) -> Step {
        match self.phase {
            Phase::AttemptingTransport => Step::Generate {
                backoff: policy.backoff_before(self.attempts_in_cycle),
            },
            Phase::Validating => Step::Validate,
            Phase::Correcting => Step::Correct,
            Phase::Success | Phase::Failure(_) => Step::Done,
        }
    }
}

/// Apply an observed event.
///
/// Events that do not apply to the current phase leave the state unchanged.
#[must_use]
pub fn transition(policy: &RetryPolicy, state: &RetryState, event: Event) -> RetryState {
    let mut next = state.clone();

    match (state.phase, event) {
        (Phase::AttemptingTransport, Event::TransportSucceeded) => {
            next.attempts_in_cycle += 1;
            next.attempts_remaining = next.attempts_remaining.saturating_sub(1);
            next.transport_attempts_count += 1;
            next.phase = Phase::Validating;
        }
        (Phase::AttemptingTransport, Event::TransportFailed) => {
            next.attempts_in_cycle += 1;
            next.attempts_remaining = next.attempts_remaining.saturating_sub(1);
            next.transport_attempts_count += 1;
            if next.attempts_remaining == 0 {
                next.phase = Phase::Failure(FailureKind::GenerationUnavailable);
            }
        }
        (Phase::Validating, Event::ValidationPassed) => {
            next.validations_count += 1;
            next.phase = Phase::Success;
        }
        (Phase::Validating, Event::ValidationFailed) => {
            next.validations_count += 1;
            next.phase = if state.corrections_remaining > 0 {
                Phase::Correcting
            } else {
                Phase::Failure(FailureKind::InvalidStructure)
            };
        }
        (Phase::Correcting, Event::CorrectionIssued) => {
            next.corrections_remaining = next.corrections_remaining.saturating_sub(1);
            next.cycle += 1;
            next.attempts_in_cycle = 0;
            next.attempts_remaining = policy.attempts_for_cycle(next.cycle);
            if !next.prompt.ends_with(CORRECTIVE_INSTRUCTION) {
                next.prompt.push_str(CORRECTIVE_INSTRUCTION);
            }
            next.phase = if next.attempts_remaining == 0 {
                Phase::Failure(FailureKind::GenerationUnavailable)
            } else {
                Phase::AttemptingTransport
            };
        }
        _ => {}
    }

    next
}
