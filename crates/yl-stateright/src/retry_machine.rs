//! Stateright model for the retry machine.
//!
//! Explores every interleaving of transport and validation outcomes the
//! generator can observe, bounded by the policy's attempt budgets.
//!
//! | Property                         | Kind       |
//! |----------------------------------|------------|
//! | corrections within budget        | always     |
//! | attempts within cycle budget     | always     |
//! | calls within total budget        | always     |
//! | validations within budget        | always     |
//! | unvalidated unavailability       | always     |
//! | prompt amended by corrections    | always     |
//! | success follows validation       | always     |
//! | terminates                       | eventually |
//! | each outcome reachable           | sometimes  |

use stateright::{Model, Property};

use yl_core::{transition, Event, FailureKind, Phase, RetryPolicy, RetryState, CORRECTIVE_INSTRUCTION};

/// Model over [`RetryState`] with observed [`Event`]s as actions.
pub struct RetryModel {
    pub policy: RetryPolicy,
    pub prompt: String,
}

impl RetryModel {
    /// Model for the given policy.
    pub fn new(policy: RetryPolicy) -> Self {
        debug_assert!(policy.initial_attempts_max > 0);
        debug_assert!(
            policy.transport_attempts_max() <= 16,
            "Model checking with large budgets is slow"
        );

        Self {
            policy,
            prompt: "write a song".to_string(),
        }
    }

    /// Prompt a state in `cycle` should carry.
    fn expected_prompt(&self, cycle: u32) -> String {
        if cycle == 0 {
            self.prompt.clone()
        } else {
            format!("{}{}", self.prompt, CORRECTIVE_INSTRUCTION)
        }
    }
}

impl Default for RetryModel {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl Model for RetryModel {
    type State = RetryState;
    type Action = Event;

    fn init_states(&self) -> Vec<Self::State> {
        vec![RetryState::new(&self.policy, self.prompt.clone())]
    }

    fn actions(&self, state: &Self::State, actions: &mut Vec<Self::Action>) {
        match state.phase {
            Phase::AttemptingTransport => {
                actions.push(Event::TransportSucceeded);
                actions.push(Event::TransportFailed);
            }
            Phase::Validating => {
                actions.push(Event::ValidationPassed);
                actions.push(Event::ValidationFailed);
            }
            Phase::Correcting => actions.push(Event::CorrectionIssued),
            Phase::Success | Phase::Failure(_) => {}
        }
    }

    fn next_state(&self, state: &Self::State, action: Self::Action) -> Option<Self::State> {
        let next = transition(&self.policy, state, action);
        // Every offered action must move the machine.
        if next == *state {
            return None;
        }
        Some(next)
    }

    fn properties(&self) -> Vec<Property<Self>> {
        vec![
            Property::always("corrections within budget", |model: &Self, state: &RetryState| {
                state.corrections_used() <= model.policy.corrections_max
                    && state.corrections_used() + state.corrections_remaining
                        == model.policy.corrections_max
            }),
            Property::always("attempts within cycle budget", |model: &Self, state: &RetryState| {
                let budget = model.policy.attempts_for_cycle(state.cycle);
                state.attempts_in_cycle <= budget
                    && state.attempts_in_cycle + state.attempts_remaining == budget
            }),
            Property::always("calls within total budget", |model: &Self, state: &RetryState| {
                state.transport_attempts_count <= model.policy.transport_attempts_max()
            }),
            Property::always("validations within budget", |model: &Self, state: &RetryState| {
                state.validations_count <= model.policy.corrections_max + 1
            }),
            Property::always("unvalidated unavailability", |_: &Self, state: &RetryState| {
                // Exhausting the first cycle means no text ever reached the validator.
                state.phase != Phase::Failure(FailureKind::GenerationUnavailable)
                    || state.cycle > 0
                    || state.validations_count == 0
            }),
            Property::always("prompt amended by corrections", |model: &Self, state: &RetryState| {
                state.prompt == model.expected_prompt(state.cycle)
            }),
            Property::always("success follows validation", |_: &Self, state: &RetryState| {
                state.phase != Phase::Success || state.validations_count == state.cycle + 1
            }),
            Property::eventually("terminates", |_: &Self, state: &RetryState| {
                state.is_terminal()
            }),
            Property::sometimes("success", |_: &Self, state: &RetryState| {
                state.phase == Phase::Success && state.cycle == 0
            }),
            Property::sometimes("success after correction", |_: &Self, state: &RetryState| {
                state.phase == Phase::Success && state.cycle > 0
            }),
            Property::sometimes("invalid structure", |_: &Self, state: &RetryState| {
                state.phase == Phase::Failure(FailureKind::InvalidStructure)
            }),
            Property::sometimes("unavailable after correction", |_: &Self, state: &RetryState| {
                state.phase == Phase::Failure(FailureKind::GenerationUnavailable) && state.cycle > 0
            }),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stateright::Checker;

    #[test]
    fn test_initial_state() {
        let model = RetryModel::default();
        let init = model.init_states();
        assert_eq!(init.len(), 1);
        assert_eq!(init[0].phase, Phase::AttemptingTransport);
        assert_eq!(init[0].attempts_remaining, 3);
    }

    #[test]
    fn test_terminal_states_offer_no_actions() {
        let model = RetryModel::default();
        let mut state = model.init_states().remove(0);
        state.phase = Phase::Success;

        let mut actions = Vec::new();
        model.actions(&state, &mut actions);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_model_checking_default_policy() {
        let checker = RetryModel::default()
            .checker()
            .threads(1)
            .spawn_bfs()
            .join();

        checker.assert_properties();
        assert!(checker.unique_state_count() > 10);
    }

    #[test]
    fn test_model_checking_without_corrections() {
        let policy = RetryPolicy {
            corrections_max: 0,
            ..Default::default()
        };
        let checker = RetryModel::new(policy).checker().spawn_bfs().join();

        // No correction means the corrected outcomes are unreachable.
        assert!(checker.discovery("success after correction").is_none());
        assert!(checker.discovery("unavailable after correction").is_none());
        assert!(checker.discovery("corrections within budget").is_none());
        assert!(checker.discovery("invalid structure").is_some());
    }

    #[test]
    #[ignore] // Slower test, run with --ignored
    fn test_model_checking_large_policy() {
        let policy = RetryPolicy {
            initial_attempts_max: 5,
            corrective_attempts_max: 3,
            corrections_max: 3,
            ..Default::default()
        };

        RetryModel::new(policy)
            .checker()
            .threads(num_cpus::get())
            .spawn_bfs()
            .join()
            .assert_properties();
    }
}
