//! Typed hand-off between consecutive steps

use super::Step;
use crate::ballot::VoteOption;

/// State handed forward by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WizardState {
    pub vote: VoteOption,
}

impl WizardState {
    pub fn with_vote(vote: VoteOption) -> Self {
        Self { vote }
    }
}

/// Holds at most one [`WizardState`], addressed to the step it was attached for
#[derive(Debug, Default)]
pub struct StateCarrier {
    slot: Option<(Step, WizardState)>,
}

impl StateCarrier {
    /// Replace whatever was attached before
    pub fn attach_state(&mut self, for_step: Step, state: Option<WizardState>) {
        self.slot = state.map(|s| (for_step, s));
    }

    /// Take the state attached for `step`; anything addressed elsewhere is dropped
    pub fn read_state(&mut self, step: Step) -> Option<WizardState> {
        match self.slot.take() {
            Some((target, state)) if target == step => Some(state),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ballot::VOTE_OPTIONS;

    #[test]
    fn test_state_is_read_once() {
        let mut carrier = StateCarrier::default();
        let state = WizardState::with_vote(VOTE_OPTIONS[1]);
        carrier.attach_state(Step::Transmission, Some(state));
        assert_eq!(carrier.read_state(Step::Transmission), Some(state));
        assert_eq!(carrier.read_state(Step::Transmission), None);
    }

    #[test]
    fn test_state_for_another_step_is_dropped() {
        let mut carrier = StateCarrier::default();
        carrier.attach_state(Step::Transmission, Some(WizardState::with_vote(VOTE_OPTIONS[0])));
        assert_eq!(carrier.read_state(Step::Welcome), None);
        assert_eq!(carrier.read_state(Step::Transmission), None);
    }

    #[test]
    fn test_attaching_nothing_clears_slot() {
        let mut carrier = StateCarrier::default();
        carrier.attach_state(Step::Transmission, Some(WizardState::with_vote(VOTE_OPTIONS[3])));
        carrier.attach_state(Step::Transmission, None);
        assert_eq!(carrier.read_state(Step::Transmission), None);
    }
}
