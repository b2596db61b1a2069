//! Property-based tests for the view state machine
//!
//! These tests verify key invariants hold across all event sequences.

use super::state::*;
use super::transition::TransitionError;
use super::*;
use crate::analysis::testing::success_result;
use crate::analysis::{AnalysisError, AnalysisRequest};
use crate::ballot::TwoBits;
use proptest::prelude::*;
use uuid::Uuid;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_bits() -> impl Strategy<Value = TwoBits> {
    prop_oneof![
        Just(TwoBits::Zero),
        Just(TwoBits::One),
        Just(TwoBits::Two),
        Just(TwoBits::Three),
    ]
}

fn arb_request() -> impl Strategy<Value = AnalysisRequest> {
    (arb_bits(), any::<bool>()).prop_map(|(bits, eve)| AnalysisRequest::new(bits, eve))
}

fn arb_id() -> impl Strategy<Value = RequestId> {
    any::<u128>().prop_map(Uuid::from_u128)
}

fn arb_error() -> impl Strategy<Value = AnalysisError> {
    prop_oneof![
        "[a-z ]{1,20}".prop_map(AnalysisError::transport),
        (400u16..600, "[a-z ]{1,20}").prop_map(|(s, m)| AnalysisError::service(s, m)),
        "[a-z ]{1,20}".prop_map(AnalysisError::malformed),
        Just(AnalysisError::cancelled()),
    ]
}

fn arb_failure_kind() -> impl Strategy<Value = FailureKind> {
    prop_oneof![
        Just(FailureKind::PreconditionMissing),
        Just(FailureKind::Transport),
        Just(FailureKind::Service),
        Just(FailureKind::MalformedResponse),
    ]
}

fn arb_state() -> impl Strategy<Value = ViewState> {
    prop_oneof![
        Just(ViewState::Idle),
        (arb_id(), arb_request())
            .prop_map(|(request_id, request)| ViewState::Submitting { request_id, request }),
        (arb_id(), arb_request()).prop_map(|(request_id, request)| ViewState::Succeeded {
            request_id,
            request,
            result: Box::new(success_result(request.message, request.include_eve)),
        }),
        (arb_failure_kind(), "[a-z ]{1,20}").prop_map(|(kind, message)| ViewState::Failed {
            failure: Failure { kind, message },
        }),
    ]
}

/// Completion events for arbitrary (usually foreign) ids
fn arb_completion() -> impl Strategy<Value = ViewEvent> {
    prop_oneof![
        (arb_id(), arb_bits()).prop_map(|(request_id, bits)| ViewEvent::AnalysisSucceeded {
            request_id,
            result: Box::new(success_result(bits, false)),
        }),
        (arb_id(), arb_error())
            .prop_map(|(request_id, error)| ViewEvent::AnalysisFailed { request_id, error }),
        arb_id().prop_map(|request_id| ViewEvent::AnalysisAborted { request_id }),
    ]
}

fn arb_event() -> impl Strategy<Value = ViewEvent> {
    prop_oneof![
        (arb_id(), proptest::option::of(arb_request()))
            .prop_map(|(request_id, request)| ViewEvent::Submit { request_id, request }),
        Just(ViewEvent::Dismiss),
        Just(ViewEvent::Leave),
        arb_completion(),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// A completion for an id that is not in flight never changes state
    #[test]
    fn prop_stale_completion_is_noop(state in arb_state(), event in arb_completion()) {
        prop_assume!(state.pending_request_id() != event.completion_id());
        let result = transition(&state, event).unwrap();
        prop_assert_eq!(result.new_state, state);
        prop_assert!(result.effects.is_empty());
    }

    /// Submitting is never re-entered by a second submit
    #[test]
    fn prop_submit_rejected_while_submitting(
        id in arb_id(),
        request in arb_request(),
        other in arb_id(),
        next in proptest::option::of(arb_request()),
    ) {
        let state = ViewState::Submitting { request_id: id, request };
        let result = transition(&state, ViewEvent::Submit { request_id: other, request: next });
        prop_assert_eq!(result.unwrap_err(), TransitionError::Busy);
    }

    /// Every request effect matches the submitting state it creates
    #[test]
    fn prop_request_effect_matches_state(state in arb_state(), event in arb_event()) {
        if let Ok(result) = transition(&state, event) {
            for effect in &result.effects {
                if let Effect::RequestAnalysis { request_id, request } = effect {
                    prop_assert_eq!(
                        &result.new_state,
                        &ViewState::Submitting { request_id: *request_id, request: *request }
                    );
                }
            }
        }
    }

    /// A missing precondition never produces a network call
    #[test]
    fn prop_missing_request_issues_nothing(state in arb_state(), id in arb_id()) {
        prop_assume!(!state.is_submitting());
        let result = transition(&state, ViewEvent::Submit { request_id: id, request: None }).unwrap();
        prop_assert!(result.effects.is_empty());
        prop_assert_eq!(
            result.new_state.failure().map(|f| f.kind),
            Some(FailureKind::PreconditionMissing)
        );
    }

    /// Leaving always lands in idle and aborts exactly the in-flight call
    #[test]
    fn prop_leave_aborts_pending(state in arb_state()) {
        let pending = state.pending_request_id();
        let result = transition(&state, ViewEvent::Leave).unwrap();
        prop_assert_eq!(result.new_state, ViewState::Idle);
        let aborted: Vec<RequestId> = result
            .effects
            .iter()
            .filter_map(|e| match e {
                Effect::AbortAnalysis { request_id } => Some(*request_id),
                Effect::RequestAnalysis { .. } => None,
            })
            .collect();
        prop_assert_eq!(aborted, pending.into_iter().collect::<Vec<_>>());
    }
}
