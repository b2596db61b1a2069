//! Pure view transition function
//!
//! Given the same state and event it always produces the same outcome and
//! performs no I/O. Network calls and cancellation leave as [`Effect`]s.

use super::state::{Failure, FailureKind, RequestId};
use super::{Effect, ViewEvent, ViewState};
use thiserror::Error;

/// Result of a view transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ViewState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ViewState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Still waiting for the analysis service; please wait")]
    Busy,
}

pub fn transition(state: &ViewState, event: ViewEvent) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Submission
        // ============================================================

        // Re-submission is disabled while a call is in flight
        (ViewState::Submitting { .. }, ViewEvent::Submit { .. } | ViewEvent::Dismiss) => {
            Err(TransitionError::Busy)
        }

        // Missing precondition: show it, issue nothing
        (_, ViewEvent::Submit { request: None, .. }) => {
            Ok(TransitionResult::new(ViewState::Failed {
                failure: Failure::precondition_missing(),
            }))
        }

        // Idle, Succeeded, Failed + Submit -> Submitting (a retry is just another submit)
        (_, ViewEvent::Submit {
            request_id,
            request: Some(request),
        }) => Ok(
            TransitionResult::new(ViewState::Submitting { request_id, request })
                .with_effect(Effect::RequestAnalysis { request_id, request }),
        ),

        // ============================================================
        // Completion
        // ============================================================

        (
            ViewState::Submitting {
                request_id: pending,
                request,
            },
            ViewEvent::AnalysisSucceeded { request_id, result },
        ) if *pending == request_id => Ok(TransitionResult::new(ViewState::Succeeded {
            request_id,
            request: *request,
            result,
        })),

        (
            ViewState::Submitting {
                request_id: pending,
                ..
            },
            ViewEvent::AnalysisFailed { request_id, error },
        ) if *pending == request_id => match FailureKind::from_error_kind(error.kind) {
            Some(kind) => Ok(TransitionResult::new(ViewState::Failed {
                failure: Failure {
                    kind,
                    message: error.message,
                },
            })),
            None => Ok(TransitionResult::new(ViewState::Idle)),
        },

        (
            ViewState::Submitting {
                request_id: pending,
                ..
            },
            ViewEvent::AnalysisAborted { request_id },
        ) if *pending == request_id => Ok(TransitionResult::new(ViewState::Idle)),

        // Stale completion from an earlier or cancelled call
        (
            _,
            ViewEvent::AnalysisSucceeded { request_id, .. }
            | ViewEvent::AnalysisFailed { request_id, .. }
            | ViewEvent::AnalysisAborted { request_id },
        ) => Ok(ignore_stale(state, request_id)),

        // ============================================================
        // Dismiss / Leave
        // ============================================================

        (ViewState::Submitting { request_id, .. }, ViewEvent::Leave) => {
            Ok(TransitionResult::new(ViewState::Idle).with_effect(Effect::AbortAnalysis {
                request_id: *request_id,
            }))
        }

        (_, ViewEvent::Leave | ViewEvent::Dismiss) => Ok(TransitionResult::new(ViewState::Idle)),
    }
}

fn ignore_stale(state: &ViewState, request_id: RequestId) -> TransitionResult {
    tracing::debug!(%request_id, state = state.name(), "Ignoring stale analysis completion");
    TransitionResult::new(state.clone())
}
