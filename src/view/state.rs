//! View state types

use crate::analysis::{AnalysisErrorKind, AnalysisRequest, AnalysisResult};
use uuid::Uuid;

/// Identifies one submission so late completions can be recognised
pub type RequestId = Uuid;

pub const NO_VOTE_SELECTED: &str = "No vote was selected. Please go back and try again.";

/// Lifecycle of the analysis call a step view owns
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ViewState {
    #[default]
    Idle,
    Submitting {
        request_id: RequestId,
        request: AnalysisRequest,
    },
    Succeeded {
        request_id: RequestId,
        request: AnalysisRequest,
        result: Box<AnalysisResult>,
    },
    Failed {
        failure: Failure,
    },
}

impl ViewState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, ViewState::Submitting { .. })
    }

    /// The in-flight request, if any
    pub fn pending_request_id(&self) -> Option<RequestId> {
        match self {
            ViewState::Submitting { request_id, .. } => Some(*request_id),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            ViewState::Succeeded { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            ViewState::Failed { failure } => Some(failure),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ViewState::Idle => "idle",
            ViewState::Submitting { .. } => "submitting",
            ViewState::Succeeded { .. } => "succeeded",
            ViewState::Failed { .. } => "failed",
        }
    }
}

/// What went wrong, in the terms a view shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn precondition_missing() -> Self {
        Self {
            kind: FailureKind::PreconditionMissing,
            message: NO_VOTE_SELECTED.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Required prior-step state is absent
    PreconditionMissing,
    Transport,
    Service,
    MalformedResponse,
}

impl FailureKind {
    /// Cancelled calls are not failures and map to nothing
    pub fn from_error_kind(kind: AnalysisErrorKind) -> Option<Self> {
        match kind {
            AnalysisErrorKind::Transport => Some(FailureKind::Transport),
            AnalysisErrorKind::Service => Some(FailureKind::Service),
            AnalysisErrorKind::MalformedResponse => Some(FailureKind::MalformedResponse),
            AnalysisErrorKind::Cancelled => None,
        }
    }

    pub fn heading(self) -> &'static str {
        match self {
            FailureKind::PreconditionMissing => "Missing vote",
            FailureKind::Transport => "Service unreachable",
            FailureKind::Service => "Simulation failed",
            FailureKind::MalformedResponse => "Unexpected response",
        }
    }
}
