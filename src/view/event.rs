//! Events that drive a step view

use super::state::RequestId;
use crate::analysis::{AnalysisError, AnalysisRequest, AnalysisResult};

/// Events that trigger view transitions
#[derive(Debug, Clone)]
pub enum ViewEvent {
    // User events
    /// `request` is `None` when the step cannot build one (missing vote)
    Submit {
        request_id: RequestId,
        request: Option<AnalysisRequest>,
    },
    Dismiss,
    /// The step is being unmounted
    Leave,

    // Runtime events
    AnalysisSucceeded {
        request_id: RequestId,
        result: Box<AnalysisResult>,
    },
    AnalysisFailed {
        request_id: RequestId,
        error: AnalysisError,
    },
    AnalysisAborted {
        request_id: RequestId,
    },
}

impl ViewEvent {
    /// Request id carried by runtime completions
    pub fn completion_id(&self) -> Option<RequestId> {
        match self {
            ViewEvent::AnalysisSucceeded { request_id, .. }
            | ViewEvent::AnalysisFailed { request_id, .. }
            | ViewEvent::AnalysisAborted { request_id } => Some(*request_id),
            _ => None,
        }
    }
}
