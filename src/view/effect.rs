//! Effects produced by view transitions

use super::state::RequestId;
use crate::analysis::AnalysisRequest;

/// Effects to be executed after a view transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Issue one analysis call
    RequestAnalysis {
        request_id: RequestId,
        request: AnalysisRequest,
    },

    /// Cancel the in-flight analysis call
    AbortAnalysis { request_id: RequestId },
}
