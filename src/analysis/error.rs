//! Analysis client error types

use thiserror::Error;

/// Message used when the service fails without saying why
pub const DEFAULT_SERVICE_ERROR: &str = "Server error";

/// Analysis error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AnalysisError {
    pub kind: AnalysisErrorKind,
    pub message: String,
    /// HTTP status when the service answered
    pub status: Option<u16>,
}

impl AnalysisError {
    pub fn new(kind: AnalysisErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(AnalysisErrorKind::Transport, message)
    }

    pub fn service(status: u16, message: impl Into<String>) -> Self {
        Self::new(AnalysisErrorKind::Service, message).with_status(status)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(AnalysisErrorKind::MalformedResponse, message)
    }

    pub fn cancelled() -> Self {
        Self::new(AnalysisErrorKind::Cancelled, "Request cancelled")
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisErrorKind {
    /// The request never reached the service or no response came back
    Transport,
    /// The service answered with a non-success status
    Service,
    /// The service answered 2xx with a body we cannot use
    MalformedResponse,
    /// The caller abandoned the request
    Cancelled,
}

impl AnalysisErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisErrorKind::Transport => "transport",
            AnalysisErrorKind::Service => "service",
            AnalysisErrorKind::MalformedResponse => "malformed_response",
            AnalysisErrorKind::Cancelled => "cancelled",
        }
    }
}

/// Extract the `error` field from a failure body, falling back to a generic message
pub fn service_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|e| e.as_str())
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| DEFAULT_SERVICE_ERROR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_field_is_extracted() {
        assert_eq!(service_error_message(r#"{"error":"boom"}"#), "boom");
    }

    #[test]
    fn test_missing_or_unusable_body_falls_back() {
        for body in ["", "not json", "{}", r#"{"error":42}"#, r#"{"error":"  "}"#] {
            assert_eq!(service_error_message(body), DEFAULT_SERVICE_ERROR, "body {body:?}");
        }
    }

    #[test]
    fn test_service_error_keeps_status() {
        let err = AnalysisError::service(500, "boom");
        assert_eq!(err.kind, AnalysisErrorKind::Service);
        assert_eq!(err.status, Some(500));
        assert_eq!(err.to_string(), "boom");
    }
}
