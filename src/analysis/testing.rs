//! Fixtures and mocks for analysis tests

use super::image::tests::fake_png_b64;
use super::types::parse_success_body;
use super::{AnalysisError, AnalysisRequest, AnalysisResult, AnalysisService};
use crate::ballot::TwoBits;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A well-formed success body as the service would send it
pub(crate) fn success_body(message: TwoBits, include_eve: bool) -> Value {
    let eve = if include_eve {
        json!({
            "circuit_img": fake_png_b64(800, 300),
            "histogram_img": fake_png_b64(640, 480),
            "counts": {
                format!("0 {message}"): 520,
                format!("1 {}", message.next()): 504,
            },
        })
    } else {
        json!({"circuit_img": null, "histogram_img": null, "counts": null})
    };

    json!({
        "message": message.as_str(),
        "include_eve": include_eve,
        "bloch_sphere_img": fake_png_b64(500, 500),
        "secure": {
            "circuit_img": fake_png_b64(800, 300),
            "histogram_img": fake_png_b64(640, 480),
            "counts": message.as_str(),
        },
        "eve": eve,
    })
}

/// A validated result matching [`success_body`]
pub(crate) fn success_result(message: TwoBits, include_eve: bool) -> AnalysisResult {
    let request = AnalysisRequest::new(message, include_eve);
    result_from_body(&success_body(message, include_eve), &request)
}

/// Validates a hand-edited fixture body
pub(crate) fn result_from_body(body: &Value, request: &AnalysisRequest) -> AnalysisResult {
    parse_success_body(&body.to_string(), request).expect("fixture body is valid")
}

/// Mock service that returns queued responses
pub(crate) struct MockAnalysisService {
    responses: Mutex<VecDeque<Result<AnalysisResult, AnalysisError>>>,
    /// Never resolve, to exercise cancellation
    hang: bool,
    requests: Mutex<Vec<AnalysisRequest>>,
}

impl MockAnalysisService {
    pub(crate) fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            hang: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::new()
        }
    }

    pub(crate) fn queue_success(&self, message: TwoBits, include_eve: bool) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(success_result(message, include_eve)));
    }

    pub(crate) fn queue_error(&self, error: AnalysisError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub(crate) fn recorded_requests(&self) -> Vec<AnalysisRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalysisService for MockAnalysisService {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        self.requests.lock().unwrap().push(*request);
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AnalysisError::transport("No mock response queued")))
    }

    fn endpoint(&self) -> &str {
        "mock://analyze"
    }
}
