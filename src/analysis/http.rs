//! HTTP implementation of the analysis service

use super::error::{service_error_message, DEFAULT_SERVICE_ERROR};
use super::types::parse_success_body;
use super::{AnalysisError, AnalysisRequest, AnalysisResult, AnalysisService};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Talks to the analysis service over `POST {base_url}/analyze`
pub struct HttpAnalysisService {
    client: Client,
    endpoint: String,
}

impl HttpAnalysisService {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, AnalysisError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AnalysisError::transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/analyze", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisService {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnalysisError::transport(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    AnalysisError::transport(format!("Connection failed: {e}"))
                } else {
                    AnalysisError::transport(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if status.is_success() {
                AnalysisError::transport(format!("Failed to read response: {e}"))
            } else {
                // The status already answers the call
                AnalysisError::service(status.as_u16(), DEFAULT_SERVICE_ERROR)
            }
        })?;

        if !status.is_success() {
            return Err(AnalysisError::service(
                status.as_u16(),
                service_error_message(&body),
            ));
        }

        parse_success_body(&body, request)
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::testing::success_body;
    use crate::analysis::AnalysisErrorKind;
    use crate::ballot::TwoBits;
    use axum::{
        extract::State,
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// What the stub answers and what it saw
    #[derive(Clone)]
    struct StubState {
        status: StatusCode,
        body: Option<Value>,
        /// Echo the request into a well-formed success body instead of `body`
        echo: bool,
        /// Replaces `secure.counts` in an echoed body
        counts: Option<Value>,
        seen: Arc<Mutex<Vec<(Option<String>, Value)>>>,
    }

    async fn analyze_handler(
        State(state): State<StubState>,
        headers: HeaderMap,
        Json(request): Json<Value>,
    ) -> (StatusCode, String) {
        let content_type = headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        state.seen.lock().unwrap().push((content_type, request.clone()));

        if state.echo {
            let message: TwoBits = request["message"].as_str().unwrap().parse().unwrap();
            let include_eve = request["include_eve"].as_bool().unwrap();
            let mut body = success_body(message, include_eve);
            if let Some(counts) = state.counts {
                body["secure"]["counts"] = counts;
            }
            return (state.status, body.to_string());
        }
        let body = state.body.map(|b| b.to_string()).unwrap_or_default();
        (state.status, body)
    }

    async fn spawn_stub(state: StubState) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new()
            .route("/analyze", post(analyze_handler))
            .with_state(state);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}")
    }

    fn echo_stub() -> StubState {
        StubState {
            status: StatusCode::OK,
            body: None,
            echo: true,
            counts: None,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn fixed_stub(status: StatusCode, body: Option<Value>) -> StubState {
        StubState {
            status,
            body,
            echo: false,
            counts: None,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    #[tokio::test]
    async fn test_sends_json_body_and_decodes_result() {
        let stub = echo_stub();
        let seen = stub.seen.clone();
        let url = spawn_stub(stub).await;
        let service = HttpAnalysisService::new(&url, None).unwrap();

        let request = AnalysisRequest::new(TwoBits::Three, false);
        let result = service.analyze(&request).await.unwrap();
        assert_eq!(result.message, TwoBits::Three);
        assert_eq!(result.secure.counts.decoded(), TwoBits::Three);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0.as_deref(), Some("application/json"));
        assert_eq!(seen[0].1, json!({"message": "11", "include_eve": false}));
    }

    #[tokio::test]
    async fn test_eve_presence_follows_request_flag() {
        let url = spawn_stub(echo_stub()).await;
        let service = HttpAnalysisService::new(&url, None).unwrap();

        for bits in TwoBits::ALL {
            for include_eve in [false, true] {
                let result = service
                    .analyze(&AnalysisRequest::new(bits, include_eve))
                    .await
                    .unwrap();
                assert_eq!(result.eve.is_some(), include_eve);
                assert_eq!(result.include_eve, include_eve);
            }
        }
    }

    #[tokio::test]
    async fn test_histogram_counts_over_http() {
        let mut stub = echo_stub();
        stub.counts = Some(json!({"0 11": 700, "1 11": 100, "0 01": 224}));
        let url = spawn_stub(stub).await;
        let service = HttpAnalysisService::new(&url, None).unwrap();

        let result = service
            .analyze(&AnalysisRequest::new(TwoBits::Three, false))
            .await
            .unwrap();
        let counts = &result.secure.counts;
        assert_eq!(counts.decoded(), TwoBits::Three);
        assert_eq!(counts.shots().get(&TwoBits::Three), Some(&800));
        assert_eq!(counts.shots().get(&TwoBits::One), Some(&224));
        assert_eq!(counts.total_shots(), 1024);
    }

    /// Answers one request with `head` and a body shorter than its declared length
    async fn spawn_truncating_server(head: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            // The JSON request body is the last thing sent
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.ends_with(b"}") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!("{head}\r\nContent-Length: 100\r\n\r\n{{\"err");
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_unreadable_error_body_keeps_service_status() {
        let url = spawn_truncating_server("HTTP/1.1 500 Internal Server Error").await;
        let service = HttpAnalysisService::new(&url, None).unwrap();

        let err = service
            .analyze(&AnalysisRequest::new(TwoBits::Zero, false))
            .await
            .unwrap_err();
        assert_eq!(err.kind, AnalysisErrorKind::Service);
        assert_eq!(err.status, Some(500));
        assert_eq!(err.message, DEFAULT_SERVICE_ERROR);
    }

    #[tokio::test]
    async fn test_unreadable_success_body_is_transport_error() {
        let url = spawn_truncating_server("HTTP/1.1 200 OK").await;
        let service = HttpAnalysisService::new(&url, None).unwrap();

        let err = service
            .analyze(&AnalysisRequest::new(TwoBits::Zero, false))
            .await
            .unwrap_err();
        assert_eq!(err.kind, AnalysisErrorKind::Transport);
        assert!(err.message.starts_with("Failed to read response"));
    }

    #[tokio::test]
    async fn test_service_error_message_is_surfaced() {
        let url = spawn_stub(fixed_stub(
            StatusCode::INTERNAL_SERVER_ERROR,
            Some(json!({"error": "boom"})),
        ))
        .await;
        let service = HttpAnalysisService::new(&url, None).unwrap();

        let err = service
            .analyze(&AnalysisRequest::new(TwoBits::Zero, false))
            .await
            .unwrap_err();
        assert_eq!(err.kind, AnalysisErrorKind::Service);
        assert_eq!(err.message, "boom");
        assert_eq!(err.status, Some(500));
    }

    #[tokio::test]
    async fn test_service_error_without_body_uses_default() {
        let url = spawn_stub(fixed_stub(StatusCode::INTERNAL_SERVER_ERROR, None)).await;
        let service = HttpAnalysisService::new(&url, None).unwrap();

        let err = service
            .analyze(&AnalysisRequest::new(TwoBits::Zero, false))
            .await
            .unwrap_err();
        assert_eq!(err.kind, AnalysisErrorKind::Service);
        assert!(!err.message.is_empty());
        assert_eq!(err.message, DEFAULT_SERVICE_ERROR);
    }

    #[tokio::test]
    async fn test_validation_error_from_service() {
        let url = spawn_stub(fixed_stub(
            StatusCode::BAD_REQUEST,
            Some(json!({"error": "Invalid message. Use 00, 01, 10, or 11."})),
        ))
        .await;
        let service = HttpAnalysisService::new(&url, None).unwrap();

        let err = service
            .analyze(&AnalysisRequest::new(TwoBits::One, false))
            .await
            .unwrap_err();
        assert_eq!(err.status, Some(400));
        assert!(err.message.starts_with("Invalid message"));
    }

    #[tokio::test]
    async fn test_intercepted_channel_without_eve_is_malformed() {
        let mut body = success_body(TwoBits::One, true);
        body.as_object_mut().unwrap().remove("eve");
        let stub = fixed_stub(StatusCode::OK, Some(body));
        let seen = stub.seen.clone();
        let url = spawn_stub(stub).await;
        let service = HttpAnalysisService::new(&url, None).unwrap();

        let err = service
            .analyze(&AnalysisRequest::new(TwoBits::One, true))
            .await
            .unwrap_err();
        assert_eq!(err.kind, AnalysisErrorKind::MalformedResponse);
        assert_eq!(
            seen.lock().unwrap()[0].1,
            json!({"message": "01", "include_eve": true})
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        // Bind then drop to get a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let service = HttpAnalysisService::new(&format!("http://{addr}"), None).unwrap();
        let err = service
            .analyze(&AnalysisRequest::new(TwoBits::Two, false))
            .await
            .unwrap_err();
        assert_eq!(err.kind, AnalysisErrorKind::Transport);
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let service = HttpAnalysisService::new("http://127.0.0.1:5000/", None).unwrap();
        assert_eq!(service.endpoint, "http://127.0.0.1:5000/analyze");
    }
}
