//! Analysis service client
//!
//! One request/response exchange with the external `/analyze` endpoint per
//! user action. Successful bodies are validated before they reach a view.

mod error;
mod http;
mod image;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{AnalysisError, AnalysisErrorKind};
pub use http::HttpAnalysisService;
pub use image::EncodedImage;
pub use types::{AnalysisRequest, AnalysisResult, ChannelReport, Counts, Verdict};

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Common interface for analysis backends
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Run one analysis round trip
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError>;

    /// Where requests go, for logs
    fn endpoint(&self) -> &str;
}

#[async_trait]
impl<T: AnalysisService + ?Sized> AnalysisService for Arc<T> {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        (**self).analyze(request).await
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }
}

/// Logging wrapper for analysis services
pub struct LoggingService<S> {
    inner: S,
}

impl<S: AnalysisService> LoggingService<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: AnalysisService> AnalysisService for LoggingService<S> {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        let start = std::time::Instant::now();
        let result = self.inner.analyze(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    endpoint = %self.inner.endpoint(),
                    message = %request.message,
                    include_eve = request.include_eve,
                    duration_ms = %duration.as_millis(),
                    decoded = %response.secure.counts.decoded(),
                    "Analysis request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    endpoint = %self.inner.endpoint(),
                    message = %request.message,
                    include_eve = request.include_eve,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    error_kind = e.kind.as_str(),
                    status = ?e.status,
                    "Analysis request failed"
                );
            }
        }

        result
    }

    fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }
}

/// Race an analysis call against cancellation
///
/// Cancelling drops the in-flight request and resolves with
/// [`AnalysisErrorKind::Cancelled`].
pub async fn analyze_cancellable<S: AnalysisService + ?Sized>(
    service: &S,
    request: &AnalysisRequest,
    cancel: &CancellationToken,
) -> Result<AnalysisResult, AnalysisError> {
    tokio::select! {
        biased;

        () = cancel.cancelled() => Err(AnalysisError::cancelled()),

        result = service.analyze(request) => result,
    }
}
