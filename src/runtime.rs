//! Effect runtime
//!
//! Executes the effects produced by view transitions. Every analysis call
//! runs as its own task, raced against a cancellation token, and reports
//! back to the UI loop as a [`ViewEvent`].

use crate::analysis::{analyze_cancellable, AnalysisErrorKind, AnalysisService};
use crate::view::{Effect, RequestId, ViewEvent};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

pub struct AnalysisRuntime<S: AnalysisService + 'static> {
    service: Arc<S>,
    event_tx: mpsc::Sender<ViewEvent>,
    /// Tokens of calls that have not reported back yet
    in_flight: HashMap<RequestId, CancellationToken>,
}

impl<S: AnalysisService + 'static> AnalysisRuntime<S> {
    pub fn new(service: Arc<S>, event_tx: mpsc::Sender<ViewEvent>) -> Self {
        Self {
            service,
            event_tx,
            in_flight: HashMap::new(),
        }
    }

    pub fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::RequestAnalysis {
                request_id,
                request,
            } => {
                let cancel = CancellationToken::new();
                self.in_flight.insert(request_id, cancel.clone());

                let service = self.service.clone();
                let event_tx = self.event_tx.clone();
                let span = tracing::info_span!(
                    "analysis",
                    %request_id,
                    message = %request.message,
                    include_eve = request.include_eve
                );

                tokio::spawn(
                    async move {
                        tracing::debug!("Making analysis request (background)");
                        let event =
                            match analyze_cancellable(service.as_ref(), &request, &cancel).await {
                                Ok(result) => ViewEvent::AnalysisSucceeded {
                                    request_id,
                                    result: Box::new(result),
                                },
                                Err(e) if e.kind == AnalysisErrorKind::Cancelled => {
                                    tracing::info!("Analysis request cancelled");
                                    ViewEvent::AnalysisAborted { request_id }
                                }
                                Err(error) => ViewEvent::AnalysisFailed { request_id, error },
                            };
                        // The UI may already be gone on shutdown
                        let _ = event_tx.send(event).await;
                    }
                    .instrument(span),
                );
            }

            Effect::AbortAnalysis { request_id } => {
                tracing::info!(%request_id, "Aborting analysis request");
                if let Some(token) = self.in_flight.remove(&request_id) {
                    token.cancel();
                }
            }
        }
    }

    /// Forget a call that has reported back
    pub fn settle(&mut self, request_id: RequestId) {
        self.in_flight.remove(&request_id);
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn abort_all(&mut self) {
        for (request_id, token) in self.in_flight.drain() {
            tracing::info!(%request_id, "Aborting analysis request on shutdown");
            token.cancel();
        }
    }
}
