use crate::types::{DeliveryAck, Result};
use futures::Stream;
use serde::Serialize;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio_stream::wrappers::ReceiverStream;

/// One settled search unit, reported in settlement order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchProgress {
    /// Units settled so far, including this one
    pub completed: usize,
    pub total: usize,
    pub plan_index: usize,
    pub succeeded: bool,
}

/// Progress update emitted to the caller of a research run.
///
/// `Display` renders the text shown to the user; a successful run always
/// ends with [`ProgressEvent::Report`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Correlation id of the run, always the first event
    Trace(String),
    Starting,
    Planning,
    SearchProgress(SearchProgress),
    SearchesComplete { succeeded: usize, failed: usize },
    Writing,
    Delivered(DeliveryAck),
    DeliveryFailed(String),
    /// Long-form report content, always the last event of a successful run
    Report(String),
}

impl ProgressEvent {
    /// Stage-level events; everything except per-unit search progress
    pub fn is_milestone(&self) -> bool {
        !matches!(self, ProgressEvent::SearchProgress(_))
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::Trace(id) => f.write_str(id),
            ProgressEvent::Starting => f.write_str("starting"),
            ProgressEvent::Planning => f.write_str("planning"),
            ProgressEvent::SearchProgress(p) => write!(f, "completed {}/{}", p.completed, p.total),
            ProgressEvent::SearchesComplete { .. } => f.write_str("searches complete"),
            ProgressEvent::Writing => f.write_str("writing"),
            ProgressEvent::Delivered(_) => f.write_str("delivered"),
            ProgressEvent::DeliveryFailed(reason) => write!(f, "delivery failed: {}", reason),
            ProgressEvent::Report(content) => f.write_str(content),
        }
    }
}

/// Ordered progress of one run.
///
/// Yields `Ok` events until the run finishes, or a single terminal `Err`
/// for a fatal failure. Dropping the stream aborts the run's driver task
/// and every search still in flight.
#[derive(Debug)]
pub struct ProgressStream {
    correlation_id: Arc<str>,
    events: ReceiverStream<Result<ProgressEvent>>,
    driver: AbortHandle,
}

impl ProgressStream {
    pub(crate) fn new(
        correlation_id: Arc<str>,
        events: mpsc::Receiver<Result<ProgressEvent>>,
        driver: AbortHandle,
    ) -> Self {
        Self {
            correlation_id,
            events: ReceiverStream::new(events),
            driver,
        }
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Stop the run now instead of waiting for the stream to be dropped
    pub fn cancel(&self) {
        self.driver.abort();
    }
}

impl Stream for ProgressStream {
    type Item = Result<ProgressEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().events).poll_next(cx)
    }
}

impl Drop for ProgressStream {
    fn drop(&mut self) {
        self.driver.abort();
    }
}
