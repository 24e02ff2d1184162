//! Contracts for the external capabilities a research run depends on.
//!
//! The pipeline only ever talks to these traits. Concrete LLM-backed and
//! channel implementations live next to the stage that uses them.

use crate::research::session::Stage;
use crate::types::{DeliveryAck, PlanItem, Report, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Proposes the sub-searches for a query.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlanningOracle: Send + Sync {
    /// Return exactly `searches` plan items for `query`
    async fn plan(&self, query: &str, searches: usize) -> Result<Vec<PlanItem>>;
}

/// Runs one sub-search and condenses what it found.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchOracle: Send + Sync {
    /// `input` is the composed "Search term / Reason" string of one plan item
    async fn search(&self, input: &str) -> Result<String>;
}

/// Turns the query and gathered evidence into a report.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SynthesisOracle: Send + Sync {
    async fn synthesize(&self, query: &str, evidence: &str) -> Result<Report>;
}

/// Hands a finished report to its recipient.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Short channel name used in logs and acknowledgements
    fn name(&self) -> &'static str;

    async fn deliver(&self, correlation_id: &str, report: &Report) -> Result<DeliveryAck>;
}

/// What happened, for a [`TraceRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    RunStarted { query: String },
    StageEntered { stage: Stage },
    SearchSettled { plan_index: usize, succeeded: bool },
    DeliveryFailed { reason: String },
    RunFinished { stage: Stage },
}

/// One observability record, always tagged with the run's correlation id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceRecord {
    pub correlation_id: Arc<str>,
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: TraceEvent,
}

impl TraceRecord {
    pub fn new(correlation_id: &Arc<str>, event: TraceEvent) -> Self {
        Self {
            correlation_id: Arc::clone(correlation_id),
            at: Utc::now(),
            event,
        }
    }
}

/// Best-effort sink for stage transitions. Must not block or fail the run.
#[cfg_attr(test, mockall::automock)]
pub trait TraceSink: Send + Sync {
    fn record(&self, record: TraceRecord);
}
