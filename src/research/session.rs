use crate::types::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Pipeline stage of a research run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Planning,
    Searching,
    Writing,
    Delivering,
    Done,
    Failed,
    Cancelled,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Planning => "planning",
            Stage::Searching => "searching",
            Stage::Writing => "writing",
            Stage::Delivering => "delivering",
            Stage::Done => "done",
            Stage::Failed => "failed",
            Stage::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done | Stage::Failed | Stage::Cancelled)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    ///
    /// Only planning and writing can fail; searching and delivering
    /// degrade instead. Any live stage can be cancelled.
    pub fn can_advance_to(&self, next: Stage) -> bool {
        use Stage::*;
        match (self, next) {
            (Planning, Searching)
            | (Searching, Writing)
            | (Writing, Delivering)
            | (Delivering, Done)
            | (Planning, Failed)
            | (Writing, Failed) => true,
            (current, Cancelled) => !current.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generate a fresh correlation id for a run
pub fn new_correlation_id() -> String {
    format!("trace_{}", Uuid::new_v4().simple())
}

/// State of one research run, owned by its driver task.
#[derive(Debug)]
pub struct RunSession {
    correlation_id: Arc<str>,
    query: Arc<str>,
    stage: Stage,
    started_at: DateTime<Utc>,
}

impl RunSession {
    pub fn new(query: impl Into<Arc<str>>) -> Self {
        Self {
            correlation_id: new_correlation_id().into(),
            query: query.into(),
            stage: Stage::Planning,
            started_at: Utc::now(),
        }
    }

    pub fn correlation_id(&self) -> &Arc<str> {
        &self.correlation_id
    }

    pub fn query(&self) -> &Arc<str> {
        &self.query
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Wall-clock time since the run started
    pub fn elapsed(&self) -> Duration {
        (Utc::now() - self.started_at).to_std().unwrap_or_default()
    }

    /// Move to `next`, rejecting transitions the state machine does not allow
    pub fn advance(&mut self, next: Stage) -> Result<()> {
        if !self.stage.can_advance_to(next) {
            return Err(AppError::Internal(format!(
                "illegal stage transition {} -> {} for run {}",
                self.stage, next, self.correlation_id
            )));
        }
        self.stage = next;
        Ok(())
    }
}
