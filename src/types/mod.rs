use serde::{Deserialize, Serialize};
use std::fmt;

// ============= Plan Types =============

/// One sub-search proposed by the planning oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanItem {
    /// Why this search helps answer the query
    #[serde(rename = "reason", alias = "rationale")]
    pub rationale: String,
    /// The search term to run
    pub query: String,
}

impl PlanItem {
    pub fn new(rationale: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            rationale: rationale.into(),
            query: query.into(),
        }
    }

    /// Input handed to the search oracle for this item.
    pub fn search_input(&self) -> String {
        format!("Search term: {}\nReason: {}", self.query, self.rationale)
    }
}

/// Validated, ordered list of plan items. Its length always equals the
/// configured fan-out width of the run that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchPlan {
    items: Vec<PlanItem>,
}

impl SearchPlan {
    /// Build a plan, rejecting any item count other than `expected`.
    pub fn validated(items: Vec<PlanItem>, expected: usize) -> Result<Self> {
        if items.len() != expected {
            return Err(AppError::Planning(format!(
                "planner returned {} searches, expected exactly {}",
                items.len(),
                expected
            )));
        }
        if let Some(pos) = items.iter().position(|i| i.query.trim().is_empty()) {
            return Err(AppError::Planning(format!(
                "plan item {} has an empty query",
                pos + 1
            )));
        }
        Ok(Self { items })
    }

    pub fn items(&self) -> &[PlanItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ============= Evidence Types =============

/// Maximum number of words kept from a single search summary.
pub const MAX_SUMMARY_WORDS: usize = 300;

/// Condensed result of one successful search task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Position of the originating item in the search plan
    pub plan_index: usize,
    /// The search term that produced this summary
    pub query: String,
    pub summary: String,
}

impl EvidenceItem {
    /// Create an item, capping the summary at [`MAX_SUMMARY_WORDS`] words.
    pub fn new(plan_index: usize, query: impl Into<String>, summary: &str) -> Self {
        Self {
            plan_index,
            query: query.into(),
            summary: truncate_words(summary.trim(), MAX_SUMMARY_WORDS),
        }
    }
}

fn truncate_words(text: &str, max_words: usize) -> String {
    if text.split_whitespace().count() <= max_words {
        return text.to_string();
    }
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Why a search task produced no evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SearchFailureKind {
    /// The oracle answered, but with nothing usable
    Empty,
    /// The per-task timeout elapsed
    TimedOut,
    /// The oracle (or the task itself) errored
    Failed(String),
}

impl fmt::Display for SearchFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchFailureKind::Empty => write!(f, "empty result"),
            SearchFailureKind::TimedOut => write!(f, "timed out"),
            SearchFailureKind::Failed(msg) => write!(f, "failed: {}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFailure {
    pub plan_index: usize,
    pub query: String,
    pub kind: SearchFailureKind,
}

/// Aggregated output of the search stage.
///
/// Items are kept sorted by `plan_index`, so the order never depends on
/// which search finished first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Evidence {
    items: Vec<EvidenceItem>,
    failures: Vec<SearchFailure>,
}

impl Evidence {
    pub fn new(mut items: Vec<EvidenceItem>, mut failures: Vec<SearchFailure>) -> Self {
        items.sort_by_key(|i| i.plan_index);
        failures.sort_by_key(|f| f.plan_index);
        Self { items, failures }
    }

    pub fn items(&self) -> &[EvidenceItem] {
        &self.items
    }

    pub fn failures(&self) -> &[SearchFailure] {
        &self.failures
    }

    /// Number of successful searches
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Summaries joined into the block handed to the synthesis oracle.
    pub fn concatenated(&self) -> String {
        self.items
            .iter()
            .map(|i| format!("## {}\n{}", i.query, i.summary))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

// ============= Report Types =============

/// Final artifact of a research run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Two or three sentence summary
    #[serde(rename = "short_summary", alias = "summary")]
    pub summary: String,
    /// Long-form markdown body
    #[serde(rename = "markdown_content", alias = "content")]
    pub content: String,
    /// Suggested topics for further research
    #[serde(rename = "follow_up_questions", alias = "follow_ups")]
    pub follow_ups: Vec<String>,
}

/// Acknowledgement returned by a delivery channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAck {
    /// Name of the channel that accepted the report
    pub channel: String,
    /// External reference (message id, file path), when the channel has one
    pub reference: Option<String>,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Planning error: {0}")]
    Planning(String),

    #[error("Search task error: {0}")]
    SearchTask(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("HTTP error (status {status:?}): {message}")]
    Http {
        status: Option<u16>,
        message: String,
    },

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Run cancelled: {0}")]
    Cancelled(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether a retry has a reasonable chance of succeeding.
    ///
    /// Only timeouts, rate limiting, server-side HTTP failures and
    /// connection-level errors count as transient.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Timeout(_) => true,
            AppError::Http { status: None, .. } => true,
            AppError::Http {
                status: Some(code), ..
            } => *code == 429 || *code >= 500,
            AppError::LLM(msg) => {
                let lower = msg.to_lowercase();
                ["429", "rate limit", "502", "503", "504", "timed out", "connection"]
                    .iter()
                    .any(|needle| lower.contains(needle))
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Http {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
