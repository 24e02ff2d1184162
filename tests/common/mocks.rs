//! Stub collaborators for testing.
//!
//! Deterministic planning, search, synthesis and delivery stubs with call
//! counters, plus a mock LLM client, so pipeline tests never touch the
//! network.

use async_trait::async_trait;
use delve::llm::LLMClient;
use delve::research::collaborators::{
    DeliveryChannel, PlanningOracle, SearchOracle, SynthesisOracle,
};
use delve::types::{AppError, DeliveryAck, PlanItem, Report, Result};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Mock LLM client returning a fixed response, or failing.
#[derive(Clone)]
pub struct MockLLMClient {
    response: String,
    should_fail: bool,
}

impl MockLLMClient {
    /// Create a new mock client that returns the given response.
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            should_fail: false,
        }
    }

    /// Create a mock client that always returns an error.
    pub fn failing() -> Self {
        Self {
            response: String::new(),
            should_fail: true,
        }
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        if self.should_fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }
        Ok(self.response.clone())
    }

    async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
        self.generate("").await
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// Plan item `i` of every stub plan
pub fn plan_item(i: usize) -> PlanItem {
    PlanItem::new(format!("angle {}", i), format!("query {}", i))
}

/// Planning oracle returning `query 0..n` items.
pub struct StubPlanner {
    /// Number of items returned; `None` returns as many as requested
    count: Option<usize>,
    pub calls: AtomicUsize,
}

impl StubPlanner {
    pub fn exact() -> Self {
        Self {
            count: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always return `count` items, whatever was asked for
    pub fn returning(count: usize) -> Self {
        Self {
            count: Some(count),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PlanningOracle for StubPlanner {
    async fn plan(&self, _query: &str, searches: usize) -> Result<Vec<PlanItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((0..self.count.unwrap_or(searches)).map(plan_item).collect())
    }
}

/// Search oracle with call counting, configurable failures and latency.
pub struct StubSearch {
    failing: HashSet<usize>,
    delay: Duration,
    /// Later plan items finish first
    reverse: bool,
    pub calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
    pub inputs: Mutex<Vec<String>>,
}

impl StubSearch {
    pub fn new() -> Self {
        Self {
            failing: HashSet::new(),
            delay: Duration::ZERO,
            reverse: false,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        }
    }

    /// Fail the searches for these plan indices
    pub fn failing(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.failing = indices.into_iter().collect();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

fn plan_index(input: &str) -> usize {
    input
        .lines()
        .next()
        .and_then(|line| line.rsplit(' ').next())
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

#[async_trait]
impl SearchOracle for StubSearch {
    async fn search(&self, input: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().push(input.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let index = plan_index(input);
        let delay = if self.reverse {
            Duration::from_millis(10 * (20 - index.min(19)) as u64)
        } else {
            self.delay
        };
        tokio::time::sleep(delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&index) {
            Err(AppError::SearchTask(format!("search {} failed", index)))
        } else {
            Ok(format!("summary {}", index))
        }
    }
}

/// Synthesis oracle returning a fixed report and recording its input.
pub struct StubWriter {
    report: Report,
    pub calls: AtomicUsize,
    pub evidence_seen: Mutex<Vec<String>>,
}

impl StubWriter {
    pub fn new(content: &str) -> Self {
        Self {
            report: Report {
                summary: "Higher rates compress tech valuations.".to_string(),
                content: content.to_string(),
                follow_ups: vec!["How do rate cuts affect growth stocks?".to_string()],
            },
            calls: AtomicUsize::new(0),
            evidence_seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SynthesisOracle for StubWriter {
    async fn synthesize(&self, _query: &str, evidence: &str) -> Result<Report> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.evidence_seen.lock().push(evidence.to_string());
        Ok(self.report.clone())
    }
}

/// Delivery channel that acknowledges or fails, recording correlation ids.
pub struct StubDelivery {
    fail: bool,
    pub delivered: Mutex<Vec<String>>,
}

impl StubDelivery {
    pub fn acking() -> Self {
        Self {
            fail: false,
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            delivered: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl DeliveryChannel for StubDelivery {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn deliver(&self, correlation_id: &str, _report: &Report) -> Result<DeliveryAck> {
        self.delivered.lock().push(correlation_id.to_string());
        if self.fail {
            return Err(AppError::Delivery("recipient unreachable".to_string()));
        }
        Ok(DeliveryAck {
            channel: self.name().to_string(),
            reference: Some(format!("msg-{}", correlation_id)),
        })
    }
}

/// Handles to every stub used by one orchestrator
pub struct Stubs {
    pub planner: Arc<StubPlanner>,
    pub search: Arc<StubSearch>,
    pub writer: Arc<StubWriter>,
    pub delivery: Arc<StubDelivery>,
}

impl Stubs {
    pub fn new() -> Self {
        Self {
            planner: Arc::new(StubPlanner::exact()),
            search: Arc::new(StubSearch::new()),
            writer: Arc::new(StubWriter::new("# Report\n\nRates matter.")),
            delivery: Arc::new(StubDelivery::acking()),
        }
    }
}
