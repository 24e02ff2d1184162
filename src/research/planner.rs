use crate::llm::LLMClient;
use crate::llm::structured::parse_structured;
use crate::research::collaborators::PlanningOracle;
use crate::research::with_timeout;
use crate::types::{AppError, PlanItem, Result, SearchPlan};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Plan oracle client: one planning call per run, validated to exactly N items.
pub struct Planner {
    oracle: Arc<dyn PlanningOracle>,
    searches: usize,
    timeout: Option<Duration>,
}

impl Planner {
    pub fn new(oracle: Arc<dyn PlanningOracle>, searches: usize) -> Self {
        Self {
            oracle,
            searches,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn searches(&self) -> usize {
        self.searches
    }

    /// Ask the planning oracle for exactly `searches` sub-searches.
    ///
    /// Every failure, including a plan of the wrong length, is reported as
    /// [`AppError::Planning`].
    pub async fn plan(&self, query: &str) -> Result<SearchPlan> {
        let items = with_timeout(self.timeout, "planning", self.oracle.plan(query, self.searches))
            .await
            .map_err(|e| match e {
                AppError::Planning(_) => e,
                other => AppError::Planning(other.to_string()),
            })?;

        let plan = SearchPlan::validated(items, self.searches)?;
        tracing::debug!(searches = plan.len(), "search plan accepted");
        Ok(plan)
    }
}

const PLANNER_SYSTEM: &str = "You are a research planner. Given a query, decide which web \
searches would best answer it. Respond with JSON only, in the form \
{\"searches\": [{\"reason\": \"why this search matters\", \"query\": \"search term\"}]}.";

#[derive(Deserialize)]
#[serde(untagged)]
enum PlanResponse {
    Wrapped { searches: Vec<PlanItem> },
    Bare(Vec<PlanItem>),
}

/// Planning oracle backed by a language model returning JSON.
pub struct LlmPlanningOracle {
    llm: Box<dyn LLMClient>,
}

impl LlmPlanningOracle {
    pub fn new(llm: Box<dyn LLMClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl PlanningOracle for LlmPlanningOracle {
    async fn plan(&self, query: &str, searches: usize) -> Result<Vec<PlanItem>> {
        let prompt = format!(
            "Query: {}\n\nPropose exactly {} searches.",
            query, searches
        );
        let response = self.llm.generate_with_system(PLANNER_SYSTEM, &prompt).await?;

        match parse_structured::<PlanResponse>(&response) {
            Ok(PlanResponse::Wrapped { searches }) | Ok(PlanResponse::Bare(searches)) => Ok(searches),
            Err(e) => Err(AppError::Planning(format!(
                "malformed plan from {}: {}",
                self.llm.model_name(),
                e
            ))),
        }
    }
}
