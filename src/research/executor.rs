use crate::research::collaborators::SearchOracle;
use crate::research::pool::WorkerPool;
use crate::research::progress::SearchProgress;
use crate::research::with_timeout;
use crate::types::{
    AppError, Evidence, EvidenceItem, PlanItem, SearchFailure, SearchFailureKind, SearchPlan,
};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, info_span, warn};

/// Runs one search unit per plan item and waits for all of them.
///
/// Units go through a shared [`WorkerPool`]; the `JoinSet` holding them is
/// owned by the `search` call, so dropping that future aborts every unit
/// that has not settled yet.
pub struct FanOutExecutor {
    oracle: Arc<dyn SearchOracle>,
    pool: WorkerPool,
    unit_timeout: Option<Duration>,
}

impl FanOutExecutor {
    pub fn new(oracle: Arc<dyn SearchOracle>, pool: WorkerPool) -> Self {
        Self {
            oracle,
            pool,
            unit_timeout: None,
        }
    }

    pub fn with_unit_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.unit_timeout = timeout;
        self
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Search every plan item and return the evidence of the ones that succeeded.
    ///
    /// `on_settled` is awaited once per unit, in settlement order. Evidence
    /// comes back ordered by plan index and is returned even when no unit
    /// succeeded.
    pub async fn search<F, Fut>(&self, plan: &SearchPlan, mut on_settled: F) -> Evidence
    where
        F: FnMut(SearchProgress) -> Fut,
        Fut: Future<Output = ()>,
    {
        let total = plan.len();
        let mut units = JoinSet::new();
        let mut launched = HashMap::with_capacity(total);

        for (plan_index, item) in plan.items().iter().enumerate() {
            let oracle = Arc::clone(&self.oracle);
            let pool = self.pool.clone();
            let item = item.clone();
            let query = item.query.clone();
            let timeout = self.unit_timeout;

            let handle = units.spawn(
                async move {
                    match pool.run(search_unit(oracle.as_ref(), &item, timeout)).await {
                        Ok(outcome) => outcome,
                        Err(e) => Err(SearchFailureKind::Failed(e.to_string())),
                    }
                }
                .instrument(info_span!("search_unit", plan_index)),
            );
            launched.insert(handle.id(), (plan_index, query));
        }

        let mut items = Vec::with_capacity(total);
        let mut failures = Vec::new();
        let mut completed = 0;

        while let Some(joined) = units.join_next_with_id().await {
            completed += 1;

            let (plan_index, query, outcome) = match joined {
                Ok((id, outcome)) => {
                    let (plan_index, query) = launched.remove(&id).unwrap_or_default();
                    (plan_index, query, outcome)
                }
                Err(join_err) => {
                    let (plan_index, query) = launched.remove(&join_err.id()).unwrap_or_default();
                    let reason = if join_err.is_panic() {
                        "search unit panicked".to_string()
                    } else {
                        "search unit was cancelled".to_string()
                    };
                    (plan_index, query, Err(SearchFailureKind::Failed(reason)))
                }
            };

            let succeeded = outcome.is_ok();
            match outcome {
                Ok(summary) => {
                    debug!(plan_index, "search unit succeeded");
                    items.push(EvidenceItem::new(plan_index, query, &summary));
                }
                Err(kind) => {
                    warn!(plan_index, query = %query, reason = %kind, "search unit failed");
                    failures.push(SearchFailure {
                        plan_index,
                        query,
                        kind,
                    });
                }
            }

            on_settled(SearchProgress {
                completed,
                total,
                plan_index,
                succeeded,
            })
            .await;
        }

        Evidence::new(items, failures)
    }
}

/// One search call. Errors, timeouts and blank answers become failures.
async fn search_unit(
    oracle: &dyn SearchOracle,
    item: &PlanItem,
    timeout: Option<Duration>,
) -> Result<String, SearchFailureKind> {
    let input = item.search_input();
    match with_timeout(timeout, "search", oracle.search(&input)).await {
        Ok(summary) if summary.trim().is_empty() => Err(SearchFailureKind::Empty),
        Ok(summary) => Ok(summary),
        Err(AppError::Timeout(_)) => Err(SearchFailureKind::TimedOut),
        Err(e) => Err(SearchFailureKind::Failed(e.to_string())),
    }
}
