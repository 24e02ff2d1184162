use crate::llm::retry::RetryConfig;
use crate::research::collaborators::{
    DeliveryChannel, PlanningOracle, SearchOracle, SynthesisOracle, TraceEvent, TraceRecord,
    TraceSink,
};
use crate::research::delivery::{Deliverer, DeliveryOutcome};
use crate::research::executor::FanOutExecutor;
use crate::research::planner::Planner;
use crate::research::pool::WorkerPool;
use crate::research::progress::{ProgressEvent, ProgressStream};
use crate::research::session::{RunSession, Stage};
use crate::research::trace::LogTraceSink;
use crate::research::writer::Writer;
use crate::types::{AppError, Result};
use crate::utils::toml_config::PipelineConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{Instrument, error, info, info_span, warn};

type Events = mpsc::Sender<Result<ProgressEvent>>;

/// Drives research runs: plan, fan-out search, write, deliver.
///
/// An orchestrator is cheap to clone and can serve many concurrent runs;
/// every run gets its own [`RunSession`] and correlation id.
#[derive(Clone)]
pub struct Orchestrator {
    pipeline: Arc<Pipeline>,
}

struct Pipeline {
    planner: Planner,
    executor: FanOutExecutor,
    writer: Writer,
    deliverer: Deliverer,
    trace: Arc<dyn TraceSink>,
    event_buffer: usize,
    run_timeout: Option<Duration>,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    /// Start a run for `query` and return its progress stream.
    ///
    /// The run executes on a spawned task, so this must be called from
    /// within a tokio runtime. The first event is the run's correlation id;
    /// a successful run ends with the report content. Dropping the stream
    /// cancels the run.
    pub fn run(&self, query: impl Into<Arc<str>>) -> ProgressStream {
        let session = RunSession::new(query);
        let correlation_id = Arc::clone(session.correlation_id());
        let (tx, rx) = mpsc::channel(self.pipeline.event_buffer);

        let span = info_span!("research_run", correlation_id = %correlation_id);
        let pipeline = Arc::clone(&self.pipeline);
        let driver = tokio::spawn(pipeline.drive(session, tx).instrument(span));

        ProgressStream::new(correlation_id, rx, driver.abort_handle())
    }

    /// Fan-out width of every run
    pub fn searches(&self) -> usize {
        self.pipeline.planner.searches()
    }

    /// Worker pool shared by the search units of all runs
    pub fn pool(&self) -> &WorkerPool {
        self.pipeline.executor.pool()
    }
}

impl Pipeline {
    async fn drive(self: Arc<Self>, mut session: RunSession, tx: Events) {
        let outcome = match self.run_timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, self.stages(&mut session, &tx)).await {
                    Ok(result) => result,
                    Err(_) => Err(AppError::Cancelled(format!(
                        "run deadline of {:?} elapsed",
                        limit
                    ))),
                }
            }
            None => self.stages(&mut session, &tx).await,
        };

        let Err(err) = outcome else {
            return;
        };

        let terminal = match err {
            AppError::Cancelled(_) => Stage::Cancelled,
            _ => Stage::Failed,
        };
        let from = session.stage();
        if let Err(e) = session.advance(terminal) {
            warn!(error = %e, "could not record terminal stage");
        }
        error!(
            stage = %from,
            elapsed_ms = session.elapsed().as_millis() as u64,
            error = %err,
            "research run ended early"
        );
        self.record(
            session.correlation_id(),
            TraceEvent::RunFinished {
                stage: session.stage(),
            },
        );
        let _ = tx.send(Err(err)).await;
    }

    async fn stages(&self, session: &mut RunSession, tx: &Events) -> Result<()> {
        let id = Arc::clone(session.correlation_id());
        let query = Arc::clone(session.query());

        emit(tx, ProgressEvent::Trace(id.to_string())).await?;
        self.record(
            &id,
            TraceEvent::RunStarted {
                query: query.to_string(),
            },
        );
        emit(tx, ProgressEvent::Starting).await?;

        self.enter(session, None)?;
        emit(tx, ProgressEvent::Planning).await?;
        let plan = self.planner.plan(&query).await?;

        self.enter(session, Some(Stage::Searching))?;
        let evidence = self
            .executor
            .search(&plan, |progress| {
                self.record(
                    &id,
                    TraceEvent::SearchSettled {
                        plan_index: progress.plan_index,
                        succeeded: progress.succeeded,
                    },
                );
                let tx = tx.clone();
                async move {
                    let _ = tx.send(Ok(ProgressEvent::SearchProgress(progress))).await;
                }
            })
            .await;
        let (succeeded, failed) = (evidence.len(), evidence.failures().len());
        info!(succeeded, failed, "searches complete");
        emit(tx, ProgressEvent::SearchesComplete { succeeded, failed }).await?;

        self.enter(session, Some(Stage::Writing))?;
        emit(tx, ProgressEvent::Writing).await?;
        let report = self.writer.write(&query, &evidence).await?;

        self.enter(session, Some(Stage::Delivering))?;
        let delivered = match self.deliverer.deliver(&id, &report).await {
            DeliveryOutcome::Delivered(ack) => ProgressEvent::Delivered(ack),
            DeliveryOutcome::Failed(err) => {
                let reason = match err {
                    AppError::Delivery(msg) => msg,
                    other => other.to_string(),
                };
                self.record(
                    &id,
                    TraceEvent::DeliveryFailed {
                        reason: reason.clone(),
                    },
                );
                ProgressEvent::DeliveryFailed(reason)
            }
        };
        emit(tx, delivered).await?;

        session.advance(Stage::Done)?;
        self.record(&id, TraceEvent::RunFinished { stage: Stage::Done });
        info!(
            follow_ups = report.follow_ups.len(),
            elapsed_ms = session.elapsed().as_millis() as u64,
            "research run complete"
        );
        emit(tx, ProgressEvent::Report(report.content)).await
    }

    /// Advance to `next` (or stay, for the initial stage) and trace it
    fn enter(&self, session: &mut RunSession, next: Option<Stage>) -> Result<()> {
        if let Some(next) = next {
            session.advance(next)?;
        }
        info!(stage = %session.stage(), "stage entered");
        self.record(
            session.correlation_id(),
            TraceEvent::StageEntered {
                stage: session.stage(),
            },
        );
        Ok(())
    }

    fn record(&self, correlation_id: &Arc<str>, event: TraceEvent) {
        self.trace.record(TraceRecord::new(correlation_id, event));
    }
}

async fn emit(tx: &Events, event: ProgressEvent) -> Result<()> {
    tx.send(Ok(event))
        .await
        .map_err(|_| AppError::Cancelled("progress stream closed".to_string()))
}

/// Assembles an [`Orchestrator`] from its collaborators and pipeline settings.
#[derive(Default)]
pub struct OrchestratorBuilder {
    planning: Option<Arc<dyn PlanningOracle>>,
    search: Option<Arc<dyn SearchOracle>>,
    synthesis: Option<Arc<dyn SynthesisOracle>>,
    delivery: Option<Arc<dyn DeliveryChannel>>,
    trace: Option<Arc<dyn TraceSink>>,
    config: PipelineConfig,
    delivery_retry: RetryConfig,
}

impl OrchestratorBuilder {
    pub fn planning_oracle(mut self, oracle: Arc<dyn PlanningOracle>) -> Self {
        self.planning = Some(oracle);
        self
    }

    pub fn search_oracle(mut self, oracle: Arc<dyn SearchOracle>) -> Self {
        self.search = Some(oracle);
        self
    }

    pub fn synthesis_oracle(mut self, oracle: Arc<dyn SynthesisOracle>) -> Self {
        self.synthesis = Some(oracle);
        self
    }

    pub fn delivery_channel(mut self, channel: Arc<dyn DeliveryChannel>) -> Self {
        self.delivery = Some(channel);
        self
    }

    /// Defaults to a [`LogTraceSink`] using the configured trace URL
    pub fn trace_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.trace = Some(sink);
        self
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn searches(mut self, searches: usize) -> Self {
        self.config.searches = searches;
        self
    }

    pub fn delivery_retry(mut self, retry: RetryConfig) -> Self {
        self.delivery_retry = retry;
        self
    }

    pub fn build(self) -> Result<Orchestrator> {
        fn missing(what: &str) -> AppError {
            AppError::Configuration(format!("no {} configured", what))
        }

        if self.config.searches == 0 {
            return Err(AppError::Configuration(
                "research.searches must be at least 1".into(),
            ));
        }
        if self.config.event_buffer == 0 {
            return Err(AppError::Configuration(
                "research.event_buffer must be at least 1".into(),
            ));
        }

        let planning = self.planning.ok_or_else(|| missing("planning oracle"))?;
        let search = self.search.ok_or_else(|| missing("search oracle"))?;
        let synthesis = self.synthesis.ok_or_else(|| missing("synthesis oracle"))?;
        let delivery = self.delivery.ok_or_else(|| missing("delivery channel"))?;
        let config = self.config;
        let trace: Arc<dyn TraceSink> = match self.trace {
            Some(sink) => sink,
            None => Arc::new(LogTraceSink::new(config.trace_url_base.clone())),
        };

        let pipeline = Pipeline {
            planner: Planner::new(planning, config.searches).with_timeout(config.plan_timeout()),
            executor: FanOutExecutor::new(search, WorkerPool::new(config.concurrency_limit()))
                .with_unit_timeout(config.search_timeout()),
            writer: Writer::new(synthesis).with_timeout(config.write_timeout()),
            deliverer: Deliverer::new(delivery)
                .with_timeout(config.deliver_timeout())
                .with_retry(self.delivery_retry),
            trace,
            event_buffer: config.event_buffer,
            run_timeout: config.run_timeout(),
        };

        Ok(Orchestrator {
            pipeline: Arc::new(pipeline),
        })
    }
}
