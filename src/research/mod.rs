//! Multi-Stage Research Pipeline
//!
//! Turns one free-text query into a long-form report by coordinating
//! several collaborators through four sequential stages, while streaming
//! progress to the caller.
//!
//! # Architecture
//!
//! - [`orchestrator::Orchestrator`] - Owns the run, its correlation id and the progress stream
//! - [`planner::Planner`] - One planning call, validated to exactly N searches
//! - [`executor::FanOutExecutor`] - N concurrent searches through a bounded [`pool::WorkerPool`]
//! - [`writer::Writer`] - One synthesis call over the gathered evidence
//! - [`delivery::Deliverer`] - One delivery call; failure never fails the run
//!
//! Collaborator contracts live in [`collaborators`]; LLM-backed
//! implementations sit next to the stage that uses them.
//!
//! # Usage
//!
//! ```ignore
//! use delve::research::factory::build_orchestrator;
//! use futures::StreamExt;
//!
//! let orchestrator = build_orchestrator(&config).await?;
//! let mut progress = orchestrator.run("impact of interest rates on tech stocks");
//!
//! while let Some(event) = progress.next().await {
//!     println!("{}", event?);
//! }
//! ```
//!
//! # Stages
//!
//! 1. **Planning** - Ask the planning oracle for N `{reason, query}` items
//! 2. **Searching** - Search every item concurrently and wait for all of them
//! 3. **Writing** - Synthesize a report from the successful searches
//! 4. **Delivering** - Hand the report to the delivery channel
//!
//! Planning and writing failures end the run; failed searches and failed
//! delivery are reported and the run carries on.

pub mod collaborators;
pub mod delivery;
pub mod executor;
pub mod factory;
pub mod orchestrator;
pub mod planner;
pub mod pool;
pub mod progress;
pub mod searcher;
pub mod session;
pub mod trace;
pub mod writer;

pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use progress::{ProgressEvent, ProgressStream, SearchProgress};
pub use session::Stage;

use crate::types::{AppError, Result};
use std::future::Future;
use std::time::Duration;

/// Await `fut`, failing with [`AppError::Timeout`] once `limit` elapses.
pub(crate) async fn with_timeout<T, F>(limit: Option<Duration>, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| AppError::Timeout(format!("{} exceeded {:?}", what, limit)))?,
        None => fut.await,
    }
}
