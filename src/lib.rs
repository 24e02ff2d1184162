//! # Delve - deep research from a single query
//!
//! Delve turns one free-text research question into a long-form report. A
//! planning model proposes a set of web searches, the searches run
//! concurrently, a writing model synthesizes what they found, and the
//! report is delivered to a file, an inbox, or the log. Progress streams to
//! the caller the whole way through.
//!
//! ## Overview
//!
//! Delve can be used in two ways:
//!
//! 1. **As a CLI** - Run the `delve` binary (`delve run "<query>"`)
//! 2. **As a library** - Drive the pipeline with your own collaborators
//!
//! ### Configuration-Driven Setup
//!
//! ```rust,ignore
//! use delve::research::factory::build_orchestrator;
//! use delve::utils::toml_config::ResearchConfig;
//! use futures::StreamExt;
//!
//! let config = ResearchConfig::load("research.toml")?;
//! let orchestrator = build_orchestrator(&config).await?;
//!
//! let mut progress = orchestrator.run("impact of interest rates on tech stocks");
//! while let Some(event) = progress.next().await {
//!     println!("{}", event?);
//! }
//! ```
//!
//! ### Custom Collaborators
//!
//! Any type implementing the traits in [`research::collaborators`] can be
//! plugged in:
//!
//! ```rust,ignore
//! use delve::research::Orchestrator;
//! use delve::research::delivery::LogDelivery;
//! use std::sync::Arc;
//!
//! let orchestrator = Orchestrator::builder()
//!     .planning_oracle(Arc::new(MyPlanner))
//!     .search_oracle(Arc::new(MySearch))
//!     .synthesis_oracle(Arc::new(MyWriter))
//!     .delivery_channel(Arc::new(LogDelivery))
//!     .searches(3)
//!     .build()?;
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ollama` | Ollama local inference (default) |
//! | `openai` | OpenAI API support |
//! | `all-llm` | Every provider |
//!
//! ## Modules
//!
//! - [`research`] - The pipeline: orchestrator, stages, collaborators
//! - [`llm`] - LLM client implementations
//! - [`tools`] - Web search tools and their registry
//! - [`cli`] - Command-line parsing and output
//! - [`types`] - Common types and error handling
//! - [`utils`] - Configuration loading

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// Command-line interface.
pub mod cli;
/// LLM provider clients and abstractions.
pub mod llm;
/// The research pipeline.
pub mod research;
/// Built-in tools (web search, page fetch).
pub mod tools;
/// Core types (plans, evidence, reports, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use llm::{LLMClient, Provider, ProviderRegistry};
pub use research::{Orchestrator, ProgressEvent, ProgressStream};
pub use tools::registry::ToolRegistry;
pub use types::{AppError, Result};
pub use utils::toml_config::ResearchConfig;
