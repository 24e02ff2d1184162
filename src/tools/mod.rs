//! Built-in Tools for Collaborator Capabilities
//!
//! This module provides the tools the search collaborator uses to gather
//! material before summarizing it.
//!
//! # Module Structure
//!
//! - [`registry`](crate::tools::registry) - Closed `ToolId` → handler mapping
//! - [`search`](crate::tools::search) - Web search and page fetch (daedra / DuckDuckGo)
//!
//! # Dispatch
//!
//! Tools are addressed by [`ToolId`](crate::tools::registry::ToolId), never by
//! free-form lookup. Required handlers are checked once at startup:
//! ```ignore
//! let registry = ToolRegistry::with_default_tools();
//! registry.validate(&[ToolId::WebSearch])?;
//! let hits = registry.execute(ToolId::WebSearch, json!({"query": "rust"})).await?;
//! ```

/// Tool registry keyed by the closed `ToolId` set.
pub mod registry;
/// Web search tool using DuckDuckGo.
pub mod search;

pub use registry::{Tool, ToolId, ToolRegistry};
