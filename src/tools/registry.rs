use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Closed set of tools the collaborators may invoke.
///
/// Tool names coming from configuration or from a model are parsed into a
/// `ToolId`; anything outside this set is rejected instead of being looked up
/// dynamically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolId {
    WebSearch,
    FetchPage,
}

impl ToolId {
    pub const ALL: [ToolId; 2] = [ToolId::WebSearch, ToolId::FetchPage];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolId::WebSearch => "web_search",
            ToolId::FetchPage => "fetch_page",
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        ToolId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| AppError::Tool(format!("Unknown tool: {}", s)))
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn id(&self) -> ToolId;
    fn description(&self) -> &str;
    async fn execute(&self, args: Value) -> Result<Value>;
}

pub struct ToolRegistry {
    tools: HashMap<ToolId, Arc<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Create a new registry with the built-in tools (web search, page fetch)
    pub fn with_default_tools() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(crate::tools::search::SearchTool::new()));
        registry.register(Arc::new(crate::tools::search::FetchPageTool::new()));
        registry
    }

    /// Register a handler, replacing any previous handler for the same id
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.id(), tool);
    }

    /// Fail unless every tool in `required` has a handler.
    ///
    /// Called once when collaborators are built so a missing handler is a
    /// startup error rather than a mid-run surprise.
    pub fn validate(&self, required: &[ToolId]) -> Result<()> {
        let missing: Vec<&str> = required
            .iter()
            .filter(|id| !self.tools.contains_key(id))
            .map(|id| id.as_str())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Configuration(format!(
                "No handler registered for tool(s): {}",
                missing.join(", ")
            )))
        }
    }

    pub async fn execute(&self, id: ToolId, args: Value) -> Result<Value> {
        match self.tools.get(&id) {
            Some(tool) => tool.execute(args).await,
            None => Err(AppError::Tool(format!("Tool not registered: {}", id))),
        }
    }

    /// Execute a tool requested by name, e.g. from model output
    pub async fn execute_named(&self, name: &str, args: Value) -> Result<Value> {
        self.execute(name.parse()?, args).await
    }

    /// (id, description) for every registered tool
    pub fn describe(&self) -> Vec<(ToolId, String)> {
        let mut tools: Vec<_> = self
            .tools
            .values()
            .map(|tool| (tool.id(), tool.description().to_string()))
            .collect();
        tools.sort_by_key(|(id, _)| id.as_str());
        tools
    }

    /// Check if a tool is registered
    pub fn has_tool(&self, id: ToolId) -> bool {
        self.tools.contains_key(&id)
    }
}
