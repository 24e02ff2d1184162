//! Search tool implementation using daedra
//!
//! This module provides web search capabilities via the daedra crate,
//! which uses DuckDuckGo as the search backend.

use crate::tools::registry::{Tool, ToolId};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde_json::{Value, json};

/// Web search tool powered by daedra
pub struct SearchTool;

impl SearchTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn id(&self) -> ToolId {
        ToolId::WebSearch
    }

    fn description(&self) -> &str {
        "Search the web for information using DuckDuckGo"
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::InvalidInput("Missing 'query' parameter".to_string()))?;

        let num_results = args
            .get("num_results")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize)
            .unwrap_or(10);

        let search_args = daedra::SearchArgs {
            query: query.to_string(),
            options: Some(daedra::SearchOptions {
                num_results,
                ..Default::default()
            }),
        };

        match daedra::tools::search::perform_search(&search_args).await {
            Ok(response) => {
                let results: Vec<Value> = response
                    .data
                    .iter()
                    .map(|r| {
                        json!({
                            "title": r.title,
                            "url": r.url,
                            "description": r.description
                        })
                    })
                    .collect();

                Ok(json!({
                    "query": query,
                    "results": results,
                    "count": results.len()
                }))
            }
            Err(e) => Err(AppError::Tool(format!("Search failed: {}", e))),
        }
    }
}

/// Page fetching tool powered by daedra
pub struct FetchPageTool;

impl FetchPageTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FetchPageTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for FetchPageTool {
    fn id(&self) -> ToolId {
        ToolId::FetchPage
    }

    fn description(&self) -> &str {
        "Fetch a web page and convert it to markdown"
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let url = args
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::InvalidInput("Missing 'url' parameter".to_string()))?;

        let fetch_args = daedra::VisitPageArgs {
            url: url.to_string(),
            include_images: false,
            selector: None,
        };

        match daedra::tools::fetch::fetch_page(&fetch_args).await {
            Ok(page_content) => Ok(json!({
                "url": page_content.url,
                "title": page_content.title,
                "content": page_content.content,
                "word_count": page_content.word_count
            })),
            Err(e) => Err(AppError::Tool(format!("Failed to fetch page: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_ids() {
        assert_eq!(SearchTool::new().id(), ToolId::WebSearch);
        assert_eq!(FetchPageTool::new().id(), ToolId::FetchPage);
        assert!(!SearchTool::new().description().is_empty());
    }

    #[tokio::test]
    async fn test_search_missing_query() {
        let result = SearchTool::new().execute(json!({})).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_fetch_page_missing_url() {
        let result = FetchPageTool::new().execute(json!({})).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
