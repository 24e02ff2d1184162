//! Search oracle backed by web search and a summarizing model
//!
//! Each call runs the plan item's search term through the `web_search` tool,
//! optionally fetches the top pages, and asks the model for a short summary
//! of what came back.

use crate::llm::LLMClient;
use crate::research::collaborators::SearchOracle;
use crate::tools::{ToolId, ToolRegistry};
use crate::types::{AppError, MAX_SUMMARY_WORDS, Result};
use crate::utils::toml_config::WebSearchConfig;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::debug;

/// Words of fetched page content kept per page
const PAGE_EXCERPT_WORDS: usize = 400;

pub struct LlmSearchOracle {
    llm: Box<dyn LLMClient>,
    tools: Arc<ToolRegistry>,
    config: WebSearchConfig,
}

impl LlmSearchOracle {
    pub fn new(llm: Box<dyn LLMClient>, tools: Arc<ToolRegistry>, config: WebSearchConfig) -> Self {
        Self { llm, tools, config }
    }

    /// Tools this oracle calls with its current configuration
    pub fn required_tools(&self) -> Vec<ToolId> {
        let mut tools = vec![ToolId::WebSearch];
        if self.config.fetch_pages > 0 {
            tools.push(ToolId::FetchPage);
        }
        tools
    }

    fn system_prompt() -> String {
        format!(
            "You are a research assistant. Given a search term and web results, write a \
             concise summary of the results in 2-3 paragraphs and at most {} words. \
             Capture the main points; skip filler. Output only the summary.",
            MAX_SUMMARY_WORDS
        )
    }

    async fn page_excerpts(&self, results: &[Value]) -> String {
        let mut excerpts = String::new();
        let urls = results
            .iter()
            .filter_map(|r| r.get("url").and_then(Value::as_str))
            .take(self.config.fetch_pages);

        for url in urls {
            match self.tools.execute(ToolId::FetchPage, json!({ "url": url })).await {
                Ok(page) => {
                    let content = page.get("content").and_then(Value::as_str).unwrap_or("");
                    let excerpt: Vec<&str> =
                        content.split_whitespace().take(PAGE_EXCERPT_WORDS).collect();
                    let _ = write!(excerpts, "\n\nPage {}:\n{}", url, excerpt.join(" "));
                }
                Err(e) => debug!(url, error = %e, "page fetch skipped"),
            }
        }
        excerpts
    }
}

/// Pull the search term out of the composed "Search term: …\nReason: …" input.
pub fn search_term(input: &str) -> &str {
    input
        .lines()
        .find_map(|line| line.strip_prefix("Search term:"))
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .unwrap_or_else(|| input.trim())
}

fn format_results(results: &[Value]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "{}. {} ({})\n{}",
                i + 1,
                r.get("title").and_then(Value::as_str).unwrap_or("untitled"),
                r.get("url").and_then(Value::as_str).unwrap_or("-"),
                r.get("description").and_then(Value::as_str).unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl SearchOracle for LlmSearchOracle {
    async fn search(&self, input: &str) -> Result<String> {
        let term = search_term(input);
        let response = self
            .tools
            .execute(
                ToolId::WebSearch,
                json!({ "query": term, "num_results": self.config.num_results }),
            )
            .await?;

        let results = response
            .get("results")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        if results.is_empty() {
            return Err(AppError::SearchTask(format!("no web results for '{}'", term)));
        }
        debug!(term, hits = results.len(), "web search returned results");

        let mut prompt = format!("{}\n\nResults:\n{}", input, format_results(&results));
        if self.config.fetch_pages > 0 {
            prompt.push_str(&self.page_excerpts(&results).await);
        }

        self.llm
            .generate_with_system(&Self::system_prompt(), &prompt)
            .await
    }
}
