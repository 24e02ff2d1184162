use crate::llm::LLMClient;
use crate::llm::structured::parse_structured;
use crate::research::collaborators::SynthesisOracle;
use crate::research::with_timeout;
use crate::types::{AppError, Evidence, Report, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Synthesis client: one call per run, turning evidence into a [`Report`].
pub struct Writer {
    oracle: Arc<dyn SynthesisOracle>,
    timeout: Option<Duration>,
}

impl Writer {
    pub fn new(oracle: Arc<dyn SynthesisOracle>) -> Self {
        Self {
            oracle,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Write the report. Empty evidence is passed through as-is.
    ///
    /// Any failure, including a report missing its summary or content, is
    /// reported as [`AppError::Synthesis`].
    pub async fn write(&self, query: &str, evidence: &Evidence) -> Result<Report> {
        let report = with_timeout(
            self.timeout,
            "synthesis",
            self.oracle.synthesize(query, &evidence.concatenated()),
        )
        .await
        .map_err(|e| match e {
            AppError::Synthesis(_) => e,
            other => AppError::Synthesis(other.to_string()),
        })?;

        if report.summary.trim().is_empty() {
            return Err(AppError::Synthesis("report has an empty summary".into()));
        }
        if report.content.trim().is_empty() {
            return Err(AppError::Synthesis("report has empty content".into()));
        }

        tracing::debug!(
            evidence = evidence.len(),
            follow_ups = report.follow_ups.len(),
            "report written"
        );
        Ok(report)
    }
}

const WRITER_SYSTEM: &str = "You are a senior researcher writing a cohesive report for a \
research query. You are given the query and summaries of searches done by a research \
assistant. First outline the report, then write it in markdown: long-form, detailed, \
several pages. Respond with JSON only: {\"short_summary\": \"2-3 sentence summary\", \
\"markdown_content\": \"the report\", \"follow_up_questions\": [\"topics to research next\"]}.";

/// Synthesis oracle backed by a language model returning JSON.
pub struct LlmSynthesisOracle {
    llm: Box<dyn LLMClient>,
}

impl LlmSynthesisOracle {
    pub fn new(llm: Box<dyn LLMClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl SynthesisOracle for LlmSynthesisOracle {
    async fn synthesize(&self, query: &str, evidence: &str) -> Result<Report> {
        let evidence = if evidence.trim().is_empty() {
            "(no search results were available)"
        } else {
            evidence
        };
        let prompt = format!("Original query: {}\n\nSummarized search results:\n{}", query, evidence);
        let response = self.llm.generate_with_system(WRITER_SYSTEM, &prompt).await?;

        parse_structured::<Report>(&response).map_err(|e| {
            AppError::Synthesis(format!("malformed report from {}: {}", self.llm.model_name(), e))
        })
    }
}
