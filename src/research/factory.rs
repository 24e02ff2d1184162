//! Builds an [`Orchestrator`] from `research.toml`
//!
//! Each LLM collaborator resolves its `[collaborators]` model reference
//! through the [`ProviderRegistry`]; the search collaborator's tools are
//! validated against the [`ToolRegistry`] before the first run.

use crate::llm::ProviderRegistry;
use crate::research::collaborators::DeliveryChannel;
use crate::research::delivery::{FileDelivery, LogDelivery, SendGridDelivery};
use crate::research::orchestrator::Orchestrator;
use crate::research::planner::LlmPlanningOracle;
use crate::research::searcher::LlmSearchOracle;
use crate::research::writer::LlmSynthesisOracle;
use crate::tools::ToolRegistry;
use crate::types::{AppError, Result};
use crate::utils::toml_config::{DeliveryConfig, ResearchConfig};
use std::sync::Arc;

/// Create the delivery channel selected by `[delivery]`
pub fn delivery_channel(config: &ResearchConfig) -> Result<Arc<dyn DeliveryChannel>> {
    let channel: Arc<dyn DeliveryChannel> = match &config.delivery {
        DeliveryConfig::Log => Arc::new(LogDelivery),
        DeliveryConfig::File { dir } => Arc::new(FileDelivery::new(dir.clone())),
        DeliveryConfig::SendGrid {
            api_key_env,
            from,
            to,
            subject,
            base_url,
        } => {
            let api_key = config.resolve_env(api_key_env).ok_or_else(|| {
                AppError::Configuration(format!(
                    "Environment variable '{}' for SendGrid is not set",
                    api_key_env
                ))
            })?;
            Arc::new(SendGridDelivery::new(api_key, from, to, subject, base_url))
        }
    };
    Ok(channel)
}

/// Build a ready-to-run orchestrator from a validated configuration.
pub async fn build_orchestrator(config: &ResearchConfig) -> Result<Orchestrator> {
    let providers = ProviderRegistry::from_config(config);
    let models = &config.collaborators;

    let planner = providers.create_client_for_model(&models.planner).await?;
    let searcher = providers.create_client_for_model(&models.searcher).await?;
    let writer = providers.create_client_for_model(&models.writer).await?;

    let tools = Arc::new(ToolRegistry::with_default_tools());
    let search_oracle = LlmSearchOracle::new(searcher, Arc::clone(&tools), config.search.clone());
    tools.validate(&search_oracle.required_tools())?;

    let channel = delivery_channel(config)?;
    tracing::info!(
        planner = %models.planner,
        searcher = %models.searcher,
        writer = %models.writer,
        delivery = channel.name(),
        searches = config.research.searches,
        "collaborators ready"
    );

    Orchestrator::builder()
        .planning_oracle(Arc::new(LlmPlanningOracle::new(planner)))
        .search_oracle(Arc::new(search_oracle))
        .synthesis_oracle(Arc::new(LlmSynthesisOracle::new(writer)))
        .delivery_channel(channel)
        .config(config.research.clone())
        .delivery_retry(config.retry.clone())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_delivery_is_log() {
        let channel = delivery_channel(&ResearchConfig::default()).unwrap();
        assert_eq!(channel.name(), "log");
    }

    #[test]
    fn test_file_delivery_from_config() {
        let config = ResearchConfig {
            delivery: DeliveryConfig::File {
                dir: PathBuf::from("reports"),
            },
            ..Default::default()
        };
        assert_eq!(delivery_channel(&config).unwrap().name(), "file");
    }

    #[test]
    fn test_sendgrid_requires_key() {
        let config = ResearchConfig {
            delivery: DeliveryConfig::SendGrid {
                api_key_env: "DELVE_TEST_UNSET_SENDGRID_KEY".into(),
                from: "a@example.com".into(),
                to: "b@example.com".into(),
                subject: "s".into(),
                base_url: "http://localhost".into(),
            },
            ..Default::default()
        };
        let err = delivery_channel(&config).err().unwrap();
        assert!(matches!(err, AppError::Configuration(msg) if msg.contains("DELVE_TEST_UNSET_SENDGRID_KEY")));
    }

    #[tokio::test]
    async fn test_unknown_model_fails_build() {
        let config = ResearchConfig::default();
        let err = build_orchestrator(&config).await.err().unwrap();
        assert!(matches!(err, AppError::Configuration(_)));
    }
}
