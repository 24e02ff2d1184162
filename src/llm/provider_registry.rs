//! Provider Registry for managing multiple LLM providers
//!
//! This module provides a registry for the named providers and models
//! configured in `research.toml`, and resolves a model name into a ready
//! [`LLMClient`].

use crate::llm::client::{LLMClient, Provider};
use crate::llm::retry::{RetryConfig, RetryingClient};
use crate::types::{AppError, Result};
use crate::utils::toml_config::{ModelConfig, ProviderConfig, ResearchConfig};
use std::collections::HashMap;

/// Registry for managing multiple named LLM providers
pub struct ProviderRegistry {
    /// Provider configurations keyed by name
    providers: HashMap<String, ProviderConfig>,
    /// Model configurations keyed by name
    models: HashMap<String, ModelConfig>,
    /// Retry policy applied to every client the registry creates
    retry: RetryConfig,
}

impl ProviderRegistry {
    /// Create a new empty provider registry
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            models: HashMap::new(),
            retry: RetryConfig::default(),
        }
    }

    /// Create a provider registry from TOML configuration
    pub fn from_config(config: &ResearchConfig) -> Self {
        let mut registry = Self {
            retry: config.retry.clone(),
            ..Self::new()
        };
        for (name, provider) in &config.providers {
            registry.register_provider(name, provider.clone());
        }
        for (name, model) in &config.models {
            registry.register_model(name, model.clone());
        }
        registry
    }

    /// Register a provider configuration
    pub fn register_provider(&mut self, name: &str, config: ProviderConfig) {
        self.providers.insert(name.to_string(), config);
    }

    /// Register a model configuration
    pub fn register_model(&mut self, name: &str, config: ModelConfig) {
        self.models.insert(name.to_string(), config);
    }

    /// Get a provider configuration by name
    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    /// Get a model configuration by name
    pub fn get_model(&self, name: &str) -> Option<&ModelConfig> {
        self.models.get(name)
    }

    /// Check if a model exists in the registry
    pub fn has_model(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Resolve the model -> provider chain for `model_name`.
    pub fn provider_for_model(&self, model_name: &str) -> Result<Provider> {
        let model_config = self.get_model(model_name).ok_or_else(|| {
            AppError::Configuration(format!("Model '{}' not found in configuration", model_name))
        })?;

        let provider_config = self.get_provider(&model_config.provider).ok_or_else(|| {
            AppError::Configuration(format!(
                "Provider '{}' referenced by model '{}' not found",
                model_config.provider, model_name
            ))
        })?;

        Provider::from_model_config(model_config, provider_config)
    }

    /// Create an LLM client for a specific model by name
    ///
    /// The client is wrapped in a [`RetryingClient`] when the configured
    /// retry policy allows any retries.
    pub async fn create_client_for_model(&self, model_name: &str) -> Result<Box<dyn LLMClient>> {
        let client = self.provider_for_model(model_name)?.create_client().await?;

        if self.retry.max_retries > 0 {
            Ok(Box::new(RetryingClient::new(client, self.retry.clone())))
        } else {
            Ok(client)
        }
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        registry.register_provider(
            "local",
            ProviderConfig::Ollama {
                base_url: "http://localhost:11434".to_string(),
            },
        );
        registry.register_model(
            "fast",
            ModelConfig {
                provider: "local".to_string(),
                model: "llama3.2".to_string(),
                temperature: 0.7,
                max_tokens: 512,
            },
        );
        registry.register_model(
            "orphan",
            ModelConfig {
                provider: "nowhere".to_string(),
                model: "x".to_string(),
                temperature: 0.7,
                max_tokens: 512,
            },
        );
        registry
    }

    #[test]
    fn test_registry_lookup() {
        let registry = registry();
        assert!(registry.has_model("fast"));
        assert!(!registry.has_model("slow"));
        assert!(registry.get_model("orphan").is_some());
    }

    #[test]
    fn test_from_config_registers_providers_and_models() {
        let config = ResearchConfig::parse(
            r#"
[retry]
max_retries = 3

[providers.local]
type = "ollama"

[models.default]
provider = "local"
model = "llama3.2"
"#,
        )
        .unwrap();

        let registry = ProviderRegistry::from_config(&config);
        assert!(registry.get_provider("local").is_some());
        assert!(registry.has_model("default"));
        assert!(!registry.has_model("fast"));
        assert_eq!(registry.retry.max_retries, 3);
        assert_eq!(
            registry.provider_for_model("default").unwrap().name(),
            "Ollama"
        );
    }

    #[test]
    fn test_provider_for_model() {
        let provider = registry().provider_for_model("fast").unwrap();
        assert_eq!(provider.name(), "Ollama");
    }

    #[test]
    fn test_unknown_model_is_configuration_error() {
        let err = registry().provider_for_model("slow").unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[test]
    fn test_dangling_provider_is_configuration_error() {
        let err = registry().provider_for_model("orphan").unwrap_err();
        assert!(err.to_string().contains("nowhere"));
    }
}
