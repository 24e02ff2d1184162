//! LLM Client abstractions and provider management
//!
//! This module provides a unified interface for the language models that back
//! the planning, search and synthesis collaborators:
//! - **OpenAI**: OpenAI API and compatible endpoints (feature `openai`)
//! - **Ollama**: local inference through an Ollama server (feature `ollama`)

use crate::types::{AppError, Result};
use crate::utils::toml_config::{ModelConfig, ProviderConfig};
use async_trait::async_trait;

/// Generic LLM client trait for provider abstraction
///
/// All LLM providers implement this trait, allowing for easy swapping
/// between providers without changing application code.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion from a prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate with system prompt
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Sampling parameters forwarded to the provider
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 4096,
        }
    }
}

/// Provider enum for runtime selection
#[derive(Debug, Clone)]
pub enum Provider {
    /// OpenAI API provider (including Azure OpenAI and compatible APIs)
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::OpenAI {
    ///     api_key: "sk-...".to_string(),
    ///     api_base: "https://api.openai.com/v1".to_string(),
    ///     model: "gpt-4o-mini".to_string(),
    ///     params: ModelParams::default(),
    /// };
    /// ```
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
        params: ModelParams,
    },

    /// Ollama local LLM provider
    Ollama {
        base_url: String,
        model: String,
        params: ModelParams,
    },
}

impl Provider {
    /// Resolve a `[models.*]` entry and the provider it references.
    ///
    /// API keys are read from the environment variable named in the
    /// provider configuration.
    pub fn from_model_config(model: &ModelConfig, provider: &ProviderConfig) -> Result<Self> {
        let params = ModelParams {
            temperature: model.temperature,
            max_tokens: model.max_tokens,
        };

        match provider {
            ProviderConfig::OpenAI {
                api_key_env,
                api_base,
            } => {
                let api_key = std::env::var(api_key_env).map_err(|_| {
                    AppError::Configuration(format!(
                        "Environment variable '{}' is not set",
                        api_key_env
                    ))
                })?;
                Ok(Provider::OpenAI {
                    api_key,
                    api_base: api_base.clone(),
                    model: model.model.clone(),
                    params,
                })
            }
            ProviderConfig::Ollama { base_url } => Ok(Provider::Ollama {
                base_url: base_url.clone(),
                model: model.model.clone(),
                params,
            }),
        }
    }

    /// Create a client instance for this provider
    ///
    /// # Errors
    ///
    /// Returns an error if the provider's cargo feature is not enabled or
    /// the client cannot be constructed.
    pub async fn create_client(&self) -> Result<Box<dyn LLMClient>> {
        match self {
            #[cfg(feature = "openai")]
            Provider::OpenAI {
                api_key,
                api_base,
                model,
                params,
            } => Ok(Box::new(super::openai::OpenAIClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
                params.clone(),
            ))),

            #[cfg(not(feature = "openai"))]
            Provider::OpenAI { model, .. } => Err(AppError::Configuration(format!(
                "Model '{}' needs the OpenAI provider; rebuild with `--features openai`",
                model
            ))),

            #[cfg(feature = "ollama")]
            Provider::Ollama {
                base_url,
                model,
                params,
            } => Ok(Box::new(super::ollama::OllamaClient::new(
                base_url.clone(),
                model.clone(),
                params.clone(),
            )?)),

            #[cfg(not(feature = "ollama"))]
            Provider::Ollama { model, .. } => Err(AppError::Configuration(format!(
                "Model '{}' needs the Ollama provider; rebuild with `--features ollama`",
                model
            ))),
        }
    }

    /// Check if this provider was compiled in
    pub fn is_enabled(&self) -> bool {
        match self {
            Provider::OpenAI { .. } => cfg!(feature = "openai"),
            Provider::Ollama { .. } => cfg!(feature = "ollama"),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI { .. } => "OpenAI",
            Provider::Ollama { .. } => "Ollama",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_name() {
        let openai = Provider::OpenAI {
            api_key: "".to_string(),
            api_base: "".to_string(),
            model: "".to_string(),
            params: ModelParams::default(),
        };
        assert_eq!(openai.name(), "OpenAI");

        let ollama = Provider::Ollama {
            base_url: "".to_string(),
            model: "".to_string(),
            params: ModelParams::default(),
        };
        assert_eq!(ollama.name(), "Ollama");
        assert_eq!(ollama.is_enabled(), cfg!(feature = "ollama"));
    }

    #[test]
    fn test_from_model_config_ollama() {
        let model = ModelConfig {
            provider: "local".to_string(),
            model: "llama3.2".to_string(),
            temperature: 0.2,
            max_tokens: 1024,
        };
        let provider = ProviderConfig::Ollama {
            base_url: "http://gpu-box:11434".to_string(),
        };

        match Provider::from_model_config(&model, &provider).unwrap() {
            Provider::Ollama {
                base_url,
                model,
                params,
            } => {
                assert_eq!(base_url, "http://gpu-box:11434");
                assert_eq!(model, "llama3.2");
                assert_eq!(params.max_tokens, 1024);
            }
            other => panic!("expected Ollama, got {:?}", other),
        }
    }

    #[test]
    fn test_from_model_config_missing_key() {
        let model = ModelConfig {
            provider: "cloud".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 512,
        };
        let provider = ProviderConfig::OpenAI {
            api_key_env: "DELVE_CLIENT_TEST_UNSET_KEY".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
        };

        let err = Provider::from_model_config(&model, &provider).unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
        assert!(err.to_string().contains("DELVE_CLIENT_TEST_UNSET_KEY"));
    }
}
