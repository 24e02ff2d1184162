//! TOML-based configuration for Delve
//!
//! This module provides declarative configuration for the research pipeline,
//! LLM providers, models, the collaborators that use them, and the delivery
//! channel via a TOML file (`research.toml`).
//!
//! Secrets never live in the file itself: providers and delivery channels name
//! the environment variable that holds the key, and validation checks that the
//! variable is set.

use crate::llm::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure loaded from research.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Pipeline shape and timeouts
    #[serde(default)]
    pub research: PipelineConfig,

    /// Retry policy for LLM-backed collaborators
    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Named LLM provider configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Named model configurations that reference providers
    #[serde(default)]
    pub models: HashMap<String, ModelConfig>,

    /// Which model backs each collaborator
    #[serde(default)]
    pub collaborators: CollaboratorsConfig,

    /// Web search settings used by the search collaborator
    #[serde(default)]
    pub search: WebSearchConfig,

    #[serde(default)]
    pub delivery: DeliveryConfig,
}

// ============= Pipeline Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Fan-out width: how many searches the planner must return
    #[serde(default = "default_searches")]
    pub searches: usize,

    /// Maximum searches in flight at once (0 = no limit)
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    #[serde(default = "default_plan_timeout")]
    pub plan_timeout_secs: u64,

    /// Per-search timeout (0 disables it)
    #[serde(default = "default_search_timeout")]
    pub search_timeout_secs: u64,

    #[serde(default = "default_write_timeout")]
    pub write_timeout_secs: u64,

    #[serde(default = "default_deliver_timeout")]
    pub deliver_timeout_secs: u64,

    /// Deadline for the whole run
    #[serde(default)]
    pub run_timeout_secs: Option<u64>,

    /// Capacity of the progress event channel
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    /// Prefix for a human-viewable trace link; the correlation id is appended
    #[serde(default)]
    pub trace_url_base: Option<String>,
}

fn default_searches() -> usize {
    5
}

fn default_max_concurrency() -> usize {
    5
}

fn default_plan_timeout() -> u64 {
    120
}

fn default_search_timeout() -> u64 {
    60
}

fn default_write_timeout() -> u64 {
    300
}

fn default_deliver_timeout() -> u64 {
    60
}

fn default_event_buffer() -> usize {
    32
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            searches: default_searches(),
            max_concurrency: default_max_concurrency(),
            plan_timeout_secs: default_plan_timeout(),
            search_timeout_secs: default_search_timeout(),
            write_timeout_secs: default_write_timeout(),
            deliver_timeout_secs: default_deliver_timeout(),
            run_timeout_secs: None,
            event_buffer: default_event_buffer(),
            trace_url_base: None,
        }
    }
}

/// `0` means "no timeout".
fn secs(value: u64) -> Option<Duration> {
    (value > 0).then(|| Duration::from_secs(value))
}

impl PipelineConfig {
    pub fn plan_timeout(&self) -> Option<Duration> {
        secs(self.plan_timeout_secs)
    }

    pub fn search_timeout(&self) -> Option<Duration> {
        secs(self.search_timeout_secs)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        secs(self.write_timeout_secs)
    }

    pub fn deliver_timeout(&self) -> Option<Duration> {
        secs(self.deliver_timeout_secs)
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_secs.and_then(secs)
    }

    /// Concurrency cap for the search fan-out, `None` when unbounded
    pub fn concurrency_limit(&self) -> Option<usize> {
        (self.max_concurrency > 0).then_some(self.max_concurrency)
    }
}

// ============= Logging Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ============= Provider Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
    },
    OpenAI {
        /// Environment variable containing API key
        api_key_env: String,
        #[serde(default = "default_openai_base")]
        api_base: String,
    },
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

// ============= Model Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Reference to a provider name defined in [providers]
    pub provider: String,

    /// Model name/identifier to use with the provider
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_model_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_model_max_tokens() -> u32 {
    4096
}

// ============= Collaborator Configuration =============

/// Model references for the LLM-backed collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaboratorsConfig {
    #[serde(default = "default_model_ref")]
    pub planner: String,
    #[serde(default = "default_model_ref")]
    pub searcher: String,
    #[serde(default = "default_model_ref")]
    pub writer: String,
}

fn default_model_ref() -> String {
    "default".to_string()
}

impl Default for CollaboratorsConfig {
    fn default() -> Self {
        Self {
            planner: default_model_ref(),
            searcher: default_model_ref(),
            writer: default_model_ref(),
        }
    }
}

impl CollaboratorsConfig {
    /// (collaborator, model) pairs
    pub fn entries(&self) -> [(&'static str, &str); 3] {
        [
            ("planner", self.planner.as_str()),
            ("searcher", self.searcher.as_str()),
            ("writer", self.writer.as_str()),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchConfig {
    /// Results requested from the web search tool per plan item
    #[serde(default = "default_num_results")]
    pub num_results: usize,
    /// Top results whose pages are fetched and handed to the summarizer (0 = snippets only)
    #[serde(default)]
    pub fetch_pages: usize,
}

fn default_num_results() -> usize {
    5
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            num_results: default_num_results(),
            fetch_pages: 0,
        }
    }
}

// ============= Delivery Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DeliveryConfig {
    /// Only log the delivery
    #[default]
    Log,
    /// Write `<dir>/<correlation_id>.md`
    File { dir: PathBuf },
    /// Send an e-mail through the SendGrid v3 API
    SendGrid {
        /// Environment variable containing the SendGrid API key
        api_key_env: String,
        from: String,
        to: String,
        #[serde(default = "default_subject")]
        subject: String,
        #[serde(default = "default_sendgrid_base")]
        base_url: String,
    },
}

fn default_subject() -> String {
    "Research report".to_string()
}

fn default_sendgrid_base() -> String {
    "https://api.sendgrid.com".to_string()
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),

    #[error("Provider '{0}' referenced by model '{1}' does not exist")]
    MissingProvider(String, String),

    #[error("Model '{0}' referenced by collaborator '{1}' does not exist")]
    MissingModel(String, String),
}

impl ResearchConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: ResearchConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for internal consistency and env var availability
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.research.searches == 0 {
            return Err(ConfigError::ValidationError(
                "research.searches must be at least 1".to_string(),
            ));
        }
        if self.research.event_buffer == 0 {
            return Err(ConfigError::ValidationError(
                "research.event_buffer must be at least 1".to_string(),
            ));
        }

        for provider in self.providers.values() {
            if let ProviderConfig::OpenAI { api_key_env, .. } = provider {
                self.validate_env_var(api_key_env)?;
            }
        }

        for (model_name, model_config) in &self.models {
            if !self.providers.contains_key(&model_config.provider) {
                return Err(ConfigError::MissingProvider(
                    model_config.provider.clone(),
                    model_name.clone(),
                ));
            }
        }

        for (collaborator, model) in self.collaborators.entries() {
            if !self.models.contains_key(model) {
                return Err(ConfigError::MissingModel(
                    model.to_string(),
                    collaborator.to_string(),
                ));
            }
        }

        if let DeliveryConfig::SendGrid {
            api_key_env,
            from,
            to,
            ..
        } = &self.delivery
        {
            self.validate_env_var(api_key_env)?;
            if !from.contains('@') || !to.contains('@') {
                return Err(ConfigError::ValidationError(
                    "delivery.from and delivery.to must be e-mail addresses".to_string(),
                ));
            }
        }

        Ok(())
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        std::env::var(name)
            .map(|_| ())
            .map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
    }

    /// Resolve an environment variable named in the config
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok()
    }

    /// Get a provider configuration by name
    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    /// Get a model configuration by name
    pub fn get_model(&self, name: &str) -> Option<&ModelConfig> {
        self.models.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> String {
        r#"
[research]
searches = 3
max_concurrency = 2
search_timeout_secs = 0

[providers.local]
type = "ollama"
base_url = "http://localhost:11434"

[models.fast]
provider = "local"
model = "llama3.2"

[models.smart]
provider = "local"
model = "qwen2.5:14b"
temperature = 0.3

[collaborators]
planner = "fast"
searcher = "fast"
writer = "smart"

[delivery]
type = "file"
dir = "reports"
"#
        .to_string()
    }

    #[test]
    fn test_parse_config() {
        let config = ResearchConfig::parse(&create_test_config()).unwrap();

        assert_eq!(config.research.searches, 3);
        assert_eq!(config.research.concurrency_limit(), Some(2));
        assert_eq!(config.research.search_timeout(), None);
        assert_eq!(config.models.len(), 2);
        assert_eq!(config.collaborators.writer, "smart");
        assert!(matches!(config.delivery, DeliveryConfig::File { .. }));
    }

    #[test]
    fn test_defaults() {
        let config = ResearchConfig::parse(
            r#"
[providers.local]
type = "ollama"

[models.default]
provider = "local"
model = "llama3.2"
"#,
        )
        .unwrap();

        assert_eq!(config.research.searches, 5);
        assert_eq!(config.research.max_concurrency, 5);
        assert_eq!(config.research.event_buffer, 32);
        assert_eq!(
            config.research.search_timeout(),
            Some(Duration::from_secs(60))
        );
        assert_eq!(config.research.run_timeout(), None);
        assert_eq!(config.retry.max_retries, 0);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.search.num_results, 5);
        assert!(matches!(config.delivery, DeliveryConfig::Log));
        match config.get_provider("local").unwrap() {
            ProviderConfig::Ollama { base_url } => assert_eq!(base_url, "http://localhost:11434"),
            other => panic!("unexpected provider {:?}", other),
        }
    }

    #[test]
    fn test_unbounded_concurrency() {
        let config = PipelineConfig {
            max_concurrency: 0,
            ..Default::default()
        };
        assert_eq!(config.concurrency_limit(), None);
    }

    #[test]
    fn test_validation_zero_searches() {
        let content = create_test_config().replace("searches = 3", "searches = 0");
        let result = ResearchConfig::parse(&content);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validation_missing_provider() {
        let content = create_test_config().replace(
            "provider = \"local\"\nmodel = \"llama3.2\"",
            "provider = \"remote\"\nmodel = \"llama3.2\"",
        );
        let result = ResearchConfig::parse(&content);
        assert!(matches!(result, Err(ConfigError::MissingProvider(p, _)) if p == "remote"));
    }

    #[test]
    fn test_validation_missing_collaborator_model() {
        let content = create_test_config().replace("writer = \"smart\"", "writer = \"huge\"");
        let result = ResearchConfig::parse(&content);
        assert!(
            matches!(result, Err(ConfigError::MissingModel(m, c)) if m == "huge" && c == "writer")
        );
    }

    #[test]
    fn test_validation_missing_env_var() {
        let content = r#"
[providers.cloud]
type = "openai"
api_key_env = "DELVE_TEST_SURELY_UNSET_KEY"

[models.default]
provider = "cloud"
model = "gpt-4o-mini"
"#;
        let result = ResearchConfig::parse(content);
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "DELVE_TEST_SURELY_UNSET_KEY")
        );
    }

    #[test]
    fn test_parse_error() {
        let result = ResearchConfig::parse("[research\nsearches = ");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = ResearchConfig::load("/definitely/not/here/research.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
