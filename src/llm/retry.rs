//! Bounded retry for transient LLM failures
//!
//! The research pipeline itself never retries. Deployments that want to ride
//! out rate limiting or a flaky provider wrap a client in [`RetryingClient`];
//! only errors for which [`crate::types::AppError::is_transient`] holds are retried.

use crate::llm::client::LLMClient;
use crate::types::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Extra attempts after the first one (0 = never retry)
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
    #[serde(default = "default_multiplier")]
    pub backoff_multiplier: f64,
}

fn default_initial_delay() -> u64 {
    500
}

fn default_max_delay() -> u64 {
    30_000
}

fn default_multiplier() -> f64 {
    2.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            backoff_multiplier: default_multiplier(),
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (0-based), capped at `max_delay_ms`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis((base as u64).min(self.max_delay_ms))
    }

    /// Run `op` until it succeeds, fails permanently, or retries run out.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_retries && e.is_transient() => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        operation = what,
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying transient failure"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// An [`LLMClient`] that retries transient failures of the wrapped client.
pub struct RetryingClient {
    inner: Box<dyn LLMClient>,
    config: RetryConfig,
}

impl RetryingClient {
    pub fn new(inner: Box<dyn LLMClient>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl LLMClient for RetryingClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.config
            .run("generate", || self.inner.generate(prompt))
            .await
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.config
            .run("generate_with_system", || {
                self.inner.generate_with_system(system, prompt)
            })
            .await
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AppError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyClient {
        calls: Arc<AtomicU32>,
        failures_before_success: u32,
        error: fn() -> AppError,
    }

    #[async_trait]
    impl LLMClient for FlakyClient {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures_before_success {
                Err((self.error)())
            } else {
                Ok("ok".to_string())
            }
        }

        async fn generate_with_system(&self, _system: &str, prompt: &str) -> Result<String> {
            self.generate(prompt).await
        }

        fn model_name(&self) -> &str {
            "flaky"
        }
    }

    fn fast_config(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_delay_ms: 1,
            max_delay_ms: 5,
            backoff_multiplier: 2.0,
        }
    }

    #[test]
    fn test_default_never_retries() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.initial_delay_ms, 500);
    }

    #[test]
    fn test_delay_is_capped() {
        let config = RetryConfig {
            max_retries: 10,
            initial_delay_ms: 100,
            max_delay_ms: 1_000,
            backoff_multiplier: 2.0,
        };
        assert_eq!(config.delay_for(0), Duration::from_millis(100));
        assert_eq!(config.delay_for(2), Duration::from_millis(400));
        assert_eq!(config.delay_for(8), Duration::from_millis(1_000));
    }

    #[tokio::test]
    async fn test_transient_error_is_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let client = RetryingClient::new(
            Box::new(FlakyClient {
                calls: calls.clone(),
                failures_before_success: 2,
                error: || AppError::Timeout("slow".into()),
            }),
            fast_config(3),
        );

        assert_eq!(client.generate("hi").await.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let client = RetryingClient::new(
            Box::new(FlakyClient {
                calls: calls.clone(),
                failures_before_success: 5,
                error: || AppError::LLM("invalid api key".into()),
            }),
            fast_config(3),
        );

        assert!(client.generate("hi").await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let client = RetryingClient::new(
            Box::new(FlakyClient {
                calls: calls.clone(),
                failures_before_success: 10,
                error: || AppError::LLM("503 service unavailable".into()),
            }),
            fast_config(2),
        );

        assert!(client.generate_with_system("sys", "hi").await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
