//! Delivery client and the built-in delivery channels
//!
//! Delivery never fails a run. [`Deliverer::deliver`] turns every outcome
//! into a [`DeliveryOutcome`] the orchestrator reports as a progress event.
//!
//! Channels:
//! - [`LogDelivery`] - writes the summary to the log
//! - [`FileDelivery`] - writes `<dir>/<correlation_id>.md`
//! - [`SendGridDelivery`] - e-mails the report through the SendGrid v3 API

use crate::llm::retry::RetryConfig;
use crate::research::collaborators::DeliveryChannel;
use crate::research::with_timeout;
use crate::types::{AppError, DeliveryAck, Report, Result};
use async_trait::async_trait;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Result of the delivery stage.
#[derive(Debug)]
pub enum DeliveryOutcome {
    Delivered(DeliveryAck),
    /// Always an [`AppError::Delivery`]
    Failed(AppError),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered(_))
    }
}

pub struct Deliverer {
    channel: Arc<dyn DeliveryChannel>,
    timeout: Option<Duration>,
    retry: RetryConfig,
}

impl Deliverer {
    pub fn new(channel: Arc<dyn DeliveryChannel>) -> Self {
        Self {
            channel,
            timeout: None,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Retry transient channel failures (HTTP 429/5xx, timeouts)
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub async fn deliver(&self, correlation_id: &str, report: &Report) -> DeliveryOutcome {
        let attempt = self
            .retry
            .run("delivery", || {
                with_timeout(
                    self.timeout,
                    "delivery",
                    self.channel.deliver(correlation_id, report),
                )
            })
            .await;

        match attempt {
            Ok(ack) => {
                info!(
                    correlation_id,
                    channel = %ack.channel,
                    reference = ack.reference.as_deref().unwrap_or("-"),
                    "report delivered"
                );
                DeliveryOutcome::Delivered(ack)
            }
            Err(e) => {
                let err = match e {
                    AppError::Delivery(_) => e,
                    other => AppError::Delivery(other.to_string()),
                };
                warn!(
                    correlation_id,
                    channel = self.channel.name(),
                    error = %err,
                    "delivery failed"
                );
                DeliveryOutcome::Failed(err)
            }
        }
    }
}

/// Plain markdown rendering shared by the file and e-mail channels
pub fn render_report(report: &Report) -> String {
    let mut out = format!("{}\n\n{}", report.summary.trim(), report.content.trim());
    if !report.follow_ups.is_empty() {
        out.push_str("\n\n## Follow-up questions\n");
        for question in &report.follow_ups {
            out.push_str(&format!("\n- {}", question));
        }
    }
    out.push('\n');
    out
}

/// Logs the report summary and nothing else.
pub struct LogDelivery;

#[async_trait]
impl DeliveryChannel for LogDelivery {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn deliver(&self, correlation_id: &str, report: &Report) -> Result<DeliveryAck> {
        info!(
            correlation_id,
            summary = %report.summary,
            chars = report.content.len(),
            "report ready"
        );
        Ok(DeliveryAck {
            channel: self.name().to_string(),
            reference: None,
        })
    }
}

/// Writes each report to `<dir>/<correlation_id>.md`.
pub struct FileDelivery {
    dir: PathBuf,
}

impl FileDelivery {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl DeliveryChannel for FileDelivery {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn deliver(&self, correlation_id: &str, report: &Report) -> Result<DeliveryAck> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            AppError::Delivery(format!("cannot create {}: {}", self.dir.display(), e))
        })?;

        let path = self.dir.join(format!("{}.md", correlation_id));
        tokio::fs::write(&path, render_report(report))
            .await
            .map_err(|e| AppError::Delivery(format!("cannot write {}: {}", path.display(), e)))?;

        Ok(DeliveryAck {
            channel: self.name().to_string(),
            reference: Some(path.display().to_string()),
        })
    }
}

/// E-mails reports through the SendGrid v3 mail API.
pub struct SendGridDelivery {
    http: reqwest::Client,
    api_key: String,
    from: String,
    to: String,
    subject: String,
    base_url: String,
}

impl SendGridDelivery {
    pub fn new(
        api_key: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl DeliveryChannel for SendGridDelivery {
    fn name(&self) -> &'static str {
        "sendgrid"
    }

    async fn deliver(&self, correlation_id: &str, report: &Report) -> Result<DeliveryAck> {
        let body = json!({
            "personalizations": [{ "to": [{ "email": self.to }] }],
            "from": { "email": self.from },
            "subject": self.subject,
            "content": [{ "type": "text/plain", "value": render_report(report) }],
            "custom_args": { "correlation_id": correlation_id }
        });

        let response = self
            .http
            .post(format!("{}/v3/mail/send", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AppError::Http {
                status: Some(status.as_u16()),
                message: format!("SendGrid rejected the message: {}", message),
            });
        }

        let reference = response
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(DeliveryAck {
            channel: self.name().to_string(),
            reference,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research::collaborators::MockDeliveryChannel;

    fn report() -> Report {
        Report {
            summary: "Short.".into(),
            content: "# Body".into(),
            follow_ups: vec!["One?".into(), "Two?".into()],
        }
    }

    #[test]
    fn test_render_report() {
        let text = render_report(&report());
        assert!(text.starts_with("Short.\n\n# Body"));
        assert!(text.contains("## Follow-up questions\n\n- One?\n- Two?"));
    }

    #[tokio::test]
    async fn test_log_delivery_acks() {
        let outcome = Deliverer::new(Arc::new(LogDelivery))
            .deliver("trace_abc", &report())
            .await;
        match outcome {
            DeliveryOutcome::Delivered(ack) => {
                assert_eq!(ack.channel, "log");
                assert!(ack.reference.is_none());
            }
            DeliveryOutcome::Failed(e) => panic!("unexpected failure: {}", e),
        }
    }

    #[tokio::test]
    async fn test_channel_error_becomes_failed_outcome() {
        let mut channel = MockDeliveryChannel::new();
        channel.expect_name().return_const("mock");
        channel
            .expect_deliver()
            .withf(|id, _| id.starts_with("trace_abc"))
            .times(1)
            .returning(|_, _| {
                Err(AppError::Http {
                    status: Some(400),
                    message: "bad address".into(),
                })
            });

        let outcome = Deliverer::new(Arc::new(channel))
            .deliver("trace_abc", &report())
            .await;
        assert!(!outcome.is_delivered());
        assert!(matches!(outcome, DeliveryOutcome::Failed(AppError::Delivery(msg)) if msg.contains("bad address")));
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried_when_enabled() {
        let mut channel = MockDeliveryChannel::new();
        channel.expect_name().return_const("mock");
        let mut seq = mockall::Sequence::new();
        channel
            .expect_deliver()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Err(AppError::Http {
                    status: Some(503),
                    message: "busy".into(),
                })
            });
        channel
            .expect_deliver()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Ok(DeliveryAck {
                    channel: "mock".into(),
                    reference: Some("id-1".into()),
                })
            });

        let retry = RetryConfig {
            max_retries: 2,
            initial_delay_ms: 1,
            max_delay_ms: 5,
            backoff_multiplier: 2.0,
        };
        let outcome = Deliverer::new(Arc::new(channel))
            .with_retry(retry)
            .deliver("trace_abc", &report())
            .await;
        assert!(outcome.is_delivered());
    }

    #[tokio::test]
    async fn test_delivery_timeout_is_failed_outcome() {
        struct Hangs;

        #[async_trait]
        impl DeliveryChannel for Hangs {
            fn name(&self) -> &'static str {
                "hangs"
            }

            async fn deliver(&self, _id: &str, _report: &Report) -> Result<DeliveryAck> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Err(AppError::Delivery("unreachable".into()))
            }
        }

        let outcome = Deliverer::new(Arc::new(Hangs))
            .with_timeout(Some(Duration::from_millis(20)))
            .deliver("trace_abc", &report())
            .await;
        assert!(matches!(outcome, DeliveryOutcome::Failed(AppError::Delivery(msg)) if msg.contains("Timed out")));
    }
}
