//! Best-effort team notification delivery.
//!
//! Delivery is behind a trait so the transport stays swappable; the shipped
//! implementation forwards to an automation webhook. Callers treat every
//! failure as non-fatal.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::core::errors::ApiError;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, to: &str, subject: &str, body: &str) -> Result<(), ApiError>;
}

/// Posts `{to, subject, body}` to a webhook with a hard timeout.
pub struct WebhookNotifier {
    url: String,
    timeout: Duration,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(url: String, timeout_secs: u64) -> Self {
        Self {
            url,
            timeout: Duration::from_secs(timeout_secs.max(1)),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, to: &str, subject: &str, body: &str) -> Result<(), ApiError> {
        let payload = json!({
            "to": to,
            "subject": subject,
            "body": body,
        });

        let res = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            return Err(ApiError::Internal(format!(
                "notification webhook returned {}",
                res.status()
            )));
        }

        Ok(())
    }
}

/// Used when no webhook is configured; delivery becomes a debug log line.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, to: &str, subject: &str, _body: &str) -> Result<(), ApiError> {
        tracing::debug!("notification skipped (no transport configured): {} -> {}", subject, to);
        Ok(())
    }
}
