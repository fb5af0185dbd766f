//! Alert delivery.
//!
//! Delivery is fire-and-forget: failures are logged here and never reach
//! the resolve or poll path.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::models::NotifyConfig;

/// Receives one call per emitted event.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, subject: &str, body: &str);
}

/// Writes alerts to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, subject: &str, body: &str) {
        log::info!("ALERT {}: {}", subject, body.replace('\n', " | "));
    }
}

/// Posts `{"subject", "body"}` JSON to a webhook.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    async fn send(&self, subject: &str, body: &str) -> Result<()> {
        self.client
            .post(&self.url)
            .json(&json!({ "subject": subject, "body": body }))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| AppError::Notify(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, subject: &str, body: &str) {
        LogNotifier.notify(subject, body).await;
        if let Err(error) = self.send(subject, body).await {
            log::warn!("Alert delivery to {} failed: {}", self.url, error);
        }
    }
}

/// Webhook notifier when configured, log-only otherwise.
pub fn notifier_from_config(config: &NotifyConfig, client: reqwest::Client) -> Arc<dyn Notifier> {
    match &config.webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(client, url.clone())),
        None => Arc::new(LogNotifier),
    }
}
