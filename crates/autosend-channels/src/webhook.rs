//! Webhook transport — POSTs each message as JSON to a configured URL.

use async_trait::async_trait;
use autosend_core::config::WebhookConfig;
use autosend_core::error::{AutosendError, Result};
use autosend_core::{DeliveryRecord, PendingMessage, Transport};
use chrono::Utc;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Outgoing request body.
#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    to: &'a str,
    content: &'a str,
}

/// Acknowledgement body returned by the recipient.
#[derive(Debug, Deserialize)]
struct WebhookResponse {
    message: String,
    #[serde(rename = "messageId")]
    message_id: String,
}

/// Transport delivering over an HTTP webhook.
pub struct WebhookTransport {
    client: reqwest::Client,
    url: String,
    expected_status: StatusCode,
}

impl WebhookTransport {
    pub fn new(config: &WebhookConfig) -> Result<Self> {
        let expected_status = StatusCode::from_u16(config.expected_status).map_err(|e| {
            AutosendError::Config(format!(
                "webhook.expected_status {} is not a valid HTTP status: {e}",
                config.expected_status
            ))
        })?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AutosendError::Transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: config.url.clone(),
            expected_status,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for WebhookTransport {
    async fn deliver(&self, message: &PendingMessage) -> Result<DeliveryRecord> {
        let body = WebhookMessage {
            to: &message.recipient,
            content: &message.content,
        };

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AutosendError::Transport(format!("Webhook send failed: {e}")))?;

        let status = resp.status();
        if status != self.expected_status {
            return Err(AutosendError::Transport(format!(
                "Webhook unexpected response code {}",
                status.as_u16()
            )));
        }

        let ack: WebhookResponse = resp
            .json()
            .await
            .map_err(|e| AutosendError::Transport(format!("Invalid webhook response: {e}")))?;

        tracing::debug!("📤 Webhook accepted message {} as {}", message.id, ack.message_id);
        Ok(DeliveryRecord {
            message: ack.message,
            delivery_id: ack.message_id,
            sent_at: Utc::now(),
        })
    }

    fn name(&self) -> &str {
        "webhook"
    }
}
