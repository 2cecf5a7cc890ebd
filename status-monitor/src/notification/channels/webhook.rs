//! Generic webhook notification channel.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::NotificationChannel;
use crate::error::{NotifyError, truncate_body};
use crate::notification::formatter::NotificationPayload;

/// POSTs payload bodies as JSON to a single webhook URL.
pub struct WebhookChannel {
    url: Url,
    client: Client,
}

impl WebhookChannel {
    /// Create a new Webhook channel.
    pub fn new(client: Client, url: Url) -> Self {
        Self { url, client }
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    fn channel_type(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, payload: &NotificationPayload) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(payload.body())
            .send()
            .await
            .map_err(NotifyError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = truncate_body(&response.text().await.unwrap_or_default());
            debug!(status = status.as_u16(), body = %body, "Webhook rejected payload");
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(kind = %payload.kind(), "Webhook notification sent");
        Ok(())
    }
}
