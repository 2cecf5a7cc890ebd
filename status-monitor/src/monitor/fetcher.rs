//! Status document retrieval.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::snapshot::Snapshot;
use crate::error::{FetchError, truncate_body};

/// Source of status snapshots.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Retrieve the current snapshot. Never retries.
    async fn fetch(&self) -> Result<Snapshot, FetchError>;

    /// Human-readable location of the source, for logs.
    fn describe(&self) -> String;
}

/// Fetches a Statuspage-style `summary.json` over HTTP.
pub struct StatusFetcher {
    client: Client,
    url: Url,
}

impl StatusFetcher {
    pub fn new(client: Client, url: Url) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl StatusSource for StatusFetcher {
    async fn fetch(&self) -> Result<Snapshot, FetchError> {
        debug!(url = %self.url, "Fetching status summary");

        let response = self
            .client
            .get(self.url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(FetchError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let body = response.bytes().await.map_err(FetchError::Request)?;
        let snapshot = Snapshot::from_summary_json(&body, Utc::now())?;

        debug!(
            components = snapshot.components().len(),
            indicator = snapshot.overall_indicator(),
            "Status summary parsed"
        );
        Ok(snapshot)
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}
