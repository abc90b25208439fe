use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, warn};

use super::traits::LeaderboardSource;
use crate::error::FetchError;

/// Fetches leaderboard JSON over HTTP, optionally through a CORS relay.
pub struct HttpSource {
    client: Client,
    relay_prefix: Option<String>,
}

impl HttpSource {
    pub fn new(relay_prefix: Option<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            relay_prefix: relay_prefix.filter(|p| !p.trim().is_empty()),
        })
    }

    /// Url actually requested for `api_url`: the relay prefix followed by the
    /// url-encoded target, or the target itself when no relay is set.
    pub fn request_url(&self, api_url: &str) -> String {
        match &self.relay_prefix {
            Some(prefix) => {
                let encoded: String =
                    url::form_urlencoded::byte_serialize(api_url.as_bytes()).collect();
                format!("{}{}", prefix, encoded)
            }
            None => api_url.to_string(),
        }
    }
}

#[async_trait]
impl LeaderboardSource for HttpSource {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        let target = self.request_url(url);
        debug!("http fetch url={}", target);

        let resp = self.client.get(&target).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Transport(e.to_string())
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            warn!("http fetch failed status={} url={}", status.as_u16(), url);
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = resp.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Transport(e.to_string())
            }
        })?;
        debug!("http fetch done url={} bytes={}", url, bytes.len());
        Ok(bytes)
    }
}
