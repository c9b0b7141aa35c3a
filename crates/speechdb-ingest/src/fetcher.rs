//! Document retrieval with bounded retry
//!
//! [`DocumentSource`] performs exactly one attempt; [`DocumentFetcher`] wraps any source with
//! a [`RetryPolicy`]. The pipeline only talks to the fetcher, tests swap the source.

use crate::config::IngestConfig;
use crate::error::{FetchError, IngestError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// How often and how patiently a failed fetch is repeated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed after the first one
    pub max_retries: u32,
    /// Fixed pause between two attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Same retry count, no waiting. Meant for tests and local mirrors.
    pub fn immediate(max_retries: u32) -> Self {
        Self::new(max_retries, Duration::ZERO)
    }

    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            crate::config::DEFAULT_MAX_RETRIES,
            Duration::from_millis(crate::config::DEFAULT_RETRY_DELAY_MS),
        )
    }
}

/// A single, unretried document download
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn get(&self, url: &str) -> std::result::Result<String, FetchError>;
}

/// reqwest-backed source presenting itself as a desktop browser
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(config: &IngestConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| IngestError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentSource for HttpSource {
    async fn get(&self, url: &str) -> std::result::Result<String, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

/// Retrying front of a [`DocumentSource`]. No caching: every call goes to the source.
pub struct DocumentFetcher<S> {
    source: S,
    policy: RetryPolicy,
}

impl DocumentFetcher<HttpSource> {
    /// HTTP fetcher configured from the ingestion settings
    pub fn http(config: &IngestConfig) -> Result<Self> {
        Ok(Self::new(HttpSource::new(config)?, config.retry_policy()))
    }
}

impl<S: DocumentSource> DocumentFetcher<S> {
    pub fn new(source: S, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch `url`, retrying per policy. The error of the last attempt is returned.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let attempts = self.policy.total_attempts();
        let mut attempt = 1;

        loop {
            debug!(url = %url, attempt, "Fetching document");

            match self.source.get(url).await {
                Ok(body) => return Ok(body),
                Err(err) if attempt < attempts => {
                    warn!(
                        url = %url,
                        attempt,
                        max_attempts = attempts,
                        error = %err,
                        "Fetch failed, retrying in {}ms",
                        self.policy.delay.as_millis()
                    );
                    if !self.policy.delay.is_zero() {
                        tokio::time::sleep(self.policy.delay).await;
                    }
                    attempt += 1;
                },
                Err(err) => {
                    return Err(IngestError::Fetch {
                        url: url.to_string(),
                        attempts,
                        source: err,
                    })
                },
            }
        }
    }
}
