//! Ingestion configuration
//!
//! Defaults match the public archive. Every knob can be overridden from the environment
//! (`SPEECHDB_*`) and then from CLI flags.

use crate::error::{IngestError, Result};
use crate::fetcher::RetryPolicy;
use speechdb_common::Language;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_BASE_URL: &str = "https://www.narendramodi.in";

/// Path of the paginated listing endpoint, relative to the base URL
pub const LISTING_PATH: &str = "/speech/loadspeeche";

pub const DEFAULT_DATA_DIR: &str = "docs";

/// A desktop browser identity; the archive rejects obvious bot user agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Additional attempts after the first failed fetch
pub const DEFAULT_MAX_RETRIES: u32 = 3;

pub const DEFAULT_RETRY_DELAY_MS: u64 = 2000;

/// Roughly one listing page worth of already-known speeches
pub const DEFAULT_DUPLICATE_THRESHOLD: usize = 10;

/// Configuration for one ingestion run
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Scheme and host of the archive, without trailing slash
    pub base_url: String,

    /// Archive edition to scrape; selects the dataset file too
    pub language: Language,

    /// Directory holding `data_<lang>.csv`
    pub data_dir: PathBuf,

    pub user_agent: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    pub max_retries: u32,

    pub retry_delay_ms: u64,

    /// Consecutive known speeches after which the run assumes it has caught up
    pub duplicate_threshold: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        IngestConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            language: Language::default(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            duplicate_threshold: DEFAULT_DUPLICATE_THRESHOLD,
        }
    }
}

impl IngestConfig {
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder::default()
    }

    /// Defaults overridden by `SPEECHDB_*` environment variables
    ///
    /// - `SPEECHDB_BASE_URL`
    /// - `SPEECHDB_DATA_DIR`
    /// - `SPEECHDB_USER_AGENT`
    /// - `SPEECHDB_TIMEOUT_SECS`
    /// - `SPEECHDB_MAX_RETRIES`
    /// - `SPEECHDB_RETRY_DELAY_MS`
    /// - `SPEECHDB_DUPLICATE_THRESHOLD`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("SPEECHDB_BASE_URL") {
            config.base_url = url;
        }
        if let Ok(dir) = std::env::var("SPEECHDB_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(agent) = std::env::var("SPEECHDB_USER_AGENT") {
            config.user_agent = agent;
        }
        if let Some(secs) = env_number("SPEECHDB_TIMEOUT_SECS")? {
            config.timeout_secs = secs;
        }
        if let Some(retries) = env_number("SPEECHDB_MAX_RETRIES")? {
            config.max_retries = retries;
        }
        if let Some(delay) = env_number("SPEECHDB_RETRY_DELAY_MS")? {
            config.retry_delay_ms = delay;
        }
        if let Some(threshold) = env_number("SPEECHDB_DUPLICATE_THRESHOLD")? {
            config.duplicate_threshold = threshold;
        }

        Ok(config)
    }

    /// Listing endpoint without query string; pages are selected with `page` and `language`
    pub fn listing_endpoint(&self) -> Result<Url> {
        let raw = format!("{}{}", self.base_url.trim_end_matches('/'), LISTING_PATH);
        Url::parse(&raw)
            .map_err(|e| IngestError::config(format!("Invalid base URL '{}': {}", self.base_url, e)))
    }

    /// URL of listing page `page` (1-based) for the configured language
    pub fn listing_url(&self, page: u32) -> Result<Url> {
        Ok(listing_page_url(&self.listing_endpoint()?, page, self.language))
    }

    /// Location of the dataset for the configured language
    pub fn dataset_path(&self) -> PathBuf {
        self.data_dir.join(self.language.dataset_file_name())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_delay_ms))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(IngestError::config("Base URL cannot be empty"));
        }

        let endpoint = self.listing_endpoint()?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(IngestError::config(format!(
                "Base URL must be http or https, got '{}'",
                endpoint.scheme()
            )));
        }

        if self.user_agent.trim().is_empty() {
            return Err(IngestError::config("User agent cannot be empty"));
        }

        if self.timeout_secs == 0 {
            return Err(IngestError::config("Timeout must be greater than 0"));
        }

        if self.duplicate_threshold == 0 {
            return Err(IngestError::config("Duplicate threshold must be greater than 0"));
        }

        Ok(())
    }
}

/// Select one listing page on an already parsed endpoint
pub fn listing_page_url(endpoint: &Url, page: u32, language: Language) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .clear()
        .append_pair("page", &page.to_string())
        .append_pair("language", language.code());
    url
}

fn env_number<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| IngestError::config(format!("{} must be a number, got '{}'", name, raw))),
        Err(_) => Ok(None),
    }
}

/// Builder for [`IngestConfig`]
#[derive(Debug, Default)]
pub struct IngestConfigBuilder {
    base_url: Option<String>,
    language: Option<Language>,
    data_dir: Option<PathBuf>,
    user_agent: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    retry_delay_ms: Option<u64>,
    duplicate_threshold: Option<usize>,
}

impl IngestConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    pub fn retry_delay_ms(mut self, delay: u64) -> Self {
        self.retry_delay_ms = Some(delay);
        self
    }

    pub fn duplicate_threshold(mut self, threshold: usize) -> Self {
        self.duplicate_threshold = Some(threshold);
        self
    }

    /// Fill unset fields from `base` instead of the built-in defaults
    pub fn build_on(self, base: IngestConfig) -> IngestConfig {
        IngestConfig {
            base_url: self.base_url.unwrap_or(base.base_url),
            language: self.language.unwrap_or(base.language),
            data_dir: self.data_dir.unwrap_or(base.data_dir),
            user_agent: self.user_agent.unwrap_or(base.user_agent),
            timeout_secs: self.timeout_secs.unwrap_or(base.timeout_secs),
            max_retries: self.max_retries.unwrap_or(base.max_retries),
            retry_delay_ms: self.retry_delay_ms.unwrap_or(base.retry_delay_ms),
            duplicate_threshold: self.duplicate_threshold.unwrap_or(base.duplicate_threshold),
        }
    }

    pub fn build(self) -> IngestConfig {
        self.build_on(IngestConfig::default())
    }
}
