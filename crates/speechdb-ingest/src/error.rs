//! Error types for speech ingestion

use speechdb_common::SpeechError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Failure of a single fetch attempt
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered HTTP {status}")]
    Status { status: u16 },
}

/// Errors surfaced by the ingestion pipeline
///
/// The controller decides per variant whether a failure ends the run, skips one item,
/// or is fatal; see `pipeline` for the policy.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Every attempt allowed by the retry policy failed
    #[error("Failed to fetch {url} after {attempts} attempt(s): {source}")]
    Fetch {
        url: String,
        attempts: u32,
        #[source]
        source: FetchError,
    },

    /// A required element is missing from a fetched document
    #[error("Malformed document {url}: {detail}")]
    MalformedDocument { url: String, detail: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read dataset {path}: {source}")]
    StoreRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write dataset {path}: {source}")]
    StoreWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write run report to {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IngestError {
    pub fn config(msg: impl Into<String>) -> Self {
        IngestError::Config(msg.into())
    }

    pub fn malformed(url: &str, detail: impl Into<String>) -> Self {
        IngestError::MalformedDocument {
            url: url.to_string(),
            detail: detail.into(),
        }
    }

    pub(crate) fn store_read(path: impl Into<PathBuf>, source: impl Into<csv::Error>) -> Self {
        IngestError::StoreRead {
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn store_write(path: impl Into<PathBuf>, source: impl Into<csv::Error>) -> Self {
        IngestError::StoreWrite {
            path: path.into(),
            source: source.into(),
        }
    }
}

impl From<SpeechError> for IngestError {
    fn from(err: SpeechError) -> Self {
        match err {
            SpeechError::InvalidLanguage(_) => IngestError::InvalidArgument(err.to_string()),
            SpeechError::Config(msg) => IngestError::Config(msg),
        }
    }
}
