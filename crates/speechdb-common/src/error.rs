//! Error types shared across speechdb crates

use thiserror::Error;

/// Result type alias for shared speechdb operations
pub type Result<T> = std::result::Result<T, SpeechError>;

/// Errors raised while interpreting shared settings and selectors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpeechError {
    #[error("Invalid language '{0}'. Use 'hi' for Hindi or 'en' for English.")]
    InvalidLanguage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SpeechError {
    pub fn config(msg: impl Into<String>) -> Self {
        SpeechError::Config(msg.into())
    }
}
