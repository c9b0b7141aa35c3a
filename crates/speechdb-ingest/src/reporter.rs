//! End-of-run reporting of how many speeches were added

use crate::error::{IngestError, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable GitHub Actions points at its step output file
pub const GITHUB_OUTPUT_ENV: &str = "GITHUB_OUTPUT";

/// Key of the line written to the step output file
pub const ADDED_COUNT_KEY: &str = "added_count";

/// Receives the number of records a run committed
pub trait RunReporter: Send + Sync {
    fn report(&self, added: usize) -> Result<()>;
}

/// Appends `added_count=<n>` to a CI step output file
#[derive(Debug, Clone)]
pub struct GithubOutputReporter {
    path: PathBuf,
}

impl GithubOutputReporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reporter for the file named by `GITHUB_OUTPUT`, if the variable is set
    pub fn from_env() -> Option<Self> {
        std::env::var_os(GITHUB_OUTPUT_ENV)
            .filter(|v| !v.is_empty())
            .map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RunReporter for GithubOutputReporter {
    fn report(&self, added: usize) -> Result<()> {
        let to_report_error = |source| IngestError::Report {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(to_report_error)?;
        writeln!(file, "{}={}", ADDED_COUNT_KEY, added).map_err(to_report_error)?;

        info!(path = %self.path.display(), added, "Wrote run output");
        Ok(())
    }
}
