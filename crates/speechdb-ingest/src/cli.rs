//! Command line interface of `speechdb-ingest`

use crate::config::IngestConfig;
use crate::reporter::GithubOutputReporter;
use clap::Parser;
use speechdb_common::Language;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "speechdb-ingest")]
#[command(author, version, about = "Incrementally scrape the speech archive into CSV datasets")]
pub struct Cli {
    /// Archive language to scrape: 'hi' (Hindi) or 'en' (English)
    #[arg(default_value = "hi")]
    pub language: Language,

    /// Directory holding the data_<lang>.csv datasets
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Archive base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Additional attempts for a failed request
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Pause between attempts, in milliseconds
    #[arg(long)]
    pub retry_delay_ms: Option<u64>,

    /// Stop after this many consecutive already-known speeches
    #[arg(long)]
    pub duplicate_threshold: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// File receiving an `added_count=<n>` line when the run finishes.
    /// Falls back to a non-empty `GITHUB_OUTPUT`.
    #[arg(long)]
    pub github_output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Overlay the flags that were given on top of `base`
    pub fn apply(&self, base: IngestConfig) -> IngestConfig {
        let mut builder = IngestConfig::builder().language(self.language);

        if let Some(dir) = &self.data_dir {
            builder = builder.data_dir(dir.clone());
        }
        if let Some(url) = &self.base_url {
            builder = builder.base_url(url.clone());
        }
        if let Some(retries) = self.max_retries {
            builder = builder.max_retries(retries);
        }
        if let Some(delay) = self.retry_delay_ms {
            builder = builder.retry_delay_ms(delay);
        }
        if let Some(threshold) = self.duplicate_threshold {
            builder = builder.duplicate_threshold(threshold);
        }
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout_secs(secs);
        }

        builder.build_on(base)
    }

    /// Step output reporter from `--github-output`, else from the environment
    pub fn github_reporter(&self) -> Option<GithubOutputReporter> {
        match &self.github_output {
            Some(path) => Some(GithubOutputReporter::new(path)),
            None => GithubOutputReporter::from_env(),
        }
    }
}
