//! speechdb-ingest - incremental speech archive scraper

use anyhow::Result;
use clap::Parser;
use speechdb_common::logging::{init_logging, LogConfig, LogLevel};
use speechdb_ingest::{Cli, IngestConfig, IngestPipeline, RunOutcome};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over the flag
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("speechdb-ingest")
        .filter_directives("html5ever=warn,selectors=warn")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    let config = cli.apply(IngestConfig::from_env()?);
    let mut pipeline = IngestPipeline::from_config(config)?;

    if let Some(reporter) = cli.github_reporter() {
        pipeline = pipeline.with_reporter(reporter);
    }

    let summary = pipeline.run().await?;

    if summary.outcome == RunOutcome::PartialSuccess {
        warn!(
            pages = summary.pages_fetched,
            "Run ended early on a fetch error; buffered speeches were saved"
        );
    }

    info!(
        added = summary.added,
        duplicates = summary.duplicates,
        malformed = summary.malformed_entries,
        failed = summary.failed_enrichments,
        "Ingestion complete"
    );
    Ok(())
}
