//! speechdb ingest library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Incrementally scrapes the public speech archive into one CSV dataset per language.
//! Each run only fetches what is new: it walks the listing newest-first and stops once it
//! meets a stretch of speeches the dataset already holds.
//!
//! # Modules
//!
//! - [`fetcher`]: document download with bounded, fixed-delay retry
//! - [`extractor`]: listing entries and speech pages to typed values
//! - [`store`]: the append-only CSV dataset
//! - [`pipeline`]: the ingestion controller
//! - [`reporter`]: end-of-run count for CI
//!
//! # Example
//!
//! ```no_run
//! use speechdb_common::Language;
//! use speechdb_ingest::{IngestConfig, IngestPipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = IngestConfig::builder()
//!         .language(Language::English)
//!         .data_dir("./docs")
//!         .build();
//!
//!     let summary = IngestPipeline::from_config(config)?.run().await?;
//!     println!("added {} speeches", summary.added);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod pipeline;
pub mod reporter;
pub mod store;

pub use cli::Cli;
pub use config::IngestConfig;
pub use error::{FetchError, IngestError, Result};
pub use pipeline::{IngestPipeline, RunOutcome, RunSummary};
