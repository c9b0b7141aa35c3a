//! Incremental ingestion of the speech archive
//!
//! One run walks the listing newest-first, page by page:
//!
//! 1. load the identifiers already in the dataset
//! 2. fetch a listing page; an empty page ends the run
//! 3. triage its entries against the known set, stopping once `duplicate_threshold`
//!    known speeches follow each other
//! 4. fetch the speech pages of all new entries concurrently and wait for all of them
//! 5. buffer the results and continue with the next page
//!
//! The buffer is written once, oldest first, when the run ends. A listing page that cannot be
//! fetched ends the run early but still commits what was buffered. Store failures are fatal.

use crate::config::{listing_page_url, IngestConfig};
use crate::error::{IngestError, Result};
use crate::extractor::{RecordExtractor, Stub};
use crate::fetcher::{DocumentFetcher, DocumentSource, HttpSource};
use crate::reporter::RunReporter;
use crate::store::CsvStore;
use futures::future::join_all;
use speechdb_common::SpeechRecord;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};
use url::Url;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunOutcome {
    /// Reached the end of the archive or caught up with the dataset
    #[default]
    Success,
    /// A listing page could not be fetched; everything buffered before it was committed
    PartialSuccess,
}

/// Counters of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub pages_fetched: u32,
    /// Records committed to the dataset
    pub added: usize,
    /// Listing entries skipped because they were already known
    pub duplicates: usize,
    pub malformed_entries: usize,
    pub failed_enrichments: usize,
}

/// Result of scanning one listing page against the known identifiers
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Triage {
    /// New speeches in listing order
    pub novel: Vec<Stub>,
    pub duplicates: usize,
    /// The duplicate threshold was reached on this page
    pub should_stop: bool,
}

/// Mutable state of a single run
///
/// Only the controller touches it; enrichment futures return values instead of writing here.
#[derive(Debug, Default)]
pub struct RunState {
    known: HashSet<String>,
    consecutive_duplicates: usize,
    buffer: Vec<SpeechRecord>,
}

impl RunState {
    pub fn new(known: HashSet<String>) -> Self {
        Self {
            known,
            ..Self::default()
        }
    }

    pub fn is_known(&self, identifier: &str) -> bool {
        self.known.contains(identifier)
    }

    pub fn consecutive_duplicates(&self) -> usize {
        self.consecutive_duplicates
    }

    /// Split a page's stubs into new and known ones, in listing order.
    ///
    /// The duplicate counter carries over between pages. Any new stub resets it. Once it
    /// reaches `threshold` the remaining stubs of the page are not looked at. New identifiers
    /// become known immediately so a speech listed twice is processed once.
    pub fn triage(&mut self, stubs: Vec<Stub>, threshold: usize) -> Triage {
        let mut triage = Triage::default();

        for stub in stubs {
            if self.known.contains(&stub.identifier) {
                self.consecutive_duplicates += 1;
                triage.duplicates += 1;

                if self.consecutive_duplicates >= threshold {
                    triage.should_stop = true;
                    break;
                }
                continue;
            }

            self.consecutive_duplicates = 0;
            self.known.insert(stub.identifier.clone());
            triage.novel.push(stub);
        }

        triage
    }

    pub fn buffer(&mut self, record: SpeechRecord) {
        self.buffer.push(record);
    }

    pub fn buffered(&self) -> &[SpeechRecord] {
        &self.buffer
    }

    /// Buffered records in the order they are persisted: oldest first
    pub fn into_commit_order(self) -> Vec<SpeechRecord> {
        let mut records = self.buffer;
        records.reverse();
        records
    }
}

/// The ingestion controller
pub struct IngestPipeline<S> {
    config: IngestConfig,
    listing_endpoint: Url,
    fetcher: DocumentFetcher<S>,
    extractor: RecordExtractor,
    store: CsvStore,
    reporters: Vec<Box<dyn RunReporter>>,
}

impl IngestPipeline<HttpSource> {
    /// Pipeline fetching over HTTP with the configured retry policy
    pub fn from_config(config: IngestConfig) -> Result<Self> {
        let fetcher = DocumentFetcher::http(&config)?;
        Self::new(config, fetcher)
    }
}

impl<S: DocumentSource> IngestPipeline<S> {
    pub fn new(config: IngestConfig, fetcher: DocumentFetcher<S>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            listing_endpoint: config.listing_endpoint()?,
            store: CsvStore::new(config.dataset_path()),
            extractor: RecordExtractor::new()?,
            reporters: Vec::new(),
            fetcher,
            config,
        })
    }

    pub fn with_reporter(mut self, reporter: impl RunReporter + 'static) -> Self {
        self.reporters.push(Box::new(reporter));
        self
    }

    pub fn fetcher(&self) -> &DocumentFetcher<S> {
        &self.fetcher
    }

    /// Execute one complete run
    pub async fn run(&self) -> Result<RunSummary> {
        info!(
            language = self.config.language.display_name(),
            dataset = %self.store.path().display(),
            "Scraping speeches"
        );

        let mut state = RunState::new(self.store.load_known_identifiers()?);
        let mut summary = RunSummary::default();
        let mut page = 1u32;

        loop {
            let url = listing_page_url(&self.listing_endpoint, page, self.config.language);
            info!(page, "Fetching listing page");

            let html = match self.fetcher.fetch(url.as_str()).await {
                Ok(html) => html,
                Err(err) => {
                    error!(page, error = %err, "Listing page unavailable, ending run early");
                    summary.outcome = RunOutcome::PartialSuccess;
                    break;
                },
            };
            summary.pages_fetched += 1;

            let entries = self.extractor.extract_stubs(&html, &url);
            if entries.is_empty() {
                info!(page, "No more speeches found, reached the end of the archive");
                break;
            }

            let mut stubs = Vec::with_capacity(entries.len());
            for entry in entries {
                match entry {
                    Ok(stub) => stubs.push(stub),
                    Err(err) => {
                        warn!(page, error = %err, "Skipping malformed listing entry");
                        summary.malformed_entries += 1;
                    },
                }
            }

            let triage = state.triage(stubs, self.config.duplicate_threshold);
            summary.duplicates += triage.duplicates;

            if !triage.novel.is_empty() {
                info!(page, count = triage.novel.len(), "Fetching speech details concurrently");

                let results = join_all(triage.novel.into_iter().map(|stub| self.enrich(stub))).await;
                for result in results {
                    match result {
                        Ok(record) => {
                            debug!(title = %record.title, "Buffered new speech");
                            state.buffer(record);
                        },
                        Err(err) => {
                            warn!(error = %err, "Failed to scrape speech, skipping it for this run");
                            summary.failed_enrichments += 1;
                        },
                    }
                }
            }

            if triage.should_stop {
                info!(
                    consecutive = state.consecutive_duplicates(),
                    "Found consecutive known speeches, dataset is up to date"
                );
                break;
            }

            page += 1;
        }

        summary.added = self.commit(state.into_commit_order())?;
        info!(
            added = summary.added,
            outcome = ?summary.outcome,
            pages = summary.pages_fetched,
            "Total new speeches added: {}",
            summary.added
        );

        // The dataset is already committed at this point
        for reporter in &self.reporters {
            if let Err(err) = reporter.report(summary.added) {
                error!(error = %err, "Failed to report run result");
                return Err(err);
            }
        }

        Ok(summary)
    }

    /// Fetch a stub's speech page and complete it into a record
    async fn enrich(&self, stub: Stub) -> Result<SpeechRecord> {
        let page_url = Url::parse(&stub.identifier).map_err(|e| {
            IngestError::malformed(&stub.identifier, format!("speech URL is invalid: {}", e))
        })?;

        let html = self.fetcher.fetch(page_url.as_str()).await?;
        let detail = self.extractor.extract_detail(&html, &page_url)?;

        Ok(stub.into_record(detail))
    }

    /// Persist records already in commit order; returns how many were written
    fn commit(&self, records: Vec<SpeechRecord>) -> Result<usize> {
        if records.is_empty() {
            info!("No new speeches to write");
            return Ok(0);
        }

        if self.store.exists()? {
            info!(count = records.len(), "Appending new speeches in chronological order");
            self.store.append(&records)?;
        } else {
            info!(count = records.len(), "Dataset does not exist, creating it with a header");
            self.store.create_with_header(&records)?;
        }

        Ok(records.len())
    }
}
