//! Shared fixtures for ingestion integration tests
//!
//! [`FakeArchive`] stands in for the speech website: listing pages are keyed by their `page`
//! query parameter, speech pages by full URL. Unknown listing pages are served empty, which
//! ends pagination; unknown speech pages answer 404.

#![allow(dead_code)]

use async_trait::async_trait;
use speechdb_common::Language;
use speechdb_ingest::config::LISTING_PATH;
use speechdb_ingest::fetcher::{DocumentFetcher, DocumentSource, RetryPolicy};
use speechdb_ingest::{FetchError, IngestConfig, IngestPipeline};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, Once};
use tokio::sync::Barrier;
use url::Url;

pub const BASE_URL: &str = "https://archive.test";

const EMPTY_LISTING: &str = "<html><body><div class=\"speechesList\"></div></body></html>";

/// Absolute URL of speech `id` as the extractor resolves it
pub fn speech_url(id: &str) -> String {
    format!("{}/speech/{}", BASE_URL, id)
}

/// One well-formed listing entry with a relative link
pub fn listing_entry(id: &str) -> String {
    format!(
        r#"<div class="speechesBox">
  <img src="/images/{id}.jpg">
  <div class="speechesItemLink left_class"><a href="/speech/{id}">Speech {id}</a></div>
  <div class="pwdBy">Posted On: 1 Jan, 2025</div>
</div>"#
    )
}

pub fn listing_page(ids: &[&str]) -> String {
    let entries: String = ids.iter().map(|id| listing_entry(id)).collect();
    format!("<html><body><div class=\"speechesList\">{}</div></body></html>", entries)
}

pub fn speech_page(id: &str) -> String {
    format!(
        r#"<html><body><div class="articleBody">
  <iframe src="https://www.youtube.com/embed/{id}"></iframe>
  <p>Opening of {id}.</p>
  <p>Closing of {id}.</p>
</div></body></html>"#
    )
}

/// What the archive saw, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Requested(String),
    Served(String),
}

/// Speech pages that only answer once all of them are being fetched at the same time
struct Gate {
    barrier: Barrier,
    urls: HashSet<String>,
}

#[derive(Default)]
pub struct FakeArchive {
    listings: HashMap<u32, String>,
    speeches: HashMap<String, String>,
    failing_pages: HashSet<u32>,
    gate: Option<Arc<Gate>>,
    events: Mutex<Vec<Event>>,
}

impl FakeArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listing page `page` with entries for `ids`, each with a working speech page
    pub fn with_page(mut self, page: u32, ids: &[&str]) -> Self {
        for id in ids {
            self.speeches.insert(speech_url(id), speech_page(id));
        }
        self.listings.insert(page, listing_page(ids));
        self
    }

    pub fn with_raw_page(mut self, page: u32, html: impl Into<String>) -> Self {
        self.listings.insert(page, html.into());
        self
    }

    pub fn with_speech(mut self, id: &str) -> Self {
        self.speeches.insert(speech_url(id), speech_page(id));
        self
    }

    /// Make speech `id` answer 404
    pub fn without_speech(mut self, id: &str) -> Self {
        self.speeches.remove(&speech_url(id));
        self
    }

    /// Listing page `page` answers 503 on every attempt
    pub fn with_failing_page(mut self, page: u32) -> Self {
        self.failing_pages.insert(page);
        self
    }

    /// Listing page `page` whose speech pages block until all of them are requested together
    pub fn with_gated_page(mut self, page: u32, ids: &[&str]) -> Self {
        self = self.with_page(page, ids);
        self.gate = Some(Arc::new(Gate {
            barrier: Barrier::new(ids.len()),
            urls: ids.iter().map(|id| speech_url(id)).collect(),
        }));
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn requests(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Requested(url) => Some(url),
                Event::Served(_) => None,
            })
            .collect()
    }

    /// Number of requests made for listing page `page`
    pub fn listing_requests(&self, page: u32) -> usize {
        self.requests()
            .iter()
            .filter(|url| listing_page_number(url) == Some(page))
            .count()
    }
}

fn listing_page_number(raw: &str) -> Option<u32> {
    let url = Url::parse(raw).ok()?;
    if url.path() != LISTING_PATH {
        return None;
    }
    url.query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse().ok())
}

#[async_trait]
impl DocumentSource for FakeArchive {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        self.events.lock().unwrap().push(Event::Requested(url.to_string()));

        if let Some(gate) = self.gate.as_ref().filter(|g| g.urls.contains(url)) {
            gate.barrier.wait().await;
        }
        let response = self.respond(url);
        self.events.lock().unwrap().push(Event::Served(url.to_string()));
        response
    }
}

impl FakeArchive {
    fn respond(&self, url: &str) -> Result<String, FetchError> {
        if let Some(page) = listing_page_number(url) {
            if self.failing_pages.contains(&page) {
                return Err(FetchError::Status { status: 503 });
            }
            return Ok(self
                .listings
                .get(&page)
                .cloned()
                .unwrap_or_else(|| EMPTY_LISTING.to_string()));
        }

        self.speeches
            .get(url)
            .cloned()
            .ok_or(FetchError::Status { status: 404 })
    }
}

pub fn test_config(data_dir: &Path, threshold: usize) -> IngestConfig {
    IngestConfig::builder()
        .base_url(BASE_URL)
        .language(Language::Hindi)
        .data_dir(data_dir)
        .max_retries(1)
        .retry_delay_ms(0)
        .duplicate_threshold(threshold)
        .build()
}

/// Route pipeline logs through the test harness; shown for failing tests only
pub fn init_test_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("speechdb_ingest=debug")
            .with_test_writer()
            .try_init();
    });
}

pub fn pipeline(archive: FakeArchive, config: IngestConfig) -> IngestPipeline<FakeArchive> {
    init_test_logging();
    let fetcher = DocumentFetcher::new(archive, RetryPolicy::immediate(config.max_retries));
    IngestPipeline::new(config, fetcher).unwrap()
}

/// Identifiers of the dataset, in file order
pub fn stored_ids(path: &Path) -> Vec<String> {
    csv::Reader::from_path(path)
        .unwrap()
        .deserialize::<speechdb_common::SpeechRecord>()
        .map(|r| r.unwrap().identifier)
        .collect()
}

pub fn ids(names: &[&str]) -> Vec<String> {
    names.iter().map(|id| speech_url(id)).collect()
}
