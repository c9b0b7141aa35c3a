//! Integration tests for incremental ingestion runs
//!
//! Every test drives a full [`IngestPipeline`] run against an in-memory archive and
//! inspects the resulting CSV dataset.

mod common;

use common::*;
use speechdb_common::SpeechRecord;
use speechdb_ingest::reporter::GithubOutputReporter;
use speechdb_ingest::store::CsvStore;
use speechdb_ingest::{IngestError, RunOutcome};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

fn seed_store(path: &std::path::Path, names: &[&str]) {
    let records: Vec<SpeechRecord> = names
        .iter()
        .map(|id| SpeechRecord {
            identifier: speech_url(id),
            title: format!("Speech {}", id),
            date: "1 Jan, 2024".to_string(),
            thumbnail_url: None,
            video_url: String::new(),
            body_text: "Earlier run".to_string(),
        })
        .collect();
    CsvStore::new(path).create_with_header(&records).unwrap();
}

#[tokio::test]
async fn test_first_run_creates_dataset_oldest_first() {
    let dir = TempDir::new().unwrap();
    let archive = FakeArchive::new()
        .with_page(1, &["e", "d", "c"])
        .with_page(2, &["b", "a"]);

    let pipeline = pipeline(archive, test_config(dir.path(), 10));
    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.outcome, RunOutcome::Success);
    assert_eq!(summary.added, 5);
    // Page 3 is empty and ends the run
    assert_eq!(summary.pages_fetched, 3);

    let dataset = dir.path().join("data_hi.csv");
    assert_eq!(stored_ids(&dataset), ids(&["a", "b", "c", "d", "e"]));

    let content = fs::read_to_string(&dataset).unwrap();
    assert!(content.starts_with("href,title,date,img,youtubeURL,speechText\n"));

    let rows: Vec<SpeechRecord> = csv::Reader::from_path(&dataset)
        .unwrap()
        .deserialize()
        .map(|r| r.unwrap())
        .collect();
    let a = &rows[0];
    assert_eq!(a.title, "Speech a");
    assert_eq!(a.date, "Posted On: 1 Jan, 2025");
    assert_eq!(a.thumbnail_url.as_deref(), Some("https://archive.test/images/a.jpg"));
    assert_eq!(a.video_url, "https://www.youtube.com/embed/a");
    assert_eq!(a.body_text, "Opening of a. Closing of a.");
}

#[tokio::test]
async fn test_second_run_adds_nothing() {
    let dir = TempDir::new().unwrap();
    let build = || FakeArchive::new().with_page(1, &["c", "b", "a"]);

    pipeline(build(), test_config(dir.path(), 3)).run().await.unwrap();
    let dataset = dir.path().join("data_hi.csv");
    let before = fs::read(&dataset).unwrap();

    let second = pipeline(build(), test_config(dir.path(), 3));
    let summary = second.run().await.unwrap();

    assert_eq!(summary.added, 0);
    assert_eq!(summary.duplicates, 3);
    assert_eq!(fs::read(&dataset).unwrap(), before);
    // Caught up on page 1, page 2 is never requested
    assert_eq!(second.fetcher().source().listing_requests(2), 0);
}

#[tokio::test]
async fn test_stops_after_consecutive_known_speeches() {
    let dir = TempDir::new().unwrap();
    let dataset = dir.path().join("data_hi.csv");
    seed_store(&dataset, &["a", "b", "c"]);

    let archive = FakeArchive::new()
        .with_page(1, &["d", "c", "b", "a"])
        .with_page(2, &["older"]);
    let pipeline = pipeline(archive, test_config(dir.path(), 3));

    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.added, 1);
    assert_eq!(summary.pages_fetched, 1);
    assert_eq!(pipeline.fetcher().source().listing_requests(2), 0);
    assert_eq!(stored_ids(&dataset), ids(&["a", "b", "c", "d"]));

    // Existing rows untouched, header written once
    let content = fs::read_to_string(&dataset).unwrap();
    assert_eq!(content.matches("href,title").count(), 1);
    assert_eq!(content.matches("Earlier run").count(), 3);
}

#[tokio::test]
async fn test_new_speech_resets_duplicate_run() {
    let dir = TempDir::new().unwrap();
    let dataset = dir.path().join("data_hi.csv");
    seed_store(&dataset, &["a", "b", "c"]);

    // Two known, one new, one known: never three known in a row
    let archive = FakeArchive::new()
        .with_page(1, &["b", "c", "x", "a"])
        .with_page(2, &["y"]);
    let pipeline = pipeline(archive, test_config(dir.path(), 3));

    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.added, 2);
    assert_eq!(pipeline.fetcher().source().listing_requests(2), 1);
    assert_eq!(pipeline.fetcher().source().listing_requests(3), 1);
    // "y" was discovered after "x", so it is older and written first
    assert_eq!(stored_ids(&dataset), ids(&["a", "b", "c", "y", "x"]));
}

#[tokio::test]
async fn test_listing_failure_commits_buffered_speeches() {
    let dir = TempDir::new().unwrap();
    let archive = FakeArchive::new()
        .with_page(1, &["e", "d", "c", "b", "a"])
        .with_failing_page(2);
    let pipeline = pipeline(archive, test_config(dir.path(), 10));

    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.outcome, RunOutcome::PartialSuccess);
    assert_eq!(summary.added, 5);
    assert_eq!(summary.pages_fetched, 1);
    // First attempt plus one retry
    assert_eq!(pipeline.fetcher().source().listing_requests(2), 2);
    assert_eq!(
        stored_ids(&dir.path().join("data_hi.csv")),
        ids(&["a", "b", "c", "d", "e"])
    );
}

#[tokio::test]
async fn test_failed_speech_page_is_skipped_and_retried_next_run() {
    let dir = TempDir::new().unwrap();
    let dataset = dir.path().join("data_hi.csv");

    let broken = FakeArchive::new()
        .with_page(1, &["c", "b", "a"])
        .without_speech("b");
    let first = pipeline(broken, test_config(dir.path(), 10));
    let summary = first.run().await.unwrap();

    assert_eq!(summary.outcome, RunOutcome::Success);
    assert_eq!(summary.added, 2);
    assert_eq!(summary.failed_enrichments, 1);
    assert_eq!(stored_ids(&dataset), ids(&["a", "c"]));

    let fixed = FakeArchive::new().with_page(1, &["c", "b", "a"]);
    let summary = pipeline(fixed, test_config(dir.path(), 10)).run().await.unwrap();

    assert_eq!(summary.added, 1);
    assert_eq!(stored_ids(&dataset), ids(&["a", "c", "b"]));
}

#[tokio::test]
async fn test_malformed_entry_does_not_affect_siblings() {
    let dir = TempDir::new().unwrap();
    let html = format!(
        "<html><body>{}<div class=\"speechesBox\"><div class=\"pwdBy\">no link</div></div>{}</body></html>",
        listing_entry("b"),
        listing_entry("a")
    );
    let archive = FakeArchive::new()
        .with_raw_page(1, html)
        .with_speech("a")
        .with_speech("b");

    let summary = pipeline(archive, test_config(dir.path(), 10)).run().await.unwrap();

    assert_eq!(summary.added, 2);
    assert_eq!(summary.malformed_entries, 1);
    assert_eq!(stored_ids(&dir.path().join("data_hi.csv")), ids(&["a", "b"]));
}

#[tokio::test]
async fn test_speech_listed_twice_is_stored_once() {
    let dir = TempDir::new().unwrap();
    let archive = FakeArchive::new()
        .with_page(1, &["b", "a"])
        .with_page(2, &["a", "z"]);

    let summary = pipeline(archive, test_config(dir.path(), 10)).run().await.unwrap();

    assert_eq!(summary.added, 3);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(stored_ids(&dir.path().join("data_hi.csv")), ids(&["z", "a", "b"]));
}

#[tokio::test]
async fn test_store_write_failure_is_fatal() {
    let dir = TempDir::new().unwrap();
    // A directory where the dataset file should be
    fs::create_dir(dir.path().join("data_hi.csv")).unwrap();

    let archive = FakeArchive::new().with_page(1, &["a"]);
    let err = pipeline(archive, test_config(dir.path(), 10))
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::StoreWrite { .. }), "{err}");
}

#[tokio::test]
async fn test_reporter_receives_added_count() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("github_output");

    let archive = FakeArchive::new().with_page(1, &["b", "a"]);
    let pipeline = pipeline(archive, test_config(dir.path(), 10))
        .with_reporter(GithubOutputReporter::new(&output));
    pipeline.run().await.unwrap();

    assert_eq!(fs::read_to_string(&output).unwrap(), "added_count=2\n");
}

#[tokio::test]
async fn test_nothing_new_reports_zero_without_creating_dataset() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("github_output");

    let pipeline = pipeline(FakeArchive::new(), test_config(dir.path(), 10))
        .with_reporter(GithubOutputReporter::new(&output));
    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.added, 0);
    assert!(!dir.path().join("data_hi.csv").exists());
    assert_eq!(fs::read_to_string(&output).unwrap(), "added_count=0\n");
}

#[tokio::test]
async fn test_listing_requests_carry_language() {
    let dir = TempDir::new().unwrap();
    let config = speechdb_ingest::IngestConfig {
        language: speechdb_common::Language::English,
        ..test_config(dir.path(), 10)
    };

    let pipeline = pipeline(FakeArchive::new(), config);
    pipeline.run().await.unwrap();

    assert_eq!(
        pipeline.fetcher().source().requests(),
        vec!["https://archive.test/speech/loadspeeche?page=1&language=en".to_string()]
    );
}

#[tokio::test]
async fn test_speech_pages_of_a_page_are_fetched_together() {
    let dir = TempDir::new().unwrap();
    let archive = FakeArchive::new()
        .with_gated_page(1, &["d", "c", "b", "a"])
        .with_page(2, &["older"]);
    let pipeline = pipeline(archive, test_config(dir.path(), 10));

    // Each gated speech page waits until all four are in flight at once
    let summary = tokio::time::timeout(Duration::from_secs(10), pipeline.run())
        .await
        .expect("speech pages of one listing page were not fetched concurrently")
        .unwrap();
    assert_eq!(summary.added, 5);

    let events = pipeline.fetcher().source().events();
    let position = |wanted: &Event| events.iter().position(|e| e == wanted).unwrap();

    let next_page = position(&Event::Requested(
        "https://archive.test/speech/loadspeeche?page=2&language=hi".to_string(),
    ));
    for id in ["a", "b", "c", "d"] {
        assert!(position(&Event::Served(speech_url(id))) < next_page, "{id} served late");
    }
}
