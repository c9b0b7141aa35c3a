//! HTML extraction for listing and speech pages
//!
//! Extraction is pure: it takes a document body plus the URL it was served from and returns
//! typed values. Missing required elements become [`IngestError::MalformedDocument`]; nothing
//! is filled in with placeholder data.

use crate::error::{IngestError, Result};
use scraper::{ElementRef, Html, Selector};
use speechdb_common::SpeechRecord;
use url::Url;

/// One listing entry container
const ENTRY: &str = ".speechesBox";
/// Link carrying the speech URL and its title
const ENTRY_LINK: &str = ".speechesItemLink.left_class a";
/// "Posted by" line holding the date
const ENTRY_DATE: &str = ".pwdBy";
const ENTRY_IMAGE: &str = "img";
const ARTICLE: &str = ".articleBody";
const ARTICLE_VIDEO: &str = "iframe";
const ARTICLE_PARAGRAPH: &str = "p";

/// Listing-page fields of a speech, before enrichment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stub {
    pub identifier: String,
    pub title: String,
    pub date: String,
    pub thumbnail_url: Option<String>,
}

impl Stub {
    /// Complete the stub with the fields read from its speech page
    pub fn into_record(self, detail: SpeechDetail) -> SpeechRecord {
        SpeechRecord {
            identifier: self.identifier,
            title: self.title,
            date: self.date,
            thumbnail_url: self.thumbnail_url,
            video_url: detail.video_url,
            body_text: detail.body_text,
        }
    }
}

/// Fields only available on the speech page itself
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpeechDetail {
    /// Empty when the article embeds no video
    pub video_url: String,
    pub body_text: String,
}

struct Selectors {
    entry: Selector,
    link: Selector,
    date: Selector,
    image: Selector,
    article: Selector,
    video: Selector,
    paragraph: Selector,
}

fn selector(css: &'static str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| IngestError::config(format!("Invalid selector '{}': {}", css, e)))
}

/// Turns archive HTML into [`Stub`]s and [`SpeechDetail`]s
pub struct RecordExtractor {
    selectors: Selectors,
}

impl RecordExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            selectors: Selectors {
                entry: selector(ENTRY)?,
                link: selector(ENTRY_LINK)?,
                date: selector(ENTRY_DATE)?,
                image: selector(ENTRY_IMAGE)?,
                article: selector(ARTICLE)?,
                video: selector(ARTICLE_VIDEO)?,
                paragraph: selector(ARTICLE_PARAGRAPH)?,
            },
        })
    }

    /// Extract every entry of a listing page, newest first as the archive lists them.
    ///
    /// Each entry succeeds or fails on its own. An empty result means the page had no
    /// entries at all, which marks the end of pagination.
    pub fn extract_stubs(&self, html: &str, page_url: &Url) -> Vec<Result<Stub>> {
        let document = Html::parse_document(html);

        document
            .select(&self.selectors.entry)
            .enumerate()
            .map(|(index, entry)| self.extract_stub(entry, index, page_url))
            .collect()
    }

    fn extract_stub(&self, entry: ElementRef<'_>, index: usize, page_url: &Url) -> Result<Stub> {
        let position = index + 1;

        let link = entry.select(&self.selectors.link).next().ok_or_else(|| {
            IngestError::malformed(
                page_url.as_str(),
                format!("entry {} has no speech link ({})", position, ENTRY_LINK),
            )
        })?;

        let href = link.value().attr("href").ok_or_else(|| {
            IngestError::malformed(
                page_url.as_str(),
                format!("entry {} speech link has no href", position),
            )
        })?;

        let identifier = resolve(page_url, href).ok_or_else(|| {
            IngestError::malformed(
                page_url.as_str(),
                format!("entry {} speech link '{}' is not a valid URL", position, href),
            )
        })?;

        let date = entry.select(&self.selectors.date).next().ok_or_else(|| {
            IngestError::malformed(
                page_url.as_str(),
                format!("entry {} has no date ({})", position, ENTRY_DATE),
            )
        })?;

        let thumbnail_url = entry
            .select(&self.selectors.image)
            .next()
            .and_then(|img| img.value().attr("src"))
            .filter(|src| !src.trim().is_empty())
            .and_then(|src| resolve(page_url, src));

        Ok(Stub {
            identifier,
            title: text_of(link),
            date: text_of(date),
            thumbnail_url,
        })
    }

    /// Extract the video link and body text of a speech page
    pub fn extract_detail(&self, html: &str, page_url: &Url) -> Result<SpeechDetail> {
        let document = Html::parse_document(html);

        let article = document
            .select(&self.selectors.article)
            .next()
            .ok_or_else(|| {
                IngestError::malformed(page_url.as_str(), format!("no article body ({})", ARTICLE))
            })?;

        let video_url = article
            .select(&self.selectors.video)
            .next()
            .and_then(|frame| frame.value().attr("src"))
            .and_then(|src| resolve(page_url, src))
            .unwrap_or_default();

        let body_text = article
            .select(&self.selectors.paragraph)
            .map(text_of)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(SpeechDetail {
            video_url,
            body_text,
        })
    }
}

/// Concatenated text content, trimmed
fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Resolve an attribute value against the page it appeared on, like a browser would
fn resolve(base: &Url, reference: &str) -> Option<String> {
    base.join(reference.trim()).ok().map(String::from)
}
