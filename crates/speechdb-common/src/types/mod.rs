//! Common types used across speechdb

use serde::{Deserialize, Serialize};

use crate::error::SpeechError;

/// On-disk column order of a speech dataset.
///
/// The names are the ones the browsing front-end reads, so they must not change even
/// though the Rust field names are more descriptive.
pub const DATASET_COLUMNS: [&str; 6] = ["href", "title", "date", "img", "youtubeURL", "speechText"];

/// Header of the unique key column
pub const IDENTIFIER_COLUMN: &str = DATASET_COLUMNS[0];

/// Language edition of the speech archive.
///
/// Each language is paginated independently upstream and persisted to its own dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "hi")]
    Hindi,
    #[serde(rename = "en")]
    English,
}

impl Language {
    /// All supported languages, in the order they are usually scraped
    pub const ALL: [Language; 2] = [Language::Hindi, Language::English];

    /// Selector value used in the listing query string
    pub fn code(self) -> &'static str {
        match self {
            Language::Hindi => "hi",
            Language::English => "en",
        }
    }

    /// Human readable name for log lines
    pub fn display_name(self) -> &'static str {
        match self {
            Language::Hindi => "Hindi",
            Language::English => "English",
        }
    }

    /// File name of the dataset holding this language's speeches (e.g. `data_hi.csv`)
    pub fn dataset_file_name(self) -> String {
        format!("data_{}.csv", self.code())
    }
}

impl std::str::FromStr for Language {
    type Err = SpeechError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "hi" => Ok(Language::Hindi),
            "en" => Ok(Language::English),
            other => Err(SpeechError::InvalidLanguage(other.to_string())),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// One speech as persisted in a dataset row.
///
/// Field order is the column order; serde renames map each field onto
/// [`DATASET_COLUMNS`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechRecord {
    /// Canonical source URL, unique across the dataset
    #[serde(rename = "href")]
    pub identifier: String,

    pub title: String,

    /// Date exactly as the archive prints it
    pub date: String,

    #[serde(rename = "img")]
    pub thumbnail_url: Option<String>,

    /// Embedded video source, empty when the speech page has none
    #[serde(rename = "youtubeURL")]
    pub video_url: String,

    #[serde(rename = "speechText")]
    pub body_text: String,
}
