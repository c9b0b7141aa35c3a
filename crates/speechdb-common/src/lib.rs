//! speechdb common library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, error handling and logging for the speechdb workspace.
//!
//! # Overview
//!
//! - **Types**: the archive [`Language`](types::Language) selector and the persisted
//!   [`SpeechRecord`](types::SpeechRecord) row
//! - **Error Handling**: [`SpeechError`] and the [`Result`] alias
//! - **Logging**: `tracing` subscriber setup shared by every binary
//!
//! # Example
//!
//! ```no_run
//! use speechdb_common::types::Language;
//!
//! fn main() -> speechdb_common::Result<()> {
//!     let language: Language = "en".parse()?;
//!     println!("{}", language.dataset_file_name());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{Result, SpeechError};
pub use types::{Language, SpeechRecord};
