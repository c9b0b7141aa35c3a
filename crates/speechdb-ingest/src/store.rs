//! CSV dataset holding all known speeches of one language
//!
//! The file is append-only from the pipeline's point of view: existing rows are never
//! rewritten and the header is written exactly once, when the file is created.

use crate::error::{IngestError, Result};
use speechdb_common::types::{DATASET_COLUMNS, IDENTIFIER_COLUMN};
use speechdb_common::SpeechRecord;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A speech dataset file
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the dataset already has content. A zero-length file does not count.
    pub fn exists(&self) -> Result<bool> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.is_file() && meta.len() > 0),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(IngestError::store_read(&self.path, e)),
        }
    }

    /// Identifiers of every persisted speech; empty when the dataset does not exist yet
    pub fn load_known_identifiers(&self) -> Result<HashSet<String>> {
        if !self.exists()? {
            debug!(path = %self.path.display(), "Dataset not found, starting empty");
            return Ok(HashSet::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| IngestError::store_read(&self.path, e))?;

        let column = reader
            .headers()
            .map_err(|e| IngestError::store_read(&self.path, e))?
            .iter()
            .position(|h| h.trim() == IDENTIFIER_COLUMN)
            .unwrap_or(0);

        let mut known = HashSet::new();
        for row in reader.records() {
            let row = row.map_err(|e| IngestError::store_read(&self.path, e))?;
            if let Some(identifier) = row.get(column).filter(|id| !id.is_empty()) {
                known.insert(identifier.to_string());
            }
        }

        info!(
            path = %self.path.display(),
            count = known.len(),
            "Loaded known speech identifiers"
        );
        Ok(known)
    }

    /// Create the dataset with a header row followed by `records`, in order
    pub fn create_with_header(&self, records: &[SpeechRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| IngestError::store_write(&self.path, e))?;
        }

        let file = File::create(&self.path).map_err(|e| IngestError::store_write(&self.path, e))?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);

        writer
            .write_record(DATASET_COLUMNS)
            .map_err(|e| IngestError::store_write(&self.path, e))?;
        self.write_rows(&mut writer, records)
    }

    /// Append `records` in order after the existing rows, without a header
    pub fn append(&self, records: &[SpeechRecord]) -> Result<()> {
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| IngestError::store_write(&self.path, e))?;

        if !ends_with_newline(&mut file).map_err(|e| IngestError::store_write(&self.path, e))? {
            file.write_all(b"\n")
                .map_err(|e| IngestError::store_write(&self.path, e))?;
        }

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        self.write_rows(&mut writer, records)
    }

    fn write_rows<W: Write>(&self, writer: &mut csv::Writer<W>, records: &[SpeechRecord]) -> Result<()> {
        for record in records {
            writer
                .serialize(record)
                .map_err(|e| IngestError::store_write(&self.path, e))?;
        }
        writer
            .flush()
            .map_err(|e| IngestError::store_write(&self.path, e))?;

        debug!(path = %self.path.display(), rows = records.len(), "Wrote dataset rows");
        Ok(())
    }
}

/// Empty files count as terminated
fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
