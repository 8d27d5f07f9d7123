/// Persisted catalog of harvested assets
///
/// A catalog is a CSV file with one header row followed by one row per
/// retrieved asset. It is written once per harvest run and read back later by
/// [`CatalogIterator`].

pub mod iterator;

pub use iterator::{CatalogIterator, CatalogPaths, CatalogSource, AUDIO_EXTENSIONS};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Header row written at the top of every catalog
pub const CATALOG_HEADER: [&str; 4] =
    ["absolute_path", "relative_path", "filename", "duration_seconds"];

/// One retrieved asset
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogRecord {
    /// Absolute location of the asset on disk
    pub absolute_path: String,
    /// Location relative to the catalog root, or the bare filename
    pub relative_path: String,
    /// File name as stored on disk
    pub filename: String,
    /// Duration read from the item page
    pub duration_seconds: u64,
}

impl CatalogRecord {
    /// Build a record for an asset stored under `root`
    pub fn new(
        asset_path: &Path,
        root: &Path,
        filename: &str,
        duration_seconds: u64,
    ) -> Result<Self> {
        let absolute = std::path::absolute(asset_path)?;
        let absolute_root = std::path::absolute(root)?;

        let relative = match absolute.strip_prefix(&absolute_root) {
            Ok(relative) if !relative.as_os_str().is_empty() => relative.to_path_buf(),
            _ => PathBuf::from(filename),
        };

        Ok(Self {
            absolute_path: absolute.to_string_lossy().into_owned(),
            relative_path: relative.to_string_lossy().into_owned(),
            filename: filename.to_string(),
            duration_seconds,
        })
    }
}

/// Destination for accepted records during a harvest run
pub trait RecordSink {
    /// Persist one accepted record
    fn append(&mut self, record: &CatalogRecord) -> Result<()>;
}

impl RecordSink for Vec<CatalogRecord> {
    fn append(&mut self, record: &CatalogRecord) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// CSV-backed record sink; truncates any existing catalog on creation
pub struct CatalogWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows: usize,
}

impl CatalogWriter {
    /// Create the catalog file and write the header row
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record(CATALOG_HEADER)?;
        writer.flush()?;

        debug!("📝 Created catalog: {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            writer,
            rows: 0,
        })
    }

    /// Number of data rows written so far
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush buffered rows and return the catalog location
    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer.flush()?;
        Ok(self.path)
    }
}

impl RecordSink for CatalogWriter {
    fn append(&mut self, record: &CatalogRecord) -> Result<()> {
        self.writer.serialize(record)?;
        // Each row is flushed so a crash never loses accepted assets
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }
}

/// Read every row of a catalog file
pub fn read_records(path: &Path) -> Result<Vec<CatalogRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}
