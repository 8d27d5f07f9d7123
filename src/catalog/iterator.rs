/// Replayable enumeration of harvested asset paths
use crate::error::{HarvestError, Result};
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Extensions picked up when scanning a directory
pub const AUDIO_EXTENSIONS: [&str; 3] = ["mp3", "wav", "ogg"];

/// Where the paths were loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// A catalog CSV written by a harvest run
    File(PathBuf),
    /// A directory scanned recursively for audio files
    Directory(PathBuf),
}

/// Ordered, finite set of asset paths that can be iterated any number of times
#[derive(Debug, Clone)]
pub struct CatalogIterator {
    source: CatalogSource,
    paths: Vec<PathBuf>,
}

impl CatalogIterator {
    /// Open a catalog file or a directory, decided by what `path` points at
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.is_file() {
            Self::from_catalog_file(path)
        } else if path.is_dir() {
            Self::from_directory(path)
        } else {
            Err(HarvestError::InvalidSource(path.to_path_buf()))
        }
    }

    /// Load the first column of every catalog row whose file still exists
    pub fn from_catalog_file(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let mut paths = Vec::new();
        for row in reader.records() {
            let row = row?;
            let Some(asset_path) = row.get(0).filter(|p| !p.is_empty()) else {
                continue;
            };
            let asset_path = PathBuf::from(asset_path);
            // Rows for deleted assets are dropped silently
            if asset_path.exists() {
                paths.push(asset_path);
            }
        }

        info!("📚 Loaded {} paths from catalog {}", paths.len(), path.display());
        Ok(Self {
            source: CatalogSource::File(path.to_path_buf()),
            paths,
        })
    }

    /// Recursively collect audio files under `root` in traversal order
    pub fn from_directory(root: &Path) -> Result<Self> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(root) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };
            if entry.file_type().is_file() && has_audio_extension(entry.path()) {
                paths.push(entry.into_path());
            }
        }

        info!("📂 Found {} audio files in {}", paths.len(), root.display());
        Ok(Self {
            source: CatalogSource::Directory(root.to_path_buf()),
            paths,
        })
    }

    pub fn source(&self) -> &CatalogSource {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Fresh pass starting at the first path
    pub fn iter(&self) -> CatalogPaths<'_> {
        CatalogPaths {
            inner: self.paths.iter(),
        }
    }
}

fn has_audio_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.iter().any(|allowed| ext.eq_ignore_ascii_case(allowed)))
        .unwrap_or(false)
}

/// Borrowing pass over a [`CatalogIterator`]
#[derive(Debug, Clone)]
pub struct CatalogPaths<'a> {
    inner: std::slice::Iter<'a, PathBuf>,
}

impl<'a> Iterator for CatalogPaths<'a> {
    type Item = &'a Path;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(PathBuf::as_path)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for CatalogPaths<'_> {}

impl FusedIterator for CatalogPaths<'_> {}

impl<'a> IntoIterator for &'a CatalogIterator {
    type Item = &'a Path;
    type IntoIter = CatalogPaths<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for CatalogIterator {
    type Item = PathBuf;
    type IntoIter = std::vec::IntoIter<PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.into_iter()
    }
}
