/// Admission filter and asset download
use super::client::SiteClient;
use super::extractor::MetadataExtractor;
use super::AssetMetadata;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use url::Url;

/// Asset stored on disk after a successful fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedAsset {
    pub path: PathBuf,
    pub filename: String,
    pub duration_seconds: u64,
}

/// Why an item page did not produce an asset
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("too short: {duration_seconds}s (must exceed {min_duration}s)")]
    TooShort { duration_seconds: u64, min_duration: u64 },

    #[error("no asset URL on page")]
    MissingAssetUrl,

    #[error("asset URL is not an absolute http(s) URL: {0}")]
    UnsupportedAssetUrl(String),

    #[error("cannot derive a filename from {0}")]
    UnnamedAsset(String),

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("download of {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("cannot write {}: {reason}", .path.display())]
    Io { path: PathBuf, reason: String },

    #[error("file missing or empty after download: {}", .0.display())]
    EmptyFile(PathBuf),
}

/// Result of processing one item page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Accepted(FetchedAsset),
    Rejected(Rejection),
}

/// Apply the admission filter; returns the parsed asset URL when admitted.
///
/// The duration threshold is strict: an item exactly `min_duration` long is
/// rejected.
pub fn admit(metadata: &AssetMetadata, min_duration: u64) -> Result<Url, Rejection> {
    if metadata.duration_seconds <= min_duration {
        return Err(Rejection::TooShort {
            duration_seconds: metadata.duration_seconds,
            min_duration,
        });
    }

    let raw = metadata.asset_url.as_deref().ok_or(Rejection::MissingAssetUrl)?;
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url),
        _ => Err(Rejection::UnsupportedAssetUrl(raw.to_string())),
    }
}

/// File name for an asset: the URL's last path segment, forced to `.mp3`
pub fn asset_filename(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.last()?;
    if segment.is_empty() {
        return None;
    }

    let is_mp3 = Path::new(segment)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("mp3"))
        .unwrap_or(false);

    if is_mp3 {
        Some(segment.to_string())
    } else {
        Some(format!("{}.mp3", segment))
    }
}

/// Downloads admitted assets from item pages
#[derive(Clone)]
pub struct AssetFetcher {
    client: SiteClient,
    extractor: MetadataExtractor,
}

impl AssetFetcher {
    pub fn new(client: SiteClient) -> Self {
        let extractor = MetadataExtractor::new(client.clone());
        Self { client, extractor }
    }

    /// Run one item page through metadata, admission, download and validation
    pub async fn fetch(
        &self,
        page_url: &str,
        output_dir: &Path,
        min_duration: u64,
    ) -> FetchOutcome {
        let metadata = self.extractor.get_metadata(page_url).await;

        let asset_url = match admit(&metadata, min_duration) {
            Ok(url) => url,
            Err(rejection) => return FetchOutcome::Rejected(rejection),
        };

        let Some(filename) = asset_filename(&asset_url) else {
            return FetchOutcome::Rejected(Rejection::UnnamedAsset(asset_url.to_string()));
        };
        let path = output_dir.join(&filename);

        info!("⬇️ Downloading ({}s): {}", metadata.duration_seconds, filename);
        if let Err(rejection) = self.download(asset_url.as_str(), &path).await {
            return FetchOutcome::Rejected(rejection);
        }

        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() && meta.len() > 0 => FetchOutcome::Accepted(FetchedAsset {
                path,
                filename,
                duration_seconds: metadata.duration_seconds,
            }),
            _ => {
                remove_partial(&path).await;
                FetchOutcome::Rejected(Rejection::EmptyFile(path))
            }
        }
    }

    async fn download(&self, url: &str, path: &Path) -> Result<(), Rejection> {
        let mut response = self.client.fetch_asset(url).await.map_err(|e| Rejection::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(Rejection::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let file = fs::File::create(path).await.map_err(|e| Rejection::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let written = write_body(&mut response, file, url, path).await;
        discard_on_error(path, written).await
    }
}

/// Stream the response body into `file`; the file is closed on return
async fn write_body(
    response: &mut reqwest::Response,
    mut file: fs::File,
    url: &str,
    path: &Path,
) -> Result<(), Rejection> {
    let io_error = |e: std::io::Error| Rejection::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => file.write_all(&chunk).await.map_err(io_error)?,
            Ok(None) => break,
            Err(e) => {
                return Err(Rejection::Transport {
                    url: url.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }
    file.flush().await.map_err(io_error)
}

/// Remove a partially written asset when the download did not complete
async fn discard_on_error<T>(path: &Path, result: Result<T, Rejection>) -> Result<T, Rejection> {
    if result.is_err() {
        remove_partial(path).await;
    }
    result
}

async fn remove_partial(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial download {}: {}", path.display(), e),
    }
}
