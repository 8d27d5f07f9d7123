/// Sound-effect harvesting pipeline
///
/// Discovery collects item pages from the category listings, the fetcher runs
/// each page through metadata extraction, the admission filter and the
/// download, and every accepted asset is appended to a [`RecordSink`].

pub mod client;
pub mod discovery;
pub mod duration;
pub mod extractor;
pub mod fetcher;

// Re-export main types
pub use client::SiteClient;
pub use discovery::{collect_item_links, ItemLinkRule, PageDiscovery, PageSet};
pub use duration::parse_duration;
pub use extractor::{extract_metadata, MetadataExtractor};
pub use fetcher::{
    admit, asset_filename, AssetFetcher, FetchOutcome, FetchedAsset, Rejection,
};

use crate::catalog::{CatalogRecord, CatalogWriter, RecordSink};
use crate::config::Config;
use crate::error::Result;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Metadata read from one item page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetMetadata {
    /// Duration in seconds; 0 when unknown
    pub duration_seconds: u64,
    /// Direct download URL, if the page carried one
    pub asset_url: Option<String>,
}

/// Accepted-asset bounds and admission threshold for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestTargets {
    pub min_files: usize,
    pub max_files: usize,
    pub min_duration: u64,
}

impl HarvestTargets {
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_files: config.harvest.min_files,
            max_files: config.harvest.max_files,
            min_duration: config.harvest.min_duration,
        }
    }
}

/// Counters for one pass over a page list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestProgress {
    pub pages_visited: usize,
    pub accepted: usize,
    pub rejected: usize,
}

/// Outcome of a complete harvest run
#[derive(Debug, Clone)]
pub struct HarvestSummary {
    pub catalog_path: PathBuf,
    pub pages_discovered: usize,
    pub progress: HarvestProgress,
    pub targets: HarvestTargets,
    pub elapsed: Duration,
}

impl HarvestSummary {
    pub fn below_minimum(&self) -> bool {
        self.progress.accepted < self.targets.min_files
    }
}

/// Drives discovery and fetching, and writes the catalog
#[derive(Clone)]
pub struct Harvester {
    config: Config,
    discovery: PageDiscovery,
    fetcher: AssetFetcher,
}

impl Harvester {
    pub fn new(config: Config) -> Result<Self> {
        let client = SiteClient::new(&config)?;
        Ok(Self {
            discovery: PageDiscovery::new(client.clone(), &config),
            fetcher: AssetFetcher::new(client),
            config,
        })
    }

    pub fn discovery(&self) -> &PageDiscovery {
        &self.discovery
    }

    /// Harvest into `output_dir` and return the catalog path
    pub async fn run(
        &self,
        output_dir: &Path,
        min_files: usize,
        max_files: usize,
        min_duration: u64,
    ) -> Result<PathBuf> {
        let targets = HarvestTargets {
            min_files,
            max_files,
            min_duration,
        };
        Ok(self.harvest(output_dir, targets).await?.catalog_path)
    }

    /// Full run: discovery, fetching, catalog writing and the completion report
    pub async fn harvest(
        &self,
        output_dir: &Path,
        targets: HarvestTargets,
    ) -> Result<HarvestSummary> {
        let start_time = Instant::now();
        tokio::fs::create_dir_all(output_dir).await?;

        info!("🔍 Searching for sound pages...");
        let pages = self.discovery.discover_pages().await?;
        info!("🎯 Found {} potential sounds", pages.len());

        let mut catalog = CatalogWriter::create(&self.config.catalog_path(output_dir))?;
        let progress = self.harvest_pages(&pages, output_dir, &targets, &mut catalog).await?;
        let catalog_path = catalog.finish()?;

        let summary = HarvestSummary {
            catalog_path,
            pages_discovered: pages.len(),
            progress,
            targets,
            elapsed: start_time.elapsed(),
        };

        info!(
            "🎉 Harvest completed in {:.1}s: {} downloaded, {} rejected, {} of {} pages visited",
            summary.elapsed.as_secs_f64(),
            progress.accepted,
            progress.rejected,
            progress.pages_visited,
            summary.pages_discovered
        );
        if summary.below_minimum() {
            warn!(
                "⚠️ Downloaded fewer files than the requested minimum ({} < {})",
                progress.accepted, targets.min_files
            );
        }

        Ok(summary)
    }

    /// Fetch `pages` in order, appending accepted assets to `sink` until
    /// `max_files` records have been written
    pub async fn harvest_pages<S: RecordSink>(
        &self,
        pages: &[String],
        output_dir: &Path,
        targets: &HarvestTargets,
        sink: &mut S,
    ) -> Result<HarvestProgress> {
        let mut progress = HarvestProgress::default();

        for (i, page_url) in pages.iter().enumerate() {
            if progress.accepted >= targets.max_files {
                break;
            }

            debug!("--- Processing {}/{}: {}", i + 1, pages.len(), page_url);
            progress.pages_visited += 1;

            match self.fetcher.fetch(page_url, output_dir, targets.min_duration).await {
                FetchOutcome::Accepted(asset) => {
                    let record = CatalogRecord::new(
                        &asset.path,
                        output_dir,
                        &asset.filename,
                        asset.duration_seconds,
                    )?;
                    sink.append(&record)?;
                    progress.accepted += 1;
                    info!(
                        "✅ Saved: {} ({}s) [{}/{}]",
                        asset.filename, asset.duration_seconds, progress.accepted, targets.max_files
                    );
                }
                FetchOutcome::Rejected(rejection) => {
                    progress.rejected += 1;
                    warn!("⏭️ Skipped {}: {}", page_url, rejection);
                }
            }

            if progress.accepted >= targets.max_files {
                break;
            }
            self.pause_between_items().await;
        }

        Ok(progress)
    }

    async fn pause_between_items(&self) {
        let min = self.config.harvest.item_delay_min_ms;
        let max = self.config.harvest.item_delay_max_ms.max(min);
        let delay = rand::thread_rng().gen_range(min..=max);
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}
