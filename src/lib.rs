/// Sound-effect harvester
///
/// Discovers item pages on a sound-effect catalog site, downloads clips that
/// pass a duration filter, and records them in a CSV catalog that can be
/// replayed later with [`CatalogIterator`].

pub mod catalog;
pub mod config;
pub mod error;
pub mod harvest;

// Re-export main types for easy access
pub use crate::catalog::{
    CatalogIterator, CatalogRecord, CatalogSource, CatalogWriter, RecordSink,
};
pub use crate::config::{Config, ConfigBuilder, ConfigOverrides};
pub use crate::error::{HarvestError, Result};
pub use crate::harvest::{
    parse_duration, AssetMetadata, FetchOutcome, HarvestSummary, HarvestTargets, Harvester,
    Rejection,
};
