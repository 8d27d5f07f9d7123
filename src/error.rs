use std::path::PathBuf;

/// Result type for harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Error types for harvester operations
#[derive(thiserror::Error, Debug)]
pub enum HarvestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to scan category {category}: {reason}")]
    Category { category: String, reason: String },

    #[error("Expected an existing catalog file or directory: {}", .0.display())]
    InvalidSource(PathBuf),
}
