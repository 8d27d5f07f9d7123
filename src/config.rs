use crate::error::{HarvestError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Smallest `max_files` the harvester accepts
pub const MIN_MAX_FILES: usize = 50;

/// Largest `max_files` the harvester accepts
pub const MAX_MAX_FILES: usize = 1000;

/// Configuration for the sound-effect harvester
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Target site layout
    pub site: SiteConfig,

    /// Request timeouts
    pub http: HttpConfig,

    /// Category scanning settings
    pub discovery: DiscoveryConfig,

    /// Download targets and pacing
    pub harvest: HarvestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site root, e.g. `https://mixkit.co`
    pub base_url: String,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Category listing paths, scanned in order
    pub categories: Vec<String>,

    /// Path prefix every item page starts with
    pub item_prefix: String,

    /// Number of `/` characters in an item page path
    pub item_path_depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Timeout for category and item pages (seconds)
    pub page_timeout_seconds: u64,

    /// Timeout for asset downloads (seconds)
    pub asset_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Upper bound on unique item pages collected
    pub max_pages: usize,

    /// Pause after each category fetch (milliseconds)
    pub category_delay_ms: u64,

    /// Log and skip unreachable categories instead of aborting the run
    pub skip_failed_categories: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Directory receiving the assets and the catalog
    pub output_dir: PathBuf,

    /// Accepted-asset count below which a warning is emitted
    pub min_files: usize,

    /// Accepted-asset count at which the run stops
    pub max_files: usize,

    /// Assets must be strictly longer than this (seconds)
    pub min_duration: u64,

    /// Catalog file name inside the output directory
    pub catalog_file: String,

    /// Lower bound of the randomized pause between items (milliseconds)
    pub item_delay_min_ms: u64,

    /// Upper bound of the randomized pause between items (milliseconds)
    pub item_delay_max_ms: u64,
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let config_paths = ["sfx-harvester.toml", "config/sfx-harvester.toml"];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(mut config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        config.apply_env();
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Self::from_env()
    }

    /// Load configuration from an explicit TOML file; environment variables
    /// still take precedence over the file
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut config = Self::parse_file(path)?;
        config.apply_env();
        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)?;
        let config = toml::from_str(&config_str).map_err(|e| {
            HarvestError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        Ok(config)
    }

    /// Override fields from `SFX_HARVESTER_*` environment variables
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    /// Override fields from `SFX_HARVESTER_*` variables supplied by `lookup`
    pub fn apply_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(output_dir) = lookup("SFX_HARVESTER_OUTPUT_DIR") {
            self.harvest.output_dir = PathBuf::from(output_dir);
        }

        if let Some(min_files) = lookup("SFX_HARVESTER_MIN_FILES") {
            self.harvest.min_files =
                parse_var("SFX_HARVESTER_MIN_FILES", &min_files, self.harvest.min_files);
        }

        if let Some(max_files) = lookup("SFX_HARVESTER_MAX_FILES") {
            self.harvest.max_files =
                parse_var("SFX_HARVESTER_MAX_FILES", &max_files, self.harvest.max_files);
        }

        if let Some(min_duration) = lookup("SFX_HARVESTER_MIN_DURATION") {
            self.harvest.min_duration =
                parse_var("SFX_HARVESTER_MIN_DURATION", &min_duration, self.harvest.min_duration);
        }

        if let Some(base_url) = lookup("SFX_HARVESTER_BASE_URL") {
            self.site.base_url = base_url;
        }

        if let Some(user_agent) = lookup("SFX_HARVESTER_USER_AGENT") {
            self.site.user_agent = user_agent;
        }
    }

    /// Apply command-line values on top of file and environment settings
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(dir) = &overrides.output_dir {
            self.harvest.output_dir = dir.clone();
        }
        if let Some(min_files) = overrides.min_files {
            self.harvest.min_files = min_files;
        }
        if let Some(max_files) = overrides.max_files {
            self.harvest.max_files = max_files;
        }
        if let Some(min_duration) = overrides.min_duration {
            self.harvest.min_duration = min_duration;
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)
            .map_err(|e| HarvestError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration before any network activity
    pub fn validate(&self) -> Result<()> {
        validate_targets(self.harvest.min_files, self.harvest.max_files)?;

        match Url::parse(&self.site.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(HarvestError::Config(format!(
                    "base_url must be an absolute http(s) URL, got '{}'",
                    self.site.base_url
                )));
            }
        }

        if self.site.categories.is_empty() {
            return Err(HarvestError::Config("at least one category is required".to_string()));
        }

        if self.discovery.max_pages == 0 {
            return Err(HarvestError::Config(
                "discovery.max_pages must be greater than 0".to_string(),
            ));
        }

        if self.harvest.item_delay_min_ms > self.harvest.item_delay_max_ms {
            return Err(HarvestError::Config(format!(
                "item_delay_min_ms ({}) cannot exceed item_delay_max_ms ({})",
                self.harvest.item_delay_min_ms, self.harvest.item_delay_max_ms
            )));
        }

        if self.harvest.catalog_file.trim().is_empty() {
            return Err(HarvestError::Config("catalog_file cannot be empty".to_string()));
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }

    /// Path of the catalog inside an output directory
    pub fn catalog_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.harvest.catalog_file)
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Harvester Configuration:\n\
            - Site: {}\n\
            - Categories: {}\n\
            - Discovery cap: {}\n\
            - Output Directory: {}\n\
            - Files: {}..={}\n\
            - Minimum duration: >{}s",
            self.site.base_url,
            self.site.categories.len(),
            self.discovery.max_pages,
            self.harvest.output_dir.display(),
            self.harvest.min_files,
            self.harvest.max_files,
            self.harvest.min_duration
        )
    }
}

/// Values given explicitly on the command line; `None` keeps the configured value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub output_dir: Option<PathBuf>,
    pub min_files: Option<usize>,
    pub max_files: Option<usize>,
    pub min_duration: Option<u64>,
}

fn parse_var<T: std::str::FromStr + Copy>(key: &str, value: &str, current: T) -> T {
    match value.trim().parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            tracing::warn!("Ignoring {}: '{}' is not a valid number", key, value);
            current
        }
    }
}

/// Check the requested accepted-asset bounds
pub fn validate_targets(min_files: usize, max_files: usize) -> Result<()> {
    if !(MIN_MAX_FILES..=MAX_MAX_FILES).contains(&max_files) {
        return Err(HarvestError::Config(format!(
            "max_files must be between {} and {}, got {}",
            MIN_MAX_FILES, MAX_MAX_FILES, max_files
        )));
    }

    if min_files > max_files {
        return Err(HarvestError::Config(format!(
            "min_files ({}) cannot be greater than max_files ({})",
            min_files, max_files
        )));
    }

    Ok(())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site: SiteConfig {
                base_url: "https://mixkit.co".to_string(),
                user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36"
                    .to_string(),
                categories: [
                    "/free-sound-effects/",
                    "/free-sound-effects/animals/",
                    "/free-sound-effects/cartoon/",
                    "/free-sound-effects/city/",
                    "/free-sound-effects/nature/",
                    "/free-sound-effects/people/",
                    "/free-sound-effects/science-fiction/",
                    "/free-sound-effects/sports/",
                    "/free-sound-effects/technology/",
                    "/free-sound-effects/transportation/",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
                item_prefix: "/free-sound-effects/".to_string(),
                item_path_depth: 3,
            },
            http: HttpConfig {
                page_timeout_seconds: 10,
                asset_timeout_seconds: 30,
            },
            discovery: DiscoveryConfig {
                max_pages: 100,
                category_delay_ms: 1000,
                skip_failed_categories: false,
            },
            harvest: HarvestConfig {
                output_dir: PathBuf::from("./sounds"),
                min_files: 50,
                max_files: 100,
                min_duration: 10,
                catalog_file: "annotation.csv".to_string(),
                item_delay_min_ms: 1000,
                item_delay_max_ms: 2000,
            },
        }
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.site.base_url = base_url.into();
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.site.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        self.config.harvest.output_dir = dir;
        self
    }

    pub fn with_file_targets(mut self, min_files: usize, max_files: usize) -> Self {
        self.config.harvest.min_files = min_files;
        self.config.harvest.max_files = max_files;
        self
    }

    pub fn with_min_duration(mut self, seconds: u64) -> Self {
        self.config.harvest.min_duration = seconds;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.config.discovery.max_pages = max_pages;
        self
    }

    pub fn skip_failed_categories(mut self, skip: bool) -> Self {
        self.config.discovery.skip_failed_categories = skip;
        self
    }

    /// Disable every etiquette delay; used against local fixtures
    pub fn without_delays(mut self) -> Self {
        self.config.discovery.category_delay_ms = 0;
        self.config.harvest.item_delay_min_ms = 0;
        self.config.harvest.item_delay_max_ms = 0;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
