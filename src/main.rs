use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, Command};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use sfx_harvester::{CatalogIterator, Config, ConfigOverrides, HarvestTargets, Harvester};

/// Number of catalog entries echoed after a run
const PREVIEW_COUNT: usize = 5;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("Sound Effect Harvester")
        .version("0.1.0")
        .author("TigreRoll")
        .about("Download sound effects longer than a minimum duration and catalog them")
        .arg(
            Arg::new("download-folder")
                .short('d')
                .long("download-folder")
                .value_name("DIR")
                .help("Folder receiving the audio files and annotation.csv [default: ./sounds]")
                .value_parser(value_parser!(PathBuf))
        )
        .arg(
            Arg::new("min-files")
                .long("min-files")
                .value_name("NUM")
                .help("Minimum number of files; fewer only triggers a warning [default: 50]")
                .value_parser(value_parser!(usize))
        )
        .arg(
            Arg::new("max-files")
                .long("max-files")
                .value_name("NUM")
                .help("Maximum number of files, 50 to 1000 [default: 100]")
                .value_parser(value_parser!(usize))
        )
        .arg(
            Arg::new("min-duration")
                .long("min-duration")
                .value_name("SECONDS")
                .help("Only keep sounds strictly longer than this [default: 10]")
                .value_parser(value_parser!(u64))
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("TOML configuration file")
                .value_parser(value_parser!(PathBuf))
        )
        .arg(
            Arg::new("iterate")
                .long("iterate")
                .value_name("PATH")
                .help("Only list the files of an existing catalog or directory")
                .value_parser(value_parser!(PathBuf))
                .conflicts_with("download-folder")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(ArgAction::SetTrue)
        )
        .get_matches();

    let default_filter = if matches.get_flag("verbose") {
        "sfx_harvester=debug,warn"
    } else {
        "sfx_harvester=info,warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    if let Some(source) = matches.get_one::<PathBuf>("iterate") {
        return preview_catalog(source);
    }

    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => Config::from_file(path)?,
        None => Config::load().unwrap_or_else(|e| {
            warn!("Failed to load config, using defaults: {}", e);
            Config::default()
        }),
    };

    // Flags win over the config file and SFX_HARVESTER_* variables
    config.apply_overrides(&ConfigOverrides {
        output_dir: matches.get_one::<PathBuf>("download-folder").cloned(),
        min_files: matches.get_one::<usize>("min-files").copied(),
        max_files: matches.get_one::<usize>("max-files").copied(),
        min_duration: matches.get_one::<u64>("min-duration").copied(),
    });

    if let Err(e) = config.validate() {
        error!("{}", e);
        return Err(e.into());
    }

    info!("🚀 Sound Effect Harvester starting...");
    info!("{}", config.summary());

    let output_dir = config.harvest.output_dir.clone();
    let targets = HarvestTargets::from_config(&config);
    let harvester = Harvester::new(config)?;
    let summary = harvester.harvest(&output_dir, targets).await?;

    info!("📝 Catalog written to {}", summary.catalog_path.display());
    preview_catalog(&summary.catalog_path)
}

/// Log the size and first entries of a catalog or audio directory
fn preview_catalog(source: &Path) -> Result<()> {
    let catalog = CatalogIterator::open(source)?;
    info!("📚 Files available for iteration: {}", catalog.len());

    for (i, path) in catalog.iter().take(PREVIEW_COUNT).enumerate() {
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        info!("{}: {}", i + 1, name);
    }
    if catalog.len() > PREVIEW_COUNT {
        info!("...");
    }

    Ok(())
}
