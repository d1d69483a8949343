use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui;
use reqwest::Url;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cutout::app::{CutoutApp, Services};
use cutout::config::{PortalConfig, DEFAULT_REMOVAL_DELAY};
use cutout::fs_utils::collect_images;
use cutout::i18n::Locale;
use cutout::image_utils::OutputFormat;
use cutout::services::{OfflineIdentity, PresignedStorage, SimulatedRemoval, StorageService};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Batch background removal with an interactive crop editor"
)]
struct Args {
    /// Image files or directories to load at start-up
    #[arg(value_name = "PATHS")]
    paths: Vec<PathBuf>,

    /// Recurse into subdirectories of the given directories
    #[arg(short = 'r', long = "recursive", default_value_t = false)]
    recursive: bool,

    /// Number of parallel decode threads
    #[arg(short = 'j', long = "parallel", default_value_t = 4)]
    parallel: usize,

    /// Encoding of edited crops
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Png)]
    format: OutputFormat,

    /// Quality of JPEG crops (1-100)
    #[arg(short, long, default_value_t = 90, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Interface language (defaults to the system locale)
    #[arg(long, value_enum)]
    locale: Option<Locale>,

    /// Endpoint that hands out pre-signed upload URLs; uploads are disabled without it
    #[arg(long, value_name = "URL")]
    storage_endpoint: Option<Url>,

    /// Simulated background-removal round-trip in milliseconds
    #[arg(long, default_value_t = DEFAULT_REMOVAL_DELAY.as_millis() as u64)]
    removal_delay_ms: u64,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("cutout={level},warn")));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let initial_files = collect_images(&args.paths, args.recursive)?;
    let config = PortalConfig {
        initial_files,
        parallel: args.parallel.max(1),
        edit_format: args.format,
        quality: args.quality,
        locale: args.locale.unwrap_or_else(Locale::from_env),
    };

    let storage: Option<Arc<dyn StorageService>> = match args.storage_endpoint {
        Some(endpoint) => {
            let storage = PresignedStorage::new(endpoint).context("Unable to set up storage client")?;
            Some(Arc::new(storage))
        }
        None => None,
    };
    let services = Services {
        removal: Arc::new(SimulatedRemoval::new(Duration::from_millis(args.removal_delay_ms))),
        storage,
        identity: Arc::new(OfflineIdentity),
    };
    info!(
        files = config.initial_files.len(),
        locale = ?config.locale,
        uploads = services.storage.is_some(),
        "starting"
    );

    let title = config.locale.messages().title;
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(title)
            .with_inner_size([1200.0, 860.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        title,
        native_options,
        Box::new(move |_cc| Ok(Box::new(CutoutApp::new(config, services)) as Box<dyn eframe::App>)),
    )
    .map_err(|err| anyhow::anyhow!("{err}"))?;

    Ok(())
}
