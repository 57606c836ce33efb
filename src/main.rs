use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use netlens::app::ExplorerApp;
use netlens::config::ExplorerConfig;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Directory holding one sub-directory per dataset.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
    /// Dataset to open first; defaults to the first one listed.
    #[arg(long)]
    dataset: Option<String>,
    /// JSON file with layout and viewport tunables.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for the initial layout positions.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ExplorerConfig::load(path)?,
        None => ExplorerConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.layout.seed = Some(seed);
    }
    log::info!("reading datasets from {}", args.data_dir.display());

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "netlens",
        options,
        Box::new(move |cc| {
            Ok(Box::new(ExplorerApp::new(
                cc,
                args.data_dir.clone(),
                args.dataset.clone(),
                config.clone(),
            )))
        }),
    )
    .map_err(|error| anyhow!("failed to run the explorer window: {error}"))
}
