//! PhotoReviewer - swipe through your photo library and clean it up
//!
//! Main entry point for the terminal front end.

mod app;

use anyhow::Result;
use app_core::AppConfig;
use app_fs::MediaFilter;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "photo_reviewer", version, about = "Review random batches of photos and videos")]
struct Cli {
    /// Media library root (defaults to the picture directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Media type filter: all, images, gifs or videos
    #[arg(long)]
    filter: Option<MediaFilter>,

    /// Configuration file to use instead of the platform default
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
    let mut config = AppConfig::load_from(&config_path)?;

    // Initialize logging and panic hook first
    let _log_guard = app_log::init(&config.logging.level)?;

    if let Err(e) = app_log::cleanup_old_logs(config.logging.retain_days) {
        tracing::warn!("Failed to cleanup old logs: {}", e);
    }

    tracing::info!(config = %config_path.display(), "PhotoReviewer starting...");

    if let Some(root) = cli.root {
        config.library.root = Some(root);
    }
    if let Some(filter) = cli.filter {
        config.library.filter = filter;
    }

    let state = app_core::AppState::new(config)?;

    app::run(state).await
}
