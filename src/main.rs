//! release-sync - inspect application readiness and release dependencies
//!
//! One-shot commands over a freshly synced watch cache. The dependency
//! controller needs a release installer and runs from the library.

use anyhow::{Context, Result};
use clap::Parser;
use release_sync::cli::{self, Command};
use release_sync::config::ConfigLoader;
use release_sync::logging::init_logging;
use std::path::PathBuf;

/// Inspect application readiness and release dependencies on a Kubernetes cluster
#[derive(Parser, Debug)]
#[command(name = "release-sync")]
#[command(about = "Inspect application readiness and release dependencies", long_about = None)]
struct Args {
    /// Configuration file (defaults to $RELEASE_SYNC_CONFIG or the user config dir)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'd')]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config =
        ConfigLoader::load(args.config.as_deref()).context("Failed to load configuration")?;
    if args.debug {
        config.logger.level = "debug".to_string();
    }
    init_logging(&config.logger);
    tracing::debug!(namespace = %config.namespace, "Configuration loaded");

    cli::handle_command(args.command, &config).await
}
