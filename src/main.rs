//! splitvault
//!
//! Splits a video into time-bounded segments with ffmpeg and stores an
//! encrypted-at-rest copy of every segment.
//!
//! # Usage
//!
//! ```bash
//! splitvault split -f movie.mp4 -s 300 --password "$SECRET"
//! splitvault split -f movie.mp4 -S 25M --chunk-strategy even --verify
//! splitvault plan -f movie.mp4 -c 4 --json
//! splitvault decrypt ./segments --password "$SECRET"
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use splitvault::app::DefaultAppContainer;
use splitvault::cli::{self, commands, Cli};
use splitvault::config_initialization::initialize_configuration_hierarchy;
use splitvault::utils::logging::init_logging;
use splitvault::DomainError;

/// Main entry point for the splitvault CLI application
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let overrides = commands::config_overrides(&cli);
    let config = initialize_configuration_hierarchy(cli.config.as_deref(), &overrides)
        .context("Failed to load configuration")?;
    init_logging(&config.logging).context("Failed to initialise logging")?;
    debug!("Resolved configuration: {:?}", config);

    info!("Executing {} command", cli.command.name());
    let container = DefaultAppContainer::new(&config);
    if let Err(e) = commands::dispatch(&cli, &container, &config).await {
        if let Some(domain_error) = e.downcast_ref::<DomainError>() {
            if domain_error.is_usage_error() {
                cli::exit_with_usage(cli.command.name(), &format!("{:#}", e));
            }
        }
        return Err(e);
    }

    Ok(())
}
