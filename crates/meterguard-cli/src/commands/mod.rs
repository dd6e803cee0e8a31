//! Command implementations

mod config;
mod distance;
mod geocode;
mod validate;

use anyhow::{Context, Result};
use meterguard_core::config::{CliConfigOverrides, LayeredConfig};

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Geocode(args) => geocode::execute_forward(args, &config, &output).await,
        Commands::Reverse(args) => geocode::execute_reverse(args, &config, &output).await,
        Commands::Distance(args) => distance::execute(args, &output),
        Commands::Validate(args) => validate::execute(args, &config, &output).await,
        Commands::Config => config::execute(&config, &output),
    }
}

/// Defaults, then the file, then the environment, then command-line flags
fn load_config(cli: &Cli) -> Result<LayeredConfig> {
    let mut config =
        LayeredConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    config.update_from_cli(CliConfigOverrides {
        google_api_key: cli.google_api_key.clone(),
        nominatim_user_agent: cli.user_agent.clone(),
        max_allowed_distance: cli.max_distance,
        movement_threshold: cli.movement_threshold,
    });

    config.validate().context("Invalid configuration")?;
    Ok(config)
}
