pub mod config;
pub mod doctor;

use clap::{Parser, Subcommand};

/// Agent Orchestration Service gateway.
#[derive(Debug, Parser)]
#[command(name = "agentrt", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the gateway server (default when no subcommand is given).
    Serve,
    /// Run diagnostic checks against the current configuration.
    Doctor,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any issues.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

/// Load the configuration from the path named by `AGENTRT_CONFIG` (or
/// `config.toml` by default). Shared by `serve`, `doctor`, and `config`.
pub fn load_config() -> anyhow::Result<(agentrt_domain::config::Config, String)> {
    let config_path = std::env::var("AGENTRT_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let config = agentrt_domain::config::Config::load(std::path::Path::new(&config_path))
        .map_err(|e| anyhow::anyhow!("loading {config_path}: {e}"))?;
    Ok((config, config_path))
}
