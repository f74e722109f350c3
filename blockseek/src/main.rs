#![warn(
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::style,
    clippy::pedantic
)]
#![allow(clippy::module_name_repetitions)]

mod chain;
mod config;
mod db;
mod subcommands;

use anyhow::bail;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use config::{Config, ConfigFile};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let config = parse_config()?;

    match &config.cli.subcommand {
        config::Subcommand::Init => subcommands::init()?,
        config::Subcommand::Index => {
            let store = db::initialize(&config).await?;
            subcommands::index(&config, store).await?;
        }
        config::Subcommand::Sync => {
            let store = db::initialize(&config).await?;
            subcommands::sync(&config, store).await?;
        }
        config::Subcommand::Status => {
            let store = db::initialize(&config).await?;
            subcommands::status(&config, &store).await?;
        }
        config::Subcommand::Version => {
            subcommands::version();
        }
    }

    Ok(())
}

fn parse_config() -> anyhow::Result<Config> {
    let cli = config::Cli::parse();

    let file = if cli.config.is_file() {
        let config_str = std::fs::read_to_string(&cli.config)?;

        toml::from_str(&config_str)?
    } else if cli.subcommand.needs_backends() {
        tracing::error!("Config file not found.");
        bail!("Missing config file.")
    } else {
        ConfigFile::default()
    };

    let config = Config::new(cli, file);

    tracing::debug!("Config loaded: {config:?}");

    Ok(config)
}
