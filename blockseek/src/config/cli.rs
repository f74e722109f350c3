use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
pub struct Cli {
    /// Location of config file: Default: blockseek.toml
    #[arg(short, long, default_value = "blockseek.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub subcommand: Subcommand,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Subcommand {
    /// Output example config file.
    Init,

    /// Run a single catch-up pass up to the current chain head, then exit.
    Index,

    /// Keep the index in sync with the chain until a fatal error occurs.
    Sync,

    /// Print the chain head, the latest indexed height and document counts.
    Status,

    /// Prints the current version of application
    Version,
}

impl Subcommand {
    /// Whether the subcommand talks to the chain node or the search backend.
    pub fn needs_backends(&self) -> bool {
        !matches!(self, Subcommand::Init | Subcommand::Version)
    }
}
