pub mod genesis;
pub mod node;
pub mod params;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "abstract-account")]
#[command(about = "Abstract account module node tooling", long_about = None)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = "config.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write default config and genesis, then initialize the database
    Init {
        /// Genesis file to start from instead of the defaults
        #[arg(long)]
        genesis: Option<String>,
    },
    /// Module parameters
    Params {
        #[command(subcommand)]
        cmd: params::ParamsCommands,
    },
    /// Genesis state
    Genesis {
        #[command(subcommand)]
        cmd: genesis::GenesisCommands,
    },
    /// Bring the database up to the current store version
    Migrate,
}
