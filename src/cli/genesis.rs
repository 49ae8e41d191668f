use clap::Subcommand;

use crate::config::AppConfig;
use crate::error::Result;
use crate::genesis::{export_genesis, GenesisState};

#[derive(Subcommand)]
pub enum GenesisCommands {
    /// Check a genesis file
    Validate { file: String },
    /// Print the module state of the configured database as genesis JSON
    Export,
}

pub fn handle_genesis_command(cmd: GenesisCommands, config: &AppConfig) -> Result<()> {
    match cmd {
        GenesisCommands::Validate { file } => {
            GenesisState::load(&file)?.validate()?;
            println!("{} is valid", file);
        }
        GenesisCommands::Export => {
            let mut app = super::node::open_app(config)?;
            let state = app.apply(|ctx, keeper| export_genesis(ctx, keeper))?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
    }
    Ok(())
}
