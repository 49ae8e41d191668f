use clap::Subcommand;
use std::fs;

use crate::config::AppConfig;
use crate::error::{AbstractAccountError, Result};
use crate::params::Params;

#[derive(Subcommand)]
pub enum ParamsCommands {
    /// Print the stored params as JSON
    Show,
    /// Check a JSON params file without touching the database
    Validate { file: String },
}

pub fn handle_params_command(cmd: ParamsCommands, config: &AppConfig) -> Result<()> {
    match cmd {
        ParamsCommands::Show => {
            let app = super::node::open_app(config)?;
            let params = app.keeper().get_params(app.store())?;
            println!("{}", serde_json::to_string_pretty(&params)?);
        }
        ParamsCommands::Validate { file } => {
            let params = load_params(&file)?;
            params.validate()?;
            println!("{} is valid", file);
        }
    }
    Ok(())
}

fn load_params(path: &str) -> Result<Params> {
    let content = fs::read_to_string(path)
        .map_err(|e| AbstractAccountError::InvalidRequest(format!("{}: {}", path, e)))?;
    serde_json::from_str(&content).map_err(|e| AbstractAccountError::ParsingParams(e.to_string()))
}
