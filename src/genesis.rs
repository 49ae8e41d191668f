use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::context::Context;
use crate::error::{AbstractAccountError, Result};
use crate::keeper::Keeper;
use crate::params::Params;

/// Module state at chain start
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GenesisState {
    pub params: Params,
    pub next_account_id: u64,
}

impl Default for GenesisState {
    fn default() -> Self {
        Self {
            params: Params::default(),
            next_account_id: 1,
        }
    }
}

impl GenesisState {
    pub fn validate(&self) -> Result<()> {
        self.params.validate()?;
        if self.next_account_id == 0 {
            return Err(AbstractAccountError::InvalidGenesis(
                "next account id must be positive".to_string(),
            ));
        }
        // the sequencer has to be able to hand out at least this id
        if self.next_account_id == u64::MAX {
            return Err(AbstractAccountError::InvalidGenesis(
                "next account id is out of range".to_string(),
            ));
        }
        Ok(())
    }

    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Err(AbstractAccountError::InvalidGenesis(format!(
                "genesis file not found: {}",
                path
            )));
        }
        let content = fs::read_to_string(path)
            .map_err(|e| AbstractAccountError::InvalidGenesis(e.to_string()))?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| AbstractAccountError::InvalidGenesis(e.to_string()))
    }
}

pub fn init_genesis(ctx: &mut Context<'_>, keeper: &Keeper, state: &GenesisState) -> Result<()> {
    state.validate()?;
    keeper.set_params(ctx.store_mut(), &state.params)?;
    keeper.set_next_account_id(ctx.store_mut(), state.next_account_id)?;

    info!(next_account_id = state.next_account_id, "initialized genesis");
    Ok(())
}

pub fn export_genesis(ctx: &Context<'_>, keeper: &Keeper) -> Result<GenesisState> {
    Ok(GenesisState {
        params: keeper.get_params(ctx.store())?,
        next_account_id: keeper.get_next_account_id(ctx.store())?,
    })
}
