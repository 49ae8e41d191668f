use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::app::App;
use crate::config::AppConfig;
use crate::error::Result;
use crate::genesis::{init_genesis, GenesisState};
use crate::keeper::Keeper;
use crate::migrations;
use crate::storage::SledStore;
use crate::vm::WasmRuntime;

/// Opens the configured database behind a fresh app
pub fn open_app(config: &AppConfig) -> Result<App<SledStore>> {
    let store = SledStore::open(&config.node.db_path)?;
    let keeper = Keeper::new(&config.module.authority, Arc::new(WasmRuntime::new()?));
    Ok(App::new(store, keeper, &config.node.chain_id, config.gas))
}

pub fn handle_init(config: &AppConfig, genesis: Option<String>) -> Result<()> {
    let state = match genesis {
        Some(path) => GenesisState::load(&path)?,
        None => {
            let state = GenesisState::default();
            if !Path::new(&config.node.genesis_file).exists() {
                state.save(&config.node.genesis_file)?;
                println!("Created '{}'.", config.node.genesis_file);
            }
            state
        }
    };

    let mut app = open_app(config)?;
    app.apply(|ctx, keeper| {
        init_genesis(ctx, keeper, &state)?;
        migrations::migrate(ctx.store_mut())
    })?;
    app.store().flush()?;

    info!(db_path = %config.node.db_path, chain_id = %config.node.chain_id, "database initialized");
    println!("Initialized {} at {}", config.node.chain_id, config.node.db_path);
    Ok(())
}

pub fn handle_migrate(config: &AppConfig) -> Result<()> {
    let mut app = open_app(config)?;
    let from = migrations::store_version(app.store())?;
    let to = app.apply(|ctx, _| migrations::migrate(ctx.store_mut()))?;
    app.store().flush()?;

    if from == to {
        println!("Store already at version {}", to);
    } else {
        println!("Migrated store from version {} to {}", from, to);
    }
    Ok(())
}
