//! In-place store migrations for the module.

use tracing::info;

use crate::error::{AbstractAccountError, Result};
use crate::keeper::KEY_PARAMS;
use crate::params::Params;
use crate::storage::{KvStore, KvStoreExt};

pub const STORE_VERSION: u64 = 2;
const KEY_STORE_VERSION: &str = "aa:store_version";

/// Version the store was last migrated to. Stores that predate versioning
/// are version 1.
pub fn store_version(store: &dyn KvStore) -> Result<u64> {
    Ok(store.get_value::<u64>(KEY_STORE_VERSION)?.unwrap_or(1))
}

/// Runs every migration the store has not seen yet and returns the
/// resulting version.
pub fn migrate(store: &mut dyn KvStore) -> Result<u64> {
    let from = store_version(store)?;
    if from < 2 {
        migrate_params_v2(store)?;
    }
    if from < STORE_VERSION {
        store.put_value(KEY_STORE_VERSION, &STORE_VERSION)?;
        info!(from, to = STORE_VERSION, "store migrated");
    }
    Ok(STORE_VERSION)
}

/// Rewrites the stored params in the current encoding. Missing params
/// become the defaults; v1 stores kept them as JSON.
pub fn migrate_params_v2(store: &mut dyn KvStore) -> Result<Params> {
    let params = match store.get(KEY_PARAMS.as_bytes())? {
        None => Params::default(),
        Some(bytes) => match bincode::deserialize::<Params>(&bytes) {
            Ok(params) => params,
            Err(_) => serde_json::from_slice::<Params>(&bytes)
                .map_err(|e| AbstractAccountError::ParsingParams(e.to_string()))?,
        },
    };

    let bytes = bincode::serialize(&params)
        .map_err(|e| AbstractAccountError::ParsingParams(e.to_string()))?;
    store.set(KEY_PARAMS.as_bytes(), bytes)?;
    Ok(params)
}
