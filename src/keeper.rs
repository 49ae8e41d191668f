//! Module keeper: parameters, the account-id sequencer and privileged calls
//! into account contracts.

use std::sync::Arc;
use tracing::{debug, info};

use crate::account::Address;
use crate::context::Context;
use crate::error::{AbstractAccountError, Result};
use crate::gas::Gas;
use crate::params::Params;
use crate::storage::{KvStore, KvStoreExt};
use crate::sudo::AccountSudoMsg;
use crate::vm::ContractRuntime;

pub const MODULE_NAME: &str = "abstractaccount";

pub const KEY_PARAMS: &str = "aa:params";
pub const KEY_NEXT_ACCOUNT_ID: &str = "aa:next_account_id";

/// Handle threaded through every operation of the module. Built once at
/// startup with the authority that may update parameters.
#[derive(Clone)]
pub struct Keeper {
    authority: Address,
    runtime: Arc<dyn ContractRuntime>,
}

impl Keeper {
    pub fn new(authority: &str, runtime: Arc<dyn ContractRuntime>) -> Self {
        Self {
            authority: authority.to_string(),
            runtime,
        }
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn runtime(&self) -> &dyn ContractRuntime {
        self.runtime.as_ref()
    }

    // ------------------------------- Params --------------------------------

    /// Stored params, or the defaults if none were ever stored
    pub fn get_params(&self, store: &dyn KvStore) -> Result<Params> {
        match store.get(KEY_PARAMS.as_bytes())? {
            Some(bytes) => bincode::deserialize(&bytes)
                .map_err(|e| AbstractAccountError::ParsingParams(e.to_string())),
            None => Ok(Params::default()),
        }
    }

    /// Validates before writing; invalid params never reach the store
    pub fn set_params(&self, store: &mut dyn KvStore, params: &Params) -> Result<()> {
        params.validate()?;
        store.put_value(KEY_PARAMS, params)
    }

    // --------------------------- Account id ----------------------------

    pub fn get_next_account_id(&self, store: &dyn KvStore) -> Result<u64> {
        Ok(store.get_value::<u64>(KEY_NEXT_ACCOUNT_ID)?.unwrap_or(1))
    }

    pub fn set_next_account_id(&self, store: &mut dyn KvStore, id: u64) -> Result<()> {
        store.put_value(KEY_NEXT_ACCOUNT_ID, &id)
    }

    pub fn get_and_increment_next_account_id(&self, store: &mut dyn KvStore) -> Result<u64> {
        let id = self.get_next_account_id(store)?;
        let next = id
            .checked_add(1)
            .ok_or_else(|| AbstractAccountError::Overflow("next account id".to_string()))?;
        self.set_next_account_id(store, next)?;
        Ok(id)
    }

    // ------------------------------ Sudo -------------------------------

    /// Calls the account contract with a budget of
    /// `min(remaining tx gas, max_gas)`.
    pub fn sudo_with_gas_limit(
        &self,
        ctx: &mut Context<'_>,
        contract: &str,
        msg: &AccountSudoMsg,
        max_gas: Gas,
    ) -> Result<Vec<u8>> {
        let payload = msg.to_json()?;
        let gas_limit = ctx.gas_meter().scoped_limit(max_gas);
        let before = ctx.gas_meter().consumed();

        let res = self
            .runtime
            .invoke(ctx, contract, msg.entry_point(), &payload, gas_limit);

        debug!(
            contract,
            entry_point = msg.entry_point(),
            gas_limit,
            gas_used = ctx.gas_meter().consumed() - before,
            ok = res.is_ok(),
            "account sudo call"
        );
        res
    }

    pub(crate) fn log_params_updated(&self, params: &Params) {
        info!(
            authority = %self.authority,
            allow_all = params.allow_all_code_ids,
            allowed = ?params.allowed_code_ids,
            max_gas_before = params.max_gas_before,
            max_gas_after = params.max_gas_after,
            "params updated"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemStore;
    use crate::testing::keeper;

    #[test]
    fn test_get_and_increment_next_account_id() {
        let mut store = MemStore::new();
        let k = keeper();

        assert_eq!(k.get_next_account_id(&store).unwrap(), 1);
        assert_eq!(k.get_and_increment_next_account_id(&mut store).unwrap(), 1);
        assert_eq!(k.get_and_increment_next_account_id(&mut store).unwrap(), 2);
        assert_eq!(k.get_next_account_id(&store).unwrap(), 3);
    }

    #[test]
    fn test_exhausted_account_id_sequence() {
        let mut store = MemStore::new();
        let k = keeper();
        k.set_next_account_id(&mut store, u64::MAX).unwrap();

        assert_eq!(
            k.get_and_increment_next_account_id(&mut store),
            Err(AbstractAccountError::Overflow("next account id".to_string()))
        );
        assert_eq!(k.get_next_account_id(&store).unwrap(), u64::MAX);
    }

    #[test]
    fn test_get_params_defaults() {
        let store = MemStore::new();
        assert_eq!(keeper().get_params(&store).unwrap(), Params::default());
    }

    #[test]
    fn test_set_params_rejects_invalid() {
        let mut store = MemStore::new();
        let k = keeper();
        let valid = Params::new(false, vec![3, 5], 100, 200).unwrap();
        k.set_params(&mut store, &valid).unwrap();

        let invalid = Params { max_gas_after: 0, ..valid.clone() };
        assert_eq!(k.set_params(&mut store, &invalid), Err(AbstractAccountError::ZeroMaxGas));
        assert_eq!(k.get_params(&store).unwrap(), valid);
    }

    #[test]
    fn test_corrupt_params() {
        let mut store = MemStore::new();
        store.set(KEY_PARAMS.as_bytes(), vec![0xff]).unwrap();

        assert!(matches!(
            keeper().get_params(&store),
            Err(AbstractAccountError::ParsingParams(_))
        ));
    }
}
