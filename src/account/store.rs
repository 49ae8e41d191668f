//! Account table on top of the key-value store

use super::types::{Account, Address, BaseAccount};
use crate::error::{AbstractAccountError, Result};
use crate::storage::{KvStore, KvStoreExt};

const KEY_NEXT_ACCOUNT_NUMBER: &str = "acc_num";

fn account_key(address: &str) -> String {
    format!("acc:{}", address)
}

/// Handle to the account table. Holds no state of its own; every call works
/// against the store it is given.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountStore;

impl AccountStore {
    pub fn new() -> Self {
        Self
    }

    pub fn get_account(&self, store: &dyn KvStore, address: &str) -> Result<Option<Account>> {
        store.get_value(&account_key(address))
    }

    /// Like [`get_account`](Self::get_account) but missing accounts are an error
    pub fn must_get_account(&self, store: &dyn KvStore, address: &str) -> Result<Account> {
        self.get_account(store, address)?
            .ok_or_else(|| AbstractAccountError::AccountNotFound(address.to_string()))
    }

    pub fn has_account(&self, store: &dyn KvStore, address: &str) -> Result<bool> {
        store.has(&account_key(address))
    }

    pub fn set_account(&self, store: &mut dyn KvStore, account: &Account) -> Result<()> {
        store.put_value(&account_key(account.address()), account)
    }

    /// Create a base account with the next free account number
    pub fn new_base_account(&self, store: &mut dyn KvStore, address: &Address) -> Result<Account> {
        if self.has_account(store, address)? {
            return Err(AbstractAccountError::InvalidRequest(format!(
                "account {} already exists",
                address
            )));
        }

        let account_number = store.get_value::<u64>(KEY_NEXT_ACCOUNT_NUMBER)?.unwrap_or(0);
        let next = account_number
            .checked_add(1)
            .ok_or_else(|| AbstractAccountError::Overflow("account number".to_string()))?;
        store.put_value(KEY_NEXT_ACCOUNT_NUMBER, &next)?;

        let account = Account::Base(BaseAccount {
            address: address.clone(),
            account_number,
            sequence: 0,
            pub_key: None,
        });
        self.set_account(store, &account)?;
        Ok(account)
    }

    /// Increment account sequence
    pub fn increment_sequence(&self, store: &mut dyn KvStore, address: &str) -> Result<u64> {
        let mut account = self.must_get_account(store, address)?;
        let sequence = account
            .sequence()
            .checked_add(1)
            .ok_or_else(|| AbstractAccountError::Overflow(format!("sequence of {}", address)))?;
        account.set_sequence(sequence);
        self.set_account(store, &account)?;
        Ok(sequence)
    }
}
