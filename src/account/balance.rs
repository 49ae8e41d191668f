//! Balance tracking for multi-denom coins

use serde::{Deserialize, Serialize};

use crate::error::{AbstractAccountError, Result};
use crate::storage::{KvStore, KvStoreExt};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Coin {
    pub denom: String,
    pub amount: u64,
}

impl Coin {
    pub fn new(amount: u64, denom: &str) -> Self {
        Self {
            denom: denom.to_string(),
            amount,
        }
    }
}

fn balance_key(address: &str, denom: &str) -> String {
    format!("bal:{}:{}", address, denom)
}

/// Handle to the balance table
#[derive(Debug, Clone, Copy, Default)]
pub struct BalanceStore;

impl BalanceStore {
    pub fn new() -> Self {
        Self
    }

    /// Get balance for an account and denom
    pub fn get_balance(&self, store: &dyn KvStore, address: &str, denom: &str) -> Result<u64> {
        Ok(store.get_value::<u64>(&balance_key(address, denom))?.unwrap_or(0))
    }

    fn set_balance(
        &self,
        store: &mut dyn KvStore,
        address: &str,
        denom: &str,
        amount: u64,
    ) -> Result<()> {
        let key = balance_key(address, denom);
        if amount == 0 {
            store.delete(key.as_bytes())
        } else {
            store.put_value(&key, &amount)
        }
    }

    /// Credit (add) coins to an account
    pub fn credit(&self, store: &mut dyn KvStore, address: &str, coin: &Coin) -> Result<()> {
        if coin.amount == 0 {
            return Ok(());
        }

        let current = self.get_balance(store, address, &coin.denom)?;
        let new_balance = current.checked_add(coin.amount).ok_or_else(|| {
            AbstractAccountError::InvalidRequest(format!("balance overflow for {}", address))
        })?;
        self.set_balance(store, address, &coin.denom, new_balance)
    }

    /// Debit (subtract) coins from an account
    pub fn debit(&self, store: &mut dyn KvStore, address: &str, coin: &Coin) -> Result<()> {
        if coin.amount == 0 {
            return Ok(());
        }

        let current = self.get_balance(store, address, &coin.denom)?;
        if current < coin.amount {
            return Err(AbstractAccountError::InsufficientFunds(format!(
                "{} has {}{}, needs {}{}",
                address, current, coin.denom, coin.amount, coin.denom
            )));
        }
        self.set_balance(store, address, &coin.denom, current - coin.amount)
    }

    /// Transfer coins from one account to another.
    ///
    /// Callers run this inside a branch, so a failure half way through
    /// leaves nothing behind once the branch is dropped.
    pub fn transfer(
        &self,
        store: &mut dyn KvStore,
        from: &str,
        to: &str,
        coins: &[Coin],
    ) -> Result<()> {
        for coin in coins {
            self.debit(store, from, coin)?;
            self.credit(store, to, coin)?;
        }
        Ok(())
    }
}
