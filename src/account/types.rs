//! Account type definitions

use serde::{Deserialize, Serialize};

use super::auth::PubKey;

/// Account address - hex string
pub type Address = String;

/// Plain account controlled by a public key
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BaseAccount {
    pub address: Address,
    pub account_number: u64,
    pub sequence: u64,
    /// Unset until the first transaction the account signs
    pub pub_key: Option<PubKey>,
}

/// Account whose authentication is delegated to the contract living at the
/// same address
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AbstractAccount {
    pub address: Address,
    pub account_number: u64,
    pub sequence: u64,
}

impl AbstractAccount {
    pub fn new(address: Address, account_number: u64, sequence: u64) -> Self {
        Self {
            address,
            account_number,
            sequence,
        }
    }

    /// Rebinds a base account, keeping its address, number and sequence
    pub fn from_base(base: BaseAccount) -> Self {
        Self::new(base.address, base.account_number, base.sequence)
    }

    /// The contract bound to this account
    pub fn contract(&self) -> &Address {
        &self.address
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum Account {
    Base(BaseAccount),
    Abstract(AbstractAccount),
}

impl Account {
    pub fn address(&self) -> &Address {
        match self {
            Account::Base(acc) => &acc.address,
            Account::Abstract(acc) => &acc.address,
        }
    }

    pub fn account_number(&self) -> u64 {
        match self {
            Account::Base(acc) => acc.account_number,
            Account::Abstract(acc) => acc.account_number,
        }
    }

    pub fn sequence(&self) -> u64 {
        match self {
            Account::Base(acc) => acc.sequence,
            Account::Abstract(acc) => acc.sequence,
        }
    }

    pub fn set_sequence(&mut self, sequence: u64) {
        match self {
            Account::Base(acc) => acc.sequence = sequence,
            Account::Abstract(acc) => acc.sequence = sequence,
        }
    }

    /// Key the standard verifier should check; abstract accounts always
    /// report the nil key
    pub fn pub_key(&self) -> Option<PubKey> {
        match self {
            Account::Base(acc) => acc.pub_key.clone(),
            Account::Abstract(_) => Some(PubKey::Nil),
        }
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self, Account::Abstract(_))
    }
}
