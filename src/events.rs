use serde::{Deserialize, Serialize};

use crate::account::Address;
use crate::account::balance::Coin;

/// Emitted once per successful account registration.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EventAccountRegistered {
    pub creator: Address,
    pub code_id: u64,
    pub contract_addr: Address,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    AccountRegistered(EventAccountRegistered),
    Instantiated {
        contract_addr: Address,
        code_id: u64,
    },
    Transfer {
        from: Address,
        to: Address,
        amount: Vec<Coin>,
    },
    ParamsUpdated {
        authority: Address,
    },
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::AccountRegistered(_) => "account_registered",
            Event::Instantiated { .. } => "instantiate",
            Event::Transfer { .. } => "transfer",
            Event::ParamsUpdated { .. } => "params_updated",
        }
    }
}
