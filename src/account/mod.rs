//! Account System Module
//!
//! This module implements the account table with:
//! - Key-controlled base accounts
//! - Abstract accounts whose authentication is delegated to a contract
//! - Multi-denom balance tracking

pub mod types;
pub mod store;
pub mod balance;
pub mod auth;

pub use types::{AbstractAccount, Account, Address, BaseAccount};
pub use store::AccountStore;
pub use balance::{BalanceStore, Coin};
pub use auth::PubKey;
