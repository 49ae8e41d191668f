//! Shared fixtures for unit tests: inline WebAssembly contracts and an app
//! with funded accounts.

use std::sync::Arc;

use crate::account::{Account, AccountStore, Address, BalanceStore, Coin};
use crate::app::App;
use crate::config::GasConfig;
use crate::crypto::KeyPair;
use crate::keeper::Keeper;
use crate::msg_server::MsgServer;
use crate::storage::MemStore;
use crate::tx::{Fee, Msg, MsgRegisterAccount, MsgSend, SignerInfo, Tx};
use crate::vm::WasmRuntime;

pub const AUTHORITY: &str = "authority";
pub const CHAIN_ID: &str = "test-chain";
pub const DENOM: &str = "uaa";
pub const TX_GAS_LIMIT: u64 = 5_000_000;

/// Account contract whose entry points are given as WAT instruction
/// sequences producing an i64. `instantiate` can return "hello", stored at
/// offset 16, with `(i64.const 68719476741)` (pointer 16, length 5).
macro_rules! account_contract {
    ($instantiate:literal, $before_tx:literal, $after_tx:literal) => {
        concat!(
            "(module\n",
            "  (memory (export \"memory\") 2)\n",
            "  (data (i32.const 16) \"hello\")\n",
            "  (func (export \"allocate\") (param i32) (result i32) (i32.const 1024))\n",
            "  (func (export \"instantiate\") (param i32 i32) (result i64) ",
            $instantiate,
            ")\n",
            "  (func (export \"before_tx\") (param i32 i32) (result i64) ",
            $before_tx,
            ")\n",
            "  (func (export \"after_tx\") (param i32 i32) (result i64) ",
            $after_tx,
            "))\n"
        )
    };
}

pub const ACCEPT_ALL: &str =
    account_contract!("(i64.const 68719476741)", "(i64.const 0)", "(i64.const 0)");

pub const REJECT_BEFORE_TX: &str =
    account_contract!("(i64.const 68719476741)", "(i64.const -1)", "(i64.const 0)");

pub const REJECT_AFTER_TX: &str =
    account_contract!("(i64.const 68719476741)", "(i64.const 0)", "(i64.const -1)");

pub const LOOP_BEFORE_TX: &str = account_contract!(
    "(i64.const 68719476741)",
    "(loop $l (br $l)) (i64.const 0)",
    "(i64.const 0)"
);

pub const LOOP_AFTER_TX: &str = account_contract!(
    "(i64.const 68719476741)",
    "(i64.const 0)",
    "(loop $l (br $l)) (i64.const 0)"
);

/// `before_tx` answers with a 4 GiB response at pointer 0
pub const OVERSIZED_RESPONSE: &str =
    account_contract!("(i64.const 68719476741)", "(i64.const 4294967295)", "(i64.const 0)");

pub const REJECT_INSTANTIATE: &str =
    account_contract!("(i64.const -7)", "(i64.const 0)", "(i64.const 0)");

pub fn wasm(wat: &str) -> Vec<u8> {
    wat::parse_str(wat).unwrap()
}

pub fn keeper() -> Keeper {
    Keeper::new(AUTHORITY, Arc::new(WasmRuntime::new().unwrap()))
}

pub fn app() -> App<MemStore> {
    App::new(MemStore::new(), keeper(), CHAIN_ID, GasConfig::default())
}

pub fn fee() -> Fee {
    Fee {
        amount: vec![],
        gas_limit: TX_GAS_LIMIT,
    }
}

pub fn send(from: &str, to: &str, amount: u64) -> Msg {
    Msg::Send(MsgSend {
        from_address: from.to_string(),
        to_address: to.to_string(),
        amount: vec![Coin::new(amount, DENOM)],
    })
}

pub fn balance(app: &App<MemStore>, address: &str) -> u64 {
    BalanceStore::new()
        .get_balance(app.store(), address, DENOM)
        .unwrap()
}

pub fn fund(app: &mut App<MemStore>, address: &str, amount: u64) {
    app.apply(|ctx, _| {
        BalanceStore::new().credit(ctx.store_mut(), address, &Coin::new(amount, DENOM))
    })
    .unwrap();
}

/// Base account controlled by a key derived from `seed`, funded with `amount`.
pub fn standard_account(app: &mut App<MemStore>, seed: u8, amount: u64) -> KeyPair {
    let kp = KeyPair::from_seed([seed; 32]);
    let address = kp.address();
    app.apply(|ctx, _| AccountStore::new().new_base_account(ctx.store_mut(), &address))
        .unwrap();
    fund(app, &address, amount);
    kp
}

pub fn store_code(app: &mut App<MemStore>, wat: &str) -> u64 {
    let code = wasm(wat);
    app.apply(|ctx, keeper| keeper.runtime().store_code(ctx, "deployer", &code))
        .unwrap()
}

/// Registers an account bound to `wat`, funded with `amount`.
pub fn abstract_account(app: &mut App<MemStore>, wat: &str, salt: &[u8], amount: u64) -> Address {
    let code_id = store_code(app, wat);
    fund(app, "creator", amount);

    let msg = MsgRegisterAccount {
        sender: "creator".to_string(),
        code_id,
        msg: b"{}".to_vec(),
        funds: vec![Coin::new(amount, DENOM)],
        salt: salt.to_vec(),
    };
    app.apply(|ctx, keeper| MsgServer::new(keeper).register_account(ctx, &msg))
        .unwrap()
        .address
}

fn account(app: &App<MemStore>, address: &str) -> Account {
    AccountStore::new().must_get_account(app.store(), address).unwrap()
}

/// Transaction signed by standard accounts, one key per signer in order.
/// The public key is attached so first-time signers get it recorded.
pub fn signed_tx(app: &App<MemStore>, msgs: Vec<Msg>, keys: &[&KeyPair]) -> Tx {
    signed_tx_with_fee(app, msgs, keys, fee())
}

pub fn signed_tx_with_fee(app: &App<MemStore>, msgs: Vec<Msg>, keys: &[&KeyPair], fee: Fee) -> Tx {
    let mut tx = Tx::new(msgs, "", fee);
    let mut numbers = Vec::new();
    for kp in keys {
        let acc = account(app, &kp.address());
        tx.auth_info.signer_infos.push(SignerInfo {
            public_key: Some(crate::account::PubKey::Ed25519(kp.public_key_bytes())),
            sequence: acc.sequence(),
        });
        numbers.push(acc.account_number());
    }
    for (kp, number) in keys.iter().zip(numbers) {
        let sign_bytes = tx.sign_bytes(CHAIN_ID, number).unwrap();
        tx.signatures.push(kp.sign(&sign_bytes));
    }
    tx
}

/// Transaction from an abstract account carrying `cred` as its credential.
pub fn abstract_tx(app: &App<MemStore>, msgs: Vec<Msg>, address: &str, cred: &[u8]) -> Tx {
    let mut tx = Tx::new(msgs, "", fee());
    tx.auth_info.signer_infos.push(SignerInfo {
        public_key: None,
        sequence: account(app, address).sequence(),
    });
    tx.signatures.push(cred.to_vec());
    tx
}

/// One signer of a [`multi_signer_tx`]
pub enum Signer<'a> {
    Key(&'a KeyPair),
    /// Abstract account address and the credential handed to its contract
    Contract(&'a str, &'a [u8]),
}

/// Transaction with signers in the given order, which must match the order
/// in which they first appear as message signers.
pub fn multi_signer_tx(app: &App<MemStore>, msgs: Vec<Msg>, signers: &[Signer<'_>]) -> Tx {
    let mut tx = Tx::new(msgs, "", fee());
    for signer in signers {
        let info = match signer {
            Signer::Key(kp) => SignerInfo {
                public_key: Some(crate::account::PubKey::Ed25519(kp.public_key_bytes())),
                sequence: account(app, &kp.address()).sequence(),
            },
            Signer::Contract(address, _) => SignerInfo {
                public_key: None,
                sequence: account(app, address).sequence(),
            },
        };
        tx.auth_info.signer_infos.push(info);
    }
    for signer in signers {
        let signature = match signer {
            Signer::Key(kp) => {
                let number = account(app, &kp.address()).account_number();
                kp.sign(&tx.sign_bytes(CHAIN_ID, number).unwrap())
            }
            Signer::Contract(_, cred) => cred.to_vec(),
        };
        tx.signatures.push(signature);
    }
    tx
}
