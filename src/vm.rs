//! Contract runtime: code storage, deterministic instantiation, admin
//! management and gas-metered invocation of WebAssembly contracts.
//!
//! Contract ABI: a module exports `memory`, `allocate(len: i32) -> i32` and
//! one function per entry point with the signature `(ptr: i32, len: i32) -> i64`.
//! The payload is written at the pointer returned by `allocate`. A negative
//! return value rejects the call; otherwise the high 32 bits are a pointer
//! and the low 32 bits a length of response data (0 for none).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use wasmtime::{Config, Engine, Linker, Module, Store, Trap};

use crate::account::{Account, AccountStore, Address, BalanceStore, Coin};
use crate::context::Context;
use crate::error::{AbstractAccountError, Result};
use crate::events::Event;
use crate::gas::Gas;
use crate::storage::{KvStore, KvStoreExt};

pub const INSTANTIATE: &str = "instantiate";

const KEY_NEXT_CODE_ID: &str = "code_seq";

// wasmtime keeps fuel in a signed counter
const MAX_FUEL: u64 = i64::MAX as u64;

fn code_key(code_id: u64) -> String {
    format!("code:{}", code_id)
}

fn contract_key(address: &str) -> String {
    format!("contract:{}", address)
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CodeInfo {
    pub creator: Address,
    pub checksum: String,
    pub wasm: Vec<u8>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ContractInfo {
    pub code_id: u64,
    pub creator: Address,
    pub admin: Option<Address>,
    pub label: String,
}

pub struct InstantiateRequest<'r> {
    pub code_id: u64,
    pub creator: &'r str,
    pub admin: Option<&'r str>,
    pub msg: &'r [u8],
    pub label: &'r str,
    pub funds: &'r [Coin],
    pub salt: &'r [u8],
}

/// Address of a contract created from `code_id` by `creator` with `salt`.
/// The same inputs always give the same address.
pub fn derive_address(code_id: u64, creator: &str, salt: &[u8]) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(b"instantiate2");
    hasher.update(code_id.to_be_bytes());
    hasher.update((creator.len() as u64).to_be_bytes());
    hasher.update(creator.as_bytes());
    hasher.update((salt.len() as u64).to_be_bytes());
    hasher.update(salt);
    hex::encode(hasher.finalize())
}

/// What the rest of the chain needs from a contract runtime
pub trait ContractRuntime {
    fn store_code(&self, ctx: &mut Context<'_>, creator: &str, wasm: &[u8]) -> Result<u64>;

    /// Creates the contract, its base account and moves `funds` from the
    /// creator, all or nothing.
    fn instantiate(
        &self,
        ctx: &mut Context<'_>,
        req: InstantiateRequest<'_>,
    ) -> Result<(Address, Vec<u8>)>;

    fn set_admin(
        &self,
        ctx: &mut Context<'_>,
        contract: &str,
        current_admin: &str,
        new_admin: &str,
    ) -> Result<()>;

    /// Calls `entry_point` with at most `gas_limit` gas. Gas used is charged
    /// to the context's meter.
    fn invoke(
        &self,
        ctx: &mut Context<'_>,
        contract: &str,
        entry_point: &str,
        payload: &[u8],
        gas_limit: Gas,
    ) -> Result<Vec<u8>>;

    fn contract_info(&self, store: &dyn KvStore, contract: &str) -> Result<Option<ContractInfo>>;
}

pub struct WasmRuntime {
    engine: Engine,
    accounts: AccountStore,
    balances: BalanceStore,
}

impl WasmRuntime {
    pub fn new() -> Result<Self> {
        let mut config = Config::new();
        config.consume_fuel(true);
        config.cranelift_nan_canonicalization(true);
        let engine = Engine::new(&config)
            .map_err(|e| {
                AbstractAccountError::Runtime(format!("failed to create wasmtime engine: {}", e))
            })?;

        Ok(WasmRuntime {
            engine,
            accounts: AccountStore::new(),
            balances: BalanceStore::new(),
        })
    }

    pub fn code_info(&self, store: &dyn KvStore, code_id: u64) -> Result<Option<CodeInfo>> {
        store.get_value(&code_key(code_id))
    }

    fn must_get_code(&self, store: &dyn KvStore, code_id: u64) -> Result<CodeInfo> {
        self.code_info(store, code_id)?
            .ok_or(AbstractAccountError::CodeNotFound(code_id))
    }

    /// Runs one entry point and charges the gas it used to `ctx`
    fn call(
        &self,
        ctx: &mut Context<'_>,
        wasm: &[u8],
        entry_point: &str,
        payload: &[u8],
        gas_limit: Gas,
    ) -> Result<Vec<u8>> {
        let (result, gas_used) = self.execute(wasm, entry_point, payload, gas_limit);
        debug!(entry_point, gas_limit, gas_used, ok = result.is_ok(), "contract call");

        ctx.consume_gas(gas_used, entry_point)?;
        result
    }

    fn execute(
        &self,
        wasm: &[u8],
        entry_point: &str,
        payload: &[u8],
        gas_limit: Gas,
    ) -> (Result<Vec<u8>>, Gas) {
        let module = match Module::new(&self.engine, wasm) {
            Ok(module) => module,
            Err(e) => {
                let err = AbstractAccountError::Runtime(format!("invalid module: {}", e));
                return (Err(err), 0);
            }
        };

        let fuel = gas_limit.min(MAX_FUEL);
        let mut store = Store::new(&self.engine, ());
        if let Err(e) = store.set_fuel(fuel) {
            return (Err(AbstractAccountError::Runtime(e.to_string())), 0);
        }

        let outcome = self.run(&module, &mut store, entry_point, payload);
        let gas_used = fuel.saturating_sub(store.get_fuel().unwrap_or(0));

        let result = match outcome {
            Ok(Ok(data)) => Ok(data),
            Ok(Err(reason)) => Err(AbstractAccountError::ContractRejected {
                entry_point: entry_point.to_string(),
                reason,
            }),
            Err(err) => Err(match err.downcast_ref::<Trap>() {
                Some(Trap::OutOfFuel) => AbstractAccountError::OutOfGas {
                    descriptor: entry_point.to_string(),
                    limit: gas_limit,
                    used: fuel,
                },
                Some(trap) => AbstractAccountError::ContractRejected {
                    entry_point: entry_point.to_string(),
                    reason: trap.to_string(),
                },
                None => AbstractAccountError::Runtime(err.to_string()),
            }),
        };

        (result, gas_used)
    }

    fn run(
        &self,
        module: &Module,
        store: &mut Store<()>,
        entry_point: &str,
        payload: &[u8],
    ) -> wasmtime::Result<std::result::Result<Vec<u8>, String>> {
        // no host functions are exposed to contracts
        let linker = Linker::new(&self.engine);
        let instance = linker.instantiate(&mut *store, module)?;

        let memory = instance
            .get_memory(&mut *store, "memory")
            .ok_or_else(|| wasmtime::Error::msg("contract must export 'memory'"))?;
        let allocate = instance.get_typed_func::<i32, i32>(&mut *store, "allocate")?;
        let entry = instance.get_typed_func::<(i32, i32), i64>(&mut *store, entry_point)?;

        let len = i32::try_from(payload.len())?;
        let ptr = allocate.call(&mut *store, len)?;
        memory.write(&mut *store, ptr as u32 as usize, payload)?;

        let ret = entry.call(&mut *store, (ptr, len))?;
        if ret < 0 {
            return Ok(Err(format!("error code {}", -ret)));
        }

        let data_ptr = (ret >> 32) as usize;
        let data_len = (ret & 0xffff_ffff) as usize;
        let memory = memory.data(&*store);
        match data_ptr.checked_add(data_len) {
            Some(end) if end <= memory.len() => Ok(Ok(memory[data_ptr..end].to_vec())),
            _ => Ok(Err(format!(
                "response of {} bytes at {} is outside memory",
                data_len, data_ptr
            ))),
        }
    }
}

impl ContractRuntime for WasmRuntime {
    fn store_code(&self, ctx: &mut Context<'_>, creator: &str, wasm: &[u8]) -> Result<u64> {
        Module::validate(&self.engine, wasm)
            .map_err(|e| AbstractAccountError::InvalidRequest(format!("invalid wasm: {}", e)))?;

        let code_id = ctx.store().get_value::<u64>(KEY_NEXT_CODE_ID)?.unwrap_or(1);
        let next = code_id
            .checked_add(1)
            .ok_or_else(|| AbstractAccountError::Overflow("code id".to_string()))?;
        ctx.store_mut().put_value(KEY_NEXT_CODE_ID, &next)?;

        let info = CodeInfo {
            creator: creator.to_string(),
            checksum: hex::encode(Sha256::digest(wasm)),
            wasm: wasm.to_vec(),
        };
        ctx.store_mut().put_value(&code_key(code_id), &info)?;

        info!(code_id, creator, checksum = %info.checksum, "stored code");
        Ok(code_id)
    }

    fn instantiate(
        &self,
        ctx: &mut Context<'_>,
        req: InstantiateRequest<'_>,
    ) -> Result<(Address, Vec<u8>)> {
        ctx.atomic(|ctx| {
            let code = self.must_get_code(ctx.store(), req.code_id)?;
            let address = derive_address(req.code_id, req.creator, req.salt);

            if ctx.store().has(&contract_key(&address))? {
                return Err(AbstractAccountError::DuplicateContract(address));
            }
            match self.accounts.get_account(ctx.store(), &address)? {
                None => {
                    self.accounts.new_base_account(ctx.store_mut(), &address)?;
                }
                // someone may have sent coins to the address ahead of time
                Some(Account::Base(base)) if base.sequence == 0 && base.pub_key.is_none() => {}
                Some(_) => return Err(AbstractAccountError::DuplicateContract(address)),
            }

            self.balances
                .transfer(ctx.store_mut(), req.creator, &address, req.funds)?;
            if !req.funds.is_empty() {
                ctx.emit(Event::Transfer {
                    from: req.creator.to_string(),
                    to: address.clone(),
                    amount: req.funds.to_vec(),
                });
            }

            let info = ContractInfo {
                code_id: req.code_id,
                creator: req.creator.to_string(),
                admin: req.admin.map(str::to_string),
                label: req.label.to_string(),
            };
            ctx.store_mut().put_value(&contract_key(&address), &info)?;

            let gas_limit = ctx.gas_meter().remaining();
            let data = self.call(ctx, &code.wasm, INSTANTIATE, req.msg, gas_limit)?;

            ctx.emit(Event::Instantiated {
                contract_addr: address.clone(),
                code_id: req.code_id,
            });
            Ok((address, data))
        })
    }

    fn set_admin(
        &self,
        ctx: &mut Context<'_>,
        contract: &str,
        current_admin: &str,
        new_admin: &str,
    ) -> Result<()> {
        let mut info = self
            .contract_info(ctx.store(), contract)?
            .ok_or_else(|| AbstractAccountError::ContractNotFound(contract.to_string()))?;

        if info.admin.as_deref() != Some(current_admin) {
            return Err(AbstractAccountError::AdminMismatch {
                contract: contract.to_string(),
                caller: current_admin.to_string(),
            });
        }

        info.admin = Some(new_admin.to_string());
        ctx.store_mut().put_value(&contract_key(contract), &info)
    }

    fn invoke(
        &self,
        ctx: &mut Context<'_>,
        contract: &str,
        entry_point: &str,
        payload: &[u8],
        gas_limit: Gas,
    ) -> Result<Vec<u8>> {
        let info = self
            .contract_info(ctx.store(), contract)?
            .ok_or_else(|| AbstractAccountError::ContractNotFound(contract.to_string()))?;
        let code = self.must_get_code(ctx.store(), info.code_id)?;
        let gas_limit = ctx.gas_meter().scoped_limit(gas_limit);

        ctx.atomic(|ctx| self.call(ctx, &code.wasm, entry_point, payload, gas_limit))
    }

    fn contract_info(&self, store: &dyn KvStore, contract: &str) -> Result<Option<ContractInfo>> {
        store.get_value(&contract_key(contract))
    }
}
