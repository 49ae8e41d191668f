//! Minimal host application: committed state, message routing and the
//! ante/post pipelines around it.

use tracing::{debug, warn};

use crate::account::BalanceStore;
use crate::ante::AnteHandler;
use crate::config::GasConfig;
use crate::context::Context;
use crate::error::Result;
use crate::events::Event;
use crate::gas::{Gas, GasMeter};
use crate::keeper::Keeper;
use crate::msg_server::MsgServer;
use crate::post::PostHandler;
use crate::storage::KvStore;
use crate::tx::{Msg, MsgResult, Tx};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxResult {
    pub gas_wanted: Gas,
    pub gas_used: Gas,
    pub events: Vec<Event>,
    pub msg_results: Vec<MsgResult>,
}

/// Sends each message to its handler
pub struct Router {
    keeper: Keeper,
    balances: BalanceStore,
}

impl Router {
    pub fn new(keeper: Keeper) -> Self {
        Self {
            keeper,
            balances: BalanceStore::new(),
        }
    }

    pub fn dispatch(&self, ctx: &mut Context<'_>, msg: &Msg) -> Result<Vec<u8>> {
        match msg {
            Msg::UpdateParams(m) => {
                MsgServer::new(&self.keeper).update_params(ctx, m)?;
                Ok(Vec::new())
            }
            Msg::RegisterAccount(m) => {
                let res = MsgServer::new(&self.keeper).register_account(ctx, m)?;
                Ok(bincode::serialize(&res)?)
            }
            Msg::Send(m) => {
                self.balances
                    .transfer(ctx.store_mut(), &m.from_address, &m.to_address, &m.amount)?;
                ctx.emit(Event::Transfer {
                    from: m.from_address.clone(),
                    to: m.to_address.clone(),
                    amount: m.amount.clone(),
                });
                Ok(Vec::new())
            }
            Msg::StoreCode(m) => {
                let code_id = self
                    .keeper
                    .runtime()
                    .store_code(ctx, &m.sender, &m.wasm_byte_code)?;
                Ok(bincode::serialize(&code_id)?)
            }
        }
    }
}

/// Ante chain, message router and post chain, in that order
struct TxPipeline {
    ante: AnteHandler,
    router: Router,
    post: PostHandler,
}

impl TxPipeline {
    fn run(&self, ctx: &mut Context<'_>, tx: &Tx) -> Result<Vec<MsgResult>> {
        self.ante.handle(ctx, tx)?;

        let results = ctx.atomic(|ctx| {
            tx.body
                .msgs
                .iter()
                .map(|msg| {
                    let data = self.router.dispatch(ctx, msg)?;
                    Ok(MsgResult {
                        msg_type: msg.type_url().to_string(),
                        data,
                    })
                })
                .collect::<Result<Vec<_>>>()
        })?;

        self.post.handle(ctx, tx, &results)?;
        Ok(results)
    }
}

pub struct App<S: KvStore> {
    store: S,
    keeper: Keeper,
    chain_id: String,
    gas: GasConfig,
    pipeline: TxPipeline,
}

impl<S: KvStore> App<S> {
    pub fn new(store: S, keeper: Keeper, chain_id: &str, gas: GasConfig) -> Self {
        let pipeline = TxPipeline {
            ante: AnteHandler::with_keeper(keeper.clone()),
            router: Router::new(keeper.clone()),
            post: PostHandler::with_keeper(keeper.clone()),
        };

        Self {
            store,
            keeper,
            chain_id: chain_id.to_string(),
            gas,
            pipeline,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn keeper(&self) -> &Keeper {
        &self.keeper
    }

    /// Runs `f` outside any transaction, with unlimited gas. Writes are
    /// committed only if `f` succeeds. Used for genesis and migrations.
    pub fn apply<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Context<'_>, &Keeper) -> Result<T>,
    {
        let mut meter = GasMeter::infinite();
        let mut ctx = Context::new(&mut self.store, &mut meter, &self.chain_id, false);
        let out = f(&mut ctx, &self.keeper)?;
        ctx.commit()?;
        Ok(out)
    }

    /// Executes `tx`. Either all of its effects, fee and sequence included,
    /// are committed, or none are.
    pub fn deliver_tx(&mut self, tx: &Tx) -> Result<TxResult> {
        let gas_limit = match tx.gas_limit() {
            0 => self.gas.default_tx_gas_limit,
            limit => limit,
        };
        self.run_tx(tx, gas_limit, false)
    }

    /// Executes `tx` against a throwaway branch to estimate its gas
    pub fn simulate_tx(&mut self, tx: &Tx) -> Result<TxResult> {
        self.run_tx(tx, self.gas.simulation_gas_limit, true)
    }

    fn run_tx(&mut self, tx: &Tx, gas_limit: Gas, simulate: bool) -> Result<TxResult> {
        let mut meter = GasMeter::new(gas_limit);
        let mut ctx = Context::new(&mut self.store, &mut meter, &self.chain_id, simulate);

        let msg_results = match self.pipeline.run(&mut ctx, tx) {
            Ok(results) => results,
            Err(err) => {
                drop(ctx);
                warn!(
                    error = %err,
                    class = ?err.class(),
                    gas_used = meter.consumed(),
                    simulate,
                    "tx rejected"
                );
                return Err(err);
            }
        };

        let events = if simulate {
            let events = ctx.events().to_vec();
            drop(ctx);
            events
        } else {
            ctx.commit()?
        };

        debug!(gas_wanted = gas_limit, gas_used = meter.consumed(), simulate, "tx executed");
        Ok(TxResult {
            gas_wanted: gas_limit,
            gas_used: meter.consumed(),
            events,
            msg_results,
        })
    }
}
