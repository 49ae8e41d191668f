//! Per-transaction execution context.

use crate::error::Result;
use crate::events::Event;
use crate::gas::{Gas, GasMeter};
use crate::storage::{BranchStore, KvStore};

/// Everything a handler sees while a transaction executes: a branch of the
/// state, the transaction's gas meter, the simulation flag and the events
/// emitted so far.
///
/// A child context from [`Context::branch`] shares the gas meter with its
/// parent but keeps its own writes and events until [`Context::commit`].
pub struct Context<'a> {
    store: BranchStore<'a>,
    gas: &'a mut GasMeter,
    chain_id: String,
    simulate: bool,
    events: Vec<Event>,
}

impl<'a> Context<'a> {
    pub fn new(
        parent: &'a mut dyn KvStore,
        gas: &'a mut GasMeter,
        chain_id: &str,
        simulate: bool,
    ) -> Self {
        Self {
            store: BranchStore::new(parent),
            gas,
            chain_id: chain_id.to_string(),
            simulate,
            events: Vec::new(),
        }
    }

    pub fn store(&self) -> &dyn KvStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut dyn KvStore {
        &mut self.store
    }

    pub fn gas_meter(&self) -> &GasMeter {
        &*self.gas
    }

    pub fn consume_gas(&mut self, amount: Gas, descriptor: &str) -> Result<()> {
        self.gas.consume(amount, descriptor)
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn is_simulation(&self) -> bool {
        self.simulate
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn branch(&mut self) -> Context<'_> {
        Context {
            store: BranchStore::new(&mut self.store),
            gas: &mut *self.gas,
            chain_id: self.chain_id.clone(),
            simulate: self.simulate,
            events: Vec::new(),
        }
    }

    /// Merges writes into the parent store and hands back the events.
    pub fn commit(self) -> Result<Vec<Event>> {
        self.store.commit()?;
        Ok(self.events)
    }

    /// Runs `f` in a child branch that is merged only if `f` succeeds.
    pub fn atomic<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Context<'_>) -> Result<T>,
    {
        let mut child = self.branch();
        let out = f(&mut child)?;
        let events = child.commit()?;
        self.events.extend(events);
        Ok(out)
    }
}
