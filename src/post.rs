//! Post-execution decorator chain. Runs only after every message of the
//! transaction succeeded; an error here voids the whole transaction.

use crate::account::{Account, AccountStore};
use crate::context::Context;
use crate::error::Result;
use crate::keeper::Keeper;
use crate::sudo::{AccountSudoMsg, MsgOutcome};
use crate::tx::{MsgResult, Tx};

pub trait PostDecorator {
    fn post_handle(&self, ctx: &mut Context<'_>, tx: &Tx, results: &[MsgResult]) -> Result<()>;
}

pub struct PostHandler {
    decorators: Vec<Box<dyn PostDecorator>>,
}

impl PostHandler {
    pub fn new(decorators: Vec<Box<dyn PostDecorator>>) -> Self {
        Self { decorators }
    }

    pub fn with_keeper(keeper: Keeper) -> Self {
        Self::new(vec![Box::new(AfterTxDecorator::new(keeper))])
    }

    pub fn handle(&self, ctx: &mut Context<'_>, tx: &Tx, results: &[MsgResult]) -> Result<()> {
        for decorator in &self.decorators {
            decorator.post_handle(ctx, tx, results)?;
        }
        Ok(())
    }
}

/// Gives every abstract signer an `after_tx` call with the message outcomes
pub struct AfterTxDecorator {
    keeper: Keeper,
    accounts: AccountStore,
}

impl AfterTxDecorator {
    pub fn new(keeper: Keeper) -> Self {
        Self {
            keeper,
            accounts: AccountStore::new(),
        }
    }
}

impl PostDecorator for AfterTxDecorator {
    fn post_handle(&self, ctx: &mut Context<'_>, tx: &Tx, results: &[MsgResult]) -> Result<()> {
        if ctx.is_simulation() {
            return Ok(());
        }

        let outcomes: Vec<MsgOutcome> = results.iter().map(MsgOutcome::from).collect();
        for signer in tx.signers() {
            let account = self.accounts.must_get_account(ctx.store(), &signer)?;
            let Account::Abstract(abs) = account else {
                continue;
            };

            let msg = AccountSudoMsg::AfterTx {
                simulate: false,
                outcomes: outcomes.clone(),
            };
            let params = self.keeper.get_params(ctx.store())?;
            self.keeper
                .sudo_with_gas_limit(ctx, abs.contract(), &msg, params.max_gas_after)?;
        }
        Ok(())
    }
}
