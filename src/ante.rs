//! Pre-execution decorator chain.
//!
//! Decorators run in order against the transaction's context and any error
//! aborts the chain. [`BeforeTxDecorator`] takes the slot of the standard
//! signature verifier: standard accounts are verified as usual, abstract
//! accounts are authenticated by a call into their contract.

use tracing::debug;

use crate::account::{Account, AccountStore, BalanceStore, PubKey};
use crate::context::Context;
use crate::error::{AbstractAccountError, Result};
use crate::gas::Gas;
use crate::keeper::Keeper;
use crate::sudo::AccountSudoMsg;
use crate::tx::{SignerInfo, Tx};

pub const MAX_MEMO_CHARACTERS: usize = 256;
pub const TX_SIG_LIMIT: usize = 7;
pub const TX_SIZE_COST_PER_BYTE: Gas = 10;
pub const SIG_VERIFY_COST_ED25519: Gas = 590;
pub const FEE_COLLECTOR: &str = "fee_collector";

pub trait AnteDecorator {
    fn ante_handle(&self, ctx: &mut Context<'_>, tx: &Tx) -> Result<()>;
}

/// Ordered chain of decorators
pub struct AnteHandler {
    decorators: Vec<Box<dyn AnteDecorator>>,
}

impl AnteHandler {
    pub fn new(decorators: Vec<Box<dyn AnteDecorator>>) -> Self {
        Self { decorators }
    }

    /// Standard chain with the abstract account authenticator in place of
    /// signature verification
    pub fn with_keeper(keeper: Keeper) -> Self {
        Self::new(vec![
            Box::new(ValidateBasicDecorator),
            Box::new(ValidateMemoDecorator),
            Box::new(ConsumeTxSizeGasDecorator),
            Box::new(DeductFeeDecorator::new()),
            Box::new(SetPubKeyDecorator::new()),
            Box::new(ValidateSigCountDecorator),
            Box::new(SigGasConsumeDecorator::new()),
            Box::new(BeforeTxDecorator::new(keeper)),
            Box::new(IncrementSequenceDecorator::new()),
        ])
    }

    pub fn handle(&self, ctx: &mut Context<'_>, tx: &Tx) -> Result<()> {
        for decorator in &self.decorators {
            decorator.ante_handle(ctx, tx)?;
        }
        Ok(())
    }
}

// ----------------------------- Host decorators -----------------------------

pub struct ValidateBasicDecorator;

impl AnteDecorator for ValidateBasicDecorator {
    fn ante_handle(&self, _ctx: &mut Context<'_>, tx: &Tx) -> Result<()> {
        if tx.body.msgs.is_empty() {
            return Err(AbstractAccountError::InvalidRequest("tx contains no messages".to_string()));
        }
        for msg in &tx.body.msgs {
            msg.validate_basic()?;
        }

        let signers = tx.signers().len();
        if tx.signatures.len() != signers || tx.auth_info.signer_infos.len() != signers {
            return Err(AbstractAccountError::InvalidRequest(format!(
                "expected {} signatures and signer infos, got {} and {}",
                signers,
                tx.signatures.len(),
                tx.auth_info.signer_infos.len()
            )));
        }
        Ok(())
    }
}

pub struct ValidateMemoDecorator;

impl AnteDecorator for ValidateMemoDecorator {
    fn ante_handle(&self, _ctx: &mut Context<'_>, tx: &Tx) -> Result<()> {
        let len = tx.body.memo.chars().count();
        if len > MAX_MEMO_CHARACTERS {
            return Err(AbstractAccountError::InvalidRequest(format!(
                "memo too long: {} > {}",
                len, MAX_MEMO_CHARACTERS
            )));
        }
        Ok(())
    }
}

pub struct ConsumeTxSizeGasDecorator;

impl AnteDecorator for ConsumeTxSizeGasDecorator {
    fn ante_handle(&self, ctx: &mut Context<'_>, tx: &Tx) -> Result<()> {
        let size = tx.to_bytes()?.len() as Gas;
        ctx.consume_gas(size.saturating_mul(TX_SIZE_COST_PER_BYTE), "tx size")
    }
}

pub struct DeductFeeDecorator {
    accounts: AccountStore,
    balances: BalanceStore,
}

impl DeductFeeDecorator {
    pub fn new() -> Self {
        Self {
            accounts: AccountStore::new(),
            balances: BalanceStore::new(),
        }
    }
}

impl AnteDecorator for DeductFeeDecorator {
    fn ante_handle(&self, ctx: &mut Context<'_>, tx: &Tx) -> Result<()> {
        let payer = tx
            .fee_payer()
            .ok_or_else(|| AbstractAccountError::InvalidRequest("no fee payer".to_string()))?;
        if !self.accounts.has_account(ctx.store(), &payer)? {
            return Err(AbstractAccountError::AccountNotFound(payer));
        }

        self.balances
            .transfer(ctx.store_mut(), &payer, FEE_COLLECTOR, &tx.auth_info.fee.amount)
    }
}

/// Records the public key of a standard account the first time it signs
pub struct SetPubKeyDecorator {
    accounts: AccountStore,
}

impl SetPubKeyDecorator {
    pub fn new() -> Self {
        Self {
            accounts: AccountStore::new(),
        }
    }
}

impl AnteDecorator for SetPubKeyDecorator {
    fn ante_handle(&self, ctx: &mut Context<'_>, tx: &Tx) -> Result<()> {
        for (signer, info) in tx.signers().iter().zip(&tx.auth_info.signer_infos) {
            let Some(pk) = &info.public_key else {
                continue;
            };

            let mut base = match self.accounts.must_get_account(ctx.store(), signer)? {
                Account::Base(base) if base.pub_key.is_none() => base,
                // abstract accounts keep the nil key for good
                _ => continue,
            };
            if pk.address().as_ref() != Some(signer) {
                return Err(AbstractAccountError::InvalidPubKey(signer.clone()));
            }

            base.pub_key = Some(pk.clone());
            self.accounts.set_account(ctx.store_mut(), &Account::Base(base))?;
        }
        Ok(())
    }
}

pub struct ValidateSigCountDecorator;

impl AnteDecorator for ValidateSigCountDecorator {
    fn ante_handle(&self, _ctx: &mut Context<'_>, tx: &Tx) -> Result<()> {
        if tx.signatures.len() > TX_SIG_LIMIT {
            return Err(AbstractAccountError::InvalidRequest(format!(
                "too many signatures: {} > {}",
                tx.signatures.len(),
                TX_SIG_LIMIT
            )));
        }
        Ok(())
    }
}

/// Gas charged for verifying one signature with `pub_key`
pub fn sig_verification_gas(pub_key: &PubKey) -> Gas {
    match pub_key {
        PubKey::Ed25519(_) => SIG_VERIFY_COST_ED25519,
        // nothing to verify; the contract call pays for itself
        PubKey::Nil => 0,
    }
}

pub struct SigGasConsumeDecorator {
    accounts: AccountStore,
}

impl SigGasConsumeDecorator {
    pub fn new() -> Self {
        Self {
            accounts: AccountStore::new(),
        }
    }
}

impl AnteDecorator for SigGasConsumeDecorator {
    fn ante_handle(&self, ctx: &mut Context<'_>, tx: &Tx) -> Result<()> {
        for signer in tx.signers() {
            let account = self.accounts.must_get_account(ctx.store(), &signer)?;
            let pub_key = match account.pub_key() {
                Some(pk) => pk,
                // estimate as if the key were set
                None if ctx.is_simulation() => PubKey::Ed25519(Vec::new()),
                None => return Err(AbstractAccountError::InvalidPubKey(signer)),
            };
            ctx.consume_gas(sig_verification_gas(&pub_key), "signature verification")?;
        }
        Ok(())
    }
}

// ------------------------------- Authentication ------------------------------

/// Standard verification of one signer: sequence check, then the signature
/// against the account's key. Signatures are not checked in simulation.
pub fn verify_signer(
    ctx: &Context<'_>,
    tx: &Tx,
    account: &Account,
    info: &SignerInfo,
    signature: &[u8],
) -> Result<()> {
    check_sequence(account, info)?;

    if ctx.is_simulation() {
        return Ok(());
    }

    let pub_key = account
        .pub_key()
        .ok_or_else(|| AbstractAccountError::InvalidPubKey(account.address().clone()))?;
    let sign_bytes = tx.sign_bytes(ctx.chain_id(), account.account_number())?;
    if !pub_key.verify(&sign_bytes, signature) {
        return Err(AbstractAccountError::InvalidSignature(account.address().clone()));
    }
    Ok(())
}

fn check_sequence(account: &Account, info: &SignerInfo) -> Result<()> {
    if info.sequence != account.sequence() {
        return Err(AbstractAccountError::WrongSequence {
            address: account.address().clone(),
            expected: account.sequence(),
            got: info.sequence,
        });
    }
    Ok(())
}

/// Authenticates every signer, in signer order. Abstract accounts are sent
/// a `before_tx` call instead of having their signature verified.
pub struct BeforeTxDecorator {
    keeper: Keeper,
    accounts: AccountStore,
}

impl BeforeTxDecorator {
    pub fn new(keeper: Keeper) -> Self {
        Self {
            keeper,
            accounts: AccountStore::new(),
        }
    }
}

impl AnteDecorator for BeforeTxDecorator {
    fn ante_handle(&self, ctx: &mut Context<'_>, tx: &Tx) -> Result<()> {
        let signers = tx.signers();
        let tx_bytes = hex::encode(tx.to_bytes()?);

        for (i, signer) in signers.iter().enumerate() {
            let account = self.accounts.must_get_account(ctx.store(), signer)?;
            let info = &tx.auth_info.signer_infos[i];
            let signature = &tx.signatures[i];

            let abs = match &account {
                Account::Base(_) => {
                    verify_signer(ctx, tx, &account, info, signature)?;
                    continue;
                }
                Account::Abstract(abs) => abs,
            };

            check_sequence(&account, info)?;

            let sign_bytes = tx.sign_bytes(ctx.chain_id(), account.account_number())?;
            let msg = AccountSudoMsg::BeforeTx {
                msgs: tx.body.msgs.clone(),
                tx_bytes: tx_bytes.clone(),
                sign_bytes: hex::encode(sign_bytes),
                cred_bytes: (!signature.is_empty()).then(|| hex::encode(signature)),
                simulate: ctx.is_simulation(),
            };

            let params = self.keeper.get_params(ctx.store())?;
            self.keeper
                .sudo_with_gas_limit(ctx, abs.contract(), &msg, params.max_gas_before)?;
            debug!(account = %abs.address, "abstract account authenticated");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------

pub struct IncrementSequenceDecorator {
    accounts: AccountStore,
}

impl IncrementSequenceDecorator {
    pub fn new() -> Self {
        Self {
            accounts: AccountStore::new(),
        }
    }
}

impl AnteDecorator for IncrementSequenceDecorator {
    fn ante_handle(&self, ctx: &mut Context<'_>, tx: &Tx) -> Result<()> {
        for signer in tx.signers() {
            self.accounts.increment_sequence(ctx.store_mut(), &signer)?;
        }
        Ok(())
    }
}
