//! Handlers for the module's messages

use tracing::info;

use crate::account::{AbstractAccount, Account, AccountStore};
use crate::context::Context;
use crate::error::{AbstractAccountError, Result};
use crate::events::{Event, EventAccountRegistered};
use crate::keeper::{Keeper, MODULE_NAME};
use crate::tx::{MsgRegisterAccount, MsgRegisterAccountResponse, MsgUpdateParams};
use crate::vm::InstantiateRequest;

pub struct MsgServer<'k> {
    keeper: &'k Keeper,
    accounts: AccountStore,
}

impl<'k> MsgServer<'k> {
    pub fn new(keeper: &'k Keeper) -> Self {
        Self {
            keeper,
            accounts: AccountStore::new(),
        }
    }

    // ----------------------------- UpdateParams ------------------------------

    pub fn update_params(&self, ctx: &mut Context<'_>, req: &MsgUpdateParams) -> Result<()> {
        if req.sender != self.keeper.authority() {
            return Err(AbstractAccountError::Unauthorized {
                expected: self.keeper.authority().to_string(),
                found: req.sender.clone(),
            });
        }

        self.keeper.set_params(ctx.store_mut(), &req.params)?;
        self.keeper.log_params_updated(&req.params);
        ctx.emit(Event::ParamsUpdated {
            authority: req.sender.clone(),
        });
        Ok(())
    }

    // ---------------------------- RegisterAccount ----------------------------

    pub fn register_account(
        &self,
        ctx: &mut Context<'_>,
        req: &MsgRegisterAccount,
    ) -> Result<MsgRegisterAccountResponse> {
        let params = self.keeper.get_params(ctx.store())?;
        if !params.is_allowed(req.code_id) {
            return Err(AbstractAccountError::NotAllowedCodeId(req.code_id));
        }

        info!(
            code_id = req.code_id,
            sender = %req.sender,
            funds = ?req.funds,
            salt = %hex::encode(&req.salt),
            "registering account"
        );

        // consumed even if the rest of the registration fails
        let account_id = self.keeper.get_and_increment_next_account_id(ctx.store_mut())?;
        let label = format!("{}/{}", MODULE_NAME, account_id);

        let (contract_addr, data) = ctx.atomic(|ctx| {
            let runtime = self.keeper.runtime();
            let (contract_addr, data) = runtime.instantiate(
                ctx,
                InstantiateRequest {
                    code_id: req.code_id,
                    creator: &req.sender,
                    admin: Some(&req.sender),
                    msg: &req.msg,
                    label: &label,
                    funds: &req.funds,
                    salt: &req.salt,
                },
            )?;

            // the contract administers itself so nobody can migrate it
            runtime.set_admin(ctx, &contract_addr, &req.sender, &contract_addr)?;

            // instantiation should have created a base account
            let base = match self.accounts.must_get_account(ctx.store(), &contract_addr)? {
                Account::Base(base) => base,
                Account::Abstract(_) => {
                    return Err(AbstractAccountError::NotBaseAccount(contract_addr));
                }
            };
            let account = Account::Abstract(AbstractAccount::from_base(base));
            self.accounts.set_account(ctx.store_mut(), &account)?;

            ctx.emit(Event::AccountRegistered(EventAccountRegistered {
                creator: req.sender.clone(),
                code_id: req.code_id,
                contract_addr: contract_addr.clone(),
            }));
            Ok((contract_addr, data))
        })?;

        info!(
            creator = %req.sender,
            code_id = req.code_id,
            contract_addr = %contract_addr,
            "account registered"
        );

        Ok(MsgRegisterAccountResponse {
            address: contract_addr,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::account::{Address, BalanceStore, Coin};
    use crate::error::ErrorClass;
    use crate::gas::{Gas, GasMeter};
    use crate::params::{Params, DEFAULT_MAX_GAS};
    use crate::storage::{KvStore, MemStore};
    use crate::testing::{self, wasm, ACCEPT_ALL, AUTHORITY, DENOM, REJECT_INSTANTIATE};
    use crate::vm::{derive_address, ContractInfo, ContractRuntime};

    /// Runtime whose instantiation leaves an abstract account behind instead
    /// of a base account.
    struct AbstractingRuntime;

    impl ContractRuntime for AbstractingRuntime {
        fn store_code(&self, _ctx: &mut Context<'_>, _creator: &str, _wasm: &[u8]) -> Result<u64> {
            Ok(1)
        }

        fn instantiate(
            &self,
            ctx: &mut Context<'_>,
            req: InstantiateRequest<'_>,
        ) -> Result<(Address, Vec<u8>)> {
            let address = derive_address(req.code_id, req.creator, req.salt);
            BalanceStore::new().transfer(ctx.store_mut(), req.creator, &address, req.funds)?;
            let account = AbstractAccount::new(address.clone(), 0, 0);
            AccountStore::new().set_account(ctx.store_mut(), &Account::Abstract(account))?;
            Ok((address, vec![]))
        }

        fn set_admin(
            &self,
            _ctx: &mut Context<'_>,
            _contract: &str,
            _current_admin: &str,
            _new_admin: &str,
        ) -> Result<()> {
            Ok(())
        }

        fn invoke(
            &self,
            _ctx: &mut Context<'_>,
            _contract: &str,
            _entry_point: &str,
            _payload: &[u8],
            _gas_limit: Gas,
        ) -> Result<Vec<u8>> {
            Ok(vec![])
        }

        fn contract_info(
            &self,
            _store: &dyn KvStore,
            _contract: &str,
        ) -> Result<Option<ContractInfo>> {
            Ok(None)
        }
    }

    const USER: &str = "user";
    const USER_INITIAL_BALANCE: u64 = 123_456;
    const REGISTER_FUNDS: u64 = 88_888;

    fn setup() -> (MemStore, Keeper, u64) {
        let mut store = MemStore::new();
        let keeper = testing::keeper();
        let mut meter = GasMeter::infinite();
        let mut ctx = Context::new(&mut store, &mut meter, testing::CHAIN_ID, false);

        BalanceStore::new()
            .credit(ctx.store_mut(), USER, &Coin::new(USER_INITIAL_BALANCE, DENOM))
            .unwrap();
        let code_id = keeper
            .runtime()
            .store_code(&mut ctx, USER, &wasm(ACCEPT_ALL))
            .unwrap();
        ctx.commit().unwrap();

        (store, keeper, code_id)
    }

    fn register_msg(code_id: u64) -> MsgRegisterAccount {
        MsgRegisterAccount {
            sender: USER.to_string(),
            code_id,
            msg: br#"{"pubkey":"abcd"}"#.to_vec(),
            funds: vec![Coin::new(REGISTER_FUNDS, DENOM)],
            salt: b"hello".to_vec(),
        }
    }

    #[test]
    fn test_update_params() {
        let cases = vec![
            ("sender is not authority", USER, Params::default(), true),
            (
                "invalid params",
                AUTHORITY,
                Params { max_gas_before: 88888, max_gas_after: 0, ..Params::default() },
                true,
            ),
            (
                "sender is authority and params are valid",
                AUTHORITY,
                Params { max_gas_before: 88888, max_gas_after: 99999, ..Params::default() },
                false,
            ),
        ];

        for (desc, sender, new_params, exp_err) in cases {
            let (mut store, keeper, _) = setup();
            let params_before = keeper.get_params(&store).unwrap();
            let store_before = store.clone();

            let mut meter = GasMeter::infinite();
            let mut ctx = Context::new(&mut store, &mut meter, testing::CHAIN_ID, false);
            let res = MsgServer::new(&keeper).update_params(
                &mut ctx,
                &MsgUpdateParams { sender: sender.to_string(), params: new_params.clone() },
            );
            ctx.commit().unwrap();

            let params_after = keeper.get_params(&store).unwrap();
            if exp_err {
                assert!(res.is_err(), "{}", desc);
                assert_eq!(params_before, params_after, "{}", desc);
                assert_eq!(store, store_before, "{}", desc);
            } else {
                assert!(res.is_ok(), "{}", desc);
                assert_eq!(new_params, params_after, "{}", desc);
            }
        }
    }

    #[test]
    fn test_update_params_unauthorized_is_policy_violation() {
        let (mut store, keeper, _) = setup();
        let mut meter = GasMeter::infinite();
        let mut ctx = Context::new(&mut store, &mut meter, testing::CHAIN_ID, false);

        let err = MsgServer::new(&keeper)
            .update_params(
                &mut ctx,
                &MsgUpdateParams {
                    sender: USER.to_string(),
                    params: Params::default(),
                },
            )
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::PolicyViolation);
    }

    #[test]
    fn test_register_account() {
        let cases = vec![
            (true, vec![], true),
            (false, vec![1, 69, 420], true),
            (false, vec![69, 420], false),
        ];

        for (allow_all, allowed, exp_ok) in cases {
            let (mut store, keeper, code_id) = setup();
            assert_eq!(code_id, 1);
            let params = Params::new(allow_all, allowed, DEFAULT_MAX_GAS, DEFAULT_MAX_GAS).unwrap();
            keeper.set_params(&mut store, &params).unwrap();

            let mut meter = GasMeter::infinite();
            let mut ctx = Context::new(&mut store, &mut meter, testing::CHAIN_ID, false);
            let res = MsgServer::new(&keeper).register_account(&mut ctx, &register_msg(code_id));
            let events = ctx.commit().unwrap();

            let bank = BalanceStore::new();
            if !exp_ok {
                let err = res.unwrap_err();
                assert_eq!(err, AbstractAccountError::NotAllowedCodeId(code_id));
                assert_eq!(err.class(), ErrorClass::PolicyViolation);
                assert_eq!(bank.get_balance(&store, USER, DENOM).unwrap(), USER_INITIAL_BALANCE);
                assert!(events.is_empty());
                continue;
            }

            let res = res.unwrap();
            let addr = res.address.clone();
            assert_eq!(addr, derive_address(code_id, USER, b"hello"));
            assert_eq!(res.data, b"hello".to_vec());

            // contract info is correct
            let info = keeper.runtime().contract_info(&store, &addr).unwrap().unwrap();
            assert_eq!(info.code_id, code_id);
            assert_eq!(info.creator, USER);
            assert_eq!(info.admin.as_ref(), Some(&addr));
            assert_eq!(
                info.label,
                format!("{}/{}", MODULE_NAME, keeper.get_next_account_id(&store).unwrap() - 1)
            );

            // an abstract account has been created
            let account = AccountStore::new().must_get_account(&store, &addr).unwrap();
            assert!(account.is_abstract());
            assert_eq!(account.sequence(), 0);

            // funds moved from the user to the contract
            assert_eq!(bank.get_balance(&store, &addr, DENOM).unwrap(), REGISTER_FUNDS);
            assert_eq!(
                bank.get_balance(&store, USER, DENOM).unwrap(),
                USER_INITIAL_BALANCE - REGISTER_FUNDS
            );

            assert!(events.contains(&Event::AccountRegistered(EventAccountRegistered {
                creator: USER.to_string(),
                code_id,
                contract_addr: addr.clone(),
            })));
        }
    }

    #[test]
    fn test_failed_registration_consumes_account_id() {
        let (mut store, keeper, _) = setup();

        let mut meter = GasMeter::infinite();
        let mut ctx = Context::new(&mut store, &mut meter, testing::CHAIN_ID, false);
        let reject_id = keeper
            .runtime()
            .store_code(&mut ctx, USER, &wasm(REJECT_INSTANTIATE))
            .unwrap();

        let server = MsgServer::new(&keeper);
        let err = server.register_account(&mut ctx, &register_msg(reject_id)).unwrap_err();
        assert_eq!(err.class(), ErrorClass::DelegatedLogicFailure);
        assert!(ctx.events().is_empty());
        ctx.commit().unwrap();

        // nothing moved, but the id is gone
        let bank = BalanceStore::new();
        assert_eq!(bank.get_balance(&store, USER, DENOM).unwrap(), USER_INITIAL_BALANCE);
        let addr = derive_address(reject_id, USER, b"hello");
        assert!(AccountStore::new().get_account(&store, &addr).unwrap().is_none());
        assert_eq!(keeper.get_next_account_id(&store).unwrap(), 2);
    }

    #[test]
    fn test_register_rejects_existing_non_base_account() {
        let (mut store, keeper, code_id) = setup();
        let addr = derive_address(code_id, USER, b"hello");
        AccountStore::new()
            .set_account(&mut store, &Account::Abstract(AbstractAccount::new(addr.clone(), 99, 0)))
            .unwrap();

        let mut meter = GasMeter::infinite();
        let mut ctx = Context::new(&mut store, &mut meter, testing::CHAIN_ID, false);
        let err = MsgServer::new(&keeper)
            .register_account(&mut ctx, &register_msg(code_id))
            .unwrap_err();
        assert!(matches!(err, AbstractAccountError::DuplicateContract(_)));
    }

    #[test]
    fn test_register_requires_base_account_after_instantiation() {
        let mut store = MemStore::new();
        let keeper = Keeper::new(AUTHORITY, Arc::new(AbstractingRuntime));
        BalanceStore::new()
            .credit(&mut store, USER, &Coin::new(USER_INITIAL_BALANCE, DENOM))
            .unwrap();

        let mut meter = GasMeter::infinite();
        let mut ctx = Context::new(&mut store, &mut meter, testing::CHAIN_ID, false);
        let err = MsgServer::new(&keeper)
            .register_account(&mut ctx, &register_msg(1))
            .unwrap_err();

        let addr = derive_address(1, USER, b"hello");
        assert_eq!(err, AbstractAccountError::NotBaseAccount(addr.clone()));
        assert_eq!(err.class(), ErrorClass::InvariantViolation);
        assert!(ctx.events().is_empty());
        ctx.commit().unwrap();

        let bank = BalanceStore::new();
        assert_eq!(bank.get_balance(&store, USER, DENOM).unwrap(), USER_INITIAL_BALANCE);
        assert_eq!(bank.get_balance(&store, &addr, DENOM).unwrap(), 0);
        assert!(AccountStore::new().get_account(&store, &addr).unwrap().is_none());
        assert_eq!(keeper.get_next_account_id(&store).unwrap(), 2);
    }
}
