//! Transactions and the messages they carry

use serde::{Deserialize, Serialize};

use crate::account::{Address, Coin, PubKey};
use crate::encoding::CanonicalEncode;
use crate::error::{AbstractAccountError, Result};
use crate::params::Params;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MsgUpdateParams {
    pub sender: Address,
    pub params: Params,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MsgRegisterAccount {
    pub sender: Address,
    pub code_id: u64,
    /// Instantiation message handed to the contract as-is
    pub msg: Vec<u8>,
    pub funds: Vec<Coin>,
    pub salt: Vec<u8>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MsgRegisterAccountResponse {
    pub address: Address,
    pub data: Vec<u8>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MsgSend {
    pub from_address: Address,
    pub to_address: Address,
    pub amount: Vec<Coin>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MsgStoreCode {
    pub sender: Address,
    pub wasm_byte_code: Vec<u8>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum Msg {
    UpdateParams(MsgUpdateParams),
    RegisterAccount(MsgRegisterAccount),
    Send(MsgSend),
    StoreCode(MsgStoreCode),
}

impl Msg {
    pub fn type_url(&self) -> &'static str {
        match self {
            Msg::UpdateParams(_) => "/abstractaccount.v1.MsgUpdateParams",
            Msg::RegisterAccount(_) => "/abstractaccount.v1.MsgRegisterAccount",
            Msg::Send(_) => "/bank.v1.MsgSend",
            Msg::StoreCode(_) => "/wasm.v1.MsgStoreCode",
        }
    }

    /// The address that must sign for this message
    pub fn signer(&self) -> &Address {
        match self {
            Msg::UpdateParams(m) => &m.sender,
            Msg::RegisterAccount(m) => &m.sender,
            Msg::Send(m) => &m.from_address,
            Msg::StoreCode(m) => &m.sender,
        }
    }

    /// Stateless checks
    pub fn validate_basic(&self) -> Result<()> {
        if self.signer().is_empty() {
            return Err(AbstractAccountError::InvalidRequest(format!(
                "{}: empty sender",
                self.type_url()
            )));
        }

        match self {
            Msg::RegisterAccount(m) if m.code_id == 0 => Err(AbstractAccountError::InvalidRequest(
                "code id must be non-zero".to_string(),
            )),
            Msg::Send(m) if m.to_address.is_empty() => Err(AbstractAccountError::InvalidRequest(
                "empty recipient".to_string(),
            )),
            Msg::StoreCode(m) if m.wasm_byte_code.is_empty() => Err(
                AbstractAccountError::InvalidRequest("empty wasm code".to_string()),
            ),
            _ => Ok(()),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Fee {
    pub amount: Vec<Coin>,
    pub gas_limit: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SignerInfo {
    /// Only needed the first time a base account signs
    pub public_key: Option<PubKey>,
    pub sequence: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AuthInfo {
    pub signer_infos: Vec<SignerInfo>,
    pub fee: Fee,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TxBody {
    pub msgs: Vec<Msg>,
    pub memo: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Tx {
    pub body: TxBody,
    pub auth_info: AuthInfo,
    /// One credential per signer, in signer order
    pub signatures: Vec<Vec<u8>>,
}

/// The bytes a signer commits to
pub struct SignDoc {
    pub body_bytes: Vec<u8>,
    pub auth_info_bytes: Vec<u8>,
    pub chain_id: String,
    pub account_number: u64,
}

impl CanonicalEncode for SignDoc {
    fn encode_to(&self, out: &mut Vec<u8>) {
        self.body_bytes.encode_to(out);
        self.auth_info_bytes.encode_to(out);
        self.chain_id.encode_to(out);
        self.account_number.encode_to(out);
    }
}

/// Outcome of one executed message, handed to `after_tx`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MsgResult {
    pub msg_type: String,
    pub data: Vec<u8>,
}

impl Tx {
    pub fn new(msgs: Vec<Msg>, memo: &str, fee: Fee) -> Self {
        Self {
            body: TxBody {
                msgs,
                memo: memo.to_string(),
            },
            auth_info: AuthInfo {
                signer_infos: Vec::new(),
                fee,
            },
            signatures: Vec::new(),
        }
    }

    /// Unique message signers, in order of first appearance
    pub fn signers(&self) -> Vec<Address> {
        let mut signers: Vec<Address> = Vec::new();
        for msg in &self.body.msgs {
            let signer = msg.signer();
            if !signers.contains(signer) {
                signers.push(signer.clone());
            }
        }
        signers
    }

    /// First signer pays the fee
    pub fn fee_payer(&self) -> Option<Address> {
        self.body.msgs.first().map(|msg| msg.signer().clone())
    }

    pub fn gas_limit(&self) -> u64 {
        self.auth_info.fee.gas_limit
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn sign_bytes(&self, chain_id: &str, account_number: u64) -> Result<Vec<u8>> {
        let doc = SignDoc {
            body_bytes: bincode::serialize(&self.body)?,
            auth_info_bytes: bincode::serialize(&self.auth_info)?,
            chain_id: chain_id.to_string(),
            account_number,
        };
        Ok(doc.canonical_bytes())
    }
}
