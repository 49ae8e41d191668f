//! Messages the chain sends to an account's contract

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tx::{Msg, MsgResult};

pub const BEFORE_TX: &str = "before_tx";
pub const AFTER_TX: &str = "after_tx";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MsgOutcome {
    pub msg_type: String,
    /// hex
    pub data: String,
}

impl From<&MsgResult> for MsgOutcome {
    fn from(res: &MsgResult) -> Self {
        Self {
            msg_type: res.msg_type.clone(),
            data: hex::encode(&res.data),
        }
    }
}

/// JSON payload of a privileged call into an account contract.
///
/// Byte fields are hex encoded.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccountSudoMsg {
    BeforeTx {
        msgs: Vec<Msg>,
        tx_bytes: String,
        sign_bytes: String,
        cred_bytes: Option<String>,
        simulate: bool,
    },
    AfterTx {
        simulate: bool,
        outcomes: Vec<MsgOutcome>,
    },
}

impl AccountSudoMsg {
    pub fn entry_point(&self) -> &'static str {
        match self {
            AccountSudoMsg::BeforeTx { .. } => BEFORE_TX,
            AccountSudoMsg::AfterTx { .. } => AFTER_TX,
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}
