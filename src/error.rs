use thiserror::Error;

pub type Result<T> = std::result::Result<T, AbstractAccountError>;

/// Coarse category of an error, so clients can tell a policy rejection apart
/// from a rejection by the account's own code or from gas exhaustion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    PolicyViolation,
    InvariantViolation,
    MalformedConfiguration,
    DelegatedLogicFailure,
    ResourceExhaustion,
    Host,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbstractAccountError {
    #[error("sender is not authority: expect {expected}, found {found}")]
    Unauthorized { expected: String, found: String },
    #[error("code id {0} is not allowed to be used to register accounts")]
    NotAllowedCodeId(u64),
    #[error("max gas must be non-zero")]
    ZeroMaxGas,
    #[error("allow list must be empty when all code ids are allowed")]
    NonEmptyAllowList,
    #[error("allow list must contain non-zero, unique and sorted code ids")]
    MalformedAllowList,
    #[error("failed to parse params: {0}")]
    ParsingParams(String),
    #[error("account {0} is not a base account")]
    NotBaseAccount(String),
    #[error("contract rejected {entry_point}: {reason}")]
    ContractRejected { entry_point: String, reason: String },
    #[error("out of gas in {descriptor}: limit {limit}, used {used}")]
    OutOfGas { descriptor: String, limit: u64, used: u64 },
    #[error("account not found: {0}")]
    AccountNotFound(String),
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("invalid signature for {0}")]
    InvalidSignature(String),
    #[error("invalid pubkey for {0}")]
    InvalidPubKey(String),
    #[error("wrong sequence for {address}: expected {expected}, got {got}")]
    WrongSequence { address: String, expected: u64, got: u64 },
    #[error("contract already exists at {0}")]
    DuplicateContract(String),
    #[error("code {0} not found")]
    CodeNotFound(u64),
    #[error("contract not found: {0}")]
    ContractNotFound(String),
    #[error("caller {caller} is not the admin of {contract}")]
    AdminMismatch { contract: String, caller: String },
    #[error("runtime error: {0}")]
    Runtime(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("invalid genesis: {0}")]
    InvalidGenesis(String),
    #[error("{0} overflowed")]
    Overflow(String),
}

impl AbstractAccountError {
    pub fn class(&self) -> ErrorClass {
        use AbstractAccountError::*;

        match self {
            Unauthorized { .. } | NotAllowedCodeId(_) => ErrorClass::PolicyViolation,
            NotBaseAccount(_) => ErrorClass::InvariantViolation,
            ZeroMaxGas | NonEmptyAllowList | MalformedAllowList => {
                ErrorClass::MalformedConfiguration
            }
            ContractRejected { .. } => ErrorClass::DelegatedLogicFailure,
            OutOfGas { .. } => ErrorClass::ResourceExhaustion,
            _ => ErrorClass::Host,
        }
    }
}

impl From<bincode::Error> for AbstractAccountError {
    fn from(err: bincode::Error) -> Self {
        AbstractAccountError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for AbstractAccountError {
    fn from(err: serde_json::Error) -> Self {
        AbstractAccountError::Serialization(err.to_string())
    }
}

impl From<sled::Error> for AbstractAccountError {
    fn from(err: sled::Error) -> Self {
        AbstractAccountError::Storage(err.to_string())
    }
}
