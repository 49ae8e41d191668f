//! Governance-controlled module parameters

use serde::{Deserialize, Serialize};

use crate::error::{AbstractAccountError, Result};

pub const DEFAULT_MAX_GAS: u64 = 2_000_000;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Params {
    /// Any code id may be used to register accounts
    pub allow_all_code_ids: bool,
    /// Strictly increasing, non-zero. Must be empty when `allow_all_code_ids`
    pub allowed_code_ids: Vec<u64>,
    /// Gas cap for the `before_tx` call
    pub max_gas_before: u64,
    /// Gas cap for the `after_tx` call
    pub max_gas_after: u64,
}

impl Params {
    pub fn new(
        allow_all_code_ids: bool,
        allowed_code_ids: Vec<u64>,
        max_gas_before: u64,
        max_gas_after: u64,
    ) -> Result<Self> {
        let params = Self {
            allow_all_code_ids,
            allowed_code_ids,
            max_gas_before,
            max_gas_after,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_gas_before == 0 || self.max_gas_after == 0 {
            return Err(AbstractAccountError::ZeroMaxGas);
        }

        if self.allow_all_code_ids && !self.allowed_code_ids.is_empty() {
            return Err(AbstractAccountError::NonEmptyAllowList);
        }

        // a single pass rejects zero, duplicates and unsorted lists
        let mut prev = 0u64;
        for &code_id in &self.allowed_code_ids {
            if code_id == 0 || prev >= code_id {
                return Err(AbstractAccountError::MalformedAllowList);
            }
            prev = code_id;
        }

        Ok(())
    }

    /// Whether `code_id` may be used to register abstract accounts
    pub fn is_allowed(&self, code_id: u64) -> bool {
        self.allow_all_code_ids || self.allowed_code_ids.binary_search(&code_id).is_ok()
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            allow_all_code_ids: true,
            allowed_code_ids: Vec::new(),
            max_gas_before: DEFAULT_MAX_GAS,
            max_gas_after: DEFAULT_MAX_GAS,
        }
    }
}
