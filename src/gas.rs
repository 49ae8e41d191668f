use crate::error::{AbstractAccountError, Result};

pub type Gas = u64;

/// Tracks gas for one transaction. Consumption past the limit is fatal for
/// the current call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasMeter {
    limit: Gas,
    consumed: Gas,
}

impl GasMeter {
    pub fn new(limit: Gas) -> Self {
        Self { limit, consumed: 0 }
    }

    pub fn infinite() -> Self {
        Self::new(Gas::MAX)
    }

    pub fn consumed(&self) -> Gas {
        self.consumed
    }

    pub fn remaining(&self) -> Gas {
        self.limit.saturating_sub(self.consumed)
    }

    /// Budget for a nested call: never more than what is left on this meter.
    pub fn scoped_limit(&self, cap: Gas) -> Gas {
        self.remaining().min(cap)
    }

    pub fn consume(&mut self, amount: Gas, descriptor: &str) -> Result<()> {
        let total = self.consumed.saturating_add(amount);
        if total > self.limit {
            self.consumed = self.limit;
            return Err(AbstractAccountError::OutOfGas {
                descriptor: descriptor.to_string(),
                limit: self.limit,
                used: total,
            });
        }

        self.consumed = total;
        Ok(())
    }
}
