/// Validation logic for transactions separated from type definitions
use crate::error::{LedgerError, Result};
use crate::transaction::types::Credits;

/// Rejects zero, negative and non-finite amounts.
pub fn validate_amount(amount: Credits) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        tracing::warn!(amount, "rejected transaction amount");
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(())
}
