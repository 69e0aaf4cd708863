/// Transaction types for CarbonLedger
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};

use super::validation::validate_amount;

/// Sender used for freshly issued credits (no debited source).
pub const ISSUANCE_SENDER: &str = "0";

/// Recipient used for retired (burned) credits.
pub const BURN_ADDRESS: &str = "BURN";

/// Category stamped on every retirement.
pub const RETIREMENT_CATEGORY: &str = "retirement";

/// Quantity of carbon credits, in tonnes of CO2 equivalent.
pub type Credits = f64;

/// A single credit movement. Fields are private so the positive-amount
/// invariant cannot be bypassed after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TransactionRecord")]
pub struct Transaction {
    sender: String,
    recipient: String,
    amount: Credits,
    category: Option<String>,
    note: Option<String>,
    created_at: u64,
}

impl Transaction {
    /// Build a transaction stamped with the current time.
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: Credits,
        category: Option<String>,
        note: Option<String>,
    ) -> Result<Self> {
        let created_at = chrono::Utc::now().timestamp_millis() as u64;
        Self::with_timestamp(sender, recipient, amount, category, note, created_at)
    }

    /// Build a transaction with an explicit creation time (milliseconds since the epoch).
    pub fn with_timestamp(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: Credits,
        category: Option<String>,
        note: Option<String>,
        created_at: u64,
    ) -> Result<Self> {
        validate_amount(amount)?;
        Ok(Transaction {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
            category,
            note,
            created_at,
        })
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn amount(&self) -> Credits {
        self.amount
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// True for newly minted credits.
    pub fn is_issuance(&self) -> bool {
        self.sender == ISSUANCE_SENDER
    }

    /// True for credits sent to the burn address.
    pub fn is_retirement(&self) -> bool {
        self.recipient == BURN_ADDRESS
    }
}

/// Wire shape accepted when reading transactions back; also understands the
/// legacy `credits` / `project_type` / `description` / `timestamp` names.
#[derive(Deserialize)]
struct TransactionRecord {
    sender: String,
    recipient: String,
    #[serde(alias = "credits")]
    amount: Credits,
    #[serde(default, alias = "project_type")]
    category: Option<String>,
    #[serde(default, alias = "description")]
    note: Option<String>,
    #[serde(alias = "timestamp")]
    created_at: u64,
}

impl TryFrom<TransactionRecord> for Transaction {
    type Error = LedgerError;

    fn try_from(record: TransactionRecord) -> Result<Self> {
        Transaction::with_timestamp(
            record.sender,
            record.recipient,
            record.amount,
            record.category,
            record.note,
            record.created_at,
        )
    }
}

/// Note stored on an issuance when the caller supplies none.
pub fn issuance_note(amount: Credits, category: &str) -> String {
    format!("Issued {} carbon credits from {} project", amount, category)
}

/// Note stored on every retirement.
pub fn retirement_note(amount: Credits, reason: Option<&str>) -> String {
    match reason {
        Some(reason) => format!("RETIRED: {} carbon credits burned - {}", amount, reason),
        None => format!("RETIRED: {} carbon credits burned", amount),
    }
}
