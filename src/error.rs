//! Error types for CarbonLedger

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("Invalid amount: {0} (credits must be greater than 0)")]
    InvalidAmount(f64),
    #[error("Ledger chain is empty; the genesis block is missing")]
    EmptyChainAccess,
    #[error("No valid proof found after {attempts} attempts")]
    ProofNotFound { attempts: u64 },
    #[error("Proof-of-work search was cancelled")]
    SealCancelled,
    #[error("A block seal is already in progress")]
    SealInProgress,
    #[error("Invalid block linkage: {0}")]
    InvalidBlockLinkage(String),
    #[error("Invalid proof of work in block {index}")]
    InvalidProofOfWork { index: u64 },
    #[error("Invalid block: {0}")]
    InvalidBlock(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::IoError(err.to_string())
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(err: toml::de::Error) -> Self {
        LedgerError::ConfigError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, LedgerError>;
