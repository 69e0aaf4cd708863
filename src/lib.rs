//! CarbonLedger - an append-only carbon credit ledger sealed by proof-of-work
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Ledger
//! - [`blockchain`] - Blocks, the ledger, canonical hashing, stats and chain validation
//! - [`transaction`] - Credit transactions and amount validation
//! - [`mempool`] - Pending transaction pool
//!
//! ## Consensus
//! - [`miner`] - Proof-of-work search and verification
//!
//! ## Cryptography
//! - [`crypto`] - SHA-256 helpers
//!
//! ## Service
//! - [`node`] - Shared ledger handle for concurrent callers
//! - [`api`] - HTTP adapter (feature `api`)
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod mempool;
pub mod transaction;

// ============================================================================
// Consensus
// ============================================================================
pub mod miner;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;

// ============================================================================
// Service
// ============================================================================
pub mod node;

#[cfg(feature = "api")]
pub mod api;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;

pub use blockchain::{Block, HashChain, Ledger, LedgerStats};
pub use error::{LedgerError, Result};
pub use mempool::TransactionPool;
pub use miner::{CancelFlag, ProofOfWork};
pub use transaction::Transaction;
