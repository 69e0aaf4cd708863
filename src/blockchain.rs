// Thin re-export module: the ledger engine lives in `blockchain/core.rs`,
// split into chain management, hashing, derived statistics and validation.

pub mod core;
pub use core::*;
