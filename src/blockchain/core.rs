// core.rs splits ledger responsibilities into submodules.
pub mod chain;
pub mod hashing;
pub mod stats;
pub mod validation;

pub use chain::*;
pub use hashing::*;
pub use stats::*;
pub use validation::*;
