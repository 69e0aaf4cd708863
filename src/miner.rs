//! Proof-of-work search and verification
//!
//! A proof is valid for a reference proof when
//! `sha256_hex("{reference}{candidate}")` starts with `difficulty` zero
//! characters. The search walks candidates upward from zero.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::crypto::{has_leading_hex_zeros, sha256_hex};
use crate::error::{LedgerError, Result};

/// Leading hex zeros required when nothing else is configured.
pub const DEFAULT_DIFFICULTY: usize = 4;

/// Upper bound on difficulty: a SHA-256 hex digest has 64 characters.
pub const MAX_DIFFICULTY: usize = 64;

/// Candidates tried between cancellation checks.
const CANCEL_CHECK_INTERVAL: u64 = 1024;

/// Cooperative cancellation signal for a running search.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask any search observing this flag to stop. Stays set until `reset`.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: usize,
    max_attempts: Option<u64>,
}

impl Default for ProofOfWork {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            max_attempts: None,
        }
    }
}

impl ProofOfWork {
    /// `difficulty` is clamped into `1..=MAX_DIFFICULTY`.
    pub fn new(difficulty: usize) -> Self {
        Self {
            difficulty: difficulty.clamp(1, MAX_DIFFICULTY),
            max_attempts: None,
        }
    }

    /// Cap the number of candidates `solve_bounded` will try.
    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn max_attempts(&self) -> Option<u64> {
        self.max_attempts
    }

    /// Pure predicate over the decimal concatenation of both numbers.
    pub fn is_valid(&self, reference: u64, candidate: u64) -> bool {
        let guess = format!("{}{}", reference, candidate);
        has_leading_hex_zeros(&sha256_hex(guess.as_bytes()), self.difficulty)
    }

    /// Unbounded search: returns the smallest candidate accepted by `is_valid`.
    pub fn solve(&self, reference: u64) -> u64 {
        let mut candidate = 0u64;
        while !self.is_valid(reference, candidate) {
            candidate += 1;
        }
        candidate
    }

    /// Same search as `solve`, honouring `max_attempts` and an optional cancel flag.
    pub fn solve_bounded(&self, reference: u64, cancel: Option<&CancelFlag>) -> Result<u64> {
        let mut candidate = 0u64;
        loop {
            if let Some(limit) = self.max_attempts {
                if candidate >= limit {
                    return Err(LedgerError::ProofNotFound { attempts: limit });
                }
            }
            if candidate % CANCEL_CHECK_INTERVAL == 0 && cancel.is_some_and(CancelFlag::is_cancelled) {
                return Err(LedgerError::SealCancelled);
            }
            if self.is_valid(reference, candidate) {
                return Ok(candidate);
            }
            candidate = candidate
                .checked_add(1)
                .ok_or(LedgerError::ProofNotFound { attempts: u64::MAX })?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_produces_valid_proof() {
        let pow = ProofOfWork::new(3);
        for reference in [0u64, 100, 35_293, 987_654_321] {
            let proof = pow.solve(reference);
            assert!(pow.is_valid(reference, proof));
        }
    }

    #[test]
    fn test_solve_returns_first_valid_candidate() {
        let pow = ProofOfWork::new(2);
        let proof = pow.solve(100);
        assert!((0..proof).all(|c| !pow.is_valid(100, c)));
    }

    #[test]
    fn test_default_difficulty_is_four() {
        let pow = ProofOfWork::default();
        assert_eq!(pow.difficulty(), 4);
        let proof = pow.solve(100);
        let digest = sha256_hex(format!("100{}", proof).as_bytes());
        assert!(digest.starts_with("0000"));
    }

    #[test]
    fn test_is_valid_checks_concatenation() {
        let pow = ProofOfWork::new(2);
        let proof = pow.solve(7);
        let digest = sha256_hex(format!("7{}", proof).as_bytes());
        assert_eq!(pow.is_valid(7, proof), digest.starts_with("00"));
    }

    #[test]
    fn test_difficulty_is_clamped() {
        assert_eq!(ProofOfWork::new(0).difficulty(), 1);
        assert_eq!(ProofOfWork::new(500).difficulty(), MAX_DIFFICULTY);
    }

    #[test]
    fn test_bounded_search_matches_unbounded() {
        let pow = ProofOfWork::new(3);
        assert_eq!(pow.solve_bounded(100, None).unwrap(), pow.solve(100));
    }

    #[test]
    fn test_bounded_search_exhausts() {
        let pow = ProofOfWork::new(MAX_DIFFICULTY).with_max_attempts(500);
        assert_eq!(
            pow.solve_bounded(100, None),
            Err(LedgerError::ProofNotFound { attempts: 500 })
        );
    }

    #[test]
    fn test_cancelled_search() {
        let flag = CancelFlag::new();
        flag.cancel();
        let pow = ProofOfWork::new(MAX_DIFFICULTY);
        assert_eq!(pow.solve_bounded(1, Some(&flag)), Err(LedgerError::SealCancelled));

        flag.reset();
        assert!(!flag.is_cancelled());
    }
}
