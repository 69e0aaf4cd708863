//! Read-only projections over the sealed chain. Nothing here is cached:
//! every figure is recomputed from the blocks on demand.

use serde::Serialize;

use crate::crypto::BlockHash;
use crate::error::{LedgerError, Result};
use crate::transaction::Credits;

use super::chain::Block;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerStats {
    pub total_blocks: usize,
    pub total_transactions: usize,
    /// Sum of every issuance (sender `"0"`).
    pub total_issued: Credits,
    /// Sum of every retirement (recipient `"BURN"`).
    pub total_retired: Credits,
    /// `total_issued - total_retired`.
    pub circulating: Credits,
    pub pending_count: usize,
    pub last_block_hash: BlockHash,
}

impl LedgerStats {
    /// Single pass over every sealed transaction.
    pub fn collect(chain: &[Block], pending_count: usize) -> Result<Self> {
        let last = chain.last().ok_or(LedgerError::EmptyChainAccess)?;

        let mut total_transactions = 0;
        let mut total_issued = 0.0;
        let mut total_retired = 0.0;
        for tx in chain.iter().flat_map(|b| &b.transactions) {
            total_transactions += 1;
            if tx.is_issuance() {
                total_issued += tx.amount();
            }
            if tx.is_retirement() {
                total_retired += tx.amount();
            }
        }

        Ok(LedgerStats {
            total_blocks: chain.len(),
            total_transactions,
            total_issued,
            total_retired,
            circulating: total_issued - total_retired,
            pending_count,
            last_block_hash: last.hash(),
        })
    }
}

/// Credits received minus credits sent by `owner` across sealed blocks.
/// The issuance sentinel is never debited.
pub fn balance_of(chain: &[Block], owner: &str) -> Credits {
    chain
        .iter()
        .flat_map(|b| &b.transactions)
        .fold(0.0, |mut balance, tx| {
            if tx.recipient() == owner {
                balance += tx.amount();
            }
            if tx.sender() == owner && !tx.is_issuance() {
                balance -= tx.amount();
            }
            balance
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{Transaction, BURN_ADDRESS, ISSUANCE_SENDER};

    fn tx(sender: &str, recipient: &str, amount: f64) -> Transaction {
        Transaction::with_timestamp(sender, recipient, amount, None, None, 1).unwrap()
    }

    fn block(index: u64, transactions: Vec<Transaction>) -> Block {
        Block {
            index,
            timestamp: index,
            proof: 0,
            previous_hash: "1".to_string(),
            transactions,
        }
    }

    #[test]
    fn test_stats_on_genesis_only() {
        let chain = vec![block(1, vec![])];
        let stats = LedgerStats::collect(&chain, 3).unwrap();
        assert_eq!(stats.total_blocks, 1);
        assert_eq!(stats.total_transactions, 0);
        assert_eq!(stats.total_issued, 0.0);
        assert_eq!(stats.pending_count, 3);
        assert_eq!(stats.last_block_hash, chain[0].hash());
    }

    #[test]
    fn test_stats_sum_issued_and_retired() {
        let chain = vec![
            block(1, vec![]),
            block(
                2,
                vec![
                    tx(ISSUANCE_SENDER, "alice", 10.0),
                    tx("alice", "bob", 4.0),
                    tx(ISSUANCE_SENDER, "bob", 2.5),
                ],
            ),
            block(3, vec![tx("bob", BURN_ADDRESS, 3.0)]),
        ];
        let stats = LedgerStats::collect(&chain, 0).unwrap();
        assert_eq!(stats.total_transactions, 4);
        assert_eq!(stats.total_issued, 12.5);
        assert_eq!(stats.total_retired, 3.0);
        assert_eq!(stats.circulating, 9.5);
    }

    #[test]
    fn test_stats_requires_genesis() {
        assert_eq!(
            LedgerStats::collect(&[], 0).unwrap_err(),
            LedgerError::EmptyChainAccess
        );
    }

    #[test]
    fn test_balances() {
        let chain = vec![
            block(1, vec![]),
            block(
                2,
                vec![
                    tx(ISSUANCE_SENDER, "alice", 10.0),
                    tx("alice", "bob", 4.0),
                    tx("bob", BURN_ADDRESS, 1.0),
                ],
            ),
        ];
        assert_eq!(balance_of(&chain, "alice"), 6.0);
        assert_eq!(balance_of(&chain, "bob"), 3.0);
        assert_eq!(balance_of(&chain, BURN_ADDRESS), 1.0);
        assert_eq!(balance_of(&chain, ISSUANCE_SENDER), 0.0);
        assert_eq!(balance_of(&chain, "nobody"), 0.0);
    }
}
