//! Pending transaction pool

use crate::transaction::Transaction;

/// Ordered buffer of transactions waiting for the next seal. Insertion
/// order is the order they will appear in the block.
#[derive(Debug, Clone, Default)]
pub struct TransactionPool {
    transactions: Vec<Transaction>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a transaction to the end of the pool.
    pub fn append(&mut self, tx: Transaction) {
        self.transactions.push(tx);
    }

    /// Take every pending transaction, leaving the pool empty.
    pub fn drain(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.transactions)
    }

    /// Put previously drained transactions back ahead of anything recorded since.
    pub fn restore(&mut self, mut drained: Vec<Transaction>) {
        drained.append(&mut self.transactions);
        self.transactions = drained;
    }

    pub fn size(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(recipient: &str, amount: f64) -> Transaction {
        Transaction::with_timestamp("0", recipient, amount, None, None, 1).unwrap()
    }

    #[test]
    fn test_append_preserves_order() {
        let mut pool = TransactionPool::new();
        pool.append(tx("alice", 1.0));
        pool.append(tx("bob", 2.0));
        pool.append(tx("carol", 3.0));

        assert_eq!(pool.size(), 3);
        let recipients: Vec<_> = pool.transactions().iter().map(|t| t.recipient()).collect();
        assert_eq!(recipients, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn test_drain_empties_pool() {
        let mut pool = TransactionPool::new();
        pool.append(tx("alice", 1.0));
        pool.append(tx("bob", 2.0));

        let drained = pool.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].recipient(), "alice");
        assert!(pool.is_empty());
        assert_eq!(pool.size(), 0);

        // Ready for new work after a drain
        pool.append(tx("carol", 3.0));
        assert_eq!(pool.size(), 1);
    }

    #[test]
    fn test_restore_puts_drained_first() {
        let mut pool = TransactionPool::new();
        pool.append(tx("alice", 1.0));
        pool.append(tx("bob", 2.0));
        let drained = pool.drain();

        pool.append(tx("carol", 3.0));
        pool.restore(drained);

        let recipients: Vec<_> = pool.transactions().iter().map(|t| t.recipient()).collect();
        assert_eq!(recipients, vec!["alice", "bob", "carol"]);
    }
}
