//! Shared ledger handle for concurrent callers.
//!
//! Mutations are serialised through an async `RwLock`. Sealing takes a
//! separate seal lock for its whole duration but holds the ledger lock only
//! to snapshot the tip and to append the result; the proof-of-work search
//! itself runs on the blocking pool, so reads and new transactions proceed
//! while it runs.
//!
//! Each seal runs in its own spawned task that owns the drained
//! transactions. Dropping the caller's future cancels that seal's search,
//! and the task then returns the transactions to the pool.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::blockchain::{Block, Ledger, LedgerStats};
use crate::config::Config;
use crate::error::{LedgerError, Result};
use crate::miner::CancelFlag;
use crate::transaction::{Credits, Transaction};

#[derive(Clone)]
pub struct Node {
    ledger: Arc<RwLock<Ledger>>,
    seal_lock: Arc<Mutex<()>>,
    /// Cancel flag of the seal currently holding `seal_lock`.
    current_seal: Arc<Mutex<CancelFlag>>,
}

/// Cancels one seal when the future waiting on it goes away. Cancelling a
/// seal that already finished is a no-op.
struct CancelOnDrop(CancelFlag);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

impl Node {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
            seal_lock: Arc::new(Mutex::new(())),
            current_seal: Arc::new(Mutex::new(CancelFlag::new())),
        }
    }

    /// Fresh ledger using the configured proof-of-work parameters.
    pub fn from_config(config: &Config) -> Self {
        Self::new(Ledger::with_proof_of_work(config.ledger.proof_of_work()))
    }

    pub async fn issue(
        &self,
        recipient: &str,
        amount: Credits,
        category: &str,
        note: Option<&str>,
    ) -> Result<u64> {
        self.ledger.write().await.issue(recipient, amount, category, note)
    }

    pub async fn transfer(
        &self,
        sender: &str,
        recipient: &str,
        amount: Credits,
        category: Option<&str>,
        note: Option<&str>,
    ) -> Result<u64> {
        self.ledger
            .write()
            .await
            .transfer(sender, recipient, amount, category, note)
    }

    pub async fn retire(&self, owner: &str, amount: Credits, reason: Option<&str>) -> Result<u64> {
        self.ledger.write().await.retire(owner, amount, reason)
    }

    /// Seal the pending pool into a new block. Concurrent calls queue up and
    /// seal one after another.
    pub async fn seal_block(&self) -> Result<Block> {
        let cancel = CancelFlag::new();
        let _guard = CancelOnDrop(cancel.clone());

        let node = self.clone();
        match tokio::spawn(async move { node.run_seal(cancel).await }).await {
            Ok(result) => result,
            // The seal task panicked or the runtime is shutting down
            Err(_) => Err(LedgerError::SealCancelled),
        }
    }

    async fn run_seal(&self, cancel: CancelFlag) -> Result<Block> {
        let _seal = self.seal_lock.lock().await;
        if cancel.is_cancelled() {
            return Err(LedgerError::SealCancelled);
        }
        *self.current_seal.lock().await = cancel.clone();

        let (job, pow) = {
            let mut ledger = self.ledger.write().await;
            (ledger.begin_seal()?, *ledger.proof_of_work())
        };

        let start = Instant::now();
        let reference = job.reference();
        let search =
            tokio::task::spawn_blocking(move || pow.solve_bounded(reference, Some(&cancel))).await;

        let mut ledger = self.ledger.write().await;
        let proof = match search {
            Ok(Ok(proof)) => proof,
            Ok(Err(e)) => {
                ledger.abort_seal(job);
                return Err(e);
            }
            Err(e) => {
                warn!(error = %e, "proof-of-work task failed");
                ledger.abort_seal(job);
                return Err(LedgerError::SealCancelled);
            }
        };

        let block = ledger.complete_seal(job, proof)?;
        info!(
            index = block.index,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "proof-of-work solved"
        );
        Ok(block)
    }

    /// Stop the in-flight proof-of-work search; its transactions stay pending.
    pub async fn cancel_seal(&self) {
        self.current_seal.lock().await.cancel();
    }

    pub async fn is_sealing(&self) -> bool {
        self.ledger.read().await.is_sealing()
    }

    /// Owned copy of the whole chain.
    pub async fn chain(&self) -> Vec<Block> {
        self.ledger.read().await.chain().to_vec()
    }

    pub async fn chain_length(&self) -> usize {
        self.ledger.read().await.chain_length()
    }

    pub async fn last_block(&self) -> Result<Block> {
        self.ledger.read().await.last_block().cloned()
    }

    /// Pool contents. Transactions held by an in-flight seal are counted by
    /// [`Node::sealing_count`] instead.
    pub async fn pending(&self) -> Vec<Transaction> {
        self.ledger.read().await.pending().to_vec()
    }

    pub async fn sealing_count(&self) -> usize {
        self.ledger.read().await.sealing_count()
    }

    pub async fn stats(&self) -> Result<LedgerStats> {
        self.ledger.read().await.stats()
    }

    pub async fn balance_of(&self, owner: &str) -> Credits {
        self.ledger.read().await.balance_of(owner)
    }

    pub async fn verify(&self) -> Result<()> {
        self.ledger.read().await.verify()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miner::{ProofOfWork, MAX_DIFFICULTY};
    use std::time::Duration;

    fn fast_node() -> Node {
        Node::new(Ledger::with_proof_of_work(ProofOfWork::new(2)))
    }

    #[tokio::test]
    async fn test_seal_through_node() {
        tokio::time::timeout(Duration::from_secs(30), async {
            let node = fast_node();
            assert_eq!(node.issue("alice", 10.0, "reforestation", None).await.unwrap(), 2);

            let block = node.seal_block().await.unwrap();
            assert_eq!(block.index, 2);
            assert_eq!(block.transactions.len(), 1);
            assert_eq!(node.chain_length().await, 2);
            assert!(node.pending().await.is_empty());
            assert_eq!(node.balance_of("alice").await, 10.0);
            assert!(node.verify().await.is_ok());
        })
        .await
        .expect("test_seal_through_node timed out");
    }

    #[tokio::test]
    async fn test_concurrent_seals_are_serialised() {
        tokio::time::timeout(Duration::from_secs(30), async {
            let node = fast_node();
            node.issue("alice", 1.0, "solar", None).await.unwrap();

            let (a, b) = tokio::join!(node.seal_block(), node.seal_block());
            let (a, b) = (a.unwrap(), b.unwrap());
            let mut indices = vec![a.index, b.index];
            indices.sort();
            assert_eq!(indices, vec![2, 3]);
            assert_eq!(node.chain_length().await, 3);
            assert!(node.verify().await.is_ok());
        })
        .await
        .expect("test_concurrent_seals_are_serialised timed out");
    }

    #[tokio::test]
    async fn test_cancel_restores_pending() {
        tokio::time::timeout(Duration::from_secs(30), async {
            let node = Node::new(Ledger::with_proof_of_work(ProofOfWork::new(MAX_DIFFICULTY)));
            node.issue("alice", 1.0, "solar", None).await.unwrap();

            let sealer = node.clone();
            let handle = tokio::spawn(async move { sealer.seal_block().await });

            while !node.is_sealing().await {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }

            // Reads and new transactions are not blocked by the search
            assert!(node.pending().await.is_empty());
            assert_eq!(node.sealing_count().await, 1);
            assert_eq!(node.transfer("alice", "bob", 0.5, None, None).await.unwrap(), 3);
            let stats = node.stats().await.unwrap();
            assert_eq!(stats.total_blocks, 1);
            assert_eq!(stats.pending_count, 2);

            node.cancel_seal().await;
            let result = handle.await.unwrap();
            assert_eq!(result.unwrap_err(), LedgerError::SealCancelled);

            let pending = node.pending().await;
            assert_eq!(pending.len(), 2);
            assert_eq!(pending[0].recipient(), "alice");
            assert_eq!(pending[1].recipient(), "bob");
            assert_eq!(node.chain_length().await, 1);
        })
        .await
        .expect("test_cancel_restores_pending timed out");
    }

    #[tokio::test]
    async fn test_dropped_seal_returns_transactions() {
        tokio::time::timeout(Duration::from_secs(30), async {
            let node = Node::new(Ledger::with_proof_of_work(ProofOfWork::new(MAX_DIFFICULTY)));
            node.issue("alice", 1.0, "solar", None).await.unwrap();

            let abandoned =
                tokio::time::timeout(Duration::from_millis(50), node.seal_block()).await;
            assert!(abandoned.is_err());

            // The abandoned seal winds down in the background
            while node.is_sealing().await || node.pending().await.is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }

            let pending = node.pending().await;
            assert_eq!(pending.len(), 1);
            assert_eq!(pending[0].recipient(), "alice");
            assert_eq!(node.sealing_count().await, 0);
            assert_eq!(node.chain_length().await, 1);
            assert_eq!(node.issue("bob", 2.0, "solar", None).await.unwrap(), 2);
            assert_eq!(node.pending().await.len(), 2);
        })
        .await
        .expect("test_dropped_seal_returns_transactions timed out");
    }
}
