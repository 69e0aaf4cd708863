use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::crypto::BlockHash;
use crate::error::{LedgerError, Result};
use crate::mempool::TransactionPool;
use crate::miner::{CancelFlag, ProofOfWork};
use crate::transaction::{
    issuance_note, retirement_note, Credits, Transaction, BURN_ADDRESS, ISSUANCE_SENDER,
    RETIREMENT_CATEGORY,
};

use super::hashing::HashChain;
use super::stats::{balance_of, LedgerStats};
use super::validation::validate_chain;

/// Proof stored in the genesis block; the first seal searches against it.
pub const GENESIS_PROOF: u64 = 100;

/// `previous_hash` marker carried by the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// 1-based position in the chain.
    pub index: u64,
    /// Milliseconds since the epoch at sealing time.
    pub timestamp: u64,
    pub proof: u64,
    pub previous_hash: BlockHash,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn genesis() -> Self {
        Block {
            index: 1,
            timestamp: now_millis(),
            proof: GENESIS_PROOF,
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
            transactions: Vec::new(),
        }
    }

    pub fn hash(&self) -> BlockHash {
        HashChain::digest(self)
    }
}

fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}

/// Everything needed to finish a seal once a proof is found. Produced by
/// [`Ledger::begin_seal`]; the drained transactions travel with it.
#[derive(Debug)]
pub struct SealJob {
    index: u64,
    reference: u64,
    previous_hash: BlockHash,
    transactions: Vec<Transaction>,
}

impl SealJob {
    /// Index the sealed block will receive.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Proof of the current tip, used as the search reference.
    pub fn reference(&self) -> u64 {
        self.reference
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }
}

/// Append-only chain of sealed blocks plus the pool of pending transactions.
/// The chain always holds the genesis block.
#[derive(Debug, Clone)]
pub struct Ledger {
    chain: Vec<Block>,
    pool: TransactionPool,
    pow: ProofOfWork,
    /// Transaction count of the in-flight seal, if one is running.
    sealing: Option<usize>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Create a ledger holding only the genesis block, at the default difficulty.
    pub fn new() -> Self {
        Self::with_proof_of_work(ProofOfWork::default())
    }

    pub fn with_proof_of_work(pow: ProofOfWork) -> Self {
        Ledger {
            chain: vec![Block::genesis()],
            pool: TransactionPool::new(),
            pow,
            sealing: None,
        }
    }

    pub fn proof_of_work(&self) -> &ProofOfWork {
        &self.pow
    }

    // ------------------------------------------------------------------
    // Recording
    // ------------------------------------------------------------------

    /// Queue a transaction and return the index of the block it is expected
    /// to land in. Every transaction recorded before the next seal reports
    /// the same index.
    pub fn record_transaction(
        &mut self,
        sender: &str,
        recipient: &str,
        amount: Credits,
        category: Option<&str>,
        note: Option<&str>,
    ) -> Result<u64> {
        let next_index = self.next_block_index()?;
        let tx = Transaction::new(
            sender,
            recipient,
            amount,
            category.map(str::to_string),
            note.map(str::to_string),
        )?;
        self.pool.append(tx);
        debug!(sender, recipient, amount, next_index, "transaction recorded");
        Ok(next_index)
    }

    /// Mint new credits for `recipient`.
    pub fn issue(
        &mut self,
        recipient: &str,
        amount: Credits,
        category: &str,
        note: Option<&str>,
    ) -> Result<u64> {
        let note = match note {
            Some(note) => note.to_string(),
            None => issuance_note(amount, category),
        };
        self.record_transaction(ISSUANCE_SENDER, recipient, amount, Some(category), Some(&note))
    }

    pub fn transfer(
        &mut self,
        sender: &str,
        recipient: &str,
        amount: Credits,
        category: Option<&str>,
        note: Option<&str>,
    ) -> Result<u64> {
        self.record_transaction(sender, recipient, amount, category, note)
    }

    /// Permanently remove `amount` credits held by `owner` from circulation.
    pub fn retire(&mut self, owner: &str, amount: Credits, reason: Option<&str>) -> Result<u64> {
        let note = retirement_note(amount, reason);
        self.record_transaction(
            owner,
            BURN_ADDRESS,
            amount,
            Some(RETIREMENT_CATEGORY),
            Some(&note),
        )
    }

    /// Index of the next block that will accept pending transactions. While a
    /// seal is in flight its block is already spoken for.
    pub fn next_block_index(&self) -> Result<u64> {
        let in_flight = u64::from(self.sealing.is_some());
        Ok(self.last_block()?.index + 1 + in_flight)
    }

    // ------------------------------------------------------------------
    // Sealing
    // ------------------------------------------------------------------

    /// Solve the proof-of-work for the tip, drain the pool into a new block
    /// and append it.
    pub fn seal_block(&mut self) -> Result<Block> {
        self.seal_block_with_cancel(None)
    }

    pub fn seal_block_with_cancel(&mut self, cancel: Option<&CancelFlag>) -> Result<Block> {
        let job = self.begin_seal()?;
        match self.pow.solve_bounded(job.reference, cancel) {
            Ok(proof) => self.complete_seal(job, proof),
            Err(e) => {
                self.abort_seal(job);
                Err(e)
            }
        }
    }

    /// First half of a seal: snapshot the tip and take the pending pool.
    /// Only one seal may be in flight at a time.
    pub fn begin_seal(&mut self) -> Result<SealJob> {
        if self.sealing.is_some() {
            return Err(LedgerError::SealInProgress);
        }
        let last = self.last_block()?;
        let (index, reference, previous_hash) = (last.index + 1, last.proof, last.hash());
        let job = SealJob {
            index,
            reference,
            previous_hash,
            transactions: self.pool.drain(),
        };
        self.sealing = Some(job.transactions.len());
        Ok(job)
    }

    /// Second half of a seal: append the block for `job` using `proof`.
    ///
    /// On failure the drained transactions go back to the front of the pool.
    pub fn complete_seal(&mut self, job: SealJob, proof: u64) -> Result<Block> {
        if let Err(e) = self.check_job(&job, proof) {
            self.abort_seal(job);
            return Err(e);
        }

        let block = Block {
            index: job.index,
            timestamp: now_millis(),
            proof,
            previous_hash: job.previous_hash,
            transactions: job.transactions,
        };
        self.chain.push(block.clone());
        self.sealing = None;

        info!(
            index = block.index,
            proof = block.proof,
            transactions = block.transactions.len(),
            "block sealed"
        );
        Ok(block)
    }

    /// Abandon `job`, returning its transactions to the pool in their original order.
    pub fn abort_seal(&mut self, job: SealJob) {
        warn!(
            index = job.index,
            restored = job.transactions.len(),
            "seal aborted"
        );
        self.pool.restore(job.transactions);
        self.sealing = None;
    }

    fn check_job(&self, job: &SealJob, proof: u64) -> Result<()> {
        let last = self.last_block()?;
        if last.index + 1 != job.index || last.hash() != job.previous_hash {
            return Err(LedgerError::InvalidBlockLinkage(format!(
                "seal for block {} no longer extends tip {}",
                job.index, last.index
            )));
        }
        if !self.pow.is_valid(job.reference, proof) {
            return Err(LedgerError::InvalidProofOfWork { index: job.index });
        }
        Ok(())
    }

    pub fn is_sealing(&self) -> bool {
        self.sealing.is_some()
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn last_block(&self) -> Result<&Block> {
        self.chain.last().ok_or(LedgerError::EmptyChainAccess)
    }

    pub fn chain_length(&self) -> usize {
        self.chain.len()
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    /// Transactions waiting in the pool. Those drained by an in-flight seal
    /// are not listed here until the seal completes or is aborted.
    pub fn pending(&self) -> &[Transaction] {
        self.pool.transactions()
    }

    /// Unsealed transactions: the pool plus any held by an in-flight seal.
    pub fn pending_count(&self) -> usize {
        self.pool.size() + self.sealing_count()
    }

    /// Transactions currently held by an in-flight seal.
    pub fn sealing_count(&self) -> usize {
        self.sealing.unwrap_or(0)
    }

    /// Aggregate figures recomputed from the sealed chain on every call.
    pub fn stats(&self) -> Result<LedgerStats> {
        LedgerStats::collect(&self.chain, self.pending_count())
    }

    /// Sealed holdings of `owner`.
    pub fn balance_of(&self, owner: &str) -> Credits {
        balance_of(&self.chain, owner)
    }

    /// Re-check genesis, linkage and every proof in the chain.
    pub fn verify(&self) -> Result<()> {
        validate_chain(&self.chain, &self.pow)
    }
}
