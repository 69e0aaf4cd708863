use crate::error::{LedgerError, Result};
use crate::miner::ProofOfWork;

use super::chain::{Block, GENESIS_PREVIOUS_HASH, GENESIS_PROOF};

/// Check a whole chain: genesis shape, then every block against its predecessor.
pub fn validate_chain(blocks: &[Block], pow: &ProofOfWork) -> Result<()> {
    let genesis = blocks.first().ok_or(LedgerError::EmptyChainAccess)?;
    validate_genesis(genesis)?;

    for pair in blocks.windows(2) {
        validate_successor(&pair[0], &pair[1], pow)?;
    }
    Ok(())
}

pub fn validate_genesis(block: &Block) -> Result<()> {
    if block.index != 1
        || block.proof != GENESIS_PROOF
        || block.previous_hash != GENESIS_PREVIOUS_HASH
        || !block.transactions.is_empty()
    {
        return Err(LedgerError::InvalidBlock(format!(
            "Genesis block must have index 1, proof {}, previous hash {:?} and no transactions.",
            GENESIS_PROOF, GENESIS_PREVIOUS_HASH
        )));
    }
    Ok(())
}

/// `block` must directly follow `previous`: next index, linked hash, valid proof.
pub fn validate_successor(previous: &Block, block: &Block, pow: &ProofOfWork) -> Result<()> {
    if block.index != previous.index + 1 {
        return Err(LedgerError::InvalidBlock(format!(
            "Invalid block index. Expected {}, but got {}.",
            previous.index + 1,
            block.index
        )));
    }

    let expected_hash = previous.hash();
    if block.previous_hash != expected_hash {
        return Err(LedgerError::InvalidBlockLinkage(format!(
            "Block {} expected previous hash {}, but got {}.",
            block.index, expected_hash, block.previous_hash
        )));
    }

    if !pow.is_valid(previous.proof, block.proof) {
        return Err(LedgerError::InvalidProofOfWork { index: block.index });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::Ledger;

    fn sealed_chain() -> (Vec<Block>, ProofOfWork) {
        let pow = ProofOfWork::new(2);
        let mut ledger = Ledger::with_proof_of_work(pow);
        ledger.issue("alice", 10.0, "reforestation", None).unwrap();
        ledger.seal_block().unwrap();
        ledger.transfer("alice", "bob", 4.0, None, None).unwrap();
        ledger.seal_block().unwrap();
        (ledger.chain().to_vec(), pow)
    }

    #[test]
    fn test_valid_chain_passes() {
        let (chain, pow) = sealed_chain();
        assert!(validate_chain(&chain, &pow).is_ok());
    }

    #[test]
    fn test_empty_chain_rejected() {
        assert_eq!(
            validate_chain(&[], &ProofOfWork::default()),
            Err(LedgerError::EmptyChainAccess)
        );
    }

    #[test]
    fn test_tampered_transaction_breaks_linkage() {
        let (mut chain, pow) = sealed_chain();
        chain[1].transactions[0] = crate::transaction::Transaction::with_timestamp(
            "0", "mallory", 1_000.0, None, None, 1,
        )
        .unwrap();
        assert!(matches!(
            validate_chain(&chain, &pow),
            Err(LedgerError::InvalidBlockLinkage(_))
        ));
    }

    #[test]
    fn test_bad_proof_detected() {
        let (mut chain, pow) = sealed_chain();
        let reference = chain[1].proof;
        let last = chain.len() - 1;
        chain[last].proof = (0..).find(|c| !pow.is_valid(reference, *c)).unwrap();
        assert_eq!(
            validate_chain(&chain, &pow),
            Err(LedgerError::InvalidProofOfWork { index: 3 })
        );
    }

    #[test]
    fn test_index_gap_detected() {
        let (mut chain, pow) = sealed_chain();
        chain.remove(1);
        assert!(matches!(
            validate_chain(&chain, &pow),
            Err(LedgerError::InvalidBlock(_))
        ));
    }
}
