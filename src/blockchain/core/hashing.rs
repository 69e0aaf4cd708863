//! Canonical block digests.
//!
//! Every field is turned into a string first, the strings are laid out as a
//! JSON object in a fixed key order (`", "` / `": "` separators) and the
//! resulting text is SHA-256 hashed. Nested transactions are canonicalised
//! the same way and embedded as the string value of `transactions`. An absent
//! optional field is written as a bare `null`, never as the string `"null"`.

use serde_json::Value;

use crate::crypto::{sha256_hex, BlockHash};
use crate::transaction::Transaction;

use super::chain::Block;

pub struct HashChain;

impl HashChain {
    /// Hex SHA-256 of the block's canonical form. Deterministic across runs.
    pub fn digest(block: &Block) -> BlockHash {
        sha256_hex(Self::canonical_form(block).as_bytes())
    }

    /// The exact text that gets hashed for `block`.
    pub fn canonical_form(block: &Block) -> String {
        let transactions = block
            .transactions
            .iter()
            .map(canonical_transaction)
            .collect::<Vec<_>>()
            .join(", ");

        canonical_record(&[
            ("index", text(block.index)),
            ("timestamp", text(block.timestamp)),
            ("proof", text(block.proof)),
            ("previous_hash", text(&block.previous_hash)),
            ("transactions", text(format!("[{}]", transactions))),
        ])
    }
}

fn canonical_transaction(tx: &Transaction) -> String {
    canonical_record(&[
        ("sender", text(tx.sender())),
        ("recipient", text(tx.recipient())),
        ("amount", text(tx.amount())),
        ("category", optional(tx.category())),
        ("note", optional(tx.note())),
        ("created_at", text(tx.created_at())),
    ])
}

fn text(value: impl ToString) -> Value {
    Value::String(value.to_string())
}

fn optional(value: Option<&str>) -> Value {
    value.map_or(Value::Null, text)
}

// serde_json's `Value` Display is infallible and handles string escaping.
fn canonical_record(fields: &[(&str, Value)]) -> String {
    let body = fields
        .iter()
        .map(|(key, value)| format!("{}: {}", Value::from(*key), value))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{}}}", body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block() -> Block {
        Block {
            index: 2,
            timestamp: 1_700_000_000_000,
            proof: 35_293,
            previous_hash: "1".to_string(),
            transactions: vec![Transaction::with_timestamp(
                "0",
                "alice",
                10.0,
                Some("reforestation".to_string()),
                None,
                1_699_999_999_000,
            )
            .unwrap()],
        }
    }

    #[test]
    fn test_canonical_form_layout() {
        let block = Block {
            transactions: vec![],
            ..sample_block()
        };
        assert_eq!(
            HashChain::canonical_form(&block),
            r#"{"index": "2", "timestamp": "1700000000000", "proof": "35293", "previous_hash": "1", "transactions": "[]"}"#
        );
    }

    #[test]
    fn test_nested_transactions_are_stringified() {
        let form = HashChain::canonical_form(&sample_block());
        assert!(form.contains(r#""transactions": "[{\"sender\": \"0\", \"recipient\": \"alice\", \"amount\": \"10\""#));
        assert!(form.contains(r#"\"category\": \"reforestation\", \"note\": null"#));
    }

    #[test]
    fn test_absent_note_differs_from_literal_null() {
        let block = sample_block();
        let mut literal = block.clone();
        literal.transactions = vec![Transaction::with_timestamp(
            "0",
            "alice",
            10.0,
            Some("reforestation".to_string()),
            Some("null".to_string()),
            1_699_999_999_000,
        )
        .unwrap()];
        assert_ne!(
            HashChain::canonical_form(&block),
            HashChain::canonical_form(&literal)
        );
        assert_ne!(HashChain::digest(&block), HashChain::digest(&literal));
    }

    #[test]
    fn test_digest_is_deterministic() {
        let block = sample_block();
        let first = HashChain::digest(&block);
        assert_eq!(first, HashChain::digest(&block.clone()));
        assert_eq!(first.len(), 64);
        assert_eq!(first, sha256_hex(HashChain::canonical_form(&block).as_bytes()));
    }

    #[test]
    fn test_digest_changes_with_contents() {
        let block = sample_block();
        let mut tampered = block.clone();
        tampered.proof += 1;
        assert_ne!(HashChain::digest(&block), HashChain::digest(&tampered));

        let mut reordered = block.clone();
        reordered.transactions.push(
            Transaction::with_timestamp("alice", "bob", 1.0, None, None, 1).unwrap(),
        );
        assert_ne!(HashChain::digest(&block), HashChain::digest(&reordered));
    }
}
