//! Hashing primitives for CarbonLedger

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest (64 lowercase characters).
pub type BlockHash = String;

/// Raw SHA-256 of arbitrary bytes.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA-256 of arbitrary bytes, hex encoded.
pub fn sha256_hex(data: &[u8]) -> BlockHash {
    hex::encode(sha256(data))
}

/// Returns true when the first `zeros` characters of a hex digest are all `'0'`.
pub fn has_leading_hex_zeros(digest: &str, zeros: usize) -> bool {
    digest.len() >= zeros && digest.bytes().take(zeros).all(|c| c == b'0')
}
