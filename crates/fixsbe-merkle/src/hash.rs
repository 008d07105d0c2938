//! Keccak-256 over concatenated byte slices.
//!
//! This is **legacy** Keccak-256 (pre-FIPS padding), not standardized
//! SHA3-256 — it must match the hash used by the on-chain verifier
//! byte for byte.

use sha3::{Digest, Keccak256};

/// Keccak-256 of a single byte slice.
#[must_use]
pub fn keccak256(bytes: &[u8]) -> [u8; 32] {
    let mut h = Keccak256::new();
    h.update(bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&h.finalize());
    out
}

/// Keccak-256 of `left || right` — the Merkle parent combiner.
#[inline]
#[must_use]
pub fn keccak256_pair(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut h = Keccak256::new();
    h.update(left);
    h.update(right);
    let mut out = [0u8; 32];
    out.copy_from_slice(&h.finalize());
    out
}
