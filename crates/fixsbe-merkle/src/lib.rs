//! fixsbe-merkle — canonical Merkle commitments over FIX descriptor fields.
//!
//! ## Overview
//! This crate turns a [`fixsbe_core::Descriptor`] into a 32-byte keccak-256
//! commitment against which any single field can later be proven. It
//! provides:
//!
//! - A **canonical path encoding** ([`path`]): every scalar occurrence is
//!   addressed by a chain of integers (tags interleaved with 0-based group
//!   indices) encoded in the deterministic CBOR unsigned/array subset.
//! - The **leaf enumerator** ([`leaf`]): deterministic walk emitting one
//!   leaf per scalar occurrence, sorted by path bytes.
//! - The **tree builder, prover, and reference verifier** ([`tree`]).
//!
//! ## Canonical leaf formula
//! `leaf_hash = keccak256(path_cbor || 0x3D || value_bytes)` — `0x3D` is
//! ASCII `=`, binding the path to the value exactly the way the on-chain
//! verifier recomputes it. Parents are `keccak256(left || right)`.
//!
//! ## Tree shape
//! Adjacent nodes pair left-to-right; a lone right-most node at any level
//! is **promoted** unchanged to the next level. Implementations that hash
//! the odd node with itself produce incompatible roots.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::module_name_repetitions)]

/// Keccak-256 primitive (legacy padding, matches the on-chain verifier).
pub mod hash;
/// Deterministic leaf enumeration over descriptors.
pub mod leaf;
/// Canonical CBOR encoding of integer-only leaf paths.
pub mod path;
/// Merkle tree construction, proof generation, and verification.
pub mod tree;

pub use hash::{keccak256, keccak256_pair};
pub use leaf::{enumerate_leaves, leaf_hash, Leaf};
pub use path::{decode_path, encode_path, path_from_signed, PathError};
pub use tree::{verify_field, verify_proof, MerkleProof, MerkleTree, ProofError};
