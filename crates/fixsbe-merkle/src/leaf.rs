//! Deterministic leaf enumeration over a descriptor.
//!
//! Every scalar occurrence produces exactly one leaf, addressed by its
//! path: `[tag]` at the root, and `[g, k]` prepended for the k-th entry
//! (0-indexed) of the group whose count tag is `g`. Nested groups
//! compose: `[g1, k1, g2, k2, tag]`.
//!
//! The output is sorted by `path_cbor` ascending (byte-lexicographic) —
//! that order is the canonical leaf index consumed by the tree builder,
//! and it is independent of the SBE wire layout by construction.

use crate::path::encode_path;
use fixsbe_core::{is_session_tag, Descriptor, Node, Tag};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

/// Separator between path bytes and value bytes inside the leaf preimage
/// (ASCII `=`).
pub const LEAF_SEPARATOR: u8 = 0x3D;

/// One provable scalar occurrence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaf {
    /// Tag chain with interleaved group indices.
    pub path: Vec<Tag>,
    /// Canonical CBOR encoding of `path`.
    pub path_cbor: Vec<u8>,
    /// UTF-8 value bytes, unchanged from the descriptor.
    pub value: Vec<u8>,
    /// `keccak256(path_cbor || 0x3D || value)`.
    pub hash: [u8; 32],
}

/// Canonical leaf hash: `keccak256(path_cbor || 0x3D || value_bytes)`.
#[must_use]
pub fn leaf_hash(path_cbor: &[u8], value: &[u8]) -> [u8; 32] {
    let mut h = Keccak256::new();
    h.update(path_cbor);
    h.update([LEAF_SEPARATOR]);
    h.update(value);
    let mut out = [0u8; 32];
    out.copy_from_slice(&h.finalize());
    out
}

/// Walk `descriptor` and emit one leaf per scalar, sorted by `path_cbor`.
///
/// Session tags and empty values produce no leaf.
#[must_use]
pub fn enumerate_leaves(descriptor: &Descriptor) -> Vec<Leaf> {
    let mut leaves = Vec::new();
    let mut prefix = Vec::new();
    walk(descriptor, &mut prefix, &mut leaves);
    leaves.sort_by(|a, b| a.path_cbor.cmp(&b.path_cbor));
    leaves
}

fn walk(descriptor: &Descriptor, prefix: &mut Vec<Tag>, out: &mut Vec<Leaf>) {
    for (tag, node) in descriptor {
        if is_session_tag(*tag) {
            continue;
        }
        match node {
            Node::Scalar(value) => {
                if value.is_empty() {
                    continue;
                }
                prefix.push(*tag);
                let path_cbor = encode_path(prefix);
                let value = value.as_bytes().to_vec();
                let hash = leaf_hash(&path_cbor, &value);
                out.push(Leaf {
                    path: prefix.clone(),
                    path_cbor,
                    value,
                    hash,
                });
                prefix.pop();
            }
            Node::Group(entries) => {
                for (k, entry) in entries.iter().enumerate() {
                    prefix.push(*tag);
                    prefix.push(k as Tag);
                    walk(entry, prefix, out);
                    prefix.pop();
                    prefix.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::keccak256;

    fn descriptor_two_fields() -> Descriptor {
        Descriptor::from_scalars([(55u32, "AAPL"), (223, "4.250")]).unwrap()
    }

    #[test]
    fn two_field_descriptor_sorts_by_path_bytes() {
        let leaves = enumerate_leaves(&descriptor_two_fields());
        assert_eq!(leaves.len(), 2);
        // 0x811837 < 0x8118DF, so tag 55 comes first.
        assert_eq!(leaves[0].path, vec![55]);
        assert_eq!(leaves[0].path_cbor, vec![0x81, 0x18, 0x37]);
        assert_eq!(leaves[1].path, vec![223]);
        assert_eq!(leaves[1].path_cbor, vec![0x81, 0x18, 0xDF]);
    }

    #[test]
    fn leaf_hash_binds_path_and_value() {
        let leaves = enumerate_leaves(&descriptor_two_fields());
        let expected = keccak256(
            &[[0x81u8, 0x18, 0x37].as_slice(), b"=".as_slice(), b"AAPL".as_slice()].concat(),
        );
        assert_eq!(leaves[0].hash, expected);
    }

    #[test]
    fn empty_values_and_session_tags_produce_no_leaf() {
        let mut d = Descriptor::new();
        d.insert_scalar(8, "FIX.4.4").unwrap();
        d.insert_scalar(55, "IBM").unwrap();
        d.insert_scalar(58, "").unwrap();
        let leaves = enumerate_leaves(&d);
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].path, vec![55]);
    }

    #[test]
    fn group_entries_get_distinct_indexed_paths() {
        let first = Descriptor::from_scalars([(455u32, "US912810TM09")]).unwrap();
        let second = Descriptor::from_scalars([(455u32, "912810TM0")]).unwrap();
        let mut d = Descriptor::new();
        d.insert_group(454, vec![first, second]).unwrap();

        let leaves = enumerate_leaves(&d);
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0].path, vec![454, 0, 455]);
        assert_eq!(
            leaves[0].path_cbor,
            vec![0x83, 0x19, 0x01, 0xC6, 0x00, 0x19, 0x01, 0xC7]
        );
        assert_eq!(leaves[1].path, vec![454, 1, 455]);
        assert_ne!(leaves[0].hash, leaves[1].hash);
    }
}
