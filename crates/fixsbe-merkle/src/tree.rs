//! Merkle tree construction, inclusion proofs, and the reference verifier.
//!
//! Tree shape: adjacent nodes pair left-to-right at every level; a lone
//! right-most node is **promoted** unchanged (never hashed with itself).
//! The root of an empty tree is the zero hash; a one-leaf tree's root is
//! that leaf. Proofs carry explicit direction bits because the on-chain
//! verifier consumes them positionally rather than re-deriving parity
//! from an index.

use crate::hash::keccak256_pair;
use crate::leaf::leaf_hash;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Proof-generation failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProofError {
    /// Requested leaf index is not in the tree.
    #[error("leaf index {index} out of range for {leaves} leaves")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of leaves in the tree.
        leaves: usize,
    },
}

/// Inclusion proof for one leaf: sibling hashes bottom-up with a
/// direction bit per sibling (`true` ⇒ the current node is the **right**
/// child, so the sibling goes on the left).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Sibling hashes, bottom-up; promotion levels contribute nothing.
    pub siblings: Vec<[u8; 32]>,
    /// Direction per sibling, same length as `siblings`.
    pub directions: Vec<bool>,
}

/// Balanced binary Merkle tree with odd-node promotion, retaining every
/// level so proofs are cheap to generate.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    levels: Vec<Vec<[u8; 32]>>,
}

impl MerkleTree {
    /// Build from leaf hashes in canonical order.
    #[must_use]
    pub fn from_leaves(leaves: Vec<[u8; 32]>) -> Self {
        if leaves.is_empty() {
            return Self { levels: Vec::new() };
        }
        let mut levels = vec![leaves];
        while levels[levels.len() - 1].len() > 1 {
            let prev = &levels[levels.len() - 1];
            let mut next = Vec::with_capacity((prev.len() + 1) / 2);
            for pair in prev.chunks(2) {
                match pair {
                    [left, right] => next.push(keccak256_pair(left, right)),
                    // Odd promotion: carry the last node up unchanged.
                    [lone] => next.push(*lone),
                    _ => unreachable!("chunks(2) yields 1- or 2-element slices"),
                }
            }
            levels.push(next);
        }
        Self { levels }
    }

    /// Number of leaves.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    /// Tree root; the zero hash for an empty tree.
    #[must_use]
    pub fn root(&self) -> [u8; 32] {
        self.levels
            .last()
            .and_then(|top| top.first())
            .copied()
            .unwrap_or([0u8; 32])
    }

    /// Generate the inclusion proof for the leaf at `index`.
    ///
    /// Walks level by level: where the node has a sibling, emit
    /// `(sibling, is_right)`; where it was promoted, emit nothing.
    pub fn prove(&self, index: usize) -> Result<MerkleProof, ProofError> {
        let leaves = self.leaf_count();
        if index >= leaves {
            return Err(ProofError::IndexOutOfRange { index, leaves });
        }
        let mut proof = MerkleProof::default();
        let mut i = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = i ^ 1;
            if sibling < level.len() {
                proof.siblings.push(level[sibling]);
                proof.directions.push(i & 1 == 1);
            }
            i >>= 1;
        }
        Ok(proof)
    }
}

/// Reference proof verification, mirroring the on-chain contract:
/// fold `is_right ? H(sibling || node) : H(node || sibling)` from the
/// leaf hash up and compare against `root`. Total — corrupt input is
/// simply `false`.
#[must_use]
pub fn verify_proof(root: [u8; 32], leaf: [u8; 32], proof: &MerkleProof) -> bool {
    if proof.siblings.len() != proof.directions.len() {
        return false;
    }
    let mut node = leaf;
    for (sibling, is_right) in proof.siblings.iter().zip(&proof.directions) {
        node = if *is_right {
            keccak256_pair(sibling, &node)
        } else {
            keccak256_pair(&node, sibling)
        };
    }
    node == root
}

/// Verify a field by recomputing its leaf hash from `(path_cbor, value)`
/// first — the exact computation the on-chain verifier performs.
#[must_use]
pub fn verify_field(root: [u8; 32], path_cbor: &[u8], value: &[u8], proof: &MerkleProof) -> bool {
    verify_proof(root, leaf_hash(path_cbor, value), proof)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::keccak256;

    fn leaves(n: u8) -> Vec<[u8; 32]> {
        (0..n).map(|i| keccak256(&[i])).collect()
    }

    #[test]
    fn empty_tree_has_zero_root() {
        assert_eq!(MerkleTree::from_leaves(Vec::new()).root(), [0u8; 32]);
    }

    #[test]
    fn single_leaf_root_is_the_leaf() {
        let l = keccak256(b"only");
        let tree = MerkleTree::from_leaves(vec![l]);
        assert_eq!(tree.root(), l);
        // The proof is empty and still verifies.
        let proof = tree.prove(0).unwrap();
        assert!(proof.siblings.is_empty());
        assert!(verify_proof(tree.root(), l, &proof));
    }

    #[test]
    fn three_leaves_promote_the_odd_node() {
        let v = leaves(3);
        let root = MerkleTree::from_leaves(v.clone()).root();
        // root = H(H(a,b), c), NOT H(H(a,b), H(c,c)).
        let expected = keccak256_pair(&keccak256_pair(&v[0], &v[1]), &v[2]);
        assert_eq!(root, expected);
        let duplicate_style = keccak256_pair(
            &keccak256_pair(&v[0], &v[1]),
            &keccak256_pair(&v[2], &v[2]),
        );
        assert_ne!(root, duplicate_style);
    }

    #[test]
    fn promoted_leaf_proof_skips_the_level() {
        let v = leaves(3);
        let tree = MerkleTree::from_leaves(v.clone());
        // Leaf 2 is promoted at level 0, so its proof has a single entry:
        // the H(a,b) node, with leaf 2 on the right.
        let proof = tree.prove(2).unwrap();
        assert_eq!(proof.siblings, vec![keccak256_pair(&v[0], &v[1])]);
        assert_eq!(proof.directions, vec![true]);
        assert!(verify_proof(tree.root(), v[2], &proof));
    }

    #[test]
    fn all_proofs_verify_for_many_sizes() {
        for n in [1u8, 2, 3, 4, 5, 7, 8, 9, 13, 16, 17, 31, 33] {
            let v = leaves(n);
            let tree = MerkleTree::from_leaves(v.clone());
            let root = tree.root();
            for (i, leaf) in v.iter().enumerate() {
                let proof = tree.prove(i).unwrap();
                assert!(
                    verify_proof(root, *leaf, &proof),
                    "proof failed for leaf {i} of {n}"
                );
            }
        }
    }

    #[test]
    fn corrupt_proofs_do_not_verify() {
        let v = leaves(5);
        let tree = MerkleTree::from_leaves(v.clone());
        let root = tree.root();
        let proof = tree.prove(1).unwrap();
        assert!(verify_proof(root, v[1], &proof));

        let mut bad_leaf = v[1];
        bad_leaf[0] ^= 1;
        assert!(!verify_proof(root, bad_leaf, &proof));

        let mut bad_sib = proof.clone();
        bad_sib.siblings[0][31] ^= 1;
        assert!(!verify_proof(root, v[1], &bad_sib));

        let mut bad_dir = proof.clone();
        bad_dir.directions[0] = !bad_dir.directions[0];
        assert!(!verify_proof(root, v[1], &bad_dir));

        let mut mismatched = proof;
        mismatched.directions.pop();
        assert!(!verify_proof(root, v[1], &mismatched));
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let tree = MerkleTree::from_leaves(leaves(4));
        assert_eq!(
            tree.prove(4),
            Err(ProofError::IndexOutOfRange {
                index: 4,
                leaves: 4
            })
        );
    }
}
