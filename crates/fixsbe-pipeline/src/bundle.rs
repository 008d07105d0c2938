//! The serialized boundary object and the proving facade.

use anyhow::{Context, Result};
use fixsbe_core::{parse_tag_values, Descriptor, SeparatorHint, Tag};
use fixsbe_merkle::{enumerate_leaves, verify_field, Leaf, MerkleTree};
use fixsbe_sbe::{
    descriptor_from_pairs, encode_message_with, MessageLayout, ScalingOverrides, Schema,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Inclusion proof for one leaf, self-contained for the verifier side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldProof {
    /// The leaf's path (tags interleaved with group indices).
    pub path: Vec<Tag>,
    /// Sibling hashes bottom-up.
    pub siblings: Vec<[u8; 32]>,
    /// Direction bits, same length as `siblings`; `true` means the
    /// current node is the right child.
    pub directions: Vec<bool>,
}

/// Everything the external collaborators receive for one message:
/// `(sbe_bytes, merkle_root, leaves, per-field proofs)`.
///
/// Proofs are index-aligned with `leaves` (the canonical `path_cbor`
/// order). The structure is serialized as-is to JSON or CBOR; raw byte
/// vectors keep the CBOR rendering compact.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProofBundle {
    /// Schema-driven SBE encoding of the message.
    pub sbe: Vec<u8>,
    /// Merkle root over the canonical leaves.
    pub root: [u8; 32],
    /// Enumerated leaves in canonical order.
    pub leaves: Vec<Leaf>,
    /// One inclusion proof per leaf, same order.
    pub proofs: Vec<FieldProof>,
}

impl ProofBundle {
    /// Re-verify every proof against the root — the reference check the
    /// on-chain verifier mirrors. Total: returns `false` on any corrupt
    /// entry, never an error.
    #[must_use]
    pub fn verify(&self) -> bool {
        if self.leaves.len() != self.proofs.len() {
            return false;
        }
        self.leaves.iter().zip(&self.proofs).all(|(leaf, proof)| {
            let merkle_proof = fixsbe_merkle::MerkleProof {
                siblings: proof.siblings.clone(),
                directions: proof.directions.clone(),
            };
            verify_field(self.root, &leaf.path_cbor, &leaf.value, &merkle_proof)
        })
    }
}

/// A root-only commitment: SBE bytes, Merkle root, and the enumerated
/// leaves, with no per-field proofs.
///
/// This is the lightweight artifact for callers that only need to pin a
/// message to a root; proofs for individual fields come from the full
/// [`ProofBundle`] path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Commitment {
    /// Schema-driven SBE encoding of the message.
    pub sbe: Vec<u8>,
    /// Merkle root over the canonical leaves.
    pub root: [u8; 32],
    /// Enumerated leaves in canonical order.
    pub leaves: Vec<Leaf>,
}

/// Encode `descriptor` and compute its root, without generating proofs.
pub fn commit_descriptor(
    schema: &Schema,
    layout: &MessageLayout,
    descriptor: &Descriptor,
    overrides: &ScalingOverrides,
) -> Result<Commitment> {
    let sbe = encode_message_with(schema, layout, descriptor, overrides)
        .with_context(|| format!("encoding message {:?}", layout.name))?;
    let leaves = enumerate_leaves(descriptor);
    let root = MerkleTree::from_leaves(leaves.iter().map(|l| l.hash).collect()).root();
    debug!(
        leaves = leaves.len(),
        root = %hex::encode(root),
        "committed descriptor (root only)"
    );
    Ok(Commitment { sbe, root, leaves })
}

/// Root-only pipeline from raw FIX text: parse, fold, encode, commit.
pub fn commit_fix_text(
    schema: &Schema,
    layout: &MessageLayout,
    fix_text: &str,
    separator: SeparatorHint,
    overrides: &ScalingOverrides,
) -> Result<Commitment> {
    let pairs = parse_tag_values(fix_text, separator).context("parsing FIX input")?;
    let descriptor =
        descriptor_from_pairs(layout, &pairs).context("folding groups into a descriptor")?;
    commit_descriptor(schema, layout, &descriptor, overrides)
}

/// Encode `descriptor` and commit its leaves: the core boundary
/// operation.
///
/// The descriptor-to-leaves path is independent of the SBE layout, so a
/// schema change never moves a leaf.
pub fn prove_descriptor(
    schema: &Schema,
    layout: &MessageLayout,
    descriptor: &Descriptor,
    overrides: &ScalingOverrides,
) -> Result<ProofBundle> {
    let sbe = encode_message_with(schema, layout, descriptor, overrides)
        .with_context(|| format!("encoding message {:?}", layout.name))?;

    let leaves = enumerate_leaves(descriptor);
    let tree = MerkleTree::from_leaves(leaves.iter().map(|l| l.hash).collect());
    let root = tree.root();

    let mut proofs = Vec::with_capacity(leaves.len());
    for (index, leaf) in leaves.iter().enumerate() {
        let proof = tree
            .prove(index)
            .with_context(|| format!("proving leaf {:?}", leaf.path))?;
        proofs.push(FieldProof {
            path: leaf.path.clone(),
            siblings: proof.siblings,
            directions: proof.directions,
        });
    }
    debug!(
        leaves = leaves.len(),
        root = %hex::encode(root),
        "committed descriptor"
    );

    Ok(ProofBundle {
        sbe,
        root,
        leaves,
        proofs,
    })
}

/// Full pipeline from raw FIX text: parse, fold groups per the layout,
/// encode, commit.
pub fn prove_fix_text(
    schema: &Schema,
    layout: &MessageLayout,
    fix_text: &str,
    separator: SeparatorHint,
    overrides: &ScalingOverrides,
) -> Result<ProofBundle> {
    let pairs = parse_tag_values(fix_text, separator).context("parsing FIX input")?;
    let descriptor =
        descriptor_from_pairs(layout, &pairs).context("folding groups into a descriptor")?;
    prove_descriptor(schema, layout, &descriptor, overrides)
}

/// Find the proof for a specific path in a bundle.
#[must_use]
pub fn proof_for_path<'b>(bundle: &'b ProofBundle, path: &[Tag]) -> Option<&'b FieldProof> {
    bundle.proofs.iter().find(|p| p.path == path)
}
