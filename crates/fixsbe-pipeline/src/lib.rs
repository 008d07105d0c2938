//! fixsbe-pipeline — the boundary the external collaborators see.
//!
//! Callers hand over a descriptor (or raw FIX text plus a schema) and
//! receive a [`ProofBundle`]: the SBE bytes, the 32-byte Merkle root,
//! every enumerated leaf, and one inclusion proof per leaf. The on-chain
//! verifier recomputes leaf hashes and walks the proofs bit-for-bit
//! against the same root.
//!
//! The whole pipeline is a synchronous, pure transformation: parsed
//! schemas are cached once per path (invalidated by content hash) and
//! shared read-only; everything else is built fresh per message.

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

/// Bundle types and the proving facade.
pub mod bundle;
/// Schema cache keyed by path + content hash.
pub mod cache;
/// Bundle file I/O (JSON/CBOR, auto-detected by extension).
pub mod io;
/// Business-field round-trip verification.
pub mod roundtrip;

pub use bundle::{
    commit_descriptor, commit_fix_text, prove_descriptor, prove_fix_text, Commitment, FieldProof,
    ProofBundle,
};
pub use cache::SchemaCache;
pub use roundtrip::{check_round_trip, Mismatch};

use anyhow::{Context, Result};
use fixsbe_core::{SeparatorHint, Tag};
use fixsbe_sbe::{MessageLayout, ScalingOverrides, Schema};
use std::path::PathBuf;

/// How the caller names the message to encode.
#[derive(Clone, Debug)]
pub enum MessageSelector {
    /// By SBE template id.
    Id(u16),
    /// By message name.
    Name(String),
}

/// Recognized configuration options for one pipeline run.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// File holding the SBE schema XML.
    pub schema_path: PathBuf,
    /// Which message template to use.
    pub message: MessageSelector,
    /// FIX separator handling.
    pub separator: SeparatorHint,
    /// Per-tag scale-exponent overrides for decimal fields.
    pub scaling_overrides: Vec<(Tag, u32)>,
}

impl PipelineConfig {
    /// Resolve the configured message against a loaded schema.
    pub fn select<'s>(&self, schema: &'s Schema) -> Result<&'s MessageLayout> {
        let layout = match &self.message {
            MessageSelector::Id(id) => schema.message_by_id(*id),
            MessageSelector::Name(name) => schema.message_by_name(name),
        }
        .context("selecting message template")?;
        Ok(layout)
    }

    /// Materialize the scaling overrides.
    #[must_use]
    pub fn overrides(&self) -> ScalingOverrides {
        self.scaling_overrides.iter().copied().collect()
    }
}

/// Load the configured schema through `cache`, run the full pipeline on
/// raw FIX text, and return the bundle.
pub fn run(config: &PipelineConfig, cache: &SchemaCache, fix_text: &str) -> Result<ProofBundle> {
    let schema = cache
        .load(&config.schema_path)
        .with_context(|| format!("loading schema {}", config.schema_path.display()))?;
    let layout = config.select(&schema)?;
    prove_fix_text(&schema, layout, fix_text, config.separator, &config.overrides())
}

/// Like [`run`], but root-only: no per-field proofs are generated.
pub fn commit(config: &PipelineConfig, cache: &SchemaCache, fix_text: &str) -> Result<Commitment> {
    let schema = cache
        .load(&config.schema_path)
        .with_context(|| format!("loading schema {}", config.schema_path.display()))?;
    let layout = config.select(&schema)?;
    commit_fix_text(&schema, layout, fix_text, config.separator, &config.overrides())
}
