//! Error type for Orchestra parsing and compilation.

use thiserror::Error;

/// Failure while parsing an Orchestra repository or lowering it to SBE.
#[derive(Debug, Error)]
pub enum OrchestraError {
    /// The XML was not syntactically valid.
    #[error("invalid Orchestra XML: {0}")]
    Xml(#[from] roxmltree::Error),
    /// The repository declares no messages at all.
    #[error("repository contains no messages")]
    NoMessages,
    /// A targeted message name is absent from the repository.
    #[error("message {0:?} not found in repository")]
    MessageNotFound(String),
    /// A message resolved to zero valid fields after component expansion.
    #[error("message {0:?}: no valid fields found")]
    EmptyMessage(String),
}
