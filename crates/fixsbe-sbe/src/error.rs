//! Error types for schema loading, encoding, and decoding.
//!
//! Encode and decode failures always identify the offending tag;
//! schema failures carry enough context to locate the element.

use crate::value::ValueError;
use fixsbe_core::{FixParseError, Tag};
use thiserror::Error;

/// Failure while loading an SBE schema document.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The XML was not syntactically valid.
    #[error("invalid SBE schema XML: {0}")]
    Xml(#[from] roxmltree::Error),
    /// A required attribute was absent.
    #[error("<{element}> is missing attribute {attr:?}")]
    MissingAttr {
        /// Element local name.
        element: &'static str,
        /// Attribute name.
        attr: &'static str,
    },
    /// An attribute failed to parse.
    #[error("<{element}> attribute {attr:?} has unusable value {value:?}")]
    BadAttr {
        /// Element local name.
        element: &'static str,
        /// Attribute name.
        attr: &'static str,
        /// The raw value.
        value: String,
    },
    /// A field or data element names an unknown encoding type.
    #[error("unknown encoding type {0:?}")]
    UnknownType(String),
    /// Declared block length disagrees with the sum of fixed-field sizes.
    #[error("{scope}: declared blockLength {declared} != computed {computed}")]
    BlockLengthMismatch {
        /// Message or group name.
        scope: String,
        /// The `blockLength` attribute.
        declared: u16,
        /// Sum of fixed-field sizes.
        computed: u16,
    },
    /// A field's explicit offset places it outside the declared block.
    #[error(
        "{scope}: field {tag} at offset {offset}+{size} exceeds blockLength {block_length}"
    )]
    FieldOutOfRange {
        /// Message or group name.
        scope: String,
        /// Offending field tag.
        tag: Tag,
        /// The field's byte offset.
        offset: usize,
        /// The field's wire size.
        size: usize,
        /// The declared block length.
        block_length: u16,
    },
    /// No message with the requested template id.
    #[error("no message with template id {0}")]
    UnknownTemplate(u16),
    /// No message with the requested name.
    #[error("no message named {0:?}")]
    UnknownMessage(String),
}

/// Failure while encoding a descriptor.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// A value is incompatible with its field's SBE type.
    #[error("tag {tag}: value {value:?}: {source}")]
    Value {
        /// Offending tag.
        tag: Tag,
        /// The raw value.
        value: String,
        /// What went wrong.
        #[source]
        source: ValueError,
    },
    /// The `NoXxx` count disagrees with the supplied entries.
    #[error("group {tag}: declared count {declared} != supplied {actual} entries")]
    GroupCountMismatch {
        /// Group count tag.
        tag: Tag,
        /// Count parsed from the descriptor value.
        declared: usize,
        /// Number of supplied sub-descriptors.
        actual: usize,
    },
    /// Too many entries for the u16 group dimension.
    #[error("group {tag}: {actual} entries exceed the u16 dimension")]
    GroupTooLarge {
        /// Group count tag.
        tag: Tag,
        /// Number of supplied sub-descriptors.
        actual: usize,
    },
    /// The layout places a field outside its own block; only possible
    /// with a layout that did not come from the schema loader.
    #[error("tag {tag}: field at offset {offset}+{size} exceeds block length {block_length}")]
    FieldOutOfBlock {
        /// Offending field tag.
        tag: Tag,
        /// The field's byte offset.
        offset: usize,
        /// The field's wire size.
        size: usize,
        /// The block length of the enclosing layout.
        block_length: u16,
    },
    /// Descriptor-level invariant violation (e.g. duplicate tag).
    #[error(transparent)]
    Descriptor(#[from] FixParseError),
}

/// Failure while decoding SBE bytes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Input ended before the structure it declares.
    #[error("truncated input: need {need} bytes at offset {at}, {have} remain")]
    Truncated {
        /// Bytes required.
        need: usize,
        /// Read position.
        at: usize,
        /// Bytes remaining.
        have: usize,
    },
    /// Header names a different template.
    #[error("template id mismatch: expected {expected}, found {found}")]
    TemplateMismatch {
        /// Template id of the layout used for decoding.
        expected: u16,
        /// Template id found in the header.
        found: u16,
    },
    /// A declared variable-length field overruns the remaining bytes.
    #[error("tag {tag}: declared length {len} overruns remaining {remaining} bytes")]
    LengthOverrun {
        /// Offending data-field tag.
        tag: Tag,
        /// Declared length.
        len: usize,
        /// Bytes remaining after the length prefix.
        remaining: usize,
    },
}
