//! fixsbe-sbe — SBE schema loading and the offset-exact codec.
//!
//! Three pieces, all driven by the same [`schema::Schema`]:
//!
//! - [`schema`]: parse an SBE XML schema into offset-resolved layouts
//!   keyed by template id.
//! - [`encode`]: serialize an ordered [`fixsbe_core::Descriptor`] into
//!   `header || root_block || var_section || groups`, little-endian
//!   throughout.
//! - [`decode`]: the symmetric walk back to a tag → value mapping with
//!   group arrays.
//!
//! [`structure`] bridges raw FIX to the codec: it folds a flat tag list
//! into a descriptor using the layout's group member sets.
//!
//! Encoder output is fully determined by the ordered input and the
//! schema; decoder output preserves schema declaration order. Loaded
//! schemas are immutable and safe to share across threads.

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
#![allow(clippy::module_name_repetitions, clippy::cast_possible_truncation)]

/// Schema-driven decoding.
pub mod decode;
/// Schema-driven encoding.
pub mod encode;
/// Error types.
pub mod error;
/// SBE schema parsing and layout resolution.
pub mod schema;
/// Flat tag list → structured descriptor folding.
pub mod structure;
/// Per-datatype value codecs.
pub mod value;

pub use decode::{decode_message, DecodedMessage, DecodedValue};
pub use encode::{encode_message, encode_message_with, ScalingOverrides, HEADER_SIZE};
pub use error::{DecodeError, EncodeError, SchemaError};
pub use schema::{
    BlockLayout, DataField, FixedField, GroupLayout, MessageLayout, SbeType, Schema, Semantics,
};
pub use structure::descriptor_from_pairs;
pub use value::ValueError;
