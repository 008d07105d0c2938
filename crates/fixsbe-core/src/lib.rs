//! fixsbe-core — canonical FIX descriptor types and tag-value parsing.
//!
//! This crate defines the **stable boundary** used across fixsbe crates:
//! - the recursive, order-preserving [`Descriptor`] (tag → scalar or
//!   repeating group),
//! - the raw FIX tag-value parser (SOH / `|` / newline separated), and
//! - the session-tag policy (tags 8, 9, 10, 35 never reach the codec or
//!   the Merkle commitment).
//!
//! Everything downstream — the SBE codec, the leaf enumerator, the proof
//! pipeline — consumes these types and never re-parses raw FIX itself.

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

/// Recursive tag → value descriptor with insertion-order iteration.
pub mod descriptor;
/// Crate-local error types.
pub mod error;
/// Raw FIX tag-value splitting and separator detection.
pub mod tagvalue;

pub use descriptor::{Descriptor, Node, Tag};
pub use error::FixParseError;
pub use tagvalue::{parse_tag_values, SeparatorHint};

/// FIX session-layer tags that are stripped before any encoding or
/// merkleization: BeginString (8), BodyLength (9), CheckSum (10),
/// MsgType (35).
pub const SESSION_TAGS: [Tag; 4] = [8, 9, 10, 35];

/// Whether `tag` belongs to the FIX session layer.
#[inline]
#[must_use]
pub fn is_session_tag(tag: Tag) -> bool {
    SESSION_TAGS.contains(&tag)
}
