//! Error types for raw FIX parsing and descriptor construction.

use crate::descriptor::Tag;
use thiserror::Error;

/// Failure to recover a FIX string into tag=value pairs, or an invariant
/// violation while building a [`crate::Descriptor`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FixParseError {
    /// Input contained no recoverable `tag=value` pair.
    #[error("no tag=value pairs found in input")]
    Empty,
    /// A tag occurred twice at the same nesting level.
    #[error("duplicate tag {0} at the same nesting level")]
    DuplicateTag(Tag),
}
