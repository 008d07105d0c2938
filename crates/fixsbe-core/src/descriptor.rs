//! The recursive FIX descriptor: an ordered mapping from tag to either a
//! scalar value or a repeating group.
//!
//! FIX tag lists are ordered and may repeat inside groups, so the mapping
//! is modelled as a `Vec<(Tag, Node)>` rather than a hash map; iteration
//! order is insertion order, which downstream encoders depend on. The one
//! invariant enforced here is that no tag appears twice at the same
//! nesting level.

use crate::error::FixParseError;
use serde::{Deserialize, Serialize};

/// A FIX tag. Positive, unique per nesting level.
pub type Tag = u32;

/// One entry of a [`Descriptor`]: a scalar value or a repeating group.
///
/// A `Group` node's tag is the FIX `NoXxx` count tag; the sequence length
/// is the count that tag would carry on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    /// Opaque UTF-8 value, interpreted per datatype only at encode time.
    Scalar(String),
    /// Ordered group entries, each a full sub-descriptor.
    Group(Vec<Descriptor>),
}

impl Node {
    /// Borrow the scalar value, if this node is one.
    #[inline]
    #[must_use]
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::Group(_) => None,
        }
    }

    /// Borrow the group entries, if this node is a group.
    #[inline]
    #[must_use]
    pub fn as_group(&self) -> Option<&[Descriptor]> {
        match self {
            Self::Scalar(_) => None,
            Self::Group(entries) => Some(entries),
        }
    }
}

/// Ordered, recursive tag → node mapping describing one FIX message
/// (or one repeating-group entry).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    entries: Vec<(Tag, Node)>,
}

impl Descriptor {
    /// Create an empty descriptor.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a descriptor from flat `(tag, value)` pairs (scalars only).
    ///
    /// Rejects duplicate tags; group folding from flat pairs is
    /// schema-driven and lives in the SBE crate.
    pub fn from_scalars<I, S>(pairs: I) -> Result<Self, FixParseError>
    where
        I: IntoIterator<Item = (Tag, S)>,
        S: Into<String>,
    {
        let mut d = Self::new();
        for (tag, value) in pairs {
            d.insert_scalar(tag, value.into())?;
        }
        Ok(d)
    }

    /// Append a scalar entry. Fails on a duplicate tag at this level.
    pub fn insert_scalar(
        &mut self,
        tag: Tag,
        value: impl Into<String>,
    ) -> Result<(), FixParseError> {
        self.check_fresh(tag)?;
        self.entries.push((tag, Node::Scalar(value.into())));
        Ok(())
    }

    /// Append a group entry. Fails on a duplicate tag at this level.
    pub fn insert_group(
        &mut self,
        tag: Tag,
        entries: Vec<Descriptor>,
    ) -> Result<(), FixParseError> {
        self.check_fresh(tag)?;
        self.entries.push((tag, Node::Group(entries)));
        Ok(())
    }

    fn check_fresh(&self, tag: Tag) -> Result<(), FixParseError> {
        if self.contains(tag) {
            return Err(FixParseError::DuplicateTag(tag));
        }
        Ok(())
    }

    /// Look up a node by tag at this level.
    #[must_use]
    pub fn get(&self, tag: Tag) -> Option<&Node> {
        self.entries
            .iter()
            .find_map(|(t, node)| (*t == tag).then_some(node))
    }

    /// Whether a tag is present at this level.
    #[inline]
    #[must_use]
    pub fn contains(&self, tag: Tag) -> bool {
        self.entries.iter().any(|(t, _)| *t == tag)
    }

    /// Iterate entries in insertion order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &(Tag, Node)> {
        self.entries.iter()
    }

    /// Number of entries at this level.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this level has no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Descriptor {
    type Item = &'a (Tag, Node);
    type IntoIter = std::slice::Iter<'a, (Tag, Node)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
