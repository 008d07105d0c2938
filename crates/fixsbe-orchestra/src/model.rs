//! In-memory Orchestra repository model.
//!
//! Everything is keyed by numeric id, matching the reference style of the
//! Orchestra standard; names are carried for diagnostics and schema
//! emission only.

use std::collections::{BTreeMap, BTreeSet};

/// Field presence inside a message, component, or group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Presence {
    /// Must appear on the wire.
    Required,
    /// May be absent; fixed-size encodings carry a null value.
    #[default]
    Optional,
}

/// A reference from a message/component/group body to a member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Ref {
    /// `<fixr:fieldRef id=.../>`
    Field {
        /// Referenced field id (the FIX tag).
        id: u32,
        /// Declared presence.
        presence: Presence,
    },
    /// `<fixr:componentRef id=.../>`
    Component {
        /// Referenced component id.
        id: u32,
        /// Declared presence.
        presence: Presence,
    },
    /// `<fixr:groupRef id=.../>`
    Group {
        /// Referenced group id (Orchestra's synthetic id, not the count tag).
        id: u32,
        /// Declared presence.
        presence: Presence,
    },
}

/// A FIX field declaration: `id` is the wire tag, `datatype` names either
/// a FIX datatype (`String`, `Qty`, `UTCTimestamp`, ...) or a code set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    /// FIX tag.
    pub id: u32,
    /// Field name (e.g. `Symbol`).
    pub name: String,
    /// FIX datatype or code-set name.
    pub datatype: String,
}

/// A reusable bundle of field references, inlined at every use site
/// during compilation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Component {
    /// Orchestra component id.
    pub id: u32,
    /// Component name (e.g. `Instrument`).
    pub name: String,
    /// Ordered member references.
    pub refs: Vec<Ref>,
}

/// A repeating group: a count tag followed by N identically laid-out
/// entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    /// Orchestra group id (synthetic; the wire identity is the count tag).
    pub id: u32,
    /// Group name (e.g. `Parties`).
    pub name: String,
    /// The FIX `NoXxx` count tag.
    pub num_in_group_field_id: u32,
    /// Ordered member references.
    pub refs: Vec<Ref>,
}

/// A message declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Message id — becomes the SBE template id.
    pub id: u32,
    /// Message name (e.g. `NewOrderSingle`).
    pub name: String,
    /// FIX MsgType code (e.g. `D`).
    pub msg_type: String,
    /// Ordered member references.
    pub refs: Vec<Ref>,
}

/// The parsed repository: declaration-ordered messages plus id-keyed
/// lookups for everything they reference.
#[derive(Clone, Debug, Default)]
pub struct Repository {
    /// Fields by id.
    pub fields: BTreeMap<u32, Field>,
    /// Components by id.
    pub components: BTreeMap<u32, Component>,
    /// Groups by id.
    pub groups: BTreeMap<u32, Group>,
    /// Messages in declaration order.
    pub messages: Vec<Message>,
    /// Names of declared code sets; fields typed by any of these encode
    /// as variable-length strings.
    pub code_sets: BTreeSet<String>,
}

impl Repository {
    /// Whether `datatype` names a code set (declared, or by the `*CodeSet`
    /// naming convention).
    #[must_use]
    pub fn is_code_set(&self, datatype: &str) -> bool {
        self.code_sets.contains(datatype) || datatype.ends_with("CodeSet")
    }

    /// Find a message by exact name.
    #[must_use]
    pub fn message_by_name(&self, name: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.name == name)
    }
}
