//! Schema-driven SBE decoding.
//!
//! The inverse of the encoder: header first (with a template-id check),
//! then the root block by offsets, the variable section in declaration
//! order, and groups recursively. Null-valued and zero/empty scalars are
//! filtered out, so the result contains exactly the business fields that
//! were present. Scaled decimals come back as their on-wire integers —
//! the round-trip contract is numeric equality at tolerance, not string
//! equality, and division is a presentation concern.

use crate::error::DecodeError;
use crate::schema::{BlockLayout, FixedField, MessageLayout, SbeType};
use fixsbe_core::Tag;
use serde::{Deserialize, Serialize};

/// A decoded field value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DecodedValue {
    /// Unsigned wire integer (uint8/16/32/64, booleans, timestamps).
    Uint(u64),
    /// Signed wire integer (int64, including scaled decimals).
    Int(i64),
    /// IEEE double.
    Float(f64),
    /// Variable-length string (UTF-8, trailing NULs trimmed) or char.
    Text(String),
    /// Repeating group: one decoded mapping per entry, bound to the
    /// count tag.
    Group(Vec<DecodedMessage>),
}

impl DecodedValue {
    /// Borrow the text content, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the group entries, if any.
    #[must_use]
    pub fn as_group(&self) -> Option<&[DecodedMessage]> {
        match self {
            Self::Group(entries) => Some(entries),
            _ => None,
        }
    }
}

/// A decoded message (or group entry): tag → value in schema declaration
/// order, which keeps round-trip tests reproducible.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodedMessage {
    entries: Vec<(Tag, DecodedValue)>,
}

impl DecodedMessage {
    /// Look up a value by tag.
    #[must_use]
    pub fn get(&self, tag: Tag) -> Option<&DecodedValue> {
        self.entries
            .iter()
            .find_map(|(t, v)| (*t == tag).then_some(v))
    }

    /// Iterate entries in schema declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &(Tag, DecodedValue)> {
        self.entries.iter()
    }

    /// Number of decoded fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was decoded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Decode one message, checking the header's template id against
/// `layout`.
pub fn decode_message(
    layout: &MessageLayout,
    bytes: &[u8],
) -> Result<DecodedMessage, DecodeError> {
    let mut pos = 0usize;
    let header = take(bytes, &mut pos, 8)?;
    let wire_block_len = usize::from(u16::from_le_bytes([header[0], header[1]]));
    let template_id = u16::from_le_bytes([header[2], header[3]]);
    // schemaId and version occupy header[4..8]; the schema version is
    // pinned, so both are informational here.
    if template_id != layout.template_id {
        return Err(DecodeError::TemplateMismatch {
            expected: layout.template_id,
            found: template_id,
        });
    }
    decode_block(&layout.body, wire_block_len, bytes, &mut pos)
}

fn decode_block(
    body: &BlockLayout,
    wire_block_len: usize,
    bytes: &[u8],
    pos: &mut usize,
) -> Result<DecodedMessage, DecodeError> {
    let block = take(bytes, pos, wire_block_len)?;
    let mut out = DecodedMessage::default();

    for field in &body.fields {
        let end = field.offset + field.ty.size();
        if end > block.len() {
            return Err(DecodeError::Truncated {
                need: end,
                at: *pos - wire_block_len,
                have: block.len(),
            });
        }
        if let Some(value) = decode_fixed(field, &block[field.offset..end]) {
            out.entries.push((field.tag, value));
        }
    }

    for data_field in &body.data_fields {
        let len_bytes = take(bytes, pos, 2)?;
        let len = usize::from(u16::from_le_bytes([len_bytes[0], len_bytes[1]]));
        if len > bytes.len() - *pos {
            return Err(DecodeError::LengthOverrun {
                tag: data_field.tag,
                len,
                remaining: bytes.len() - *pos,
            });
        }
        let raw = take(bytes, pos, len)?;
        let text = String::from_utf8_lossy(raw);
        let trimmed = text.trim_end_matches('\0');
        if !trimmed.is_empty() {
            out.entries
                .push((data_field.tag, DecodedValue::Text(trimmed.to_owned())));
        }
    }

    for group in &body.groups {
        let dim = take(bytes, pos, 4)?;
        let entry_block_len = usize::from(u16::from_le_bytes([dim[0], dim[1]]));
        let count = usize::from(u16::from_le_bytes([dim[2], dim[3]]));
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            entries.push(decode_block(&group.body, entry_block_len, bytes, pos)?);
        }
        out.entries
            .push((group.count_tag, DecodedValue::Group(entries)));
    }

    Ok(out)
}

/// Decode one fixed field, filtering null sentinels and zero/empty
/// values.
fn decode_fixed(field: &FixedField, raw: &[u8]) -> Option<DecodedValue> {
    match field.ty {
        SbeType::Char => {
            let b = raw[0];
            (b != 0 && field.null_value != Some(i64::from(b)))
                .then(|| DecodedValue::Text(char::from(b).to_string()))
        }
        SbeType::UInt8 => keep_uint(field, u64::from(raw[0])),
        SbeType::UInt16 => {
            keep_uint(field, u64::from(u16::from_le_bytes([raw[0], raw[1]])))
        }
        SbeType::UInt32 => keep_uint(
            field,
            u64::from(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]])),
        ),
        SbeType::UInt64 => {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(raw);
            keep_uint(field, u64::from_le_bytes(buf))
        }
        SbeType::Int64 => {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(raw);
            let v = i64::from_le_bytes(buf);
            (v != 0 && field.null_value != Some(v)).then_some(DecodedValue::Int(v))
        }
        SbeType::Double => {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(raw);
            let v = f64::from_le_bytes(buf);
            (!v.is_nan() && v != 0.0).then_some(DecodedValue::Float(v))
        }
    }
}

fn keep_uint(field: &FixedField, v: u64) -> Option<DecodedValue> {
    let is_null = field
        .null_value
        .is_some_and(|null| u64::try_from(null).is_ok_and(|n| n == v));
    (v != 0 && !is_null).then_some(DecodedValue::Uint(v))
}

fn take<'a>(bytes: &'a [u8], pos: &mut usize, n: usize) -> Result<&'a [u8], DecodeError> {
    let have = bytes.len().saturating_sub(*pos);
    if n > have {
        return Err(DecodeError::Truncated {
            need: n,
            at: *pos,
            have,
        });
    }
    let slice = &bytes[*pos..*pos + n];
    *pos += n;
    Ok(slice)
}
