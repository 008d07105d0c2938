//! Schema-driven SBE encoding.
//!
//! Output is `header || root_block || var_section || groups`, all
//! little-endian. The root (and each group element's) block is
//! zero-initialized with nullable fields pre-set to their null value, so
//! absent optional fields decode as absent rather than as zero noise.
//! Unknown tags are dropped silently — forward compatibility with
//! schemas that predate later FIX extensions.

use crate::error::EncodeError;
use crate::schema::{BlockLayout, FixedField, MessageLayout, SbeType, Schema, Semantics};
use crate::value::{self, ValueError};
use fixsbe_core::{Descriptor, Node, Tag};
use std::collections::HashMap;
use tracing::debug;

/// Wire size of the message header:
/// `{blockLength, templateId, schemaId, version}: u16 × 4`.
pub const HEADER_SIZE: usize = 8;

/// Per-tag overrides of the scale exponent applied to decimal fields.
#[derive(Clone, Debug, Default)]
pub struct ScalingOverrides(HashMap<Tag, u32>);

impl ScalingOverrides {
    /// No overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the exponent for one tag.
    pub fn set(&mut self, tag: Tag, exponent: u32) {
        self.0.insert(tag, exponent);
    }

    /// The override for `tag`, if any.
    #[must_use]
    pub fn exponent(&self, tag: Tag) -> Option<u32> {
        self.0.get(&tag).copied()
    }

    fn exponent_for(&self, tag: Tag, default: u32) -> u32 {
        self.exponent(tag).unwrap_or(default)
    }
}

impl FromIterator<(Tag, u32)> for ScalingOverrides {
    fn from_iter<I: IntoIterator<Item = (Tag, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Encode a descriptor against a message layout.
pub fn encode_message(
    schema: &Schema,
    layout: &MessageLayout,
    descriptor: &Descriptor,
) -> Result<Vec<u8>, EncodeError> {
    encode_message_with(schema, layout, descriptor, &ScalingOverrides::new())
}

/// Encode with per-tag scaling overrides.
pub fn encode_message_with(
    schema: &Schema,
    layout: &MessageLayout,
    descriptor: &Descriptor,
    overrides: &ScalingOverrides,
) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::with_capacity(HEADER_SIZE + usize::from(layout.body.block_length));
    out.extend_from_slice(&layout.body.block_length.to_le_bytes());
    out.extend_from_slice(&layout.template_id.to_le_bytes());
    out.extend_from_slice(&schema.id.to_le_bytes());
    out.extend_from_slice(&schema.version.to_le_bytes());
    encode_block(&layout.body, descriptor, overrides, &mut out)?;
    Ok(out)
}

fn encode_block(
    body: &BlockLayout,
    descriptor: &Descriptor,
    overrides: &ScalingOverrides,
    out: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    // Fixed block: zeros, then null sentinels, then supplied values.
    // Bounds are checked up front for every field — the decoder performs
    // the same check — so a layout that was not produced by the loader
    // surfaces as an error instead of a slice panic.
    let mut block = vec![0u8; usize::from(body.block_length)];
    for field in &body.fields {
        if field.offset + field.ty.size() > block.len() {
            return Err(EncodeError::FieldOutOfBlock {
                tag: field.tag,
                offset: field.offset,
                size: field.ty.size(),
                block_length: body.block_length,
            });
        }
        if !field.required {
            write_null(field, &mut block);
        }
    }
    for (tag, node) in descriptor {
        match node {
            Node::Scalar(value) => {
                if let Some(field) = body.fixed(*tag) {
                    write_fixed(field, value, overrides, &mut block)?;
                } else if !body.is_scalar_member(*tag) && body.group(*tag).is_none() {
                    debug!(tag, "tag unknown to this layout, dropping");
                }
            }
            Node::Group(_) => {
                if body.group(*tag).is_none() {
                    debug!(tag, "group tag unknown to this layout, dropping");
                }
            }
        }
    }
    out.extend_from_slice(&block);

    // Variable section: declared order, absent fields emit length 0.
    for data_field in &body.data_fields {
        let bytes = match descriptor.get(data_field.tag) {
            Some(Node::Scalar(value)) => value.as_bytes(),
            _ => &[],
        };
        let len = u16::try_from(bytes.len()).map_err(|_| EncodeError::Value {
            tag: data_field.tag,
            value: String::from_utf8_lossy(&bytes[..32]).into_owned(),
            source: ValueError::TooLong,
        })?;
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(bytes);
    }

    // Groups: dimension, then per entry the block, var section, and
    // nested groups recursively.
    for group in &body.groups {
        let entries: &[Descriptor] = match descriptor.get(group.count_tag) {
            Some(Node::Group(entries)) => entries,
            Some(Node::Scalar(count)) => {
                // A bare count with no entries is only consistent when zero.
                let declared: usize =
                    count.parse().map_err(|_| EncodeError::Value {
                        tag: group.count_tag,
                        value: count.clone(),
                        source: ValueError::NotNumeric,
                    })?;
                if declared != 0 {
                    return Err(EncodeError::GroupCountMismatch {
                        tag: group.count_tag,
                        declared,
                        actual: 0,
                    });
                }
                &[]
            }
            None => &[],
        };
        let count = u16::try_from(entries.len()).map_err(|_| EncodeError::GroupTooLarge {
            tag: group.count_tag,
            actual: entries.len(),
        })?;
        out.extend_from_slice(&group.body.block_length.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        for entry in entries {
            encode_block(&group.body, entry, overrides, out)?;
        }
    }
    Ok(())
}

fn write_null(field: &FixedField, block: &mut [u8]) {
    let dst = &mut block[field.offset..field.offset + field.ty.size()];
    match field.ty {
        SbeType::Double => dst.copy_from_slice(&f64::NAN.to_le_bytes()),
        _ => {
            if let Some(null) = field.null_value {
                write_int(field.ty, null, dst);
            }
        }
    }
}

fn write_fixed(
    field: &FixedField,
    raw: &str,
    overrides: &ScalingOverrides,
    block: &mut [u8],
) -> Result<(), EncodeError> {
    let err = |source: ValueError| EncodeError::Value {
        tag: field.tag,
        value: raw.to_owned(),
        source,
    };
    let dst = &mut block[field.offset..field.offset + field.ty.size()];
    match (field.ty, field.semantics) {
        (SbeType::Char, _) => dst[0] = value::parse_char(raw).map_err(err)?,
        (SbeType::UInt8, Semantics::Boolean) => {
            dst[0] = value::parse_boolean(raw).map_err(err)?;
        }
        (SbeType::UInt8, _) => {
            dst[0] = raw.parse::<u8>().map_err(|_| err(ValueError::NotNumeric))?;
        }
        (SbeType::UInt16, _) => {
            let v: u16 = raw.parse().map_err(|_| err(ValueError::NotNumeric))?;
            dst.copy_from_slice(&v.to_le_bytes());
        }
        (SbeType::UInt32, _) => {
            let v: u32 = raw.parse().map_err(|_| err(ValueError::NotNumeric))?;
            dst.copy_from_slice(&v.to_le_bytes());
        }
        (SbeType::UInt64, Semantics::Timestamp) => {
            let v = value::parse_timestamp(raw).map_err(err)?;
            dst.copy_from_slice(&v.to_le_bytes());
        }
        (SbeType::UInt64, _) => {
            let v: u64 = raw.parse().map_err(|_| err(ValueError::NotNumeric))?;
            dst.copy_from_slice(&v.to_le_bytes());
        }
        (SbeType::Int64, Semantics::Scaled(exponent)) => {
            let exponent = overrides.exponent_for(field.tag, exponent);
            let v = value::parse_scaled(raw, exponent).map_err(err)?;
            dst.copy_from_slice(&v.to_le_bytes());
        }
        (SbeType::Int64, _) => {
            let v: i64 = raw.parse().map_err(|_| err(ValueError::NotNumeric))?;
            dst.copy_from_slice(&v.to_le_bytes());
        }
        (SbeType::Double, _) => {
            let v: f64 = raw.parse().map_err(|_| err(ValueError::NotNumeric))?;
            dst.copy_from_slice(&v.to_le_bytes());
        }
    }
    Ok(())
}

fn write_int(ty: SbeType, value: i64, dst: &mut [u8]) {
    match ty {
        SbeType::Char | SbeType::UInt8 => dst[0] = value as u8,
        SbeType::UInt16 => dst.copy_from_slice(&(value as u16).to_le_bytes()),
        SbeType::UInt32 => dst.copy_from_slice(&(value as u32).to_le_bytes()),
        SbeType::UInt64 => dst.copy_from_slice(&(value as u64).to_le_bytes()),
        SbeType::Int64 => dst.copy_from_slice(&value.to_le_bytes()),
        SbeType::Double => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A layout that did not come through the loader and places a field
    /// past the end of its block must error, not panic.
    #[test]
    fn hand_built_layout_with_stray_offset_is_an_error() {
        let schema =
            Schema::from_xml(r#"<sbe:messageSchema xmlns:sbe="urn:sbe" id="1" version="0"/>"#)
                .unwrap();
        let layout = MessageLayout {
            template_id: 9,
            name: "Rogue".to_owned(),
            msg_type: None,
            body: BlockLayout {
                block_length: 4,
                fields: vec![FixedField {
                    tag: 44,
                    name: "Price".to_owned(),
                    ty: SbeType::Int64,
                    offset: 2,
                    required: false,
                    null_value: Some(i64::MIN),
                    semantics: Semantics::Scaled(4),
                }],
                data_fields: Vec::new(),
                groups: Vec::new(),
            },
        };
        let descriptor = Descriptor::from_scalars([(44u32, "1.5")]).unwrap();
        assert!(matches!(
            encode_message(&schema, &layout, &descriptor),
            Err(EncodeError::FieldOutOfBlock {
                tag: 44,
                offset: 2,
                size: 8,
                block_length: 4,
            })
        ));
    }
}
