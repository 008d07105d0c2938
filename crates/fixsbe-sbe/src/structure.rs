//! Folding a flat ordered tag list into a structured [`Descriptor`].
//!
//! Raw FIX is flat: a repeating group is just its count tag followed by
//! N runs of member tags. The schema layout tells us which tags belong
//! to which group, and a repeated tag inside a run delimits the next
//! entry — the standard FIX group-parsing rule. Unknown tags at the root
//! are kept as scalars (the encoder drops them silently later); a
//! non-member tag inside a group closes the group and returns control to
//! the enclosing level.

use crate::error::EncodeError;
use crate::schema::{BlockLayout, MessageLayout};
use crate::value::ValueError;
use fixsbe_core::{Descriptor, Tag};

/// Fold flat `(tag, value)` pairs into a descriptor shaped by `layout`.
///
/// The `NoXxx` count value is validated against the number of entries
/// actually parsed.
pub fn descriptor_from_pairs(
    layout: &MessageLayout,
    pairs: &[(Tag, String)],
) -> Result<Descriptor, EncodeError> {
    let mut idx = 0usize;
    let mut root = Descriptor::new();
    while idx < pairs.len() {
        let (tag, value) = &pairs[idx];
        if let Some(group) = layout.body.group(*tag) {
            let declared = parse_count(*tag, value)?;
            idx += 1;
            let entries = fold_entries(&group.body, pairs, &mut idx)?;
            if declared != entries.len() {
                return Err(EncodeError::GroupCountMismatch {
                    tag: *tag,
                    declared,
                    actual: entries.len(),
                });
            }
            root.insert_group(*tag, entries)?;
        } else {
            // Root scalars, including tags unknown to the layout: kept
            // in declaration order, dropped later by the encoder if the
            // schema has no slot for them.
            root.insert_scalar(*tag, value.clone())?;
            idx += 1;
        }
    }
    Ok(root)
}

/// Parse consecutive group entries starting at `idx`.
fn fold_entries(
    body: &BlockLayout,
    pairs: &[(Tag, String)],
    idx: &mut usize,
) -> Result<Vec<Descriptor>, EncodeError> {
    let mut entries = Vec::new();
    'entries: while *idx < pairs.len() {
        let (tag, _) = &pairs[*idx];
        if !is_member(body, *tag) {
            break;
        }
        let mut entry = Descriptor::new();
        while *idx < pairs.len() {
            let (tag, value) = &pairs[*idx];
            if entry.contains(*tag) {
                // Repeated tag: this entry is complete, the next begins.
                entries.push(entry);
                continue 'entries;
            }
            if let Some(nested) = body.group(*tag) {
                let declared = parse_count(*tag, value)?;
                *idx += 1;
                let nested_entries = fold_entries(&nested.body, pairs, idx)?;
                if declared != nested_entries.len() {
                    return Err(EncodeError::GroupCountMismatch {
                        tag: *tag,
                        declared,
                        actual: nested_entries.len(),
                    });
                }
                entry.insert_group(*tag, nested_entries)?;
            } else if body.is_scalar_member(*tag) {
                entry.insert_scalar(*tag, value.clone())?;
                *idx += 1;
            } else {
                break;
            }
        }
        entries.push(entry);
        break;
    }
    Ok(entries)
}

fn is_member(body: &BlockLayout, tag: Tag) -> bool {
    body.is_scalar_member(tag) || body.group(tag).is_some()
}

fn parse_count(tag: Tag, value: &str) -> Result<usize, EncodeError> {
    value.parse().map_err(|_| EncodeError::Value {
        tag,
        value: value.to_owned(),
        source: ValueError::NotNumeric,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use fixsbe_core::Node;

    fn layout() -> Schema {
        Schema::from_xml(
            r#"<sbe:messageSchema xmlns:sbe="urn:sbe" package="t" id="1" version="0">
  <types>
    <composite name="varStringEncoding">
      <type name="length" primitiveType="uint16"/>
      <type name="varData" primitiveType="uint8" length="0"/>
    </composite>
  </types>
  <sbe:message name="NewOrderSingle" id="14" blockLength="1">
    <field name="Side" id="54" type="char" presence="required"/>
    <data name="ClOrdID" id="11" type="varStringEncoding"/>
    <group name="Parties" id="453" blockLength="5">
      <field name="PartyIDSource" id="447" type="char"/>
      <field name="PartyRole" id="452" type="uint32"/>
      <data name="PartyID" id="448" type="varStringEncoding"/>
    </group>
  </sbe:message>
</sbe:messageSchema>"#,
        )
        .unwrap()
    }

    fn pairs(raw: &[(u32, &str)]) -> Vec<(u32, String)> {
        raw.iter().map(|(t, v)| (*t, (*v).to_owned())).collect()
    }

    #[test]
    fn folds_a_two_entry_group() {
        let schema = layout();
        let layout = schema.message_by_id(14).unwrap();
        let flat = pairs(&[
            (11, "ORD-1"),
            (54, "1"),
            (453, "2"),
            (448, "PARTY1"),
            (447, "D"),
            (452, "1"),
            (448, "PARTY2"),
            (447, "D"),
            (452, "3"),
        ]);
        let d = descriptor_from_pairs(layout, &flat).unwrap();
        let entries = d.get(453).and_then(Node::as_group).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].get(448).and_then(Node::as_scalar), Some("PARTY1"));
        assert_eq!(entries[1].get(452).and_then(Node::as_scalar), Some("3"));
    }

    #[test]
    fn count_mismatch_is_an_error() {
        let schema = layout();
        let layout = schema.message_by_id(14).unwrap();
        let flat = pairs(&[(453, "3"), (448, "PARTY1"), (447, "D")]);
        assert!(matches!(
            descriptor_from_pairs(layout, &flat),
            Err(EncodeError::GroupCountMismatch {
                tag: 453,
                declared: 3,
                actual: 1
            })
        ));
    }

    #[test]
    fn trailing_root_fields_end_the_group() {
        let schema = layout();
        let layout = schema.message_by_id(14).unwrap();
        let flat = pairs(&[(453, "1"), (448, "PARTY1"), (54, "2")]);
        let d = descriptor_from_pairs(layout, &flat).unwrap();
        assert_eq!(d.get(453).and_then(Node::as_group).unwrap().len(), 1);
        assert_eq!(d.get(54).and_then(Node::as_scalar), Some("2"));
    }

    #[test]
    fn unknown_root_tags_are_kept_for_the_encoder_to_drop() {
        let schema = layout();
        let layout = schema.message_by_id(14).unwrap();
        let flat = pairs(&[(54, "1"), (9999, "x")]);
        let d = descriptor_from_pairs(layout, &flat).unwrap();
        assert_eq!(d.get(9999).and_then(Node::as_scalar), Some("x"));
    }
}
