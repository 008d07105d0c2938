//! SBE schema loading: XML → offset-resolved message layouts.
//!
//! The loader accepts the schema our Orchestra compiler emits (or any
//! conformant schema using the same composites): a `messageSchema` root,
//! a `<types>` section declaring the header, `groupSizeEncoding`, and
//! var-data composites, then one message per template. Offsets are taken
//! from `offset` attributes when present and accumulated otherwise, and
//! the declared `blockLength` must equal the accumulated field sizes.

use crate::error::SchemaError;
use fixsbe_core::Tag;
use roxmltree::{Document, Node};
use std::collections::BTreeSet;

/// Fixed-width SBE primitive types used in root and group blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SbeType {
    /// Single ASCII character.
    Char,
    /// One byte (FIX Boolean).
    UInt8,
    /// Two bytes (group dimensions, `NumInGroup`).
    UInt16,
    /// Four bytes (FIX int family).
    UInt32,
    /// Eight bytes (timestamps).
    UInt64,
    /// Eight bytes signed (scaled decimals).
    Int64,
    /// IEEE 754 double.
    Double,
}

impl SbeType {
    /// Wire size in bytes.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::Char | Self::UInt8 => 1,
            Self::UInt16 => 2,
            Self::UInt32 => 4,
            Self::UInt64 | Self::Int64 | Self::Double => 8,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "char" => Some(Self::Char),
            "uint8" => Some(Self::UInt8),
            "uint16" => Some(Self::UInt16),
            "uint32" => Some(Self::UInt32),
            "uint64" => Some(Self::UInt64),
            "int64" => Some(Self::Int64),
            "double" => Some(Self::Double),
            _ => None,
        }
    }

    /// Default null sentinel for the optional form. `None` for double,
    /// whose sentinel is IEEE NaN.
    #[must_use]
    pub const fn default_null(self) -> Option<i64> {
        match self {
            Self::Char => Some(0),
            Self::UInt8 => Some(0xFF),
            Self::UInt16 => Some(0xFFFF),
            Self::UInt32 => Some(0xFFFF_FFFF),
            Self::UInt64 => Some(0), // timestamps: absent == 0
            Self::Int64 => Some(i64::MIN),
            Self::Double => None,
        }
    }
}

/// Value-level semantics recovered from the `semanticType` attribute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Semantics {
    /// Plain integer/char/float.
    #[default]
    Plain,
    /// Decimal scaled by `10^exponent` on the wire.
    Scaled(u32),
    /// 17-digit `YYYYMMDDHHMMSSmmm` timestamp integer.
    Timestamp,
    /// FIX Boolean (`Y`/`N` family).
    Boolean,
}

impl Semantics {
    fn from_semantic_type(name: &str) -> Self {
        match name {
            "Qty" | "Price" | "PriceOffset" | "Amt" => Self::Scaled(4),
            "Percentage" => Self::Scaled(8),
            "UTCTimestamp" | "TZTimestamp" => Self::Timestamp,
            "Boolean" => Self::Boolean,
            _ => Self::Plain,
        }
    }
}

/// One fixed-size field occurrence in a root or group block.
#[derive(Clone, Debug)]
pub struct FixedField {
    /// FIX tag.
    pub tag: Tag,
    /// Field name, for diagnostics.
    pub name: String,
    /// Wire primitive.
    pub ty: SbeType,
    /// Byte offset inside the block.
    pub offset: usize,
    /// Declared presence; optional fields are pre-set to their null value.
    pub required: bool,
    /// Null sentinel; `None` means IEEE NaN (double) or required.
    pub null_value: Option<i64>,
    /// Value-level semantics (scaling, timestamp, boolean).
    pub semantics: Semantics,
}

/// One variable-length string field, in declared order after the block.
#[derive(Clone, Debug)]
pub struct DataField {
    /// FIX tag.
    pub tag: Tag,
    /// Field name, for diagnostics.
    pub name: String,
}

/// The recursive block shape shared by messages and repeating groups.
#[derive(Clone, Debug, Default)]
pub struct BlockLayout {
    /// Fixed block size in bytes.
    pub block_length: u16,
    /// Fixed fields with resolved offsets.
    pub fields: Vec<FixedField>,
    /// Variable-length fields in declaration order.
    pub data_fields: Vec<DataField>,
    /// Nested repeating groups in declaration order.
    pub groups: Vec<GroupLayout>,
}

impl BlockLayout {
    /// Look up a fixed field by tag.
    #[must_use]
    pub fn fixed(&self, tag: Tag) -> Option<&FixedField> {
        self.fields.iter().find(|f| f.tag == tag)
    }

    /// Look up a nested group by its count tag.
    #[must_use]
    pub fn group(&self, count_tag: Tag) -> Option<&GroupLayout> {
        self.groups.iter().find(|g| g.count_tag == count_tag)
    }

    /// Whether `tag` names a scalar (fixed or data) member of this block.
    #[must_use]
    pub fn is_scalar_member(&self, tag: Tag) -> bool {
        self.fields.iter().any(|f| f.tag == tag)
            || self.data_fields.iter().any(|d| d.tag == tag)
    }
}

/// A repeating group: its count tag plus its own block shape.
#[derive(Clone, Debug)]
pub struct GroupLayout {
    /// The FIX `NoXxx` count tag (also the SBE group id).
    pub count_tag: Tag,
    /// Group name, for diagnostics.
    pub name: String,
    /// The group's block shape, recursively.
    pub body: BlockLayout,
}

/// One message template.
#[derive(Clone, Debug)]
pub struct MessageLayout {
    /// SBE template id.
    pub template_id: u16,
    /// Message name.
    pub name: String,
    /// FIX MsgType code, when the schema carries one.
    pub msg_type: Option<String>,
    /// Root block shape.
    pub body: BlockLayout,
}

/// A loaded schema: immutable, cheap to share read-only across threads.
#[derive(Clone, Debug)]
pub struct Schema {
    /// Schema id (third header word).
    pub id: u16,
    /// Schema version (fourth header word).
    pub version: u16,
    /// Package name from the schema root.
    pub package: String,
    messages: Vec<MessageLayout>,
}

impl Schema {
    /// Parse and offset-resolve a schema document.
    pub fn from_xml(xml: &str) -> Result<Self, SchemaError> {
        let doc = Document::parse(xml)?;
        let root = doc.root_element();

        let id = attr_parse(root, "messageSchema", "id")?.unwrap_or(0);
        let version = attr_parse(root, "messageSchema", "version")?.unwrap_or(0);
        let package = root.attribute("package").unwrap_or("").to_owned();

        // Var-data encodings: composites shaped {length, varData}.
        let var_encodings = collect_var_encodings(root);

        let mut messages = Vec::new();
        for node in root.children().filter(Node::is_element) {
            if node.tag_name().name() != "message" {
                continue;
            }
            messages.push(parse_message(node, &var_encodings)?);
        }

        Ok(Self {
            id,
            version,
            package,
            messages,
        })
    }

    /// All message layouts in declaration order.
    #[must_use]
    pub fn messages(&self) -> &[MessageLayout] {
        &self.messages
    }

    /// Look up a message by template id.
    pub fn message_by_id(&self, template_id: u16) -> Result<&MessageLayout, SchemaError> {
        self.messages
            .iter()
            .find(|m| m.template_id == template_id)
            .ok_or(SchemaError::UnknownTemplate(template_id))
    }

    /// Look up a message by name.
    pub fn message_by_name(&self, name: &str) -> Result<&MessageLayout, SchemaError> {
        self.messages
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| SchemaError::UnknownMessage(name.to_owned()))
    }
}

fn collect_var_encodings(root: Node<'_, '_>) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for composite in root
        .descendants()
        .filter(Node::is_element)
        .filter(|n| n.tag_name().name() == "composite")
    {
        let member_names: Vec<&str> = composite
            .children()
            .filter(Node::is_element)
            .filter_map(|c| c.attribute("name"))
            .collect();
        if member_names.contains(&"length") && member_names.contains(&"varData") {
            if let Some(name) = composite.attribute("name") {
                out.insert(name.to_owned());
            }
        }
    }
    out
}

fn parse_message(
    node: Node<'_, '_>,
    var_encodings: &BTreeSet<String>,
) -> Result<MessageLayout, SchemaError> {
    let template_id = attr_required(node, "message", "id")?;
    let name = node.attribute("name").unwrap_or("").to_owned();
    let msg_type = node.attribute("semanticType").map(str::to_owned);
    let body = parse_block(node, &name, var_encodings)?;
    Ok(MessageLayout {
        template_id,
        name,
        msg_type,
        body,
    })
}

/// Parse the field/data/group children of a message or group element and
/// resolve offsets.
fn parse_block(
    node: Node<'_, '_>,
    scope: &str,
    var_encodings: &BTreeSet<String>,
) -> Result<BlockLayout, SchemaError> {
    let mut body = BlockLayout::default();
    // `cursor` is where the next implicit offset lands; `sum_of_sizes`
    // is the invariant the declared blockLength must equal. Explicit
    // offsets move the cursor but never shrink the sum, so overlapping
    // or padded layouts cannot slip through the equality check.
    let mut cursor = 0usize;
    let mut sum_of_sizes = 0usize;

    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "field" => {
                let type_name = child
                    .attribute("type")
                    .ok_or(SchemaError::MissingAttr {
                        element: "field",
                        attr: "type",
                    })?;
                let ty = SbeType::from_name(type_name)
                    .ok_or_else(|| SchemaError::UnknownType(type_name.to_owned()))?;
                let declared_offset = attr_parse::<usize>(child, "field", "offset")?;
                let field_offset = declared_offset.unwrap_or(cursor);
                let required = child.attribute("presence") != Some("optional");
                let null_value = match attr_parse::<i64>(child, "field", "nullValue")? {
                    Some(v) => Some(v),
                    None if required => None,
                    None => ty.default_null(),
                };
                let semantics = child
                    .attribute("semanticType")
                    .map(Semantics::from_semantic_type)
                    .unwrap_or_default();
                body.fields.push(FixedField {
                    tag: attr_required(child, "field", "id")?,
                    name: child.attribute("name").unwrap_or("").to_owned(),
                    ty,
                    offset: field_offset,
                    required,
                    null_value,
                    semantics,
                });
                cursor = field_offset + ty.size();
                sum_of_sizes += ty.size();
            }
            "data" => {
                let type_name = child
                    .attribute("type")
                    .ok_or(SchemaError::MissingAttr {
                        element: "data",
                        attr: "type",
                    })?;
                if !var_encodings.contains(type_name) {
                    return Err(SchemaError::UnknownType(type_name.to_owned()));
                }
                body.data_fields.push(DataField {
                    tag: attr_required(child, "data", "id")?,
                    name: child.attribute("name").unwrap_or("").to_owned(),
                });
            }
            "group" => {
                let group_name = child.attribute("name").unwrap_or("").to_owned();
                let group_body = parse_block(child, &group_name, var_encodings)?;
                body.groups.push(GroupLayout {
                    count_tag: attr_required(child, "group", "id")?,
                    name: group_name,
                    body: group_body,
                });
            }
            _ => {} // unrecognized children ignored
        }
    }

    let computed =
        u16::try_from(sum_of_sizes).map_err(|_| SchemaError::BlockLengthMismatch {
            scope: scope.to_owned(),
            declared: u16::MAX,
            computed: u16::MAX,
        })?;
    let declared = attr_parse::<u16>(node, "message", "blockLength")?.unwrap_or(computed);
    if declared != computed {
        return Err(SchemaError::BlockLengthMismatch {
            scope: scope.to_owned(),
            declared,
            computed,
        });
    }
    // Every field must also land inside the declared block: the sum
    // equality alone cannot see a stray explicit offset.
    for field in &body.fields {
        if field.offset + field.ty.size() > usize::from(declared) {
            return Err(SchemaError::FieldOutOfRange {
                scope: scope.to_owned(),
                tag: field.tag,
                offset: field.offset,
                size: field.ty.size(),
                block_length: declared,
            });
        }
    }
    body.block_length = declared;
    Ok(body)
}

fn attr_required<T: std::str::FromStr>(
    node: Node<'_, '_>,
    element: &'static str,
    attr: &'static str,
) -> Result<T, SchemaError> {
    attr_parse(node, element, attr)?.ok_or(SchemaError::MissingAttr { element, attr })
}

fn attr_parse<T: std::str::FromStr>(
    node: Node<'_, '_>,
    element: &'static str,
    attr: &'static str,
) -> Result<Option<T>, SchemaError> {
    match node.attribute(attr) {
        None => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| SchemaError::BadAttr {
            element,
            attr,
            value: raw.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sbe:messageSchema xmlns:sbe="http://fixprotocol.io/2016/sbe" package="fixsbe" id="1" version="0" byteOrder="littleEndian">
  <types>
    <composite name="messageHeader">
      <type name="blockLength" primitiveType="uint16"/>
      <type name="templateId" primitiveType="uint16"/>
      <type name="schemaId" primitiveType="uint16"/>
      <type name="version" primitiveType="uint16"/>
    </composite>
    <composite name="groupSizeEncoding">
      <type name="blockLength" primitiveType="uint16"/>
      <type name="numInGroup" primitiveType="uint16"/>
    </composite>
    <composite name="varStringEncoding">
      <type name="length" primitiveType="uint16"/>
      <type name="varData" primitiveType="uint8" length="0" characterEncoding="UTF-8"/>
    </composite>
  </types>
  <sbe:message name="SecurityDefinition" id="37" semanticType="d" blockLength="8">
    <field name="CouponRate" id="223" type="int64" offset="0" semanticType="Percentage" presence="optional" nullValue="-9223372036854775808"/>
    <data name="Symbol" id="55" type="varStringEncoding" semanticType="String"/>
    <data name="Currency" id="15" type="varStringEncoding" semanticType="Currency"/>
  </sbe:message>
</sbe:messageSchema>"#;

    #[test]
    fn loads_offsets_null_values_and_semantics() {
        let schema = Schema::from_xml(SCHEMA).unwrap();
        assert_eq!(schema.id, 1);
        assert_eq!(schema.version, 0);

        let msg = schema.message_by_id(37).unwrap();
        assert_eq!(msg.name, "SecurityDefinition");
        assert_eq!(msg.body.block_length, 8);
        let coupon = msg.body.fixed(223).unwrap();
        assert_eq!(coupon.ty, SbeType::Int64);
        assert_eq!(coupon.offset, 0);
        assert_eq!(coupon.null_value, Some(i64::MIN));
        assert_eq!(coupon.semantics, Semantics::Scaled(8));
        assert!(!coupon.required);

        let tags: Vec<u32> = msg.body.data_fields.iter().map(|d| d.tag).collect();
        assert_eq!(tags, vec![55, 15]);

        assert!(matches!(
            schema.message_by_id(99),
            Err(SchemaError::UnknownTemplate(99))
        ));
        assert!(schema.message_by_name("SecurityDefinition").is_ok());
    }

    #[test]
    fn block_length_mismatch_is_rejected() {
        let bad = SCHEMA.replace(r#"blockLength="8""#, r#"blockLength="12""#);
        assert!(matches!(
            Schema::from_xml(&bad),
            Err(SchemaError::BlockLengthMismatch {
                declared: 12,
                computed: 8,
                ..
            })
        ));
    }

    fn message_schema(fields: &str, block_length: u16) -> String {
        format!(
            r#"<sbe:messageSchema xmlns:sbe="urn:sbe" package="t" id="1" version="0">
  <types/>
  <sbe:message name="M" id="9" blockLength="{block_length}">
{fields}
  </sbe:message>
</sbe:messageSchema>"#
        )
    }

    #[test]
    fn overlapping_explicit_offsets_fail_the_size_sum() {
        // Two uint32 fields pinned to the same offset: the block "ends"
        // at 4 but the sum of sizes is 8, so blockLength="4" must not
        // load.
        let xml = message_schema(
            r#"    <field name="A" id="1" type="uint32" offset="0"/>
    <field name="B" id="2" type="uint32" offset="0"/>"#,
            4,
        );
        assert!(matches!(
            Schema::from_xml(&xml),
            Err(SchemaError::BlockLengthMismatch {
                declared: 4,
                computed: 8,
                ..
            })
        ));
    }

    #[test]
    fn padded_explicit_offsets_fail_the_size_sum() {
        // A gap between fields: declared 12, but the fields only sum
        // to 8.
        let xml = message_schema(
            r#"    <field name="A" id="1" type="uint32" offset="0"/>
    <field name="B" id="2" type="uint32" offset="8"/>"#,
            12,
        );
        assert!(matches!(
            Schema::from_xml(&xml),
            Err(SchemaError::BlockLengthMismatch {
                declared: 12,
                computed: 8,
                ..
            })
        ));
    }

    #[test]
    fn out_of_range_explicit_offset_is_rejected() {
        // The size sum matches the declared blockLength, but field 1
        // sits far outside the block.
        let xml = message_schema(
            r#"    <field name="A" id="1" type="uint32" offset="1000"/>
    <field name="B" id="2" type="uint32" offset="4"/>"#,
            8,
        );
        assert!(matches!(
            Schema::from_xml(&xml),
            Err(SchemaError::FieldOutOfRange {
                tag: 1,
                offset: 1000,
                block_length: 8,
                ..
            })
        ));
    }

    #[test]
    fn data_field_must_use_a_declared_var_encoding() {
        let bad = SCHEMA.replace("varStringEncoding\" semanticType=\"String", "mystery\" semanticType=\"String");
        assert!(matches!(
            Schema::from_xml(&bad),
            Err(SchemaError::UnknownType(t)) if t == "mystery"
        ));
    }
}
