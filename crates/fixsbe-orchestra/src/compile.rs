//! Orchestra → SBE lowering.
//!
//! Each message's references are expanded eagerly: components inline
//! their members at every use site, groups become SBE `<group>` elements
//! keyed by their `numInGroup` field id, and every field picks an SBE
//! encoding from the FIX datatype decision table. Fixed-size fields come
//! first (offsets assigned by accumulating sizes), then `<data>`
//! declarations, then groups — the declaration order the encoder,
//! decoder, and schema loader all rely on.

use crate::error::OrchestraError;
use crate::model::{Group, Message, Presence, Ref, Repository};
use std::fmt::Write as _;
use tracing::warn;

/// Schema-level knobs for the emitted SBE XML.
#[derive(Clone, Debug)]
pub struct CompileOptions {
    /// SBE schema id (header `schemaId`).
    pub schema_id: u16,
    /// SBE schema version (header `version`); pinned, evolution is out of
    /// scope.
    pub version: u16,
    /// Package name on the schema root.
    pub package: String,
    /// Compile only the named message instead of the whole repository.
    pub target_message: Option<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            schema_id: 1,
            version: 0,
            package: "fixsbe".to_owned(),
            target_message: None,
        }
    }
}

/// Scale exponent applied to price-family datatypes (`10^4`).
pub const PRICE_EXPONENT: u32 = 4;
/// Scale exponent applied to `Percentage` (`10^8`).
pub const PERCENTAGE_EXPONENT: u32 = 8;

/// SBE encoding chosen for one FIX datatype.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Encoding {
    VarString,
    Char,
    Bool,
    UInt16,
    UInt32,
    Timestamp,
    Scaled(u32),
    Double,
}

impl Encoding {
    const fn is_var(self) -> bool {
        matches!(self, Self::VarString)
    }

    const fn primitive(self) -> &'static str {
        match self {
            Self::VarString => "varStringEncoding",
            Self::Char => "char",
            Self::Bool => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::Timestamp => "uint64",
            Self::Scaled(_) => "int64",
            Self::Double => "double",
        }
    }

    const fn size(self) -> u16 {
        match self {
            Self::VarString => 0,
            Self::Char | Self::Bool => 1,
            Self::UInt16 => 2,
            Self::UInt32 => 4,
            Self::Timestamp | Self::Scaled(_) | Self::Double => 8,
        }
    }

    /// Null sentinel for the optional form; `None` for double (IEEE NaN
    /// is the sentinel and has no attribute rendering).
    fn null_value(self) -> Option<String> {
        match self {
            Self::VarString | Self::Double => None,
            Self::Char => Some("0".to_owned()),
            Self::Bool => Some("255".to_owned()),
            Self::UInt16 => Some("65535".to_owned()),
            Self::UInt32 => Some("4294967295".to_owned()),
            Self::Timestamp => Some("0".to_owned()),
            Self::Scaled(_) => Some(i64::MIN.to_string()),
        }
    }
}

/// The FIX datatype → SBE encoding decision table.
fn encoding_for(repo: &Repository, datatype: &str) -> Encoding {
    match datatype {
        "char" => Encoding::Char,
        "int" | "Length" | "SeqNum" | "TagNum" | "DayOfMonth" => Encoding::UInt32,
        "NumInGroup" => Encoding::UInt16,
        "Qty" | "Price" | "PriceOffset" | "Amt" => Encoding::Scaled(PRICE_EXPONENT),
        "Percentage" => Encoding::Scaled(PERCENTAGE_EXPONENT),
        "float" => Encoding::Double,
        "UTCTimestamp" | "TZTimestamp" => Encoding::Timestamp,
        "Boolean" => Encoding::Bool,
        "String" | "MultipleValueString" | "MultipleStringValue" | "MultipleCharValue"
        | "Country" | "Currency" | "Exchange" | "LocalMktDate" | "MonthYear" | "UTCDateOnly"
        | "UTCTimeOnly" => Encoding::VarString,
        other => {
            // Code sets and anything unrecognized travel as strings.
            if !repo.is_code_set(other) {
                warn!(datatype = other, "unmapped FIX datatype, encoding as var string");
            }
            Encoding::VarString
        }
    }
}

struct ResolvedField {
    tag: u32,
    name: String,
    datatype: String,
    encoding: Encoding,
    presence: Presence,
}

#[derive(Default)]
struct ResolvedBody {
    fixed: Vec<ResolvedField>,
    data: Vec<ResolvedField>,
    groups: Vec<ResolvedGroup>,
}

struct ResolvedGroup {
    count_tag: u32,
    name: String,
    body: ResolvedBody,
}

impl ResolvedBody {
    fn is_empty(&self) -> bool {
        self.fixed.is_empty() && self.data.is_empty() && self.groups.is_empty()
    }

    fn block_length(&self) -> u16 {
        self.fixed.iter().map(|f| f.encoding.size()).sum()
    }
}

/// Compile a repository to an SBE XML schema string.
pub fn compile_to_sbe(
    repo: &Repository,
    options: &CompileOptions,
) -> Result<String, OrchestraError> {
    if repo.messages.is_empty() {
        return Err(OrchestraError::NoMessages);
    }
    let selected: Vec<&Message> = match &options.target_message {
        Some(name) => vec![repo
            .message_by_name(name)
            .ok_or_else(|| OrchestraError::MessageNotFound(name.clone()))?],
        None => repo.messages.iter().collect(),
    };

    let mut out = String::new();
    let _ = writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    let _ = writeln!(
        out,
        r#"<sbe:messageSchema xmlns:sbe="http://fixprotocol.io/2016/sbe" package="{}" id="{}" version="{}" semanticVersion="FIX.4.4" byteOrder="littleEndian">"#,
        escape(&options.package),
        options.schema_id,
        options.version
    );
    emit_types(&mut out);

    for message in selected {
        let body = expand_refs(repo, &message.refs);
        if body.is_empty() {
            return Err(OrchestraError::EmptyMessage(message.name.clone()));
        }
        let _ = writeln!(
            out,
            r#"  <sbe:message name="{}" id="{}" semanticType="{}" blockLength="{}">"#,
            escape(&message.name),
            message.id,
            escape(&message.msg_type),
            body.block_length()
        );
        emit_body(&mut out, &body, 2);
        let _ = writeln!(out, "  </sbe:message>");
    }
    let _ = writeln!(out, "</sbe:messageSchema>");
    Ok(out)
}

fn emit_types(out: &mut String) {
    let _ = writeln!(
        out,
        r#"  <types>
    <composite name="messageHeader" description="Message identifiers and length of message root">
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
  </types>"#
    );
}

/// Expand refs into the three ordered lists, inlining components at each
/// reference. Unknown ids are dropped with a warning; emptiness is
/// judged (and made fatal) by the caller.
fn expand_refs(repo: &Repository, refs: &[Ref]) -> ResolvedBody {
    let mut body = ResolvedBody::default();
    expand_into(repo, refs, &mut body);
    body
}

fn expand_into(repo: &Repository, refs: &[Ref], body: &mut ResolvedBody) {
    for r in refs {
        match *r {
            Ref::Field { id, presence } => {
                let Some(field) = repo.fields.get(&id) else {
                    warn!(id, "fieldRef references unknown field id, dropping");
                    continue;
                };
                let encoding = encoding_for(repo, &field.datatype);
                let resolved = ResolvedField {
                    tag: field.id,
                    name: field.name.clone(),
                    datatype: field.datatype.clone(),
                    encoding,
                    presence,
                };
                if encoding.is_var() {
                    body.data.push(resolved);
                } else {
                    body.fixed.push(resolved);
                }
            }
            Ref::Component { id, .. } => {
                let Some(component) = repo.components.get(&id) else {
                    warn!(id, "componentRef references unknown component id, dropping");
                    continue;
                };
                expand_into(repo, &component.refs, body);
            }
            Ref::Group { id, .. } => {
                let Some(group) = repo.groups.get(&id) else {
                    warn!(id, "groupRef references unknown group id, dropping");
                    continue;
                };
                body.groups.push(resolve_group(repo, group));
            }
        }
    }
}

fn resolve_group(repo: &Repository, group: &Group) -> ResolvedGroup {
    ResolvedGroup {
        count_tag: group.num_in_group_field_id,
        name: group.name.clone(),
        body: expand_refs(repo, &group.refs),
    }
}

fn emit_body(out: &mut String, body: &ResolvedBody, depth: usize) {
    let pad = "  ".repeat(depth);
    let mut offset: u16 = 0;
    for field in &body.fixed {
        let mut attrs = format!(
            r#"name="{}" id="{}" type="{}" offset="{}" semanticType="{}""#,
            escape(&field.name),
            field.tag,
            field.encoding.primitive(),
            offset,
            escape(&field.datatype)
        );
        match field.presence {
            Presence::Required => attrs.push_str(r#" presence="required""#),
            Presence::Optional => {
                attrs.push_str(r#" presence="optional""#);
                if let Some(null) = field.encoding.null_value() {
                    let _ = write!(attrs, r#" nullValue="{null}""#);
                }
            }
        }
        let _ = writeln!(out, "{pad}<field {attrs}/>");
        offset += field.encoding.size();
    }
    for field in &body.data {
        let _ = writeln!(
            out,
            r#"{pad}<data name="{}" id="{}" type="varStringEncoding" semanticType="{}"/>"#,
            escape(&field.name),
            field.tag,
            escape(&field.datatype)
        );
    }
    for group in &body.groups {
        let _ = writeln!(
            out,
            r#"{pad}<group name="{}" id="{}" dimensionType="groupSizeEncoding" blockLength="{}">"#,
            escape(&group.name),
            group.count_tag,
            group.body.block_length()
        );
        emit_body(out, &group.body, depth + 1);
        let _ = writeln!(out, "{pad}</group>");
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
