//! Orchestra XML → [`Repository`].
//!
//! Parsing is deliberately tolerant: element matching is by local name
//! (so any `fixr:` prefix binding works), unrecognized elements are
//! ignored, and malformed declarations are skipped with a warning rather
//! than failing the whole repository. The strict checks (zero messages,
//! empty message bodies) live in the compiler, which is the point where
//! they become fatal.

use crate::error::OrchestraError;
use crate::model::{Component, Field, Group, Message, Presence, Ref, Repository};
use roxmltree::{Document, Node};
use tracing::warn;

/// Parse an Orchestra repository document.
pub fn parse_repository(xml: &str) -> Result<Repository, OrchestraError> {
    let doc = Document::parse(xml)?;
    let mut repo = Repository::default();

    for node in doc.descendants().filter(Node::is_element) {
        match node.tag_name().name() {
            "field" => {
                if let Some(field) = parse_field(node) {
                    repo.fields.insert(field.id, field);
                }
            }
            "codeSet" => {
                if let Some(name) = node.attribute("name") {
                    repo.code_sets.insert(name.to_owned());
                }
            }
            "component" => {
                if let Some(component) = parse_component(node) {
                    repo.components.insert(component.id, component);
                }
            }
            "group" => {
                if let Some(group) = parse_group(node) {
                    repo.groups.insert(group.id, group);
                }
            }
            "message" => {
                if let Some(message) = parse_message(node) {
                    repo.messages.push(message);
                }
            }
            _ => {} // unrecognized elements are ignored
        }
    }

    Ok(repo)
}

fn parse_field(node: Node<'_, '_>) -> Option<Field> {
    let id = attr_u32(node, "id")?;
    let name = node.attribute("name").unwrap_or_default().to_owned();
    let Some(datatype) = node.attribute("type") else {
        warn!(id, %name, "field declaration without a type, skipping");
        return None;
    };
    Some(Field {
        id,
        name,
        datatype: datatype.to_owned(),
    })
}

fn parse_component(node: Node<'_, '_>) -> Option<Component> {
    let id = attr_u32(node, "id")?;
    Some(Component {
        id,
        name: node.attribute("name").unwrap_or_default().to_owned(),
        refs: parse_refs(node),
    })
}

fn parse_group(node: Node<'_, '_>) -> Option<Group> {
    let id = attr_u32(node, "id")?;
    let name = node.attribute("name").unwrap_or_default().to_owned();
    // The count tag lives on a <fixr:numInGroup id=.../> child.
    let Some(count_tag) = node
        .children()
        .filter(Node::is_element)
        .find(|c| c.tag_name().name() == "numInGroup")
        .and_then(|c| attr_u32(c, "id"))
    else {
        warn!(id, %name, "group without a numInGroup declaration, skipping");
        return None;
    };
    Some(Group {
        id,
        name,
        num_in_group_field_id: count_tag,
        refs: parse_refs(node),
    })
}

fn parse_message(node: Node<'_, '_>) -> Option<Message> {
    let id = attr_u32(node, "id")?;
    let name = node.attribute("name").unwrap_or_default().to_owned();
    // Member refs sit under <fixr:structure>; fall back to direct
    // children for repositories that omit the wrapper.
    let structure = node
        .children()
        .filter(Node::is_element)
        .find(|c| c.tag_name().name() == "structure");
    let refs = parse_refs(structure.unwrap_or(node));
    Some(Message {
        id,
        name,
        msg_type: node.attribute("msgType").unwrap_or_default().to_owned(),
        refs,
    })
}

fn parse_refs(node: Node<'_, '_>) -> Vec<Ref> {
    let mut refs = Vec::new();
    for child in node.children().filter(Node::is_element) {
        let presence = parse_presence(child);
        let parsed = match child.tag_name().name() {
            "fieldRef" => attr_u32(child, "id").map(|id| Ref::Field { id, presence }),
            "componentRef" => attr_u32(child, "id").map(|id| Ref::Component { id, presence }),
            "groupRef" => attr_u32(child, "id").map(|id| Ref::Group { id, presence }),
            _ => None,
        };
        if let Some(r) = parsed {
            refs.push(r);
        }
    }
    refs
}

fn parse_presence(node: Node<'_, '_>) -> Presence {
    match node.attribute("presence") {
        Some("required") => Presence::Required,
        _ => Presence::Optional,
    }
}

fn attr_u32(node: Node<'_, '_>, attr: &str) -> Option<u32> {
    node.attribute(attr).and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<fixr:repository xmlns:fixr="http://fixprotocol.io/2020/orchestra/repository">
  <fixr:codeSets>
    <fixr:codeSet name="PartyIDSourceCodeSet" id="447" type="char"/>
  </fixr:codeSets>
  <fixr:fields>
    <fixr:field id="55" name="Symbol" type="String"/>
    <fixr:field id="54" name="Side" type="char"/>
    <fixr:field id="453" name="NoPartyIDs" type="NumInGroup"/>
    <fixr:field id="448" name="PartyID" type="String"/>
    <fixr:field id="447" name="PartyIDSource" type="PartyIDSourceCodeSet"/>
    <fixr:field id="452" name="PartyRole" type="int"/>
  </fixr:fields>
  <fixr:components>
    <fixr:component name="Instrument" id="1003">
      <fixr:fieldRef id="55" presence="required"/>
    </fixr:component>
  </fixr:components>
  <fixr:groups>
    <fixr:group id="2071" name="Parties">
      <fixr:numInGroup id="453"/>
      <fixr:fieldRef id="448"/>
      <fixr:fieldRef id="447"/>
      <fixr:fieldRef id="452"/>
    </fixr:group>
  </fixr:groups>
  <fixr:messages>
    <fixr:message name="NewOrderSingle" id="14" msgType="D">
      <fixr:structure>
        <fixr:componentRef id="1003"/>
        <fixr:fieldRef id="54" presence="required"/>
        <fixr:groupRef id="2071"/>
      </fixr:structure>
    </fixr:message>
  </fixr:messages>
</fixr:repository>"#;

    #[test]
    fn parses_the_full_repository_shape() {
        let repo = parse_repository(SAMPLE).unwrap();
        assert_eq!(repo.fields.len(), 6);
        assert_eq!(repo.fields[&55].datatype, "String");
        assert!(repo.is_code_set("PartyIDSourceCodeSet"));
        assert_eq!(repo.components[&1003].refs.len(), 1);
        assert_eq!(repo.groups[&2071].num_in_group_field_id, 453);
        let msg = repo.message_by_name("NewOrderSingle").unwrap();
        assert_eq!(msg.id, 14);
        assert_eq!(msg.msg_type, "D");
        assert_eq!(msg.refs.len(), 3);
        assert!(matches!(
            msg.refs[1],
            Ref::Field {
                id: 54,
                presence: Presence::Required
            }
        ));
    }

    #[test]
    fn unknown_elements_are_ignored() {
        let xml = r#"<fixr:repository xmlns:fixr="urn:x">
            <fixr:metadata><dc:title xmlns:dc="urn:dc">t</dc:title></fixr:metadata>
            <fixr:fields><fixr:field id="55" name="Symbol" type="String"/></fixr:fields>
            <fixr:messages><fixr:message name="M" id="1" msgType="x">
              <fixr:fieldRef id="55"/>
            </fixr:message></fixr:messages>
        </fixr:repository>"#;
        let repo = parse_repository(xml).unwrap();
        assert_eq!(repo.fields.len(), 1);
        assert_eq!(repo.messages.len(), 1);
        assert_eq!(repo.messages[0].refs.len(), 1);
    }

    #[test]
    fn syntactically_invalid_xml_is_fatal() {
        assert!(matches!(
            parse_repository("<fixr:repository"),
            Err(OrchestraError::Xml(_))
        ));
    }
}
