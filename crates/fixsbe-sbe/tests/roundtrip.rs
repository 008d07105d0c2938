//! Compile an Orchestra repository, load the resulting SBE schema, and
//! round-trip real FIX messages through the codec.

use fixsbe_core::{parse_tag_values, SeparatorHint};
use fixsbe_orchestra::{compile_to_sbe, parse_repository, CompileOptions};
use fixsbe_sbe::{
    decode_message, descriptor_from_pairs, encode_message, DecodeError, DecodedValue, Schema,
    HEADER_SIZE,
};

const ORCHESTRA: &str = r#"<fixr:repository xmlns:fixr="http://fixprotocol.io/2020/orchestra/repository">
  <fixr:fields>
    <fixr:field id="55" name="Symbol" type="String"/>
    <fixr:field id="223" name="CouponRate" type="Percentage"/>
    <fixr:field id="15" name="Currency" type="Currency"/>
    <fixr:field id="54" name="Side" type="char"/>
    <fixr:field id="38" name="OrderQty" type="Qty"/>
    <fixr:field id="44" name="Price" type="Price"/>
    <fixr:field id="60" name="TransactTime" type="UTCTimestamp"/>
    <fixr:field id="11" name="ClOrdID" type="String"/>
    <fixr:field id="453" name="NoPartyIDs" type="NumInGroup"/>
    <fixr:field id="448" name="PartyID" type="String"/>
    <fixr:field id="447" name="PartyIDSource" type="char"/>
    <fixr:field id="452" name="PartyRole" type="int"/>
  </fixr:fields>
  <fixr:components>
    <fixr:component name="Instrument" id="1003">
      <fixr:fieldRef id="55" presence="required"/>
      <fixr:fieldRef id="223"/>
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
        <fixr:fieldRef id="11"/>
        <fixr:componentRef id="1003"/>
        <fixr:fieldRef id="54" presence="required"/>
        <fixr:fieldRef id="38"/>
        <fixr:fieldRef id="44"/>
        <fixr:fieldRef id="60"/>
        <fixr:groupRef id="2071"/>
      </fixr:structure>
    </fixr:message>
    <fixr:message name="SecurityDefinition" id="37" msgType="d">
      <fixr:structure>
        <fixr:componentRef id="1003"/>
        <fixr:fieldRef id="15"/>
      </fixr:structure>
    </fixr:message>
  </fixr:messages>
</fixr:repository>"#;

fn load_schema() -> Schema {
    let repo = parse_repository(ORCHESTRA).unwrap();
    let xml = compile_to_sbe(&repo, &CompileOptions::default()).unwrap();
    Schema::from_xml(&xml).unwrap()
}

/// SecurityDefinition (template 37) from raw FIX text: session tags are
/// stripped, strings survive exactly, and the percentage comes back as
/// its on-wire 10^8-scaled integer.
#[test]
fn security_definition_round_trips() {
    let schema = load_schema();
    let layout = schema.message_by_id(37).unwrap();

    let pairs = parse_tag_values(
        "8=FIX.4.4|35=d|55=USTB-2030-11-15|223=4.250|15=USD|10=000",
        SeparatorHint::Auto,
    )
    .unwrap();
    let descriptor = descriptor_from_pairs(layout, &pairs).unwrap();
    let bytes = encode_message(&schema, layout, &descriptor).unwrap();

    assert!(bytes.len() >= HEADER_SIZE);
    assert_eq!(
        u16::from_le_bytes([bytes[0], bytes[1]]),
        layout.body.block_length
    );
    assert_eq!(u16::from_le_bytes([bytes[2], bytes[3]]), 37);

    let decoded = decode_message(layout, &bytes).unwrap();
    assert_eq!(
        decoded.get(55),
        Some(&DecodedValue::Text("USTB-2030-11-15".to_owned()))
    );
    assert_eq!(decoded.get(15), Some(&DecodedValue::Text("USD".to_owned())));
    // 4.250% scaled by 10^8.
    assert_eq!(decoded.get(223), Some(&DecodedValue::Int(425_000_000)));
    // Session tags never reach the output.
    assert_eq!(decoded.get(8), None);
    assert_eq!(decoded.get(35), None);
}

/// NewOrderSingle (template 14) with a two-entry Parties group.
#[test]
fn repeating_group_round_trips() {
    let schema = load_schema();
    let layout = schema.message_by_id(14).unwrap();

    let pairs = parse_tag_values(
        "8=FIX.4.4|35=D|11=ORD-7|55=AAPL|54=1|38=100|44=189.5|60=20301115-09:30:00.123|453=2|448=PARTY1|447=D|452=1|448=PARTY2|447=D|452=3|10=000",
        SeparatorHint::Auto,
    )
    .unwrap();
    let descriptor = descriptor_from_pairs(layout, &pairs).unwrap();
    let bytes = encode_message(&schema, layout, &descriptor).unwrap();
    let decoded = decode_message(layout, &bytes).unwrap();

    assert_eq!(decoded.get(11), Some(&DecodedValue::Text("ORD-7".to_owned())));
    assert_eq!(decoded.get(54), Some(&DecodedValue::Text("1".to_owned())));
    // Qty/Price scale by 10^4; the timestamp is the 17-digit integer.
    assert_eq!(decoded.get(38), Some(&DecodedValue::Int(1_000_000)));
    assert_eq!(decoded.get(44), Some(&DecodedValue::Int(1_895_000)));
    assert_eq!(
        decoded.get(60),
        Some(&DecodedValue::Uint(20_301_115_093_000_123))
    );

    let entries = decoded.get(453).and_then(DecodedValue::as_group).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(
        entries[0].get(448),
        Some(&DecodedValue::Text("PARTY1".to_owned()))
    );
    assert_eq!(
        entries[0].get(447),
        Some(&DecodedValue::Text("D".to_owned()))
    );
    assert_eq!(entries[0].get(452), Some(&DecodedValue::Uint(1)));
    assert_eq!(
        entries[1].get(448),
        Some(&DecodedValue::Text("PARTY2".to_owned()))
    );
    assert_eq!(entries[1].get(452), Some(&DecodedValue::Uint(3)));
}

/// Absent optional fields encode as null sentinels and are filtered on
/// decode; unknown tags are dropped without error.
#[test]
fn absent_and_unknown_fields() {
    let schema = load_schema();
    let layout = schema.message_by_id(14).unwrap();

    let pairs = parse_tag_values("11=ORD-8|54=2|9999=ignored", SeparatorHint::Auto).unwrap();
    let descriptor = descriptor_from_pairs(layout, &pairs).unwrap();
    let bytes = encode_message(&schema, layout, &descriptor).unwrap();
    let decoded = decode_message(layout, &bytes).unwrap();

    assert_eq!(decoded.get(11), Some(&DecodedValue::Text("ORD-8".to_owned())));
    assert_eq!(decoded.get(54), Some(&DecodedValue::Text("2".to_owned())));
    assert_eq!(decoded.get(38), None, "absent Qty must stay absent");
    assert_eq!(decoded.get(44), None);
    assert_eq!(decoded.get(60), None);
    assert_eq!(decoded.get(9999), None);
    // The empty group still decodes to an empty array under its count tag.
    assert_eq!(
        decoded.get(453).and_then(DecodedValue::as_group).map(<[_]>::len),
        Some(0)
    );
}

/// Decoder failure modes: truncation, overrunning lengths, template
/// mismatch.
#[test]
fn decoder_rejects_malformed_input() {
    let schema = load_schema();
    let layout = schema.message_by_id(37).unwrap();

    let pairs = parse_tag_values("55=IBM|15=USD", SeparatorHint::Auto).unwrap();
    let descriptor = descriptor_from_pairs(layout, &pairs).unwrap();
    let bytes = encode_message(&schema, layout, &descriptor).unwrap();

    // Truncated header.
    assert!(matches!(
        decode_message(layout, &bytes[..4]),
        Err(DecodeError::Truncated { .. })
    ));
    // Truncated block.
    assert!(matches!(
        decode_message(layout, &bytes[..HEADER_SIZE + 2]),
        Err(DecodeError::Truncated { .. })
    ));
    // A declared string length overrunning the buffer.
    let mut overrun = bytes.clone();
    let var_start = HEADER_SIZE + usize::from(layout.body.block_length);
    overrun[var_start] = 0xFF;
    overrun[var_start + 1] = 0xFF;
    assert!(matches!(
        decode_message(layout, &overrun),
        Err(DecodeError::LengthOverrun { tag: 55, .. })
    ));
    // Wrong template id for the layout.
    let other = schema.message_by_id(14).unwrap();
    assert!(matches!(
        decode_message(other, &bytes),
        Err(DecodeError::TemplateMismatch {
            expected: 14,
            found: 37
        })
    ));
}

/// The encoder is deterministic: same descriptor, same bytes.
#[test]
fn encoding_is_deterministic() {
    let schema = load_schema();
    let layout = schema.message_by_id(37).unwrap();
    let pairs = parse_tag_values("55=IBM|223=4.25|15=USD", SeparatorHint::Auto).unwrap();
    let descriptor = descriptor_from_pairs(layout, &pairs).unwrap();
    let a = encode_message(&schema, layout, &descriptor).unwrap();
    let b = encode_message(&schema, layout, &descriptor).unwrap();
    assert_eq!(a, b);
}
