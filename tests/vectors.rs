//! End-to-end wire vectors, checked byte-for-byte against the reference
//! protobuf encoding, plus the decoder's failure modes.

use schemabuf::{decode, encode, Schema, Value};

fn from_hex(hex: &str) -> Vec<u8> {
    assert!(hex.len() % 2 == 0, "odd hex literal: {hex}");
    (0..hex.len())
        .step_by(2)
        .map(|idx| u8::from_str_radix(&hex[idx..idx + 2], 16).expect("valid hex"))
        .collect()
}

#[track_caller]
fn assert_encodes(schema: &Schema, value: &Value, hex: &str) {
    let bytes = encode(schema, value);
    assert_eq!(
        &bytes[..],
        &from_hex(hex)[..],
        "encoded bytes mismatch (got {bytes:02x?})"
    );
    assert_eq!(&decode(schema, &bytes).unwrap(), value, "roundtrip mismatch");
}

#[test]
fn test_int_record() {
    let schema = Schema::record([("value", Schema::int())]);
    let value = Value::record([("value", Value::Int(150))]);
    assert_encodes(&schema, &value, "089601");
}

#[test]
fn test_string_record() {
    let schema = Schema::record([("value", Schema::string())]);
    let value = Value::record([("value", Value::String("testing".to_string()))]);
    assert_encodes(&schema, &value, "0A0774657374696E67");
}

#[test]
fn test_float_record() {
    let schema = Schema::record([("value", Schema::float())]);
    let value = Value::record([("value", Value::Float(0.001))]);
    assert_encodes(&schema, &value, "0D6F12833A");
}

#[test]
fn test_double_record() {
    let schema = Schema::record([("value", Schema::double())]);
    let value = Value::record([("value", Value::Double(0.001))]);
    assert_encodes(&schema, &value, "09FCA9F1D24D62503F");
}

#[test]
fn test_embedded_record() {
    let schema = Schema::record([("embedded", Schema::record([("value", Schema::int())]))]);
    let value = Value::record([("embedded", Value::record([("value", Value::Int(150))]))]);
    assert_encodes(&schema, &value, "0A03089601");
}

#[test]
fn test_packed_sequence() {
    let schema = Schema::record([("packed", Schema::sequence(Schema::int()))]);
    let value = Value::record([(
        "packed",
        Value::sequence([Value::Int(3), Value::Int(270), Value::Int(86942)]),
    )]);
    assert_encodes(&schema, &value, "0A06038E029EA705");
}

#[test]
fn test_unpacked_sequence() {
    let schema = Schema::record([("items", Schema::sequence(Schema::string()))]);
    let value = Value::record([(
        "items",
        Value::sequence([
            Value::String("foo".to_string()),
            Value::String("bar".to_string()),
            Value::String("baz".to_string()),
        ]),
    )]);
    assert_encodes(&schema, &value, "0A0F0A03666F6F12036261721A0362617A");
}

#[test]
fn test_two_field_record() {
    let schema = Schema::record([("name", Schema::string()), ("value", Schema::int())]);
    let value = Value::record([
        ("name", Value::String("Foo".to_string())),
        ("value", Value::Int(123)),
    ]);
    assert_encodes(&schema, &value, "0A03466F6F107B");
}

fn one_of_schema() -> Schema {
    Schema::enumeration([
        ("StringValue", Schema::record([("value", Schema::string())])),
        ("IntValue", Schema::record([("value", Schema::int())])),
        ("BooleanValue", Schema::record([("value", Schema::bool())])),
    ])
}

#[test]
fn test_enumeration_within_record() {
    let schema = Schema::record([("oneOf", one_of_schema())]);
    let value = Value::record([(
        "oneOf",
        Value::case("IntValue", Value::record([("value", Value::Int(482))])),
    )]);
    assert_encodes(&schema, &value, "0A05120308E203");
}

#[test]
fn test_enumeration_first_and_last_case() {
    let schema = Schema::record([("oneOf", one_of_schema())]);

    let value = Value::record([(
        "oneOf",
        Value::case(
            "StringValue",
            Value::record([("value", Value::String("foo".to_string()))]),
        ),
    )]);
    assert_encodes(&schema, &value, "0A070A050A03666F6F");

    let value = Value::record([(
        "oneOf",
        Value::case("BooleanValue", Value::record([("value", Value::Bool(true))])),
    )]);
    assert_encodes(&schema, &value, "0A041A020801");
}

#[test]
fn test_top_level_scalars_are_untagged() {
    assert_eq!(&encode(&Schema::int(), &Value::Int(150))[..], [0x96, 0x01]);
    assert_eq!(
        &encode(&Schema::string(), &Value::String("ab".to_string()))[..],
        &b"ab"[..]
    );
    assert_eq!(
        decode(&Schema::string(), b"testing").unwrap(),
        Value::String("testing".to_string())
    );
}

// ------------------------------ failure modes ------------------------------

#[track_caller]
fn assert_decode_fails(schema: &Schema, hex: &str, rendered: &str) {
    let error = decode(schema, &from_hex(hex)).unwrap_err();
    assert_eq!(error.to_string(), rendered);
}

#[test]
fn test_empty_input() {
    let schema = Schema::record([("value", Schema::int())]);
    assert_eq!(
        decode(&schema, &[]).unwrap_err().to_string(),
        "No bytes to decode"
    );
}

#[test]
fn test_unknown_wire_type() {
    let schema = Schema::record([("value", Schema::int())]);
    assert_decode_fails(&schema, "0F", "Failed decoding key: unknown wire type");
}

#[test]
fn test_invalid_field_number() {
    let schema = Schema::record([("value", Schema::int())]);
    assert_decode_fails(&schema, "00", "Failed decoding key: invalid field number");
}

#[test]
fn test_truncated_length_delimited_payload() {
    let schema = Schema::record([("value", Schema::string())]);
    assert_decode_fails(&schema, "0A0346", "Unexpected end of bytes");
}

#[test]
fn test_unterminated_varint() {
    let schema = Schema::record([("value", Schema::int()), ("count", Schema::int())]);
    assert_decode_fails(&schema, "10FF", "Unexpected end of chunk");
}

#[test]
fn test_field_number_outside_schema() {
    let schema = Schema::record([("value", Schema::int())]);
    assert_decode_fails(&schema, "107B", "Schema doesn't contain field number 2.");
}

#[test]
fn test_group_wire_types_rejected() {
    let schema = Schema::record([("value", Schema::int())]);
    assert_decode_fails(&schema, "0B", "group wire types are not supported");
    assert_decode_fails(&schema, "0C", "group wire types are not supported");
}

#[test]
fn test_short_float_payload() {
    assert_decode_fails(&Schema::float(), "6F12", "Unable to decode Float");
    assert_decode_fails(&Schema::double(), "FCA9F1", "Unable to decode Double");
}

#[test]
fn test_fail_schema_decodes_to_its_message() {
    let schema = Schema::fail("not representable");
    assert_decode_fails(&schema, "089601", "not representable");

    // Encoding through a fail schema yields the empty chunk.
    assert!(encode(&schema, &Value::Int(1)).is_empty());
}

#[test]
fn test_missing_product_field() {
    let schema = Schema::product(
        [
            schemabuf::ProductField::new("name", Schema::string(), |_| Value::Unit),
            schemabuf::ProductField::new("value", Schema::int(), |_| Value::Unit),
        ],
        |values| Ok(Value::Sequence(values)),
    );
    // Only field 1 is present on the wire.
    assert_decode_fails(&schema, "0A03466F6F", "Missing field number 2.");
}

#[test]
fn test_encoder_silently_drops_mismatched_shapes() {
    // A string value against an int schema encodes to nothing.
    let schema = Schema::record([("value", Schema::int())]);
    let value = Value::record([("value", Value::String("nope".to_string()))]);
    let bytes = encode(&schema, &value);
    assert!(bytes.is_empty(), "{bytes:02x?}");

    // A transform whose backward conversion fails encodes to nothing.
    let schema = Schema::transform(Schema::int(), Ok, |_| Err("no".to_string()));
    assert!(encode(&schema, &Value::Int(1)).is_empty());
}
