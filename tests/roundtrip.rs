//! Round-trip coverage: decode(encode(v)) == v across every schema shape,
//! with property tests for the scalar-bearing shapes.

use bytes::Bytes;
use chrono::offset::TimeZone as _;
use chrono::{FixedOffset, Month, NaiveDate, NaiveTime, TimeDelta, Utc, Weekday};
use proptest::prelude::*;
use schemabuf::{decode, encode, OneofCase, ProductField, Schema, Value};

#[track_caller]
fn assert_roundtrip(schema: &Schema, value: &Value) {
    let bytes = encode(schema, value);
    assert_eq!(
        &decode(schema, &bytes).unwrap(),
        value,
        "bytes: {bytes:02x?}"
    );
}

fn int_record(value: i32) -> (Schema, Value) {
    (
        Schema::record([("value", Schema::int())]),
        Value::record([("value", Value::Int(value))]),
    )
}

proptest! {
    #[test]
    fn proptest_scalar_record_roundtrips(
        short: i16,
        int: i32,
        long: i64,
        flag: bool,
        float in -1.0e30f32..1.0e30f32,
        double in -1.0e300f64..1.0e300f64,
        text: String,
        character: char,
        binary in proptest::collection::vec(any::<u8>(), 0..64),
    ) {
        let schema = Schema::record([
            ("short", Schema::short()),
            ("int", Schema::int()),
            ("long", Schema::long()),
            ("flag", Schema::bool()),
            ("float", Schema::float()),
            ("double", Schema::double()),
            ("text", Schema::string()),
            ("character", Schema::char()),
            ("binary", Schema::binary()),
        ]);
        let value = Value::record([
            ("short", Value::Short(short)),
            ("int", Value::Int(int)),
            ("long", Value::Long(long)),
            ("flag", Value::Bool(flag)),
            ("float", Value::Float(float)),
            ("double", Value::Double(double)),
            ("text", Value::String(text)),
            ("character", Value::Char(character)),
            ("binary", Value::Binary(Bytes::from(binary))),
        ]);
        assert_roundtrip(&schema, &value);
    }

    #[test]
    fn proptest_packed_sequence_roundtrips(items in proptest::collection::vec(any::<i64>(), 0..32)) {
        let schema = Schema::record([("items", Schema::sequence(Schema::long()))]);
        let value = Value::record([(
            "items",
            Value::sequence(items.into_iter().map(Value::Long)),
        )]);
        assert_roundtrip(&schema, &value);
    }

    #[test]
    fn proptest_unpacked_sequence_roundtrips(items in proptest::collection::vec(any::<String>(), 0..16)) {
        let schema = Schema::record([("items", Schema::sequence(Schema::string()))]);
        let value = Value::record([(
            "items",
            Value::sequence(items.into_iter().map(Value::String)),
        )]);
        assert_roundtrip(&schema, &value);
    }

    #[test]
    fn proptest_tuple_roundtrips(first: i32, second: String) {
        let schema = Schema::tuple(Schema::int(), Schema::string());
        let value = Value::tuple(Value::Int(first), Value::String(second));
        assert_roundtrip(&schema, &value);
    }

    #[test]
    fn proptest_either_roundtrips(value: Result<i64, String>) {
        let schema = Schema::either(Schema::long(), Schema::string());
        let value = match value {
            Ok(left) => Value::left(Value::Long(left)),
            Err(right) => Value::right(Value::String(right)),
        };
        assert_roundtrip(&schema, &value);
    }

    #[test]
    fn proptest_reordered_fields_still_roundtrip(name: String, count: i32) {
        // Reordering fields shifts every field number, so the bytes change,
        // but each ordering round-trips through itself.
        let forward = Schema::record([("name", Schema::string()), ("count", Schema::int())]);
        let backward = Schema::record([("count", Schema::int()), ("name", Schema::string())]);
        let value = Value::record([
            ("name", Value::String(name.clone())),
            ("count", Value::Int(count)),
        ]);

        assert_roundtrip(&forward, &value);
        assert_roundtrip(&backward, &value);

        if !name.is_empty() || count != 0 {
            prop_assert_ne!(encode(&forward, &value), encode(&backward, &value));
        }
    }
}

#[test]
fn test_optional_present_and_absent() {
    let schema = Schema::record([("id", Schema::int()), ("nick", Schema::optional(Schema::string()))]);

    let present = Value::record([
        ("id", Value::Int(1)),
        ("nick", Value::some(Value::String("ada".to_string()))),
    ]);
    assert_roundtrip(&schema, &present);

    // An absent optional occupies zero bytes, so the decoded record simply
    // lacks the field.
    let absent = Value::record([("id", Value::Int(1)), ("nick", Value::none())]);
    let without_field = Value::record([("id", Value::Int(1))]);
    let bytes = encode(&schema, &absent);
    assert_eq!(bytes, encode(&schema, &without_field));
    assert_eq!(decode(&schema, &bytes).unwrap(), without_field);
}

#[test]
fn test_nested_optional_collapses_inner_none() {
    let schema = Schema::record([("opt", Schema::optional(Schema::optional(Schema::int())))]);

    let some_some = Value::record([("opt", Value::some(Value::some(Value::Int(7))))]);
    assert_roundtrip(&schema, &some_some);

    // Some(None) and None are indistinguishable on the wire; decoding
    // yields the outer None.
    let some_none = Value::record([("opt", Value::some(Value::none()))]);
    let bytes = encode(&schema, &some_none);
    assert_eq!(
        decode(&schema, &bytes).unwrap(),
        Value::record([("opt", Value::none())])
    );
}

#[test]
fn test_char_sequences_are_not_packed() {
    let schema = Schema::record([("chars", Schema::sequence(Schema::char()))]);
    let value = Value::record([(
        "chars",
        Value::sequence([Value::Char('a'), Value::Char('b')]),
    )]);

    // Each element is its own length-delimited field; a packed frame of
    // chars would be undecodable.
    let bytes = encode(&schema, &value);
    assert_eq!(&bytes[..], [0x0a, 0x06, 0x0a, 0x01, b'a', 0x12, 0x01, b'b']);
    assert_roundtrip(&schema, &value);
}

#[test]
fn test_duplicate_field_keeps_first_occurrence() {
    let (schema, _) = int_record(0);
    // Field 1 appears twice: value 1, then value 2.
    let decoded = decode(&schema, &[0x08, 0x01, 0x08, 0x02]).unwrap();
    assert_eq!(decoded, Value::record([("value", Value::Int(1))]));
}

#[test]
fn test_transform_surfaces_user_values() {
    // Stored as an int, surfaced as its decimal rendering.
    let schema = Schema::transform(
        Schema::int(),
        |inner| match inner {
            Value::Int(value) => Ok(Value::String(value.to_string())),
            other => Err(format!("expected an int, got {other:?}")),
        },
        |value| match value {
            Value::String(text) => text
                .parse::<i32>()
                .map(Value::Int)
                .map_err(|err| err.to_string()),
            other => Err(format!("expected a string, got {other:?}")),
        },
    );

    let value = Value::String("150".to_string());
    let bytes = encode(&schema, &value);
    assert_eq!(&bytes[..], [0x96, 0x01]);
    assert_eq!(decode(&schema, &bytes).unwrap(), value);
}

#[test]
fn test_transform_decode_error_is_verbatim() {
    let schema = Schema::transform(
        Schema::int(),
        |_| Err("boom".to_string()),
        |value| Ok(value),
    );
    let error = decode(&schema, &[0x01]).unwrap_err();
    assert_eq!(error.to_string(), "boom");
}

#[test]
fn test_transform_over_record_inlines_fields() {
    let point = Schema::record([("x", Schema::int()), ("y", Schema::int())]);
    let schema = Schema::record([
        ("a", Schema::int()),
        ("point", Schema::transform(point, Ok, Ok)),
        ("b", Schema::int()),
    ]);

    // The inlined fields consume positions 2 and 3; `b` lands at 4.
    let value = Value::record([
        ("a", Value::Int(1)),
        ("x", Value::Int(5)),
        ("y", Value::Int(7)),
        ("b", Value::Int(9)),
    ]);
    let bytes = encode(&schema, &value);
    assert_eq!(&bytes[..], [0x08, 0x01, 0x10, 0x05, 0x18, 0x07, 0x20, 0x09]);
    assert_eq!(decode(&schema, &bytes).unwrap(), value);
}

#[test]
fn test_product_roundtrips_through_constructor() {
    let schema = Schema::product(
        [
            ProductField::new("name", Schema::string(), |value| match value {
                Value::Tuple(first, _) => (**first).clone(),
                _ => Value::Unit,
            }),
            ProductField::new("age", Schema::int(), |value| match value {
                Value::Tuple(_, second) => (**second).clone(),
                _ => Value::Unit,
            }),
        ],
        |mut values| {
            let age = values.pop().ok_or_else(|| "missing age".to_string())?;
            let name = values.pop().ok_or_else(|| "missing name".to_string())?;
            Ok(Value::tuple(name, age))
        },
    );

    let value = Value::tuple(Value::String("ada".to_string()), Value::Int(36));
    assert_roundtrip(&schema, &value);
}

fn shape_case(name: &'static str, field: &'static str) -> OneofCase {
    let schema = Schema::transform(
        Schema::record([(field, Schema::double())]),
        move |inner| Ok(Value::case(name, inner)),
        move |value| match value {
            Value::Enumeration(case, inner) if case == name => Ok(*inner),
            other => Err(format!("not a {name}: {other:?}")),
        },
    );
    OneofCase::new(name, schema, move |value| match value {
        Value::Enumeration(case, _) if case == name => Some(value.clone()),
        _ => None,
    })
}

#[test]
fn test_oneof_roundtrips_each_case() {
    let schema = Schema::oneof([shape_case("Circle", "radius"), shape_case("Square", "side")]);

    let circle = Value::case("Circle", Value::record([("radius", Value::Double(1.5))]));
    let square = Value::case("Square", Value::record([("side", Value::Double(2.0))]));
    assert_roundtrip(&schema, &circle);
    assert_roundtrip(&schema, &square);
}

#[test]
fn test_oneof_unknown_case_encodes_empty_payload() {
    let schema = Schema::oneof([shape_case("Circle", "radius")]);
    let stranger = Value::case("Pentagon", Value::Unit);
    // No probe matches: the oneof still frames an empty payload.
    assert!(encode(&schema, &stranger).is_empty());

    let nested = Schema::record([("shape", schema)]);
    let value = Value::record([("shape", stranger)]);
    assert_eq!(&encode(&nested, &value)[..], [0x0a, 0x00]);
}

fn int_list_schema() -> Schema {
    Schema::enumeration([
        (
            "Cons",
            Schema::record([
                ("head", Schema::int()),
                ("tail", Schema::defer(int_list_schema)),
            ]),
        ),
        ("Nil", Schema::case_object("Nil", Value::Unit)),
    ])
}

fn cons(head: i32, tail: Value) -> Value {
    Value::case(
        "Cons",
        Value::record([("head", Value::Int(head)), ("tail", tail)]),
    )
}

fn nil() -> Value {
    Value::case("Nil", Value::Unit)
}

#[test]
fn test_recursive_schema_roundtrips() {
    let schema = int_list_schema();
    assert_roundtrip(&schema, &nil());
    assert_roundtrip(&schema, &cons(1, nil()));
    assert_roundtrip(&schema, &cons(1, cons(2, cons(3, nil()))));
}

#[test]
fn test_case_object_inside_enumeration() {
    let schema = Schema::record([("list", int_list_schema())]);
    let value = Value::record([("list", nil())]);

    // `Nil` is case 2: an empty length-delimited payload at field 2,
    // wrapped in the enumeration's own frame.
    let bytes = encode(&schema, &value);
    assert_eq!(&bytes[..], [0x0a, 0x02, 0x12, 0x00]);
    assert_roundtrip(&schema, &value);
}

#[test]
fn test_temporal_record_roundtrips() {
    let zone: chrono_tz::Tz = "Europe/Paris".parse().unwrap();
    let schema = Schema::record([
        ("weekday", Schema::day_of_week()),
        ("month", Schema::month()),
        ("month_day", Schema::month_day()),
        ("period", Schema::period()),
        ("year", Schema::year()),
        ("year_month", Schema::year_month()),
        ("zone_id", Schema::zone_id()),
        ("zone_offset", Schema::zone_offset()),
        ("duration", Schema::duration()),
        ("instant", Schema::instant()),
        ("local_date", Schema::local_date()),
        ("local_time", Schema::local_time()),
        ("local_date_time", Schema::local_date_time()),
        ("offset_time", Schema::offset_time()),
        ("offset_date_time", Schema::offset_date_time()),
        ("zoned_date_time", Schema::zoned_date_time()),
    ]);

    let offset = FixedOffset::east_opt(3600).unwrap();
    let value = Value::record([
        ("weekday", Value::DayOfWeek(Weekday::Wed)),
        ("month", Value::Month(Month::July)),
        ("month_day", Value::MonthDay { month: 2, day: 29 }),
        (
            "period",
            Value::Period {
                years: -1,
                months: 2,
                days: 30,
            },
        ),
        ("year", Value::Year(-44)),
        ("year_month", Value::YearMonth { year: 2024, month: 7 }),
        ("zone_id", Value::ZoneId(zone)),
        ("zone_offset", Value::ZoneOffset(offset)),
        (
            "duration",
            Value::Duration(TimeDelta::try_seconds(90).unwrap() + TimeDelta::nanoseconds(12_345)),
        ),
        (
            "instant",
            Value::Instant(Utc.with_ymd_and_hms(2020, 7, 1, 8, 15, 30).unwrap()),
        ),
        (
            "local_date",
            Value::LocalDate(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()),
        ),
        (
            "local_time",
            Value::LocalTime(NaiveTime::from_hms_milli_opt(23, 59, 59, 123).unwrap()),
        ),
        (
            "local_date_time",
            Value::LocalDateTime(
                NaiveDate::from_ymd_opt(2024, 2, 29)
                    .unwrap()
                    .and_hms_opt(12, 30, 45)
                    .unwrap(),
            ),
        ),
        (
            "offset_time",
            Value::OffsetTime(NaiveTime::from_hms_opt(10, 15, 30).unwrap(), offset),
        ),
        (
            "offset_date_time",
            Value::OffsetDateTime(offset.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap()),
        ),
        (
            "zoned_date_time",
            Value::ZonedDateTime(zone.with_ymd_and_hms(2020, 7, 1, 10, 15, 30).unwrap()),
        ),
    ]);

    assert_roundtrip(&schema, &value);
}

#[test]
fn test_enumeration_unknown_field_number_fails() {
    let schema = Schema::enumeration([("Only", Schema::record([("value", Schema::int())]))]);
    // Field 2 selects a case that doesn't exist.
    let error = decode(&schema, &[0x12, 0x00]).unwrap_err();
    assert_eq!(error.to_string(), "Schema doesn't contain field number 2.");
}

#[test]
fn test_tuple_with_missing_component_fails() {
    let schema = Schema::tuple(Schema::int(), Schema::int());
    // Only `first` (field 1) is present.
    let error = decode(&schema, &[0x08, 0x01]).unwrap_err();
    assert_eq!(error.to_string(), "Error while decoding tuple.");
}

#[test]
fn test_either_with_bad_field_number_fails() {
    let schema = Schema::either(Schema::int(), Schema::int());
    let error = decode(&schema, &[0x18, 0x01]).unwrap_err();
    assert_eq!(error.to_string(), "Failed to decode either.");
}
