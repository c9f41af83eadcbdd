//! The encoder dispatcher: `(schema, value)` in, wire bytes out.
//!
//! Encoding never fails. A `(schema, value)` pair that doesn't match, and
//! a transform whose backward conversion errors, encode to the empty
//! chunk; the bytes a schema would have produced are simply absent.

use std::collections::BTreeMap;

use bytes::{BufMut, Bytes, BytesMut};

use super::{can_be_packed, temporal};
use crate::leb128::encode_varint;
use crate::schema::{flat_fields, FlatFields, Schema, StandardType};
use crate::value::Value;
use crate::wire::{encode_key, WireType};

/// Encodes `value` as described by `schema`.
///
/// The top-level value is emitted untagged: the buffer starts directly
/// with the root's payload.
pub fn encode(schema: &Schema, value: &Value) -> Bytes {
    let mut buf = BytesMut::new();
    encode_value(None, schema, value, &mut buf);
    buf.freeze()
}

fn encode_value(field_number: Option<u32>, schema: &Schema, value: &Value, buf: &mut BytesMut) {
    match (schema, value) {
        (Schema::Primitive(standard), value) => {
            encode_primitive(field_number, *standard, value, buf)
        }
        (Schema::Sequence(element), Value::Sequence(items)) => {
            encode_sequence(field_number, element, items, buf)
        }
        (Schema::Tuple(first, second), Value::Tuple(a, b)) => {
            let fields = vec![
                ("first".to_string(), (**first).clone()),
                ("second".to_string(), (**second).clone()),
            ];
            let data = BTreeMap::from([
                ("first".to_string(), (**a).clone()),
                ("second".to_string(), (**b).clone()),
            ]);
            encode_record(field_number, &flat_fields(&fields, 1), &data, buf)
        }
        (Schema::Optional(_), Value::Optional(None)) => {}
        (Schema::Optional(inner), Value::Optional(Some(value))) => {
            let fields = vec![("value".to_string(), (**inner).clone())];
            let data = BTreeMap::from([("value".to_string(), (**value).clone())]);
            encode_record(field_number, &flat_fields(&fields, 1), &data, buf)
        }
        (Schema::Either(left, _), Value::Left(value)) => {
            let mut payload = BytesMut::new();
            encode_value(Some(1), left, value, &mut payload);
            put_len_field(field_number, &payload, buf);
        }
        (Schema::Either(_, right), Value::Right(value)) => {
            let mut payload = BytesMut::new();
            encode_value(Some(2), right, value, &mut payload);
            put_len_field(field_number, &payload, buf);
        }
        (Schema::Transform(transform), value) => {
            // A failing backward conversion drops the value on the floor.
            if let Ok(inner) = (transform.encode)(value.clone()) {
                encode_value(field_number, &transform.inner, &inner, buf);
            }
        }
        (Schema::Record(record), Value::Record(data)) => {
            encode_record(field_number, &flat_fields(&record.fields, 1), data, buf)
        }
        (Schema::Product(product), value) => {
            let data: BTreeMap<String, Value> = product
                .fields
                .iter()
                .map(|field| (field.name.clone(), (field.extract)(value)))
                .collect();
            encode_record(
                field_number,
                &flat_fields(&product.field_pairs(), 1),
                &data,
                buf,
            )
        }
        (Schema::Enumeration(enumeration), Value::Enumeration(case_name, value)) => {
            let mut payload = BytesMut::new();
            let flat = flat_fields(&enumeration.cases, 1);
            if let Some(case) = flat.iter().find(|case| case.name == *case_name) {
                encode_value(Some(case.field_number), &case.schema, value, &mut payload);
            }
            put_len_field(field_number, &payload, buf);
        }
        (Schema::Oneof(oneof), value) => {
            let mut payload = BytesMut::new();
            for (index, case) in oneof.cases.iter().enumerate() {
                if let Some(inner) = (case.deconstruct)(value) {
                    let case_number = u32::try_from(index).unwrap_or(u32::MAX).saturating_add(1);
                    encode_value(Some(case_number), &case.schema, &inner, &mut payload);
                    break;
                }
            }
            put_len_field(field_number, &payload, buf);
        }
        (Schema::CaseObject(_), _) => put_len_field(field_number, &[], buf),
        (Schema::Lazy(lazy), value) => encode_value(field_number, &lazy.resolve(), value, buf),
        (Schema::Fail(_), _) => {}
        // Mismatched (schema, value) shapes encode to nothing.
        _ => {}
    }
}

/// Encodes the flattened fields present in `data`, in declaration order,
/// then wraps them as a length-delimited frame under `field_number`.
fn encode_record(
    field_number: Option<u32>,
    flat: &FlatFields,
    data: &BTreeMap<String, Value>,
    buf: &mut BytesMut,
) {
    let mut payload = BytesMut::new();
    for field in flat {
        if let Some(value) = data.get(&field.name) {
            encode_value(Some(field.field_number), &field.schema, value, &mut payload);
        }
    }
    put_len_field(field_number, &payload, buf);
}

fn encode_sequence(
    field_number: Option<u32>,
    element: &Schema,
    items: &[Value],
    buf: &mut BytesMut,
) {
    let mut payload = BytesMut::new();
    if can_be_packed(element) {
        for item in items {
            encode_value(None, element, item, &mut payload);
        }
    } else {
        for (index, item) in items.iter().enumerate() {
            // Elements get synthetic 1-based field numbers.
            let element_number = u32::try_from(index).unwrap_or(u32::MAX).saturating_add(1);
            encode_value(Some(element_number), element, item, &mut payload);
        }
    }
    put_len_field(field_number, &payload, buf);
}

fn encode_primitive(
    field_number: Option<u32>,
    standard: StandardType,
    value: &Value,
    buf: &mut BytesMut,
) {
    match (standard, value) {
        (StandardType::Unit, _) => {}
        (StandardType::Bool, Value::Bool(value)) => {
            put_varint_field(field_number, i64::from(*value), buf)
        }
        (StandardType::Short, Value::Short(value)) => {
            put_varint_field(field_number, i64::from(*value), buf)
        }
        (StandardType::Int, Value::Int(value)) => {
            put_varint_field(field_number, i64::from(*value), buf)
        }
        (StandardType::Long, Value::Long(value)) => put_varint_field(field_number, *value, buf),
        (StandardType::Float, Value::Float(value)) => {
            encode_key(WireType::Bit32, field_number, buf);
            buf.put_f32_le(*value);
        }
        (StandardType::Double, Value::Double(value)) => {
            encode_key(WireType::Bit64, field_number, buf);
            buf.put_f64_le(*value);
        }
        (StandardType::String, Value::String(value)) => {
            put_len_field(field_number, value.as_bytes(), buf)
        }
        (StandardType::Binary, Value::Binary(value)) => put_len_field(field_number, value, buf),
        (StandardType::Char, Value::Char(value)) => {
            let mut encoded = [0u8; 4];
            put_len_field(field_number, value.encode_utf8(&mut encoded).as_bytes(), buf)
        }
        (StandardType::DayOfWeek, Value::DayOfWeek(value)) => {
            put_varint_field(field_number, i64::from(value.number_from_monday()), buf)
        }
        (StandardType::Month, Value::Month(value)) => {
            put_varint_field(field_number, i64::from(value.number_from_month()), buf)
        }
        (StandardType::Year, Value::Year(value)) => {
            put_varint_field(field_number, i64::from(*value), buf)
        }
        (StandardType::ZoneOffset, Value::ZoneOffset(value)) => {
            put_varint_field(field_number, i64::from(value.local_minus_utc()), buf)
        }
        (StandardType::MonthDay, Value::MonthDay { month, day }) => encode_record(
            field_number,
            &flat_fields(&temporal::month_day_fields(), 1),
            &temporal::month_day_data(*month, *day),
            buf,
        ),
        (StandardType::YearMonth, Value::YearMonth { year, month }) => encode_record(
            field_number,
            &flat_fields(&temporal::year_month_fields(), 1),
            &temporal::year_month_data(*year, *month),
            buf,
        ),
        (StandardType::Period, Value::Period { years, months, days }) => encode_record(
            field_number,
            &flat_fields(&temporal::period_fields(), 1),
            &temporal::period_data(*years, *months, *days),
            buf,
        ),
        (StandardType::Duration, Value::Duration(value)) => encode_record(
            field_number,
            &flat_fields(&temporal::duration_fields(), 1),
            &temporal::duration_data(value),
            buf,
        ),
        (StandardType::ZoneId, Value::ZoneId(value)) => {
            put_len_field(field_number, value.name().as_bytes(), buf)
        }
        (StandardType::Instant, Value::Instant(value)) => {
            put_len_field(field_number, temporal::format_instant(value).as_bytes(), buf)
        }
        (StandardType::LocalDate, Value::LocalDate(value)) => put_len_field(
            field_number,
            temporal::format_local_date(value).as_bytes(),
            buf,
        ),
        (StandardType::LocalTime, Value::LocalTime(value)) => put_len_field(
            field_number,
            temporal::format_local_time(value).as_bytes(),
            buf,
        ),
        (StandardType::LocalDateTime, Value::LocalDateTime(value)) => put_len_field(
            field_number,
            temporal::format_local_date_time(value).as_bytes(),
            buf,
        ),
        (StandardType::OffsetTime, Value::OffsetTime(time, offset)) => put_len_field(
            field_number,
            temporal::format_offset_time(time, offset).as_bytes(),
            buf,
        ),
        (StandardType::OffsetDateTime, Value::OffsetDateTime(value)) => put_len_field(
            field_number,
            temporal::format_offset_date_time(value).as_bytes(),
            buf,
        ),
        (StandardType::ZonedDateTime, Value::ZonedDateTime(value)) => put_len_field(
            field_number,
            temporal::format_zoned_date_time(value).as_bytes(),
            buf,
        ),
        // Mismatched (standard, value) shapes encode to nothing.
        _ => {}
    }
}

/// Writes a varint payload, tagged when a field number is present. Signed
/// values pass through as their two's-complement 64-bit representation.
fn put_varint_field(field_number: Option<u32>, value: i64, buf: &mut BytesMut) {
    encode_key(WireType::VarInt, field_number, buf);
    encode_varint(value as u64, buf);
}

/// Writes a length-delimited payload, tagged and length-prefixed when a
/// field number is present; bare otherwise.
fn put_len_field(field_number: Option<u32>, payload: &[u8], buf: &mut BytesMut) {
    encode_key(WireType::LengthDelimited(payload.len()), field_number, buf);
    buf.extend_from_slice(payload);
}
