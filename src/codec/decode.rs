//! The decoder dispatcher: a schema in, a [`Decoder`] producing a value
//! out.
//!
//! Every composite shape reads a field key, looks the field number up in
//! its flattened field table, and bounds the sub-decoder with
//! [`Decoder::take`] when the key is length-delimited. Errors abort the
//! whole top-level decode; nothing recovers locally.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::{Buf, Bytes};

use super::{can_be_packed, temporal};
use crate::decoder::{self, Decoder};
use crate::error::DecodeError;
use crate::leb128::decode_varint;
use crate::schema::{
    flat_fields, CaseObjectSchema, EnumerationSchema, FlatFields, OneofSchema, ProductSchema,
    RecordSchema, Schema, StandardType, TransformSchema,
};
use crate::value::Value;
use crate::wire::{self, WireType};

/// Decodes `bytes` as described by `schema`.
///
/// The top-level value is expected untagged; leftover bytes after the root
/// payload are ignored.
pub fn decode(schema: &Schema, bytes: &[u8]) -> Result<Value, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::EmptyInput);
    }
    let (_leftover, value) = schema_decoder(schema).run(Bytes::copy_from_slice(bytes))?;
    Ok(value)
}

fn schema_decoder(schema: &Schema) -> Decoder<Value> {
    match schema {
        Schema::Primitive(standard) => primitive_decoder(*standard),
        Schema::Sequence(element) => sequence_decoder(element),
        Schema::Tuple(first, second) => tuple_decoder(first, second),
        Schema::Optional(inner) => optional_decoder(inner),
        Schema::Either(left, right) => either_decoder(left, right),
        Schema::Transform(transform) => transform_decoder(transform),
        Schema::Record(record) => record_decoder(record),
        Schema::Product(product) => product_decoder(product),
        Schema::Enumeration(enumeration) => enumeration_decoder(enumeration),
        Schema::Oneof(oneof) => oneof_decoder(oneof),
        Schema::CaseObject(case_object) => case_object_decoder(case_object),
        Schema::Fail(message) => Decoder::fail(DecodeError::message(message.to_string())),
        Schema::Lazy(lazy) => {
            // Built at run time so self-referential schemas terminate.
            let lazy = Arc::clone(lazy);
            Decoder::new(move |bytes| schema_decoder(&lazy.resolve()).run(bytes))
        }
    }
}

/// Reads one field key, folding the payload width into the wire type for
/// length-delimited fields. Group keys have no consumer in any schema, so
/// they are rejected here rather than by a cryptic failure downstream.
fn key() -> Decoder<(WireType, u32)> {
    Decoder::new(|mut bytes: Bytes| {
        let (wire_type, field_number, read) = wire::decode_key(&bytes)?;
        if matches!(wire_type, WireType::StartGroup | WireType::EndGroup) {
            return Err(DecodeError::UnsupportedGroupType);
        }
        bytes.advance(read);
        Ok((bytes, (wire_type, field_number)))
    })
}

fn varint() -> Decoder<u64> {
    Decoder::new(|mut bytes: Bytes| {
        let (value, read) = decode_varint(&bytes)?;
        bytes.advance(read);
        Ok((bytes, value))
    })
}

/// Bounds `decoder` to the payload width when the field was
/// length-delimited; varint- and fixed-width payloads delimit themselves.
fn bounded(decoder: Decoder<Value>, wire_type: WireType) -> Decoder<Value> {
    match wire_type {
        WireType::LengthDelimited(width) => decoder.take(width),
        _ => decoder,
    }
}

// -------------------------------- records ---------------------------------

/// Decodes a record payload into a name-to-value map.
///
/// Reads keys until the (bounded) buffer is empty, resolving each field
/// number against the flattened field table. The first occurrence of a
/// field wins; an undeclared field number fails the decode.
fn record_payload(flat: FlatFields) -> Decoder<BTreeMap<String, Value>> {
    if flat.is_empty() {
        return Decoder::succeed(BTreeMap::new());
    }
    Decoder::new(move |mut bytes: Bytes| {
        let mut data = BTreeMap::new();
        while !bytes.is_empty() {
            let (rest, (wire_type, field_number)) = key().run(bytes)?;
            let field = flat
                .iter()
                .find(|field| field.field_number == field_number)
                .ok_or(DecodeError::unknown_field_number(field_number))?;
            let (rest, value) = bounded(schema_decoder(&field.schema), wire_type).run(rest)?;
            data.entry(field.name.clone()).or_insert(value);
            bytes = rest;
        }
        Ok((bytes, data))
    })
}

fn record_decoder(record: &Arc<RecordSchema>) -> Decoder<Value> {
    record_payload(flat_fields(&record.fields, 1)).map(Value::Record)
}

fn product_decoder(product: &Arc<ProductSchema>) -> Decoder<Value> {
    let product = Arc::clone(product);
    let flat = flat_fields(&product.field_pairs(), 1);
    Decoder::new(move |mut bytes: Bytes| {
        let mut slots: Vec<Option<Value>> = vec![None; flat.len()];
        while !bytes.is_empty() {
            let (rest, (wire_type, field_number)) = key().run(bytes)?;
            let index = flat
                .iter()
                .position(|field| field.field_number == field_number)
                .ok_or(DecodeError::unknown_field_number(field_number))?;
            let (rest, value) = bounded(schema_decoder(&flat[index].schema), wire_type).run(rest)?;
            if slots[index].is_none() {
                slots[index] = Some(value);
            }
            bytes = rest;
        }

        let mut values = Vec::with_capacity(slots.len());
        for (index, slot) in slots.into_iter().enumerate() {
            let field_number = u32::try_from(index).unwrap_or(u32::MAX).saturating_add(1);
            values.push(slot.ok_or(DecodeError::missing_field_number(field_number))?);
        }
        let value = (product.construct)(values).map_err(DecodeError::message)?;
        Ok((bytes, value))
    })
}

fn tuple_decoder(first: &Schema, second: &Schema) -> Decoder<Value> {
    let fields = vec![
        ("first".to_string(), first.clone()),
        ("second".to_string(), second.clone()),
    ];
    let flat = flat_fields(&fields, 1);
    Decoder::new(move |bytes| {
        let (leftover, mut data) = record_payload(flat.clone()).run(bytes)?;
        match (data.remove("first"), data.remove("second")) {
            (Some(first), Some(second)) => Ok((leftover, Value::tuple(first, second))),
            _ => Err(DecodeError::MalformedTuple),
        }
    })
}

fn optional_decoder(inner: &Schema) -> Decoder<Value> {
    let fields = vec![("value".to_string(), inner.clone())];
    let flat = flat_fields(&fields, 1);
    Decoder::new(move |bytes| {
        let (leftover, mut data) = record_payload(flat.clone()).run(bytes)?;
        // An absent `value` field is how a decoded `None` looks, even for
        // a nested optional.
        Ok((leftover, Value::Optional(data.remove("value").map(Box::new))))
    })
}

// ---------------------------------- sums -----------------------------------

fn either_decoder(left: &Schema, right: &Schema) -> Decoder<Value> {
    let left = left.clone();
    let right = right.clone();
    key().and_then(move |(wire_type, field_number)| match field_number {
        1 => bounded(schema_decoder(&left), wire_type).map(Value::left),
        2 => bounded(schema_decoder(&right), wire_type).map(Value::right),
        _ => Decoder::fail(DecodeError::MalformedEither),
    })
}

fn enumeration_decoder(enumeration: &Arc<EnumerationSchema>) -> Decoder<Value> {
    let flat = flat_fields(&enumeration.cases, 1);
    key().and_then(move |(wire_type, field_number)| {
        match flat.iter().find(|case| case.field_number == field_number) {
            Some(case) => {
                let name = case.name.clone();
                bounded(schema_decoder(&case.schema), wire_type)
                    .map(move |value| Value::Enumeration(name.clone(), Box::new(value)))
            }
            None => Decoder::fail(DecodeError::unknown_field_number(field_number)),
        }
    })
}

fn oneof_decoder(oneof: &Arc<OneofSchema>) -> Decoder<Value> {
    let oneof = Arc::clone(oneof);
    key().and_then(move |(wire_type, field_number)| {
        match oneof.cases.get((field_number - 1) as usize) {
            Some(case) => bounded(schema_decoder(&case.schema), wire_type),
            None => Decoder::fail(DecodeError::unknown_field_number(field_number)),
        }
    })
}

fn case_object_decoder(case_object: &Arc<CaseObjectSchema>) -> Decoder<Value> {
    // The enclosing record or sum has already consumed the key and bounded
    // this decoder to the zero-width frame, so there is nothing to read.
    Decoder::succeed(case_object.instance.clone())
}

// ------------------------------- sequences ---------------------------------

fn sequence_decoder(element: &Schema) -> Decoder<Value> {
    if can_be_packed(element) {
        schema_decoder(element).repeated().map(Value::Sequence)
    } else {
        let element = element.clone();
        key()
            .and_then(move |(wire_type, _)| bounded(schema_decoder(&element), wire_type))
            .repeated()
            .map(Value::Sequence)
    }
}

fn transform_decoder(transform: &Arc<TransformSchema>) -> Decoder<Value> {
    let transform = Arc::clone(transform);
    Decoder::new(move |bytes| {
        let (leftover, inner) = schema_decoder(&transform.inner).run(bytes)?;
        let value = (transform.decode)(inner).map_err(DecodeError::message)?;
        Ok((leftover, value))
    })
}

// ------------------------------- primitives --------------------------------

fn primitive_decoder(standard: StandardType) -> Decoder<Value> {
    match standard {
        StandardType::Unit => Decoder::succeed(Value::Unit),
        StandardType::Bool => varint().map(|value| Value::Bool(value != 0)),
        StandardType::Short => varint().map(|value| Value::Short(value as i16)),
        StandardType::Int => varint().map(|value| Value::Int(value as i32)),
        StandardType::Long => varint().map(|value| Value::Long(value as i64)),
        StandardType::Float => fixed_decoder::<4>("Float", |raw| {
            Value::Float(f32::from_le_bytes(raw))
        }),
        StandardType::Double => fixed_decoder::<8>("Double", |raw| {
            Value::Double(f64::from_le_bytes(raw))
        }),
        StandardType::String => decoder::string().map(Value::String),
        StandardType::Binary => decoder::binary().map(Value::Binary),
        StandardType::Char => string_try_map(|text| {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(value), None) => Ok(Value::Char(value)),
                _ => Err(DecodeError::unexpected_width("Char")),
            }
        }),
        StandardType::DayOfWeek => varint_try_map(|ordinal| {
            temporal::weekday_from_ordinal(ordinal).map(Value::DayOfWeek)
        }),
        StandardType::Month => {
            varint_try_map(|ordinal| temporal::month_from_ordinal(ordinal).map(Value::Month))
        }
        StandardType::Year => varint_try_map(|year| Ok(Value::Year(year as i32))),
        StandardType::ZoneOffset => varint_try_map(|seconds| {
            temporal::zone_offset_from_seconds(seconds).map(Value::ZoneOffset)
        }),
        StandardType::MonthDay => {
            record_try_map(temporal::month_day_fields(), temporal::month_day_from_record)
        }
        StandardType::YearMonth => record_try_map(
            temporal::year_month_fields(),
            temporal::year_month_from_record,
        ),
        StandardType::Period => {
            record_try_map(temporal::period_fields(), temporal::period_from_record)
        }
        StandardType::Duration => {
            record_try_map(temporal::duration_fields(), temporal::duration_from_record)
        }
        StandardType::ZoneId => {
            string_try_map(|text| temporal::parse_zone_id(text).map(Value::ZoneId))
        }
        StandardType::Instant => {
            string_try_map(|text| temporal::parse_instant(text).map(Value::Instant))
        }
        StandardType::LocalDate => {
            string_try_map(|text| temporal::parse_local_date(text).map(Value::LocalDate))
        }
        StandardType::LocalTime => {
            string_try_map(|text| temporal::parse_local_time(text).map(Value::LocalTime))
        }
        StandardType::LocalDateTime => string_try_map(|text| {
            temporal::parse_local_date_time(text).map(Value::LocalDateTime)
        }),
        StandardType::OffsetTime => string_try_map(|text| {
            temporal::parse_offset_time(text).map(|(time, offset)| Value::OffsetTime(time, offset))
        }),
        StandardType::OffsetDateTime => string_try_map(|text| {
            temporal::parse_offset_date_time(text).map(Value::OffsetDateTime)
        }),
        StandardType::ZonedDateTime => string_try_map(|text| {
            temporal::parse_zoned_date_time(text).map(Value::ZonedDateTime)
        }),
    }
}

/// Decodes an `N`-byte little-endian payload, failing with
/// `Unable to decode {primitive}` when the buffer runs short.
fn fixed_decoder<const N: usize>(
    primitive: &'static str,
    convert: impl Fn([u8; N]) -> Value + 'static,
) -> Decoder<Value> {
    Decoder::new(move |mut bytes: Bytes| {
        if bytes.len() < N {
            return Err(DecodeError::unexpected_width(primitive));
        }
        let mut raw = [0u8; N];
        raw.copy_from_slice(&bytes[..N]);
        bytes.advance(N);
        Ok((bytes, convert(raw)))
    })
}

/// A varint decoder followed by a fallible conversion. The raw value is
/// reinterpreted as a two's-complement 64-bit integer first.
fn varint_try_map(
    convert: impl Fn(i64) -> Result<Value, DecodeError> + 'static,
) -> Decoder<Value> {
    Decoder::new(move |bytes| {
        let (leftover, raw) = varint().run(bytes)?;
        Ok((leftover, convert(raw as i64)?))
    })
}

/// A whole-buffer string decoder followed by a fallible conversion.
fn string_try_map(
    convert: impl Fn(&str) -> Result<Value, DecodeError> + 'static,
) -> Decoder<Value> {
    Decoder::new(move |bytes| {
        let (leftover, text) = decoder::string().run(bytes)?;
        Ok((leftover, convert(&text)?))
    })
}

/// A sub-record decoder followed by a fallible reconstruction, for the
/// record-shaped calendar types.
fn record_try_map(
    fields: Vec<(String, Schema)>,
    convert: impl Fn(&BTreeMap<String, Value>) -> Result<Value, DecodeError> + 'static,
) -> Decoder<Value> {
    let flat = flat_fields(&fields, 1);
    Decoder::new(move |bytes| {
        let (leftover, data) = record_payload(flat.clone()).run(bytes)?;
        Ok((leftover, convert(&data)?))
    })
}
