//! The dynamic value model the codec reads and writes.
//!
//! [`Value`] is a single tagged sum spanning every shape a [`Schema`] can
//! describe: scalar leaves, the calendar types, and the composite shapes
//! (records, sequences, tuples, options, eithers, enumeration cases).
//! Schema-described user types are reached from here through
//! `Schema::transform`.
//!
//! [`Schema`]: crate::schema::Schema

use std::collections::BTreeMap;

use bytes::Bytes;
use chrono::{
    DateTime, FixedOffset, Month, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc, Weekday,
};
use chrono_tz::Tz;

/// A dynamically-typed value, the common currency of [`encode`] and
/// [`decode`].
///
/// [`encode`]: crate::codec::encode
/// [`decode`]: crate::codec::decode
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The unit value; occupies zero bytes on the wire.
    Unit,
    Bool(bool),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Binary(Bytes),
    Char(char),
    /// ISO day of week, `Mon` through `Sun`.
    DayOfWeek(Weekday),
    Month(Month),
    /// A month/day pair, e.g. a recurring anniversary.
    MonthDay { month: u32, day: u32 },
    /// A date-based amount of time: years, months, and days.
    Period { years: i32, months: i32, days: i32 },
    Year(i32),
    YearMonth { year: i32, month: u32 },
    /// An IANA time-zone identifier, e.g. `Europe/Paris`.
    ZoneId(Tz),
    /// A fixed offset from UTC.
    ZoneOffset(FixedOffset),
    Duration(TimeDelta),
    Instant(DateTime<Utc>),
    LocalDate(NaiveDate),
    LocalTime(NaiveTime),
    LocalDateTime(NaiveDateTime),
    /// A time of day paired with a UTC offset.
    OffsetTime(NaiveTime, FixedOffset),
    OffsetDateTime(DateTime<FixedOffset>),
    /// A date-time in a named time zone.
    ZonedDateTime(DateTime<Tz>),
    /// A named-field product. Encoding walks the schema's declared field
    /// order and looks values up here by name.
    Record(BTreeMap<String, Value>),
    /// A single case of a sum: the case name plus its payload.
    Enumeration(String, Box<Value>),
    /// A homogeneous ordered collection.
    Sequence(Vec<Value>),
    /// An ordered pair.
    Tuple(Box<Value>, Box<Value>),
    /// Zero or one inner value.
    Optional(Option<Box<Value>>),
    /// The left alternative of an either.
    Left(Box<Value>),
    /// The right alternative of an either.
    Right(Box<Value>),
}

impl Value {
    /// Builds a [`Value::Record`] from `(name, value)` pairs.
    pub fn record<N, I>(fields: I) -> Value
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, Value)>,
    {
        Value::Record(
            fields
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        )
    }

    /// Builds a [`Value::Sequence`] from an iterator of values.
    pub fn sequence<I: IntoIterator<Item = Value>>(items: I) -> Value {
        Value::Sequence(items.into_iter().collect())
    }

    /// Builds a [`Value::Enumeration`] case.
    pub fn case(name: impl Into<String>, value: Value) -> Value {
        Value::Enumeration(name.into(), Box::new(value))
    }

    /// Builds a present [`Value::Optional`].
    pub fn some(value: Value) -> Value {
        Value::Optional(Some(Box::new(value)))
    }

    /// The absent [`Value::Optional`].
    pub fn none() -> Value {
        Value::Optional(None)
    }

    /// Builds a [`Value::Tuple`].
    pub fn tuple(first: Value, second: Value) -> Value {
        Value::Tuple(Box::new(first), Box::new(second))
    }

    /// Builds a [`Value::Left`].
    pub fn left(value: Value) -> Value {
        Value::Left(Box::new(value))
    }

    /// Builds a [`Value::Right`].
    pub fn right(value: Value) -> Value {
        Value::Right(Box::new(value))
    }
}
