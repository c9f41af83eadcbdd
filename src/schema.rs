//! Runtime descriptions of data types.
//!
//! A [`Schema`] is an ordinary value, built programmatically and shared
//! (cheaply, via interior [`Arc`]s) across every encode/decode call. The
//! codec walks it structurally; nothing here is generated.
//!
//! Field numbers are never written down by hand: within each record frame
//! they are assigned positionally starting at 1, by [`flat_fields`]. A field
//! whose schema is a transform chain terminating at a record is inlined,
//! its positional numbers consumed by the inner fields in declaration
//! order.

use std::fmt;
use std::sync::{Arc, OnceLock};

use smallvec::SmallVec;

use crate::value::Value;

/// Forward (`decode`) or backward (`encode`) conversion carried by a
/// transform node.
pub type TransformFn = Arc<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;

/// Builds a statically-shaped product value from its decoded field slots.
pub type ConstructFn = Arc<dyn Fn(Vec<Value>) -> Result<Value, String> + Send + Sync>;

/// Pulls one field's value out of a statically-shaped product value.
pub type ExtractFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Probes whether a value belongs to one case of a [`Schema::oneof`],
/// yielding the case payload when it does.
pub type DeconstructFn = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// The scalar leaves a schema can bottom out in.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StandardType {
    Unit,
    Bool,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
    Binary,
    Char,
    DayOfWeek,
    Month,
    MonthDay,
    Period,
    Year,
    YearMonth,
    ZoneId,
    ZoneOffset,
    Duration,
    Instant,
    LocalDate,
    LocalTime,
    LocalDateTime,
    OffsetTime,
    OffsetDateTime,
    ZonedDateTime,
}

impl StandardType {
    /// Whether a sequence of this scalar uses the packed representation.
    ///
    /// `Char` encodes as a length-delimited UTF-8 string, so a packed frame
    /// of chars would be undecodable; it is forced unpackable.
    pub(crate) fn is_packable(self) -> bool {
        matches!(
            self,
            StandardType::Bool
                | StandardType::Short
                | StandardType::Int
                | StandardType::Long
                | StandardType::Float
                | StandardType::Double
                | StandardType::DayOfWeek
                | StandardType::Month
                | StandardType::Year
                | StandardType::ZoneOffset
                | StandardType::Duration
        )
    }
}

/// A runtime description of a data type.
///
/// Cloning is cheap; composite variants share their contents through
/// [`Arc`]s. Schemas are deeply immutable and may be shared freely across
/// threads.
#[derive(Clone)]
pub enum Schema {
    /// A scalar leaf.
    Primitive(StandardType),
    /// A homogeneous ordered collection of `element`.
    Sequence(Arc<Schema>),
    /// An ordered pair, encoded as the record `{first, second}`.
    Tuple(Arc<Schema>, Arc<Schema>),
    /// Zero or one of `inner`, encoded as the record `{value}`.
    Optional(Arc<Schema>),
    /// A tagged union of exactly two alternatives, `Left` at position 1
    /// and `Right` at position 2.
    Either(Arc<Schema>, Arc<Schema>),
    /// A lens between a stored inner representation and a user-facing
    /// value; how user-defined types enter the codec.
    Transform(Arc<TransformSchema>),
    /// A named-field product with a runtime-dynamic field list; decodes to
    /// [`Value::Record`].
    Record(Arc<RecordSchema>),
    /// A statically-shaped product; decodes through a constructor over its
    /// field slots.
    Product(Arc<ProductSchema>),
    /// A runtime-dynamic sum; exactly one case is present on the wire.
    Enumeration(Arc<EnumerationSchema>),
    /// A statically-declared sum; cases carry deconstruction probes, in
    /// the manner of a protobuf `oneof`.
    Oneof(Arc<OneofSchema>),
    /// A singleton product with zero fields.
    CaseObject(Arc<CaseObjectSchema>),
    /// Always fails to decode with the carried message; encodes to the
    /// empty chunk.
    Fail(Arc<str>),
    /// Deferred construction, for schemas that reference themselves.
    Lazy(Arc<LazySchema>),
}

/// The transform node: an inner schema plus both directions of conversion.
pub struct TransformSchema {
    pub(crate) inner: Schema,
    /// Applied after decoding the inner representation.
    pub(crate) decode: TransformFn,
    /// Applied before encoding, to recover the inner representation.
    pub(crate) encode: TransformFn,
}

/// A record with a runtime-dynamic ordered field list.
pub struct RecordSchema {
    pub(crate) fields: Vec<(String, Schema)>,
}

/// One field of a [`ProductSchema`].
pub struct ProductField {
    pub(crate) name: String,
    pub(crate) schema: Schema,
    pub(crate) extract: ExtractFn,
}

impl ProductField {
    /// A product field: its name, its schema, and how to pull it out of
    /// the parent value during encoding.
    pub fn new(
        name: impl Into<String>,
        schema: Schema,
        extract: impl Fn(&Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        ProductField {
            name: name.into(),
            schema,
            extract: Arc::new(extract),
        }
    }
}

/// A statically-shaped product of any arity: ordered fields plus a
/// constructor from the decoded field slots.
pub struct ProductSchema {
    pub(crate) fields: Vec<ProductField>,
    pub(crate) construct: ConstructFn,
}

impl ProductSchema {
    /// The `(name, schema)` view of the fields, for flattening.
    pub(crate) fn field_pairs(&self) -> Vec<(String, Schema)> {
        self.fields
            .iter()
            .map(|field| (field.name.clone(), field.schema.clone()))
            .collect()
    }
}

/// A sum with a runtime-dynamic ordered case list.
pub struct EnumerationSchema {
    pub(crate) cases: Vec<(String, Schema)>,
}

/// One case of a [`OneofSchema`].
pub struct OneofCase {
    pub(crate) name: String,
    pub(crate) schema: Schema,
    pub(crate) deconstruct: DeconstructFn,
}

impl OneofCase {
    /// A oneof case: its name, its payload schema, and the probe that
    /// recognizes (and unwraps) values belonging to it.
    pub fn new(
        name: impl Into<String>,
        schema: Schema,
        deconstruct: impl Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    ) -> Self {
        OneofCase {
            name: name.into(),
            schema,
            deconstruct: Arc::new(deconstruct),
        }
    }
}

/// A statically-declared sum. Exactly one case's probe matches any given
/// value; on decode the case is chosen by the received field number.
pub struct OneofSchema {
    pub(crate) cases: Vec<OneofCase>,
}

/// A singleton: a case name plus the instance returned on decode.
pub struct CaseObjectSchema {
    pub(crate) name: String,
    pub(crate) instance: Value,
}

/// A schema built on first use, so sums and products can reference
/// themselves through it.
pub struct LazySchema {
    thunk: Box<dyn Fn() -> Schema + Send + Sync>,
    realized: OnceLock<Schema>,
}

impl LazySchema {
    /// The realized schema, built once and cached.
    pub(crate) fn resolve(&self) -> Schema {
        self.realized.get_or_init(|| (self.thunk)()).clone()
    }
}

impl Schema {
    pub fn unit() -> Schema {
        Schema::Primitive(StandardType::Unit)
    }

    pub fn bool() -> Schema {
        Schema::Primitive(StandardType::Bool)
    }

    pub fn short() -> Schema {
        Schema::Primitive(StandardType::Short)
    }

    pub fn int() -> Schema {
        Schema::Primitive(StandardType::Int)
    }

    pub fn long() -> Schema {
        Schema::Primitive(StandardType::Long)
    }

    pub fn float() -> Schema {
        Schema::Primitive(StandardType::Float)
    }

    pub fn double() -> Schema {
        Schema::Primitive(StandardType::Double)
    }

    pub fn string() -> Schema {
        Schema::Primitive(StandardType::String)
    }

    pub fn binary() -> Schema {
        Schema::Primitive(StandardType::Binary)
    }

    pub fn char() -> Schema {
        Schema::Primitive(StandardType::Char)
    }

    pub fn day_of_week() -> Schema {
        Schema::Primitive(StandardType::DayOfWeek)
    }

    pub fn month() -> Schema {
        Schema::Primitive(StandardType::Month)
    }

    pub fn month_day() -> Schema {
        Schema::Primitive(StandardType::MonthDay)
    }

    pub fn period() -> Schema {
        Schema::Primitive(StandardType::Period)
    }

    pub fn year() -> Schema {
        Schema::Primitive(StandardType::Year)
    }

    pub fn year_month() -> Schema {
        Schema::Primitive(StandardType::YearMonth)
    }

    pub fn zone_id() -> Schema {
        Schema::Primitive(StandardType::ZoneId)
    }

    pub fn zone_offset() -> Schema {
        Schema::Primitive(StandardType::ZoneOffset)
    }

    pub fn duration() -> Schema {
        Schema::Primitive(StandardType::Duration)
    }

    pub fn instant() -> Schema {
        Schema::Primitive(StandardType::Instant)
    }

    pub fn local_date() -> Schema {
        Schema::Primitive(StandardType::LocalDate)
    }

    pub fn local_time() -> Schema {
        Schema::Primitive(StandardType::LocalTime)
    }

    pub fn local_date_time() -> Schema {
        Schema::Primitive(StandardType::LocalDateTime)
    }

    pub fn offset_time() -> Schema {
        Schema::Primitive(StandardType::OffsetTime)
    }

    pub fn offset_date_time() -> Schema {
        Schema::Primitive(StandardType::OffsetDateTime)
    }

    pub fn zoned_date_time() -> Schema {
        Schema::Primitive(StandardType::ZonedDateTime)
    }

    /// A homogeneous sequence of `element`.
    pub fn sequence(element: Schema) -> Schema {
        Schema::Sequence(Arc::new(element))
    }

    /// An ordered pair.
    pub fn tuple(first: Schema, second: Schema) -> Schema {
        Schema::Tuple(Arc::new(first), Arc::new(second))
    }

    /// Zero or one of `inner`.
    pub fn optional(inner: Schema) -> Schema {
        Schema::Optional(Arc::new(inner))
    }

    /// A tagged union of two alternatives.
    pub fn either(left: Schema, right: Schema) -> Schema {
        Schema::Either(Arc::new(left), Arc::new(right))
    }

    /// A lens between `inner`'s representation and a user-facing value.
    ///
    /// `decode` runs after the inner schema decodes; `encode` runs before
    /// the inner schema encodes. The two should be mutually inverse on
    /// values that round-trip.
    pub fn transform(
        inner: Schema,
        decode: impl Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
        encode: impl Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    ) -> Schema {
        Schema::Transform(Arc::new(TransformSchema {
            inner,
            decode: Arc::new(decode),
            encode: Arc::new(encode),
        }))
    }

    /// A record with the given ordered fields.
    pub fn record<N, I>(fields: I) -> Schema
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, Schema)>,
    {
        Schema::Record(Arc::new(RecordSchema {
            fields: fields
                .into_iter()
                .map(|(name, schema)| (name.into(), schema))
                .collect(),
        }))
    }

    /// A statically-shaped product: ordered fields plus a constructor over
    /// the decoded field slots.
    pub fn product<I>(
        fields: I,
        construct: impl Fn(Vec<Value>) -> Result<Value, String> + Send + Sync + 'static,
    ) -> Schema
    where
        I: IntoIterator<Item = ProductField>,
    {
        Schema::Product(Arc::new(ProductSchema {
            fields: fields.into_iter().collect(),
            construct: Arc::new(construct),
        }))
    }

    /// A sum with the given ordered cases.
    pub fn enumeration<N, I>(cases: I) -> Schema
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, Schema)>,
    {
        Schema::Enumeration(Arc::new(EnumerationSchema {
            cases: cases
                .into_iter()
                .map(|(name, schema)| (name.into(), schema))
                .collect(),
        }))
    }

    /// A statically-declared sum with deconstruction probes per case.
    pub fn oneof<I: IntoIterator<Item = OneofCase>>(cases: I) -> Schema {
        Schema::Oneof(Arc::new(OneofSchema {
            cases: cases.into_iter().collect(),
        }))
    }

    /// A singleton product: decodes to `instance`, encodes to an empty
    /// length-delimited payload.
    pub fn case_object(name: impl Into<String>, instance: Value) -> Schema {
        Schema::CaseObject(Arc::new(CaseObjectSchema {
            name: name.into(),
            instance,
        }))
    }

    /// A schema that always fails to decode with `message`.
    pub fn fail(message: impl Into<String>) -> Schema {
        Schema::Fail(Arc::from(message.into()))
    }

    /// Defers schema construction until first use, allowing a schema to
    /// reference itself.
    pub fn defer(thunk: impl Fn() -> Schema + Send + Sync + 'static) -> Schema {
        Schema::Lazy(Arc::new(LazySchema {
            thunk: Box::new(thunk),
            realized: OnceLock::new(),
        }))
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schema::Primitive(standard) => f.debug_tuple("Primitive").field(standard).finish(),
            Schema::Sequence(element) => f.debug_tuple("Sequence").field(element).finish(),
            Schema::Tuple(first, second) => {
                f.debug_tuple("Tuple").field(first).field(second).finish()
            }
            Schema::Optional(inner) => f.debug_tuple("Optional").field(inner).finish(),
            Schema::Either(left, right) => {
                f.debug_tuple("Either").field(left).field(right).finish()
            }
            Schema::Transform(transform) => {
                f.debug_tuple("Transform").field(&transform.inner).finish()
            }
            Schema::Record(record) => {
                let names: Vec<_> = record.fields.iter().map(|(name, _)| name).collect();
                f.debug_tuple("Record").field(&names).finish()
            }
            Schema::Product(product) => {
                let names: Vec<_> = product.fields.iter().map(|field| &field.name).collect();
                f.debug_tuple("Product").field(&names).finish()
            }
            Schema::Enumeration(enumeration) => {
                let names: Vec<_> = enumeration.cases.iter().map(|(name, _)| name).collect();
                f.debug_tuple("Enumeration").field(&names).finish()
            }
            Schema::Oneof(oneof) => {
                let names: Vec<_> = oneof.cases.iter().map(|case| &case.name).collect();
                f.debug_tuple("Oneof").field(&names).finish()
            }
            Schema::CaseObject(case_object) => {
                f.debug_tuple("CaseObject").field(&case_object.name).finish()
            }
            Schema::Fail(message) => f.debug_tuple("Fail").field(message).finish(),
            Schema::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

/// A record field after flattening: its wire field number, its name, and
/// its (possibly transform-wrapped) schema.
#[derive(Clone)]
pub(crate) struct FlatField {
    pub(crate) field_number: u32,
    pub(crate) name: String,
    pub(crate) schema: Schema,
}

pub(crate) type FlatFields = SmallVec<[FlatField; 8]>;

/// Assigns positional field numbers to `fields`, starting at `base`.
///
/// A field whose schema is a transform chain ending in a record is inlined:
/// the inner record's fields take over the outer field's position, numbered
/// consecutively, each keeping the outer conversions wrapped around its own
/// schema. Every other field occupies exactly one number.
pub(crate) fn flat_fields(fields: &[(String, Schema)], base: u32) -> FlatFields {
    let mut flattened = FlatFields::new();
    let mut next = base;
    for (name, schema) in fields {
        match nested_fields(schema, next) {
            Some(inner) => {
                next += inner.len() as u32;
                flattened.extend(inner);
            }
            None => {
                flattened.push(FlatField {
                    field_number: next,
                    name: name.clone(),
                    schema: schema.clone(),
                });
                next += 1;
            }
        }
    }
    flattened
}

fn nested_fields(schema: &Schema, base: u32) -> Option<FlatFields> {
    match schema {
        Schema::Transform(transform) => {
            let inner = match &transform.inner {
                Schema::Record(record) => Some(flat_fields(&record.fields, base)),
                inner @ Schema::Transform(_) => nested_fields(inner, base),
                _ => None,
            }?;
            // Keep the outer conversions in play for each inlined field.
            Some(
                inner
                    .into_iter()
                    .map(|field| FlatField {
                        schema: Schema::Transform(Arc::new(TransformSchema {
                            inner: field.schema,
                            decode: transform.decode.clone(),
                            encode: transform.encode.clone(),
                        })),
                        ..field
                    })
                    .collect(),
            )
        }
        _ => None,
    }
}
