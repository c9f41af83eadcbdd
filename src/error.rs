//! Errors produced while decoding wire bytes.
//!
//! Every failure mode is a variant of [`DecodeError`]; the [`Display`]
//! rendering is the stable, human-readable form surfaced to callers. The
//! encoder has no error channel: malformed `(schema, value)` pairs encode to
//! the empty chunk.
//!
//! [`Display`]: core::fmt::Display

use core::fmt;

/// An error raised while decoding a protobuf-encoded buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The top-level buffer handed to `decode` was empty.
    EmptyInput,
    /// A field key carried field number zero (or one too large to represent).
    InvalidFieldNumber,
    /// A field key carried a wire-type code outside `0..=5`.
    UnknownWireType,
    /// A group key was read; group encoding is deprecated and unsupported.
    UnsupportedGroupType,
    /// A bounded read (length prefix, `take`) ran past the end of the buffer.
    UnexpectedEndOfBytes,
    /// A varint was unterminated, or read from an empty buffer.
    UnexpectedEndOfChunk,
    /// A decoded field number is not declared by the schema.
    UnknownFieldNumber { field_number: u32 },
    /// A statically-shaped product finished decoding with an empty slot.
    MissingFieldNumber { field_number: u32 },
    /// A tuple payload was missing its first or second component.
    MalformedTuple,
    /// An either payload carried a field number other than 1 or 2.
    MalformedEither,
    /// A fixed-width payload was shorter than the wire type requires.
    UnexpectedWidth { primitive: &'static str },
    /// A length-delimited string payload was not valid UTF-8.
    InvalidUtf8,
    /// A schema-level failure: `Schema::fail`, a transform conversion error,
    /// or an out-of-range calendar component.
    Message(String),
}

impl DecodeError {
    /// A decoded field number the schema does not declare.
    pub(crate) fn unknown_field_number(field_number: u32) -> Self {
        DecodeError::UnknownFieldNumber { field_number }
    }

    /// A product slot still empty once its buffer is exhausted.
    pub(crate) fn missing_field_number(field_number: u32) -> Self {
        DecodeError::MissingFieldNumber { field_number }
    }

    /// A fixed-width payload (`Float`/`Double`) that ran short.
    pub(crate) fn unexpected_width(primitive: &'static str) -> Self {
        DecodeError::UnexpectedWidth { primitive }
    }

    /// A free-form schema-level failure.
    pub(crate) fn message(message: impl Into<String>) -> Self {
        DecodeError::Message(message.into())
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::EmptyInput => write!(f, "No bytes to decode"),
            DecodeError::InvalidFieldNumber => {
                write!(f, "Failed decoding key: invalid field number")
            }
            DecodeError::UnknownWireType => {
                write!(f, "Failed decoding key: unknown wire type")
            }
            DecodeError::UnsupportedGroupType => {
                write!(f, "group wire types are not supported")
            }
            DecodeError::UnexpectedEndOfBytes => write!(f, "Unexpected end of bytes"),
            DecodeError::UnexpectedEndOfChunk => write!(f, "Unexpected end of chunk"),
            DecodeError::UnknownFieldNumber { field_number } => {
                write!(f, "Schema doesn't contain field number {field_number}.")
            }
            DecodeError::MissingFieldNumber { field_number } => {
                write!(f, "Missing field number {field_number}.")
            }
            DecodeError::MalformedTuple => write!(f, "Error while decoding tuple."),
            DecodeError::MalformedEither => write!(f, "Failed to decode either."),
            DecodeError::UnexpectedWidth { primitive } => {
                write!(f, "Unable to decode {primitive}")
            }
            DecodeError::InvalidUtf8 => write!(f, "invalid UTF-8 in string field"),
            DecodeError::Message(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for DecodeError {}
