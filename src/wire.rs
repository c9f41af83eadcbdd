//! Wire format for Google's Protocol Buffers, aka [protobuf](https://protobuf.dev).
//!
//! A protobuf message is a series of key/payload records. The key is a
//! varint packing a field number and a [`WireType`]; for length-delimited
//! payloads the key is followed immediately by a varint payload length,
//! which we fold into the decoded [`WireType`] itself.

use crate::error::DecodeError;
use crate::leb128::{decode_varint, encode_varint};

/// Minimum value of a protobuf field number.
pub const MINIMUM_FIELD_NUMBER: u32 = 1;

/// Denotes the shape of a field payload in an encoded protobuf message.
///
/// `LengthDelimited` carries the payload width read from (or written to)
/// the wire immediately after the key varint.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WireType {
    /// Variable length integer. Used for every varint-shaped scalar.
    VarInt,
    /// 64-bit little-endian payload. Used for `double`.
    Bit64,
    /// Length-prefixed payload. Used for strings, bytes, nested records,
    /// and packed sequences.
    LengthDelimited(usize),
    /// Group start (deprecated). Recognized, never emitted.
    StartGroup,
    /// Group end (deprecated). Recognized, never emitted.
    EndGroup,
    /// 32-bit little-endian payload. Used for `float`.
    Bit32,
}

impl WireType {
    /// Maximum raw value a wire-type code can be.
    const MAX_VAL: u64 = 5;

    /// Return the raw 3-bit code for this [`WireType`].
    #[inline]
    pub const fn code(self) -> u8 {
        match self {
            WireType::VarInt => 0,
            WireType::Bit64 => 1,
            WireType::LengthDelimited(_) => 2,
            WireType::StartGroup => 3,
            WireType::EndGroup => 4,
            WireType::Bit32 => 5,
        }
    }
}

/// Encodes a field key for the provided wire type and field number.
///
/// A `None` field number writes nothing at all: top-level values and the
/// elements of a packed sequence are emitted untagged (and, for
/// length-delimited shapes, unprefixed).
///
/// Hot path for encoding - called for every field in every record.
#[inline]
pub fn encode_key<B: bytes::BufMut>(
    wire_type: WireType,
    field_number: Option<u32>,
    buf: &mut B,
) {
    let Some(field_number) = field_number else {
        return;
    };
    let key = (u64::from(field_number) << 3) | u64::from(wire_type.code());
    encode_varint(key, buf);
    if let WireType::LengthDelimited(len) = wire_type {
        encode_varint(len as u64, buf);
    }
}

/// Decodes a field key from the front of `data`.
///
/// Returns the wire type, the field number, and the total number of bytes
/// consumed. For length-delimited keys the payload width varint is read
/// here and returned inside the wire type.
///
/// Rejects field number zero and wire-type codes above 5. Group keys decode
/// successfully at this layer; rejecting them is the schema dispatcher's
/// job, which knows no schema can consume them.
#[inline]
pub fn decode_key(data: &[u8]) -> Result<(WireType, u32, usize), DecodeError> {
    let (key, mut read) = decode_varint(data)?;

    let field_number = key >> 3;
    if field_number < u64::from(MINIMUM_FIELD_NUMBER) || field_number > u64::from(u32::MAX) {
        return Err(DecodeError::InvalidFieldNumber);
    }
    let field_number = field_number as u32;

    let wire_type = match key & 0b111 {
        0 => WireType::VarInt,
        1 => WireType::Bit64,
        2 => {
            let (len, len_read) = decode_varint(&data[read..])?;
            read += len_read;
            let len = usize::try_from(len).map_err(|_| DecodeError::UnexpectedEndOfBytes)?;
            WireType::LengthDelimited(len)
        }
        3 => WireType::StartGroup,
        4 => WireType::EndGroup,
        5 => WireType::Bit32,
        code => {
            debug_assert!(code > WireType::MAX_VAL);
            return Err(DecodeError::UnknownWireType);
        }
    };

    Ok((wire_type, field_number, read))
}
