//! LEB128 variable-length integer encoding/decoding.
//!
//! Protobuf spells these "varints": a 64-bit value is emitted 7 bits at a
//! time, low bits first, with the high bit of each byte set while more bits
//! remain. Signed integers pass through here as their two's-complement
//! 64-bit representation; there is no zig-zag step.

use crate::error::DecodeError;

/// Encodes `value` as a LEB128 varint, returning the number of bytes written.
#[inline]
pub fn encode_varint<B: bytes::BufMut>(value: u64, buf: &mut B) -> usize {
    let mut value = value;
    let mut written = 0;
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        written += 1;
        if value == 0 {
            buf.put_u8(byte);
            return written;
        }
        buf.put_u8(byte | 0x80);
    }
}

/// Keeps the truncation error off the hot decode path; varints on real
/// wires terminate.
#[cold]
#[inline(never)]
fn unterminated() -> DecodeError {
    DecodeError::UnexpectedEndOfChunk
}

/// Decodes a LEB128 varint from the front of `data`.
///
/// Returns the decoded value and the number of bytes consumed. The varint
/// ends at the first byte with its high bit clear; an empty buffer or a
/// buffer with no terminating byte fails.
#[inline]
pub fn decode_varint(data: &[u8]) -> Result<(u64, usize), DecodeError> {
    // Fast path: single-byte varints dominate real messages.
    match data.first() {
        Some(&byte) if byte < 0x80 => return Ok((u64::from(byte), 1)),
        Some(_) => {}
        None => return Err(unterminated()),
    }

    let terminator = data
        .iter()
        .position(|byte| byte & 0x80 == 0)
        .ok_or_else(unterminated)?;

    // Fold the continuation bytes back-to-front; bits beyond the 64th are
    // discarded, matching two's-complement truncation.
    let mut value = 0u64;
    for byte in data[..=terminator].iter().rev() {
        value = (value << 7) | u64::from(byte & 0x7f);
    }
    Ok((value, terminator + 1))
}

/// The number of bytes [`encode_varint`] writes for `value`.
///
/// LEB128 packs 7 bits per byte, so this is `ceil(significant_bits / 7)`
/// with a minimum of one byte for zero.
#[inline]
pub fn encoded_varint_len(value: u64) -> usize {
    if value == 0 {
        return 1;
    }
    let significant = 64 - value.leading_zeros() as usize;
    significant.div_ceil(7)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{decode_varint, encode_varint, encoded_varint_len};

    #[test]
    fn smoketest_varint_roundtrip() {
        #[track_caller]
        fn test_case(value: u64, len: usize) {
            let mut buf = Vec::new();
            let written = encode_varint(value, &mut buf);
            let (decoded, read) = decode_varint(&buf).unwrap();

            assert_eq!(decoded, value, "invalid value");
            assert_eq!(written, len, "invalid encode length");
            assert_eq!(read, len, "invalid decode length");
            assert_eq!(encoded_varint_len(value), len, "invalid predicted length");
        }

        test_case(0, 1);
        test_case(1, 1);
        test_case(127, 1);
        test_case(128, 2);
        test_case(150, 2);
        test_case(86942, 3);
        test_case(u64::from(u32::MAX), 5);
        test_case(u64::MAX, 10);
    }

    #[test]
    fn test_decode_failures() {
        // Empty buffer.
        assert!(decode_varint(&[]).is_err());
        // No terminating byte.
        assert!(decode_varint(&[0xff]).is_err());
        assert!(decode_varint(&[0x80, 0x80, 0x80]).is_err());
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let (value, read) = decode_varint(&[0x96, 0x01, 0xde, 0xad]).unwrap();
        assert_eq!(value, 150);
        assert_eq!(read, 2);
    }

    proptest! {
        #[test]
        fn proptest_varint_roundtrip(value: u64) {
            let mut buf = Vec::new();
            let written = encode_varint(value, &mut buf);
            let (decoded, read) = decode_varint(&buf).unwrap();

            prop_assert_eq!(decoded, value);
            prop_assert_eq!(read, written);
            prop_assert_eq!(encoded_varint_len(value), written);
        }

        #[test]
        fn proptest_varint_length_is_minimal(value: u64) {
            let mut buf = Vec::new();
            encode_varint(value, &mut buf);

            let bits = 64 - value.leading_zeros() as usize;
            let expected = bits.div_ceil(7).max(1);
            prop_assert_eq!(buf.len(), expected);
        }
    }
}
