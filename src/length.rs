//! Length prefix codec
//!
//! Values below 128 occupy a single byte. Larger values are written as `0x80 | n`
//! followed by `n` big-endian magnitude bytes without leading zeros.
//! Only this minimal form is accepted when decoding.

use alloc::{vec, vec::Vec};

use crate::decode::{decode_length, finish};
use crate::util::strip_leading_zeros;
use crate::{DecodeError, Decoded};

pub use crate::decode::MAX_LENGTH_MAGNITUDE_BYTES;

/// Writes the canonical length prefix for `length`
/// ### Usage
/// ```
/// # use its_security::length::serialize_length;
/// assert_eq!(serialize_length(3), [0x03]);
/// assert_eq!(serialize_length(4096), [0x82, 0x10, 0x00]);
///
/// // the widest prefix carries every 32 bit length
/// # use its_security::length::MAX_LENGTH_MAGNITUDE_BYTES;
/// assert_eq!(serialize_length(0xffff_ffff).len(), 1 + MAX_LENGTH_MAGNITUDE_BYTES);
/// ```
#[must_use]
pub fn serialize_length(length: usize) -> Vec<u8> {
    if length < 128 {
        #[allow(clippy::cast_possible_truncation)]
        return vec![length as u8];
    }
    let raw = length.to_be_bytes();
    let magnitude = strip_leading_zeros(&raw);
    let mut prefix = Vec::with_capacity(1 + magnitude.len());
    #[allow(clippy::cast_possible_truncation)]
    prefix.push(0x80 | magnitude.len() as u8);
    prefix.extend_from_slice(magnitude);
    prefix
}

/// Reads a canonical length prefix from the start of `input`
///
/// Truncated input, non-minimal encodings and values wider than 32 bits are rejected.
pub fn deserialize_length(input: &[u8]) -> Result<Decoded<usize>, DecodeError<&[u8]>> {
    finish(input, decode_length(input))
}

/// Number of bytes [`serialize_length`] produces for `length`
#[must_use]
pub fn length_coding_size(length: usize) -> usize {
    if length < 128 {
        1
    } else {
        let significant_bits = (usize::BITS - length.leading_zeros()) as usize;
        1 + significant_bits.div_ceil(8)
    }
}

/// Encoded size of a length prefixed buffer of `data_length` bytes
#[must_use]
pub fn length_prefixed_size(data_length: usize) -> usize {
    length_coding_size(data_length) + data_length
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encodes_short_and_long_form() {
        assert_eq!(serialize_length(0), [0x00]);
        assert_eq!(serialize_length(127), [0x7f]);
        assert_eq!(serialize_length(128), [0x81, 0x80]);
        assert_eq!(serialize_length(256), [0x82, 0x01, 0x00]);
        assert_eq!(
            serialize_length(u32::MAX as usize),
            [0x84, 0xff, 0xff, 0xff, 0xff]
        );
    }

    #[test]
    fn leaves_trailing_bytes() {
        let decoded = deserialize_length(&[0x81, 0xc8, 0xaa, 0xbb]).unwrap();
        assert_eq!(decoded.decoded, 200);
        assert_eq!(decoded.bytes_consumed, 2);
    }

    #[test]
    fn rejects_non_canonical_prefixes() {
        for input in [
            &[0x81, 0x05][..],
            &[0x82, 0x00, 0x80],
            &[0x80],
            &[0x83, 0x00, 0x01, 0x00],
        ] {
            assert!(
                matches!(
                    deserialize_length(input),
                    Err(DecodeError::NonCanonicalLength(_))
                ),
                "{input:02x?}"
            );
        }
    }

    #[test]
    fn rejects_oversized_and_truncated_prefixes() {
        assert!(matches!(
            deserialize_length(&[0x85, 0x01, 0x00, 0x00, 0x00, 0x00]),
            Err(DecodeError::IntegerError(_))
        ));
        assert!(matches!(
            deserialize_length(&[0x82, 0x01]),
            Err(DecodeError::ParserError(_))
        ));
        assert!(matches!(
            deserialize_length(&[]),
            Err(DecodeError::ParserError(_))
        ));
    }

    proptest! {
        #[test]
        fn round_trips_every_u32(value: u32) {
            let value = value as usize;
            let encoded = serialize_length(value);
            prop_assert_eq!(encoded.len(), length_coding_size(value));
            let decoded = deserialize_length(&encoded).unwrap();
            prop_assert_eq!(decoded.decoded, value);
            prop_assert_eq!(decoded.bytes_consumed, encoded.len());
        }

        #[test]
        fn rejects_padded_magnitude(value: u32) {
            let raw = value.to_be_bytes();
            let magnitude = strip_leading_zeros(&raw);
            let mut padded = vec![0x80 | (magnitude.len() as u8 + 1), 0x00];
            padded.extend_from_slice(magnitude);
            prop_assert!(deserialize_length(&padded).is_err());
        }
    }
}
