/// Number of bytes needed to hold `bits` bits
pub(crate) fn bitstring_buffer_size(bits: usize) -> usize {
    bits.div_ceil(8)
}

/// Number of zero bits that pad `bits` bits to the next byte boundary
pub(crate) fn bitstring_padding_bits(bits: usize) -> usize {
    (8 - bits % 8) % 8
}

/// Minimal big-endian representation of an unsigned integer, at least one byte
pub(crate) fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let mut stripped = bytes;
    while stripped.len() > 1 && stripped[0] == 0 {
        stripped = &stripped[1..];
    }
    stripped
}

/// Minimal big-endian two's complement representation of a signed integer
pub(crate) fn strip_sign_extension(bytes: &[u8]) -> &[u8] {
    let mut stripped = bytes;
    while stripped.len() > 1
        && ((stripped[0] == 0x00 && stripped[1] & 0x80 == 0)
            || (stripped[0] == 0xff && stripped[1] & 0x80 != 0))
    {
        stripped = &stripped[1..];
    }
    stripped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_to_byte_boundary() {
        assert_eq!(bitstring_buffer_size(0), 0);
        assert_eq!(bitstring_buffer_size(1), 1);
        assert_eq!(bitstring_buffer_size(8), 1);
        assert_eq!(bitstring_buffer_size(9), 2);
        assert_eq!(bitstring_padding_bits(8), 0);
        assert_eq!(bitstring_padding_bits(3), 5);
    }

    #[test]
    fn strips_redundant_bytes() {
        assert_eq!(strip_leading_zeros(&[0, 0, 1, 0]), &[1, 0]);
        assert_eq!(strip_leading_zeros(&[0, 0]), &[0]);
        assert_eq!(strip_sign_extension(&128i64.to_be_bytes()), &[0x00, 0x80]);
        assert_eq!(strip_sign_extension(&(-1i64).to_be_bytes()), &[0xff]);
        assert_eq!(strip_sign_extension(&(-129i64).to_be_bytes()), &[0xff, 0x7f]);
        assert_eq!(strip_sign_extension(&5i64.to_be_bytes()), &[0x05]);
    }
}
