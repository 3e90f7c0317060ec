//! Variable-length integer codec.
//!
//! Base-128 varint: little-endian groups of 7 bits, bit 7 of each byte set
//! when more groups follow. Signed streams store the zig-zag transform of the
//! value so that small magnitudes of either sign stay short.

use sift_common::Result;

/// Longest legal encoding of a 64-bit value.
pub const MAX_VARINT_BYTES: usize = 10;

/// Decodes one varint, pulling bytes from `next_byte`.
pub fn read_u64(mut next_byte: impl FnMut() -> Result<u8>) -> Result<u64> {
    let mut result = 0u64;
    let mut shift = 0u32;
    loop {
        let byte = next_byte()?;
        result |= ((byte & 0x7f) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
        // continuation bit set past the longest legal encoding
        sift_common::verify_data!(varint, shift < 64);
    }
}

#[inline]
pub fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

#[inline]
pub fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Appends the varint encoding of `value` to `out`.
pub fn write_u64(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Appends the zig-zag varint encoding of `value` to `out`.
pub fn write_i64(out: &mut Vec<u8>, value: i64) {
    write_u64(out, zigzag_encode(value));
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_common::error::{Error, ErrorKind};

    fn decode_slice(bytes: &[u8]) -> Result<u64> {
        let mut iter = bytes.iter();
        read_u64(|| {
            iter.next()
                .copied()
                .ok_or_else(|| Error::end_of_stream("varint test input"))
        })
    }

    #[test]
    fn test_known_encodings() {
        assert_eq!(decode_slice(&[0x00]).unwrap(), 0);
        assert_eq!(decode_slice(&[0x7f]).unwrap(), 127);
        assert_eq!(decode_slice(&[0x80, 0x01]).unwrap(), 128);
        assert_eq!(decode_slice(&[0xac, 0x02]).unwrap(), 300);
    }

    #[test]
    fn test_round_trip() {
        fastrand::seed(17);
        let mut values: Vec<u64> = (0..1000).map(|_| fastrand::u64(..)).collect();
        values.extend([0, 1, 127, 128, u64::MAX]);
        for value in values {
            let mut out = Vec::new();
            write_u64(&mut out, value);
            assert!(out.len() <= MAX_VARINT_BYTES);
            assert_eq!(decode_slice(&out).unwrap(), value);
        }
    }

    #[test]
    fn test_zigzag() {
        assert_eq!(zigzag_encode(0), 0);
        assert_eq!(zigzag_encode(-1), 1);
        assert_eq!(zigzag_encode(1), 2);
        assert_eq!(zigzag_encode(-2), 3);
        for value in [0i64, -1, 1, i64::MIN, i64::MAX, 123456, -987654] {
            assert_eq!(zigzag_decode(zigzag_encode(value)), value);
        }
    }

    #[test]
    fn test_overlong_encoding_rejected() {
        let bytes = [0x80u8; 11];
        let err = decode_slice(&bytes).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidFormat { .. }));
        // ten groups with the last continuation clear is the legal maximum
        let mut bytes = [0x80u8; 10];
        bytes[9] = 0x01;
        assert!(decode_slice(&bytes).is_ok());
    }
}
