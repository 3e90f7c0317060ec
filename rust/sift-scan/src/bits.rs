//! Bit-level helpers for row null masks.
//!
//! A null mask is a bit-per-row byte array, LSB-first within each byte, where
//! a set bit means the row is non-null.

use std::ops::Range;

/// Returns `true` if the bit at `index` is set (row is non-null).
#[inline]
pub fn is_set(bits: &[u8], index: u32) -> bool {
    bits[(index >> 3) as usize] & (1 << (index & 7)) != 0
}

/// Returns `true` if the bit at `index` is clear (row is null).
#[inline]
pub fn is_null(bits: &[u8], index: u32) -> bool {
    !is_set(bits, index)
}

#[inline]
pub fn set_bit(bits: &mut [u8], index: u32) {
    bits[(index >> 3) as usize] |= 1 << (index & 7);
}

#[inline]
pub fn clear_bit(bits: &mut [u8], index: u32) {
    bits[(index >> 3) as usize] &= !(1 << (index & 7));
}

/// Counts the set bits (non-null rows) in the logical row range.
pub fn count_set(bits: &[u8], range: Range<u32>) -> u64 {
    debug_assert!(range.end as usize <= bits.len() * 8);
    let mut count = 0u64;
    let mut pos = range.start;
    while pos < range.end && pos & 7 != 0 {
        count += is_set(bits, pos) as u64;
        pos += 1;
    }
    while pos + 8 <= range.end {
        count += bits[(pos >> 3) as usize].count_ones() as u64;
        pos += 8;
    }
    while pos < range.end {
        count += is_set(bits, pos) as u64;
        pos += 1;
    }
    count
}

/// Copies the first `count` bits of `src` into `dst`, leaving the remaining
/// bits of `dst` untouched.
pub fn copy_prefix(src: &[u8], dst: &mut [u8], count: usize) {
    let full_bytes = count / 8;
    dst[..full_bytes].copy_from_slice(&src[..full_bytes]);
    for index in (full_bytes * 8) as u32..count as u32 {
        if is_set(src, index) {
            set_bit(dst, index);
        } else {
            clear_bit(dst, index);
        }
    }
}

/// Builds a mask from per-row flags, `true` meaning non-null.
pub fn from_flags(flags: &[bool]) -> Vec<u8> {
    let mut bits = vec![0u8; flags.len().div_ceil(8)];
    for (index, &flag) in flags.iter().enumerate() {
        if flag {
            set_bit(&mut bits, index as u32);
        }
    }
    bits
}
