//! Typed-value abstraction for the decoders.
//!
//! A decoder instance is configured once for a stream; the concrete in-memory
//! type of the decoded values is a compile-time parameter. `ScanValue::KIND`
//! is an associated constant, so dispatching on it inside a monomorphized
//! decode loop folds to straight-line code rather than a per-element branch.

use bytemuck::Pod;
use num_traits::AsPrimitive;

/// Logical decode shape of a value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Plain integer of up to 64 bits, fixed or variable width on disk.
    Int,
    /// 32-bit float, reinterpreted from 4 raw bytes.
    Float32,
    /// 64-bit float, reinterpreted from 8 raw bytes.
    Float64,
    /// 128-bit wide value (huge integer or legacy timestamp).
    Wide,
}

/// A value type the decoders can produce.
pub trait ScanValue:
    Copy + Default + PartialEq + std::fmt::Debug + Pod + Send + 'static
{
    const KIND: ValueKind;
    const SIZE: usize = std::mem::size_of::<Self>();

    fn from_i64(value: i64) -> Self;
    fn from_u64(value: u64) -> Self;
    fn from_i128(value: i128) -> Self;
    fn from_f32(value: f32) -> Self;
    fn from_f64(value: f64) -> Self;

    /// Widens the value for generic comparison (filters, aggregation sinks).
    /// Floats truncate toward zero.
    fn as_i128(self) -> i128;
}

macro_rules! impl_int_scan_value {
    ($($t:ty),*) => {$(
        impl ScanValue for $t {
            const KIND: ValueKind = ValueKind::Int;

            #[inline]
            fn from_i64(value: i64) -> Self {
                value.as_()
            }

            #[inline]
            fn from_u64(value: u64) -> Self {
                value.as_()
            }

            #[inline]
            fn from_i128(value: i128) -> Self {
                value.as_()
            }

            #[inline]
            fn from_f32(value: f32) -> Self {
                value.as_()
            }

            #[inline]
            fn from_f64(value: f64) -> Self {
                value.as_()
            }

            #[inline]
            fn as_i128(self) -> i128 {
                self.as_()
            }
        }
    )*}
}

impl_int_scan_value!(i8, i16, i32, i64, u8, u16, u32, u64);

macro_rules! impl_float_scan_value {
    ($t:ty, $kind:expr) => {
        impl ScanValue for $t {
            const KIND: ValueKind = $kind;

            #[inline]
            fn from_i64(value: i64) -> Self {
                value.as_()
            }

            #[inline]
            fn from_u64(value: u64) -> Self {
                value.as_()
            }

            #[inline]
            fn from_i128(value: i128) -> Self {
                value.as_()
            }

            #[inline]
            fn from_f32(value: f32) -> Self {
                value.as_()
            }

            #[inline]
            fn from_f64(value: f64) -> Self {
                value.as_()
            }

            #[inline]
            fn as_i128(self) -> i128 {
                self.as_()
            }
        }
    };
}

impl_float_scan_value!(f32, ValueKind::Float32);
impl_float_scan_value!(f64, ValueKind::Float64);

impl ScanValue for i128 {
    const KIND: ValueKind = ValueKind::Wide;

    #[inline]
    fn from_i64(value: i64) -> Self {
        value as i128
    }

    #[inline]
    fn from_u64(value: u64) -> Self {
        value as i128
    }

    #[inline]
    fn from_i128(value: i128) -> Self {
        value
    }

    #[inline]
    fn from_f32(value: f32) -> Self {
        value.as_()
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value.as_()
    }

    #[inline]
    fn as_i128(self) -> i128 {
        self
    }
}

pub const NANOS_PER_DAY: i128 = 86_400_000_000_000;

/// Reconstructs a legacy 12-byte timestamp (day count plus nanosecond of day)
/// as nanoseconds since the epoch.
#[inline]
pub fn timestamp_nanos(days: i32, nanos: u64) -> i128 {
    days as i128 * NANOS_PER_DAY + nanos as i128
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_narrowing() {
        assert_eq!(<i8 as ScanValue>::from_i64(-2), -2i8);
        assert_eq!(<u16 as ScanValue>::from_u64(0xfffff), 0xffffu16);
        assert_eq!(<i64 as ScanValue>::from_i64(i64::MIN), i64::MIN);
        assert_eq!(<i128 as ScanValue>::from_i64(-1), -1i128);
    }

    #[test]
    fn test_timestamp_nanos() {
        assert_eq!(timestamp_nanos(0, 0), 0);
        assert_eq!(timestamp_nanos(1, 0), NANOS_PER_DAY);
        assert_eq!(timestamp_nanos(-1, 500), -NANOS_PER_DAY + 500);
    }
}
