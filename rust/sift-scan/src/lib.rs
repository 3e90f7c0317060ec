//! Decoding of direct (unencoded) integer column streams.
//!
//! A direct stream stores one fixed-width or varint-encoded value per
//! non-null row. [`DirectDecoder`] reads such streams against an optional
//! null mask, driven by a [`ScanVisitor`] that bundles the row selection
//! with filtering, materialization and aggregation capabilities. The stock
//! visitor is [`Scanner`].
//!
//! ```no_run
//! use sift_scan::{DirectDecoder, ScanBuffers, Scanner};
//! # fn scan(source: Box<dyn sift_io::ByteSource>) -> sift_common::Result<()> {
//! let mut decoder = DirectDecoder::new(source, true, 8, false, false)?;
//! let rows = [2u32, 5, 9];
//! let mut buffers = ScanBuffers::<i64>::new();
//! let mut scanner = Scanner::new(&rows, &mut buffers);
//! decoder.read_with_visitor(&mut scanner, None, true)?;
//! # Ok(())
//! # }
//! ```

pub mod bits;
pub mod direct_decoder;
pub mod int_decoder;
pub mod kernels;
pub mod value;
pub mod varint;
pub mod visitor;

#[cfg(test)]
pub(crate) mod test_util;

pub use direct_decoder::DirectDecoder;
pub use int_decoder::IntDecoder;
pub use value::{ScanValue, ValueKind};
pub use visitor::{
    AlwaysTrue, IntRangeFilter, NoHook, ScanBuffers, ScanVisitor, Scanner, SumHook, ValueFilter,
    ValueHook,
};
