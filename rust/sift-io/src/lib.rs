//! Byte-stream abstractions for the sift decoders:
//! - `ByteSource`: a seekable, chunk-at-a-time supplier of stream bytes.
//! - `Checkpoint`: an opaque row-group position token.
//!
//! Provides two implementations: memory-based and file-based.

use sift_bytes::Bytes;
use sift_common::Result;

pub mod file;
pub mod memory;
pub mod utils;

pub use file::FileByteSource;
pub use memory::MemoryByteSource;

/// An opaque position token identifying a row-group boundary within an
/// encoded stream.
///
/// Checkpoints are recorded by the layer that writes stripe metadata; the
/// decoders only carry them back to [`ByteSource::seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    offset: u64,
}

impl Checkpoint {
    pub fn new(offset: u64) -> Checkpoint {
        Checkpoint { offset }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }
}

/// A seekable, buffered supplier of stream bytes, consumed by exactly one
/// decoder.
///
/// The source owns its buffering strategy; chunk boundaries are arbitrary and
/// carry no meaning, so a single encoded value may straddle two chunks.
pub trait ByteSource: Send {
    /// Returns the next chunk of the stream.
    ///
    /// `size_hint` is the number of bytes the caller needs to make progress;
    /// the source may return more or fewer. An empty chunk signals end of
    /// stream.
    fn next_chunk(&mut self, size_hint: usize) -> Result<Bytes>;

    /// Repositions the stream so that the next chunk starts at the
    /// checkpoint.
    fn seek(&mut self, checkpoint: Checkpoint) -> Result<()>;

    /// The logical offset of the first byte of the next chunk to be
    /// delivered.
    fn position(&self) -> u64;
}

impl ByteSource for Box<dyn ByteSource> {
    fn next_chunk(&mut self, size_hint: usize) -> Result<Bytes> {
        self.as_mut().next_chunk(size_hint)
    }

    fn seek(&mut self, checkpoint: Checkpoint) -> Result<()> {
        self.as_mut().seek(checkpoint)
    }

    fn position(&self) -> u64 {
        self.as_ref().position()
    }
}
