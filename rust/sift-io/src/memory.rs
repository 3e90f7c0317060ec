use sift_bytes::Bytes;
use sift_common::Result;

use crate::{ByteSource, Checkpoint};

/// A byte source over an in-memory buffer.
///
/// Chunks are zero-copy slices of the backing [`Bytes`]. The chunk size can
/// be capped to force encoded values to straddle chunk boundaries, which is
/// how the decoder tests exercise their refill paths.
pub struct MemoryByteSource {
    data: Bytes,
    pos: u64,
    max_chunk: usize,
}

impl MemoryByteSource {
    pub fn new(data: impl Into<Bytes>) -> MemoryByteSource {
        MemoryByteSource {
            data: data.into(),
            pos: 0,
            max_chunk: usize::MAX,
        }
    }

    /// Caps the size of the chunks delivered by `next_chunk`.
    pub fn with_chunk_size(data: impl Into<Bytes>, max_chunk: usize) -> MemoryByteSource {
        assert_ne!(max_chunk, 0);
        MemoryByteSource {
            data: data.into(),
            pos: 0,
            max_chunk,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl ByteSource for MemoryByteSource {
    fn next_chunk(&mut self, _size_hint: usize) -> Result<Bytes> {
        let start = (self.pos as usize).min(self.data.len());
        let len = (self.data.len() - start).min(self.max_chunk);
        let chunk = self.data.slice(start..start + len);
        self.pos += len as u64;
        Ok(chunk)
    }

    fn seek(&mut self, checkpoint: Checkpoint) -> Result<()> {
        sift_common::verify_arg!(
            checkpoint,
            checkpoint.offset() <= self.data.len() as u64
        );
        self.pos = checkpoint.offset();
        Ok(())
    }

    fn position(&self) -> u64 {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryByteSource;
    use crate::{ByteSource, Checkpoint};

    #[test]
    fn test_chunked_delivery() {
        let data: Vec<u8> = (0u8..20).collect();
        let mut source = MemoryByteSource::with_chunk_size(data.clone(), 3);
        let mut collected = Vec::new();
        loop {
            let chunk = source.next_chunk(1).unwrap();
            if chunk.is_empty() {
                break;
            }
            assert!(chunk.len() <= 3);
            collected.extend_from_slice(&chunk);
        }
        assert_eq!(collected, data);
        assert_eq!(source.position(), 20);
    }

    #[test]
    fn test_seek() {
        let data: Vec<u8> = (0u8..10).collect();
        let mut source = MemoryByteSource::new(data);
        source.seek(Checkpoint::new(7)).unwrap();
        let chunk = source.next_chunk(1).unwrap();
        assert_eq!(chunk.as_slice(), &[7, 8, 9]);

        assert!(source.seek(Checkpoint::new(11)).is_err());
    }

    #[test]
    fn test_end_of_stream() {
        let mut source = MemoryByteSource::new(vec![1u8]);
        assert_eq!(source.next_chunk(1).unwrap().len(), 1);
        assert!(source.next_chunk(1).unwrap().is_empty());
        assert!(source.next_chunk(100).unwrap().is_empty());
    }
}
