use std::{
    fs::File,
    io::{Seek, SeekFrom},
    path::Path,
};

use sift_bytes::Bytes;
use sift_common::{Result, error::Error};

use crate::{ByteSource, Checkpoint, utils::read_fully};

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// A byte source over a file, reading fixed-size chunks sequentially.
pub struct FileByteSource {
    file: File,
    pos: u64,
    chunk_size: usize,
}

impl FileByteSource {
    pub fn new(file: File) -> FileByteSource {
        FileByteSource {
            file,
            pos: 0,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<FileByteSource> {
        let file = File::open(path.as_ref())
            .map_err(|e| Error::io(path.as_ref().display().to_string(), e))?;
        Ok(FileByteSource::new(file))
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> FileByteSource {
        assert_ne!(chunk_size, 0);
        self.chunk_size = chunk_size;
        self
    }
}

impl ByteSource for FileByteSource {
    fn next_chunk(&mut self, size_hint: usize) -> Result<Bytes> {
        let len = self.chunk_size.max(size_hint);
        let mut buf = vec![0u8; len];
        self.file
            .seek(SeekFrom::Start(self.pos))
            .map_err(|e| Error::io("file source seek", e))?;
        let read = read_fully(&mut self.file, &mut buf)
            .map_err(|e| Error::io("file source read", e))?;
        buf.truncate(read);
        self.pos += read as u64;
        Ok(buf.into())
    }

    fn seek(&mut self, checkpoint: Checkpoint) -> Result<()> {
        self.pos = checkpoint.offset();
        Ok(())
    }

    fn position(&self) -> u64 {
        self.pos
    }
}
