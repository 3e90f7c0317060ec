//! Base integer-stream decoder: buffer cursors over a byte source, width and
//! signedness configuration, and lazy skip accumulation.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use sift_bytes::Bytes;
use sift_common::{Result, error::Error};
use sift_io::{ByteSource, Checkpoint};

use crate::{
    value::{ScanValue, ValueKind, timestamp_nanos},
    varint,
};

/// Decodes a stream of fixed-width or variable-length integers.
///
/// The decoder exclusively owns its byte source. Skips are lazy: `skip`
/// only accumulates a pending count, and the next read (or an explicit
/// [`IntDecoder::skip_pending`]) performs the byte-level skip, so consecutive
/// skips coalesce into one.
pub struct IntDecoder {
    source: Box<dyn ByteSource>,
    chunk: Bytes,
    chunk_pos: usize,
    num_bytes: u32,
    signed: bool,
    use_varint: bool,
    big_endian: bool,
    pending_skip: u64,
}

impl IntDecoder {
    /// Creates a decoder over `source`.
    ///
    /// `num_bytes` is the on-disk value width: 1, 2, 4 or 8 for plain
    /// integers and floats, 12 or 16 for wide values. For variable-length
    /// streams the width only bounds the decoded range.
    pub fn new(
        source: Box<dyn ByteSource>,
        signed: bool,
        num_bytes: u32,
        use_varint: bool,
        big_endian: bool,
    ) -> Result<IntDecoder> {
        sift_common::verify_arg!(num_bytes, matches!(num_bytes, 1 | 2 | 4 | 8 | 12 | 16));
        if use_varint {
            sift_common::verify_arg!(num_bytes, num_bytes <= 8);
        }
        Ok(IntDecoder {
            source,
            chunk: Bytes::new(),
            chunk_pos: 0,
            num_bytes,
            signed,
            use_varint,
            big_endian,
            pending_skip: 0,
        })
    }

    #[inline]
    pub fn num_bytes(&self) -> u32 {
        self.num_bytes
    }

    #[inline]
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    #[inline]
    pub fn use_varint(&self) -> bool {
        self.use_varint
    }

    /// The stream offset of the next byte this decoder would consume.
    /// Meaningful only once the pending skip is resolved.
    pub fn stream_position(&self) -> u64 {
        self.source.position() - self.remaining() as u64
    }

    /// Logically advances past `n` values. No bytes are touched until the
    /// next read or [`IntDecoder::skip_pending`].
    #[inline]
    pub fn skip(&mut self, n: u64) {
        self.pending_skip += n;
    }

    /// Resolves the accumulated pending skip against the byte stream.
    pub fn skip_pending(&mut self) -> Result<()> {
        let to_skip = std::mem::take(&mut self.pending_skip);
        if to_skip == 0 {
            return Ok(());
        }
        self.skip_values(to_skip)
    }

    /// Repositions the decoder at a row-group boundary. Any buffered bytes
    /// are discarded.
    pub fn seek(&mut self, checkpoint: Checkpoint) -> Result<()> {
        debug_assert_eq!(
            self.pending_skip, 0,
            "seek with an unresolved pending skip"
        );
        log::debug!("seeking integer stream to offset {}", checkpoint.offset());
        self.pending_skip = 0;
        self.chunk = Bytes::new();
        self.chunk_pos = 0;
        self.source.seek(checkpoint)
    }

    /// Decodes one value of the configured shape.
    pub fn read_value<T: ScanValue>(&mut self) -> Result<T> {
        self.skip_pending()?;
        match T::KIND {
            ValueKind::Float32 => Ok(T::from_f32(self.read_float()?)),
            ValueKind::Float64 => Ok(T::from_f64(self.read_double()?)),
            ValueKind::Wide => {
                if self.num_bytes == 12 {
                    Ok(T::from_i128(self.read_int96()?))
                } else {
                    Ok(T::from_i128(self.read_wide()?))
                }
            }
            ValueKind::Int => {
                if self.signed {
                    Ok(T::from_i64(self.read_long()?))
                } else {
                    Ok(T::from_u64(self.read_ulong()?))
                }
            }
        }
    }

    /// Decodes a contiguous run of values.
    pub fn bulk_read<T: ScanValue>(&mut self, out: &mut [T]) -> Result<()> {
        self.skip_pending()?;
        if !self.use_varint
            && !self.big_endian
            && T::KIND != ValueKind::Wide
            && self.num_bytes as usize == T::SIZE
        {
            return self.bulk_read_native(out);
        }
        for slot in out.iter_mut() {
            *slot = self.read_value()?;
        }
        Ok(())
    }

    /// Decodes the values at the given positions of a contiguous run,
    /// skipping over the positions in between.
    pub fn bulk_read_rows<T: ScanValue>(&mut self, positions: &[u32], out: &mut [T]) -> Result<()> {
        debug_assert_eq!(positions.len(), out.len());
        self.skip_pending()?;
        let mut next = 0u32;
        for (slot, &position) in out.iter_mut().zip(positions) {
            debug_assert!(position >= next);
            if position > next {
                self.skip_values((position - next) as u64)?;
            }
            *slot = self.read_value()?;
            next = position + 1;
        }
        Ok(())
    }

    /// Contiguous little-endian values of native width: chunk-sized copies
    /// through an explicit byte-slice cast.
    fn bulk_read_native<T: ScanValue>(&mut self, out: &mut [T]) -> Result<()> {
        let width = T::SIZE;
        let mut filled = 0;
        while filled < out.len() {
            if self.remaining() == 0 {
                self.refill((out.len() - filled) * width)?;
            }
            let run = (self.remaining() / width).min(out.len() - filled);
            if run == 0 {
                // value straddles the chunk boundary
                out[filled] = self.read_value()?;
                filled += 1;
                continue;
            }
            let src = &self.chunk[self.chunk_pos..self.chunk_pos + run * width];
            bytemuck::cast_slice_mut::<T, u8>(&mut out[filled..filled + run])
                .copy_from_slice(src);
            self.chunk_pos += run * width;
            filled += run;
        }
        Ok(())
    }

    pub fn read_long(&mut self) -> Result<i64> {
        self.skip_pending()?;
        if self.use_varint {
            let raw = varint::read_u64(|| self.read_byte())?;
            Ok(varint::zigzag_decode(raw))
        } else {
            let raw = self.read_fixed_raw()?;
            let shift = 64 - 8 * self.num_bytes;
            Ok(((raw << shift) as i64) >> shift)
        }
    }

    pub fn read_ulong(&mut self) -> Result<u64> {
        self.skip_pending()?;
        if self.use_varint {
            varint::read_u64(|| self.read_byte())
        } else {
            self.read_fixed_raw()
        }
    }

    /// Reads 4 raw bytes and reinterprets them as a 32-bit float.
    pub fn read_float(&mut self) -> Result<f32> {
        self.skip_pending()?;
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(if self.big_endian {
            f32::from_be_bytes(buf)
        } else {
            f32::from_le_bytes(buf)
        })
    }

    /// Reads 8 raw bytes and reinterprets them as a 64-bit float.
    pub fn read_double(&mut self) -> Result<f64> {
        self.skip_pending()?;
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(if self.big_endian {
            f64::from_be_bytes(buf)
        } else {
            f64::from_le_bytes(buf)
        })
    }

    /// Reads a fixed wide integer of the configured width (12 or 16 bytes),
    /// sign-extended to 128 bits.
    pub fn read_wide(&mut self) -> Result<i128> {
        self.skip_pending()?;
        let width = self.num_bytes as usize;
        let mut buf = [0u8; 16];
        self.read_exact(&mut buf[..width])?;
        let mut acc = 0u128;
        if self.big_endian {
            for &byte in &buf[..width] {
                acc = (acc << 8) | byte as u128;
            }
        } else {
            for &byte in buf[..width].iter().rev() {
                acc = (acc << 8) | byte as u128;
            }
        }
        let shift = 128 - 8 * width as u32;
        Ok(((acc << shift) as i128) >> shift)
    }

    /// Reads a legacy 12-byte timestamp: 4 bytes of day count followed by
    /// 8 bytes of nanosecond-of-day. The layout is fixed by the on-disk
    /// format.
    pub fn read_int96(&mut self) -> Result<i128> {
        self.skip_pending()?;
        let mut buf = [0u8; 12];
        self.read_exact(&mut buf)?;
        let (days, nanos) = if self.big_endian {
            (
                BigEndian::read_i32(&buf[..4]),
                BigEndian::read_u64(&buf[4..12]),
            )
        } else {
            (
                LittleEndian::read_i32(&buf[..4]),
                LittleEndian::read_u64(&buf[4..12]),
            )
        };
        Ok(timestamp_nanos(days, nanos))
    }

    fn read_fixed_raw(&mut self) -> Result<u64> {
        let width = self.num_bytes as usize;
        sift_common::verify_arg!(num_bytes, width <= 8);
        if self.remaining() >= width {
            let bytes = &self.chunk[self.chunk_pos..self.chunk_pos + width];
            let raw = if self.big_endian {
                BigEndian::read_uint(bytes, width)
            } else {
                LittleEndian::read_uint(bytes, width)
            };
            self.chunk_pos += width;
            return Ok(raw);
        }
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf[..width])?;
        Ok(if self.big_endian {
            BigEndian::read_uint(&buf[..width], width)
        } else {
            LittleEndian::read_uint(&buf[..width], width)
        })
    }

    /// Skips `n` values, touching the stream immediately.
    pub(crate) fn skip_values(&mut self, n: u64) -> Result<()> {
        if self.use_varint {
            for _ in 0..n {
                loop {
                    if self.read_byte()? & 0x80 == 0 {
                        break;
                    }
                }
            }
            Ok(())
        } else {
            self.skip_bytes(n * self.num_bytes as u64)
        }
    }

    fn skip_bytes(&mut self, mut count: u64) -> Result<()> {
        loop {
            let available = self.remaining() as u64;
            if count <= available {
                self.chunk_pos += count as usize;
                return Ok(());
            }
            count -= available;
            self.chunk_pos = self.chunk.len();
            self.refill(count.min(1 << 20) as usize)?;
        }
    }

    #[inline]
    fn read_byte(&mut self) -> Result<u8> {
        if self.remaining() == 0 {
            self.refill(1)?;
        }
        let byte = self.chunk[self.chunk_pos];
        self.chunk_pos += 1;
        Ok(byte)
    }

    fn read_exact(&mut self, out: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < out.len() {
            if self.remaining() == 0 {
                self.refill(out.len() - filled)?;
            }
            let run = (out.len() - filled).min(self.remaining());
            out[filled..filled + run]
                .copy_from_slice(&self.chunk[self.chunk_pos..self.chunk_pos + run]);
            self.chunk_pos += run;
            filled += run;
        }
        Ok(())
    }

    #[inline]
    fn remaining(&self) -> usize {
        self.chunk.len() - self.chunk_pos
    }

    fn refill(&mut self, size_hint: usize) -> Result<()> {
        debug_assert_eq!(self.remaining(), 0);
        let chunk = self.source.next_chunk(size_hint)?;
        if chunk.is_empty() {
            return Err(Error::end_of_stream("integer stream exhausted"));
        }
        self.chunk = chunk;
        self.chunk_pos = 0;
        Ok(())
    }
}
