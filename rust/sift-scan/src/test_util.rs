//! Shared helpers for the decoder tests: tiny encoders producing the on-disk
//! layouts the decoders consume.

use sift_io::MemoryByteSource;

use crate::{int_decoder::IntDecoder, varint};

pub(crate) fn encode_fixed(values: &[i64], width: usize, big_endian: bool) -> Vec<u8> {
    let mut out = Vec::new();
    for &value in values {
        let bytes = (value as u64).to_le_bytes();
        if big_endian {
            out.extend(bytes[..width].iter().rev());
        } else {
            out.extend_from_slice(&bytes[..width]);
        }
    }
    out
}

pub(crate) fn encode_varints(values: &[i64], signed: bool) -> Vec<u8> {
    let mut out = Vec::new();
    for &value in values {
        if signed {
            varint::write_i64(&mut out, value);
        } else {
            varint::write_u64(&mut out, value as u64);
        }
    }
    out
}

pub(crate) fn fixed_decoder(
    bytes: Vec<u8>,
    signed: bool,
    width: u32,
    big_endian: bool,
    chunk: usize,
) -> IntDecoder {
    let source = MemoryByteSource::with_chunk_size(bytes, chunk);
    IntDecoder::new(Box::new(source), signed, width, false, big_endian).unwrap()
}

pub(crate) fn varint_decoder(bytes: Vec<u8>, signed: bool, chunk: usize) -> IntDecoder {
    let source = MemoryByteSource::with_chunk_size(bytes, chunk);
    IntDecoder::new(Box::new(source), signed, 8, true, false).unwrap()
}
