//! Null-aware decoding of direct (unencoded) integer streams.
//!
//! [`DirectDecoder`] drives a [`ScanVisitor`] over a value stream that
//! physically stores one value per non-null row. Decoding runs either as a
//! scalar loop, one row at a time, or as a batched fast path that compacts
//! the row selection against the null mask up front and then bulk-reads,
//! filters and scatters whole runs. Both paths leave the stream at the same
//! byte position for the same call, so they can be mixed freely across
//! calls.

use crate::{
    bits,
    int_decoder::IntDecoder,
    kernels,
    value::ScanValue,
    visitor::{ScanVisitor, ValueFilter, ValueHook},
};
use sift_common::Result;
use sift_io::{ByteSource, Checkpoint};

pub struct DirectDecoder {
    base: IntDecoder,
}

enum NullOutcome {
    /// Every selected row fell on a null.
    AllNull,
    Produced { count: usize, any_nulls: bool },
}

impl DirectDecoder {
    /// Creates a decoder over `source`. Parameters mirror
    /// [`IntDecoder::new`].
    pub fn new(
        source: Box<dyn ByteSource>,
        signed: bool,
        num_bytes: u32,
        use_varint: bool,
        big_endian: bool,
    ) -> Result<DirectDecoder> {
        Ok(DirectDecoder {
            base: IntDecoder::new(source, signed, num_bytes, use_varint, big_endian)?,
        })
    }

    /// Repositions the decoder at a row-group boundary recorded when the
    /// stream was written.
    pub fn seek_to_row_group(&mut self, checkpoint: Checkpoint) -> Result<()> {
        self.base.seek(checkpoint)
    }

    /// Logically advances past `num_values` non-null values. The byte
    /// stream is not touched until the next read.
    #[inline]
    pub fn skip(&mut self, num_values: u64) {
        self.base.skip(num_values);
    }

    /// Resolves any accumulated skip against the byte stream.
    pub fn skip_pending(&mut self) -> Result<()> {
        self.base.skip_pending()
    }

    /// The stream offset of the next byte the decoder would consume.
    /// Meaningful only once the pending skip is resolved.
    pub fn stream_position(&self) -> u64 {
        self.base.stream_position()
    }

    /// Decodes the next `data.len()` rows. With a null mask, only the slots
    /// whose bit is set consume a stream value; null slots are left
    /// untouched.
    pub fn next<T: ScanValue>(&mut self, data: &mut [T], nulls: Option<&[u8]>) -> Result<()> {
        match nulls {
            None => self.base.bulk_read(data),
            Some(nulls) => {
                self.base.skip_pending()?;
                for (index, slot) in data.iter_mut().enumerate() {
                    if bits::is_set(nulls, index as u32) {
                        *slot = self.base.read_value()?;
                    }
                }
                Ok(())
            }
        }
    }

    /// Decodes the visitor's row selection, applying its filter, extraction
    /// and hook capabilities. `nulls` is the null mask of the row range the
    /// selection addresses; without one every row holds a value.
    ///
    /// `try_fast_path` permits the batched fast path; it is attempted only
    /// for eligible capability combinations and falling back to the scalar
    /// loop is never an error.
    pub fn read_with_visitor<V: ScanVisitor>(
        &mut self,
        visitor: &mut V,
        nulls: Option<&[u8]>,
        try_fast_path: bool,
    ) -> Result<()> {
        self.base.skip_pending()?;
        if visitor.num_rows() == 0 {
            visitor.set_num_values(0);
            return Ok(());
        }
        if try_fast_path
            && kernels::use_fast_path(visitor, nulls.is_some(), self.base.use_varint())
        {
            log::trace!("direct decode fast path over {} rows", visitor.num_rows());
            return self.fast_path(visitor, nulls);
        }
        self.scalar_path(visitor, nulls)
    }

    /// One row at a time: classify against the null mask, decode, hand to
    /// the visitor, then skip the gap it requests.
    fn scalar_path<V: ScanVisitor>(
        &mut self,
        visitor: &mut V,
        nulls: Option<&[u8]>,
    ) -> Result<()> {
        let allow_nulls = visitor.allow_nulls();
        let mut current = visitor.start();
        self.skip_rows(0, current, nulls);
        loop {
            if let Some(null_bits) = nulls {
                if !allow_nulls {
                    let (value_skip, at_end) =
                        visitor.check_and_skip_nulls(null_bits, &mut current);
                    self.base.skip(value_skip);
                    if at_end {
                        return Ok(());
                    }
                } else if bits::is_null(null_bits, current) {
                    let (to_skip, at_end) = visitor.process_null();
                    if self.finish_row(to_skip, at_end, &mut current, nulls) {
                        return Ok(());
                    }
                    continue;
                }
            }
            let value = self.base.read_value::<V::Value>()?;
            let (to_skip, at_end) = visitor.process(value);
            if self.finish_row(to_skip, at_end, &mut current, nulls) {
                return Ok(());
            }
        }
    }

    /// Shared loop tail: step past the row just visited, then skip the gap
    /// to the next row of interest. Returns `true` at the end of the
    /// selection.
    fn finish_row(
        &mut self,
        to_skip: u32,
        at_end: bool,
        current: &mut u32,
        nulls: Option<&[u8]>,
    ) -> bool {
        if at_end {
            return true;
        }
        *current += 1;
        if to_skip > 0 {
            self.skip_rows(*current, *current + to_skip, nulls);
            *current += to_skip;
        }
        false
    }

    /// Skips the rows `from..to`, consuming one stream value per non-null
    /// row. The skip stays pending.
    fn skip_rows(&mut self, from: u32, to: u32, nulls: Option<&[u8]>) {
        let values = match nulls {
            Some(nulls) => bits::count_set(nulls, from..to),
            None => (to - from) as u64,
        };
        self.base.skip(values);
    }

    fn fast_path<V: ScanVisitor>(&mut self, visitor: &mut V, nulls: Option<&[u8]>) -> Result<()> {
        let has_filter = !<V::Filter as ValueFilter<V::Value>>::ALWAYS_TRUE;
        let has_hook = !<V::Hook as ValueHook<V::Value>>::NOOP;
        let num_rows = visitor.num_rows();
        let allow_nulls = visitor.allow_nulls();
        let bias = visitor.num_values_bias();
        let Some(nulls) = nulls else {
            let count = {
                let parts = visitor.batch(num_rows);
                let dense_run = V::DENSE || parts.rows[num_rows - 1] as usize == num_rows - 1;
                if dense_run {
                    self.base.bulk_read(&mut parts.values[..num_rows])?;
                } else {
                    self.base.bulk_read_rows(parts.rows, &mut parts.values[..num_rows])?;
                }
                if has_hook {
                    let hook_rows = if bias != 0 {
                        parts.inner_rows.clear();
                        parts
                            .inner_rows
                            .extend(parts.rows.iter().map(|&row| row + bias));
                        Some(&parts.inner_rows[..])
                    } else {
                        None
                    };
                    kernels::process_run(
                        &mut parts.values[..num_rows],
                        num_rows,
                        parts.rows,
                        hook_rows,
                        &mut parts.output_rows[..],
                        parts.filter,
                        parts.hook,
                        V::FILTER_ONLY,
                    )
                } else if has_filter {
                    kernels::process_run(
                        &mut parts.values[..num_rows],
                        num_rows,
                        parts.rows,
                        None,
                        &mut parts.output_rows[..],
                        parts.filter,
                        parts.hook,
                        V::FILTER_ONLY,
                    )
                } else {
                    num_rows
                }
            };
            visitor.set_num_values(count);
            return Ok(());
        };
        let outcome = {
            let parts = visitor.batch(num_rows);
            let materialize = !has_hook && !V::FILTER_ONLY;
            // Compact the selection against the null mask. `outer_rows` gets
            // the surviving logical rows, `inner_rows` their positions in
            // the value stream.
            let compaction = if V::DENSE {
                kernels::non_null_rows_from_dense(nulls, num_rows, parts.outer_rows);
                if allow_nulls && materialize {
                    bits::copy_prefix(nulls, parts.result_nulls, num_rows);
                }
                kernels::SparseCompaction {
                    any_nulls: parts.outer_rows.len() < num_rows,
                    tail_skip: 0,
                }
            } else {
                let scatter = allow_nulls && materialize;
                kernels::non_null_rows_from_sparse(
                    nulls,
                    parts.rows,
                    parts.inner_rows,
                    parts.outer_rows,
                    scatter.then_some(&mut *parts.output_rows),
                    scatter.then_some(&mut parts.result_nulls[..]),
                )
            };
            let num_inner = parts.outer_rows.len();
            if num_inner == 0 {
                self.base.skip(compaction.tail_skip);
                NullOutcome::AllNull
            } else {
                if V::DENSE {
                    // dense selection: the surviving values are the stream
                    // prefix
                    self.base.bulk_read(&mut parts.values[..num_inner])?;
                } else {
                    self.base
                        .bulk_read_rows(parts.inner_rows, &mut parts.values[..num_inner])?;
                }
                self.base.skip(compaction.tail_skip);
                let count = if has_hook {
                    if bias != 0 {
                        for row in parts.outer_rows.iter_mut() {
                            *row += bias;
                        }
                    }
                    let num_hits = kernels::process_run(
                        &mut parts.values[..num_inner],
                        num_inner,
                        parts.outer_rows,
                        None,
                        &mut parts.output_rows[..],
                        parts.filter,
                        parts.hook,
                        V::FILTER_ONLY,
                    );
                    if allow_nulls { num_rows } else { num_hits }
                } else if has_filter {
                    kernels::process_run(
                        &mut parts.values[..num_inner],
                        num_inner,
                        parts.outer_rows,
                        None,
                        &mut parts.output_rows[..],
                        parts.filter,
                        parts.hook,
                        V::FILTER_ONLY,
                    )
                } else if allow_nulls {
                    // spread the compact run out to selection-aligned slots;
                    // null slots keep whatever they held, their bit is clear
                    if V::DENSE {
                        kernels::scatter_run(&mut parts.values[..], parts.outer_rows);
                    } else {
                        kernels::scatter_run(&mut parts.values[..], &parts.output_rows[..num_inner]);
                    }
                    num_rows
                } else {
                    num_inner
                };
                NullOutcome::Produced {
                    count,
                    any_nulls: compaction.any_nulls,
                }
            }
        };
        match outcome {
            NullOutcome::AllNull => {
                visitor.set_has_nulls();
                visitor.set_all_null(if allow_nulls { num_rows } else { 0 });
            }
            NullOutcome::Produced { count, any_nulls } => {
                if any_nulls {
                    visitor.set_has_nulls();
                }
                visitor.set_num_values(count);
            }
        }
        Ok(())
    }
}
