//! Visitor protocol for the decode loop.
//!
//! A visitor bundles the capabilities of one decode call: the set of logical
//! rows to visit, the null-handling mode, a filter predicate, an extraction
//! policy and an optional aggregation hook. The decoder drives the visitor;
//! the visitor decides how far to jump after each observed row, which is how
//! filter-driven and null-driven advancement are expressed uniformly.
//!
//! Capabilities are compile-time parameters (associated types and consts),
//! so the per-element hot paths monomorphize without dynamic dispatch.

use crate::{bits, value::ScanValue};

/// A predicate over decoded values.
pub trait ValueFilter<T>: Send {
    /// `true` for the no-op filter; lets kernels drop the test entirely.
    const ALWAYS_TRUE: bool = false;

    fn test(&self, value: T) -> bool;

    /// Whether a null value passes the filter.
    fn test_null(&self) -> bool {
        false
    }
}

/// The no-op filter: every value and every null passes.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysTrue;

impl<T> ValueFilter<T> for AlwaysTrue {
    const ALWAYS_TRUE: bool = true;

    #[inline]
    fn test(&self, _value: T) -> bool {
        true
    }

    fn test_null(&self) -> bool {
        true
    }
}

/// Keeps values inside an inclusive integer band.
#[derive(Debug, Clone)]
pub struct IntRangeFilter {
    min: i128,
    max: i128,
    null_allowed: bool,
}

impl IntRangeFilter {
    pub fn new(min: i128, max: i128) -> IntRangeFilter {
        IntRangeFilter {
            min,
            max,
            null_allowed: false,
        }
    }

    pub fn with_nulls_allowed(mut self, null_allowed: bool) -> IntRangeFilter {
        self.null_allowed = null_allowed;
        self
    }
}

impl<T: ScanValue> ValueFilter<T> for IntRangeFilter {
    #[inline]
    fn test(&self, value: T) -> bool {
        let value = value.as_i128();
        value >= self.min && value <= self.max
    }

    fn test_null(&self) -> bool {
        self.null_allowed
    }
}

/// An aggregation sink consuming decoded values instead of (or alongside)
/// materializing them.
pub trait ValueHook<T>: Send {
    /// `true` for the no-op hook.
    const NOOP: bool = false;

    /// Consumes a value destined for the given output index.
    fn add(&mut self, index: u32, value: T);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoHook;

impl<T> ValueHook<T> for NoHook {
    const NOOP: bool = true;

    #[inline]
    fn add(&mut self, _index: u32, _value: T) {}
}

/// A sum aggregation sink that also records every (index, value) pair it
/// consumed, in order.
#[derive(Debug, Default)]
pub struct SumHook {
    pub total: i128,
    pub entries: Vec<(u32, i128)>,
}

impl<T: ScanValue> ValueHook<T> for SumHook {
    fn add(&mut self, index: u32, value: T) {
        let value = value.as_i128();
        self.total += value;
        self.entries.push((index, value));
    }
}

/// Reusable working buffers for a visitor, owned by the caller and sized per
/// call. Reusing them across calls avoids reallocation in tight scan loops.
#[derive(Debug, Default)]
pub struct ScanBuffers<T> {
    /// Decoded (and, with a filter, compacted) values.
    pub values: Vec<T>,
    /// Logical rows of the values that passed the filter.
    pub output_rows: Vec<u32>,
    /// Rows in the null-inclusive row space that survive null compaction.
    pub outer_rows: Vec<u32>,
    /// Positions of those rows within the compacted value run.
    pub inner_rows: Vec<u32>,
    /// Null bits of the produced output slots, set = non-null.
    pub result_nulls: Vec<u8>,
}

impl<T: ScanValue> ScanBuffers<T> {
    pub fn new() -> ScanBuffers<T> {
        ScanBuffers {
            values: Vec::new(),
            output_rows: Vec::new(),
            outer_rows: Vec::new(),
            inner_rows: Vec::new(),
            result_nulls: Vec::new(),
        }
    }
}

/// The disjoint pieces of a visitor used by the batched fast path.
pub struct BatchParts<'a, T, F, H> {
    pub rows: &'a [u32],
    pub values: &'a mut Vec<T>,
    pub output_rows: &'a mut Vec<u32>,
    pub outer_rows: &'a mut Vec<u32>,
    pub inner_rows: &'a mut Vec<u32>,
    pub result_nulls: &'a mut [u8],
    pub filter: &'a F,
    pub hook: &'a mut H,
}

/// The capability bundle driving one decode call.
///
/// Implementations must preserve the ordering and counting behavior of the
/// stock [`Scanner`]: rows are visited in ascending order, skip counts are
/// measured in logical rows, and the final value count reflects exactly the
/// values (and surfaced nulls) emitted.
pub trait ScanVisitor {
    type Value: ScanValue;
    type Filter: ValueFilter<Self::Value>;
    type Hook: ValueHook<Self::Value>;

    /// The row selection is the contiguous range starting at zero.
    const DENSE: bool;
    /// Drop-values mode: only filter evaluation matters, no value storage.
    const FILTER_ONLY: bool;

    /// The ordered logical rows this call visits.
    fn rows(&self) -> &[u32];

    fn num_rows(&self) -> usize {
        self.rows().len()
    }

    /// First row of interest.
    fn start(&self) -> u32 {
        self.rows()[0]
    }

    /// Whether null rows are surfaced to the output (`true`) or hidden
    /// (`false`).
    fn allow_nulls(&self) -> bool;

    /// Hidden-null classification. Advances past requested rows that fall on
    /// nulls, moves `current` to the next row to decode (or one past the
    /// last requested row on exhaustion) and returns the number of non-null
    /// values to skip in the crossed range, plus the exhaustion flag.
    fn check_and_skip_nulls(&mut self, nulls: &[u8], current: &mut u32) -> (u64, bool);

    /// A surfaced null at the current row. Returns the count of additional
    /// rows to skip and the exhaustion flag.
    fn process_null(&mut self) -> (u32, bool);

    /// A decoded value at the current row. Returns the count of additional
    /// rows to skip and the exhaustion flag.
    fn process(&mut self, value: Self::Value) -> (u32, bool);

    /// Starting offset of hook accumulation, for outputs already holding
    /// values from earlier batches.
    fn num_values_bias(&self) -> u32;

    fn set_has_nulls(&mut self);

    /// Every visited row was null; `count` output slots are produced.
    fn set_all_null(&mut self, count: usize);

    /// Final count of emitted output slots.
    fn set_num_values(&mut self, count: usize);

    /// Splits the visitor into the buffers and capabilities of the batched
    /// fast path.
    fn batch(&mut self, num_rows: usize) -> BatchParts<'_, Self::Value, Self::Filter, Self::Hook>;
}

/// The stock visitor: scans `rows` over one column stream, filtering,
/// materializing and/or aggregating into caller-owned [`ScanBuffers`].
pub struct Scanner<'a, T: ScanValue, F, H, const DENSE: bool, const FILTER_ONLY: bool> {
    rows: &'a [u32],
    row_index: usize,
    allow_nulls: bool,
    values_bias: u32,
    num_values: usize,
    has_nulls: bool,
    filter: F,
    hook: H,
    buffers: &'a mut ScanBuffers<T>,
}

impl<'a, T: ScanValue> Scanner<'a, T, AlwaysTrue, NoHook, false, false> {
    /// A plain materializing scan: no filter, no hook, sparse-capable.
    pub fn new(rows: &'a [u32], buffers: &'a mut ScanBuffers<T>) -> Self {
        Scanner::with_capabilities(rows, AlwaysTrue, NoHook, buffers)
    }
}

impl<'a, T, F, H, const DENSE: bool, const FILTER_ONLY: bool>
    Scanner<'a, T, F, H, DENSE, FILTER_ONLY>
where
    T: ScanValue,
    F: ValueFilter<T>,
    H: ValueHook<T>,
{
    pub fn with_capabilities(
        rows: &'a [u32],
        filter: F,
        hook: H,
        buffers: &'a mut ScanBuffers<T>,
    ) -> Self {
        debug_assert!(rows.windows(2).all(|pair| pair[0] < pair[1]));
        debug_assert!(!DENSE || rows.last().is_none_or(|&last| last as usize == rows.len() - 1));
        let num_rows = rows.len();
        buffers.values.clear();
        buffers.values.resize(num_rows, T::default());
        buffers.output_rows.clear();
        buffers.output_rows.resize(num_rows, 0);
        buffers.outer_rows.clear();
        buffers.inner_rows.clear();
        buffers.result_nulls.clear();
        buffers.result_nulls.resize(num_rows.div_ceil(8), 0xff);
        Scanner {
            rows,
            row_index: 0,
            allow_nulls: false,
            values_bias: 0,
            num_values: 0,
            has_nulls: false,
            filter,
            hook,
            buffers,
        }
    }

    /// Surfaces nulls to the output instead of hiding them.
    pub fn surface_nulls(mut self, allow: bool) -> Self {
        self.allow_nulls = allow;
        self
    }

    pub fn with_values_bias(mut self, bias: u32) -> Self {
        self.values_bias = bias;
        self
    }

    /// Count of output slots emitted by the last decode call.
    pub fn num_values(&self) -> usize {
        self.num_values
    }

    pub fn has_nulls(&self) -> bool {
        self.has_nulls
    }

    pub fn hook(&self) -> &H {
        &self.hook
    }

    fn emit(&mut self, row: u32, value: T) {
        if !H::NOOP {
            self.hook.add(row + self.values_bias, value);
        } else {
            if !FILTER_ONLY {
                self.buffers.values[self.num_values] = value;
            }
            if !F::ALWAYS_TRUE {
                self.buffers.output_rows[self.num_values] = row;
            }
        }
        self.num_values += 1;
    }

    fn advance(&mut self, row: u32) -> (u32, bool) {
        self.row_index += 1;
        if self.row_index == self.rows.len() {
            return (0, true);
        }
        if DENSE {
            (0, false)
        } else {
            (self.rows[self.row_index] - row - 1, false)
        }
    }
}

impl<'a, T, F, H, const DENSE: bool, const FILTER_ONLY: bool> ScanVisitor
    for Scanner<'a, T, F, H, DENSE, FILTER_ONLY>
where
    T: ScanValue,
    F: ValueFilter<T>,
    H: ValueHook<T>,
{
    type Value = T;
    type Filter = F;
    type Hook = H;

    const DENSE: bool = DENSE;
    const FILTER_ONLY: bool = FILTER_ONLY;

    fn rows(&self) -> &[u32] {
        self.rows
    }

    fn allow_nulls(&self) -> bool {
        self.allow_nulls
    }

    fn check_and_skip_nulls(&mut self, nulls: &[u8], current: &mut u32) -> (u64, bool) {
        let start = *current;
        loop {
            if self.row_index == self.rows.len() {
                let target = self.rows[self.rows.len() - 1] + 1;
                let skipped = bits::count_set(nulls, start..target);
                *current = target;
                return (skipped, true);
            }
            let row = self.rows[self.row_index];
            if bits::is_set(nulls, row) {
                let skipped = bits::count_set(nulls, start..row);
                *current = row;
                return (skipped, false);
            }
            // requested row is null and hidden: drop it
            self.has_nulls = true;
            self.row_index += 1;
        }
    }

    fn process_null(&mut self) -> (u32, bool) {
        let row = self.rows[self.row_index];
        self.has_nulls = true;
        if self.filter.test_null() {
            if H::NOOP && !FILTER_ONLY {
                bits::clear_bit(&mut self.buffers.result_nulls, self.num_values as u32);
            }
            if H::NOOP && !F::ALWAYS_TRUE {
                self.buffers.output_rows[self.num_values] = row;
            }
            self.num_values += 1;
        }
        self.advance(row)
    }

    fn process(&mut self, value: T) -> (u32, bool) {
        let row = self.rows[self.row_index];
        if F::ALWAYS_TRUE || self.filter.test(value) {
            self.emit(row, value);
        }
        self.advance(row)
    }

    fn num_values_bias(&self) -> u32 {
        self.values_bias
    }

    fn set_has_nulls(&mut self) {
        self.has_nulls = true;
    }

    fn set_all_null(&mut self, count: usize) {
        for index in 0..count as u32 {
            bits::clear_bit(&mut self.buffers.result_nulls, index);
        }
        self.num_values = count;
    }

    fn set_num_values(&mut self, count: usize) {
        self.num_values = count;
    }

    fn batch(&mut self, num_rows: usize) -> BatchParts<'_, T, F, H> {
        debug_assert_eq!(num_rows, self.rows.len());
        BatchParts {
            rows: self.rows,
            values: &mut self.buffers.values,
            output_rows: &mut self.buffers.output_rows,
            outer_rows: &mut self.buffers.outer_rows,
            inner_rows: &mut self.buffers.inner_rows,
            result_nulls: &mut self.buffers.result_nulls,
            filter: &self.filter,
            hook: &mut self.hook,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_range_filter() {
        let filter = IntRangeFilter::new(10, 20);
        assert!(ValueFilter::<i64>::test(&filter, 10));
        assert!(ValueFilter::<i64>::test(&filter, 20));
        assert!(!ValueFilter::<i64>::test(&filter, 21));
        assert!(!ValueFilter::<i64>::test(&filter, -5));
        assert!(!ValueFilter::<i64>::test_null(&filter));
        let filter = filter.with_nulls_allowed(true);
        assert!(ValueFilter::<i64>::test_null(&filter));
    }

    #[test]
    fn test_scalar_process_advances_by_row_gaps() {
        let rows = [2u32, 5, 9];
        let mut buffers = ScanBuffers::<i64>::new();
        let mut scanner = Scanner::new(&rows, &mut buffers);
        assert_eq!(scanner.start(), 2);
        assert_eq!(scanner.process(100), (2, false));
        assert_eq!(scanner.process(200), (3, false));
        assert_eq!(scanner.process(300), (0, true));
        assert_eq!(scanner.num_values(), 3);
        assert_eq!(&buffers.values[..3], &[100, 200, 300]);
    }

    #[test]
    fn test_check_and_skip_nulls_counts_values_only() {
        // rows 0..6, nulls at 1, 2 and 4
        let nulls = crate::bits::from_flags(&[true, false, false, true, false, true]);
        let rows = [1u32, 2, 3, 5];
        let mut buffers = ScanBuffers::<i64>::new();
        let mut scanner = Scanner::<i64, _, _, false, false>::with_capabilities(
            &rows,
            AlwaysTrue,
            NoHook,
            &mut buffers,
        );
        let mut current = 1u32;
        // rows 1 and 2 are null and hidden; next decodable row is 3, with no
        // non-null values in between
        assert_eq!(scanner.check_and_skip_nulls(&nulls, &mut current), (0, false));
        assert_eq!(current, 3);
        assert_eq!(scanner.process(30), (1, false));
        current = 5;
        assert_eq!(scanner.check_and_skip_nulls(&nulls, &mut current), (0, false));
        assert_eq!(current, 5);
        assert_eq!(scanner.process(50), (0, true));
        assert_eq!(scanner.num_values(), 2);
        assert!(scanner.has_nulls());
    }
}
