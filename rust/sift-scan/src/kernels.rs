//! Batched building blocks of the decode fast path: null compaction,
//! run filtering and value scatter.
//!
//! These operate on whole runs of rows at a time so the per-element decode
//! loop stays branch-light. All row lists are ascending.

use crate::{
    bits,
    value::{ScanValue, ValueKind},
    visitor::{ScanVisitor, ValueFilter, ValueHook},
};

/// Result of compacting a sparse row selection against a null mask.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SparseCompaction {
    /// Whether any selected row fell on a null.
    pub any_nulls: bool,
    /// Non-null values between the last surviving row and the end of the
    /// selected range, to be skipped in the value stream.
    pub tail_skip: u64,
}

/// Collects the non-null rows of a dense selection covering `0..num_rows`.
///
/// In the dense case a row ordinal and its selection position coincide, so
/// the output doubles as both the surviving logical rows and their output
/// slots.
pub fn non_null_rows_from_dense(nulls: &[u8], num_rows: usize, outer: &mut Vec<u32>) {
    outer.clear();
    outer.reserve(num_rows);
    for row in 0..num_rows as u32 {
        if bits::is_set(nulls, row) {
            outer.push(row);
        }
    }
}

/// Compacts a sparse row selection against a null mask.
///
/// Surviving rows land in `outer` (logical row ordinals) and `inner` (their
/// positions within the stream of non-null values, which is what the value
/// stream actually stores). `scatter`, when present, receives the selection
/// position of each survivor so decoded values can be spread back to
/// selection-aligned output slots; `result_nulls`, when present, gets the
/// bit cleared at the selection position of every null row.
pub fn non_null_rows_from_sparse(
    nulls: &[u8],
    rows: &[u32],
    inner: &mut Vec<u32>,
    outer: &mut Vec<u32>,
    mut scatter: Option<&mut Vec<u32>>,
    mut result_nulls: Option<&mut [u8]>,
) -> SparseCompaction {
    inner.clear();
    outer.clear();
    if let Some(scatter) = scatter.as_deref_mut() {
        scatter.clear();
    }
    let mut non_nulls_before = 0u64;
    let mut scanned_to = 0u32;
    let mut any_nulls = false;
    for (position, &row) in rows.iter().enumerate() {
        non_nulls_before += bits::count_set(nulls, scanned_to..row);
        scanned_to = row;
        if bits::is_set(nulls, row) {
            inner.push(non_nulls_before as u32);
            outer.push(row);
            if let Some(scatter) = scatter.as_deref_mut() {
                scatter.push(position as u32);
            }
        } else {
            any_nulls = true;
            if let Some(result_nulls) = result_nulls.as_deref_mut() {
                bits::clear_bit(result_nulls, position as u32);
            }
        }
    }
    let last = rows[rows.len() - 1];
    let total = non_nulls_before + bits::count_set(nulls, scanned_to..last + 1);
    let consumed = inner.last().map_or(0, |&position| position as u64 + 1);
    SparseCompaction {
        any_nulls,
        tail_skip: total - consumed,
    }
}

/// Filters (and optionally aggregates) a run of decoded values in place.
///
/// With a hook, each passing value is fed to it keyed by `hook_rows`. Without
/// one, passing values are compacted to the front of `values` (unless
/// `filter_only`, which drops them) and their rows recorded in
/// `output_rows`. Returns the number of passing values.
#[allow(clippy::too_many_arguments)]
pub fn process_run<T, F, H>(
    values: &mut [T],
    num_input: usize,
    rows_for_hits: &[u32],
    hook_rows: Option<&[u32]>,
    output_rows: &mut [u32],
    filter: &F,
    hook: &mut H,
    filter_only: bool,
) -> usize
where
    T: ScanValue,
    F: ValueFilter<T>,
    H: ValueHook<T>,
{
    let mut num_hits = 0;
    if !H::NOOP {
        let hook_rows = hook_rows.unwrap_or(rows_for_hits);
        for index in 0..num_input {
            let value = values[index];
            if F::ALWAYS_TRUE || filter.test(value) {
                hook.add(hook_rows[index], value);
                num_hits += 1;
            }
        }
        return num_hits;
    }
    for index in 0..num_input {
        let value = values[index];
        if F::ALWAYS_TRUE || filter.test(value) {
            if !filter_only {
                values[num_hits] = value;
            }
            output_rows[num_hits] = rows_for_hits[index];
            num_hits += 1;
        }
    }
    num_hits
}

/// Spreads the compact value run at the front of `values` out to the given
/// target slots. Targets are ascending and `targets[i] >= i`, so moving from
/// the back never overwrites a pending source.
pub fn scatter_run<T: Copy>(values: &mut [T], targets: &[u32]) {
    for index in (0..targets.len()).rev() {
        values[targets[index] as usize] = values[index];
    }
}

/// Whether a decode call qualifies for the batched fast path.
///
/// Wide values stay scalar, as does a varint stream feeding a non-integer
/// output and the surfaced-nulls-with-filter combination, where passing
/// nulls must interleave with passing values in emission order.
pub fn use_fast_path<V: ScanVisitor>(visitor: &V, has_nulls: bool, use_varint: bool) -> bool {
    if matches!(<V::Value as ScanValue>::KIND, ValueKind::Wide) {
        return false;
    }
    if use_varint && !matches!(<V::Value as ScanValue>::KIND, ValueKind::Int) {
        return false;
    }
    if visitor.num_rows() == 0 {
        return false;
    }
    if has_nulls
        && visitor.allow_nulls()
        && !<V::Filter as ValueFilter<V::Value>>::ALWAYS_TRUE
    {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visitor::{AlwaysTrue, IntRangeFilter, NoHook, SumHook};

    #[test]
    fn test_dense_compaction() {
        let nulls = bits::from_flags(&[true, false, true, true, false]);
        let mut outer = Vec::new();
        non_null_rows_from_dense(&nulls, 5, &mut outer);
        assert_eq!(outer, vec![0, 2, 3]);
    }

    #[test]
    fn test_sparse_compaction() {
        // rows 0..8, nulls at 1, 4, 6
        let flags = [true, false, true, true, false, true, false, true];
        let nulls = bits::from_flags(&flags);
        let rows = [1u32, 3, 5, 6, 7];
        let mut inner = Vec::new();
        let mut outer = Vec::new();
        let mut scatter = Vec::new();
        let mut result_nulls = vec![0xffu8];
        let compaction = non_null_rows_from_sparse(
            &nulls,
            &rows,
            &mut inner,
            &mut outer,
            Some(&mut scatter),
            Some(&mut result_nulls),
        );
        // rows 1 and 6 are null; survivors are 3, 5 and 7 with value-stream
        // positions 2, 3 and 4
        assert_eq!(outer, vec![3, 5, 7]);
        assert_eq!(inner, vec![2, 3, 4]);
        assert_eq!(scatter, vec![1, 2, 4]);
        assert!(compaction.any_nulls);
        assert_eq!(compaction.tail_skip, 0);
        // selection positions 0 and 3 fell on nulls
        assert!(bits::is_null(&result_nulls, 0));
        assert!(bits::is_set(&result_nulls, 1));
        assert!(bits::is_null(&result_nulls, 3));
    }

    #[test]
    fn test_sparse_compaction_tail_skip() {
        // all non-null, selection stops early within the scanned range
        let nulls = bits::from_flags(&[true; 8]);
        let rows = [0u32, 2, 6];
        let mut inner = Vec::new();
        let mut outer = Vec::new();
        let compaction =
            non_null_rows_from_sparse(&nulls, &rows, &mut inner, &mut outer, None, None);
        assert_eq!(inner, vec![0, 2, 6]);
        assert!(!compaction.any_nulls);
        assert_eq!(compaction.tail_skip, 0);

        // null at the last selected row leaves trailing values to skip
        let nulls = bits::from_flags(&[true, true, true, true, true, true, false, true]);
        let rows = [0u32, 2, 6];
        let compaction =
            non_null_rows_from_sparse(&nulls, &rows, &mut inner, &mut outer, None, None);
        assert_eq!(inner, vec![0, 2]);
        assert_eq!(outer, vec![0, 2]);
        // values at rows 3, 4, 5 come after the last survivor
        assert_eq!(compaction.tail_skip, 3);
    }

    #[test]
    fn test_process_run_filter() {
        let mut values = [5i64, 15, 25, 18, 2];
        let rows = [0u32, 1, 2, 3, 4];
        let mut output_rows = [0u32; 5];
        let filter = IntRangeFilter::new(10, 20);
        let num_hits = process_run(
            &mut values,
            5,
            &rows,
            None,
            &mut output_rows,
            &filter,
            &mut NoHook,
            false,
        );
        assert_eq!(num_hits, 2);
        assert_eq!(&values[..2], &[15, 18]);
        assert_eq!(&output_rows[..2], &[1, 3]);
    }

    #[test]
    fn test_process_run_filter_only() {
        let mut values = [5i64, 15, 25, 18, 2];
        let rows = [0u32, 1, 2, 3, 4];
        let mut output_rows = [0u32; 5];
        let filter = IntRangeFilter::new(10, 20);
        let num_hits = process_run(
            &mut values,
            5,
            &rows,
            None,
            &mut output_rows,
            &filter,
            &mut NoHook,
            true,
        );
        assert_eq!(num_hits, 2);
        // drop-values mode leaves the value run untouched
        assert_eq!(values, [5, 15, 25, 18, 2]);
        assert_eq!(&output_rows[..2], &[1, 3]);
    }

    #[test]
    fn test_process_run_hook() {
        let mut values = [10i64, 20, 30];
        let rows = [4u32, 7, 9];
        let mut output_rows = [0u32; 3];
        let mut hook = SumHook::default();
        let num_hits = process_run(
            &mut values,
            3,
            &rows,
            None,
            &mut output_rows,
            &AlwaysTrue,
            &mut hook,
            false,
        );
        assert_eq!(num_hits, 3);
        assert_eq!(hook.total, 60);
        assert_eq!(hook.entries, vec![(4, 10), (7, 20), (9, 30)]);
    }

    #[test]
    fn test_scatter_run() {
        let mut values = [10i64, 20, 30, 0, 0];
        scatter_run(&mut values, &[0, 2, 4]);
        assert_eq!(values[0], 10);
        assert_eq!(values[2], 20);
        assert_eq!(values[4], 30);
    }
}
