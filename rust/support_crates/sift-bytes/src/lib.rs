//! Shared immutable byte buffers for the sift read path.

use std::ops::{Bound, Range, RangeBounds};
use std::sync::Arc;

/// An immutable, cheaply cloneable byte buffer.
///
/// `Bytes` is a view over reference-counted storage: [`Bytes::slice`] produces
/// a sub-view without copying, and `clone` bumps a refcount. This is the chunk
/// currency of the byte-source layer: a source can hand out windows of one
/// backing allocation to its consumer.
#[derive(Clone)]
pub struct Bytes {
    data: Arc<[u8]>,
    range: Range<usize>,
}

impl Bytes {
    /// Creates a new empty `Bytes`.
    pub fn new() -> Bytes {
        Bytes {
            data: Arc::new([]),
            range: 0..0,
        }
    }

    /// Creates a `Bytes` containing a copy of the provided slice.
    pub fn copy_from_slice(data: &[u8]) -> Bytes {
        Bytes {
            data: Arc::from(data),
            range: 0..data.len(),
        }
    }

    /// Returns the number of bytes in the view.
    #[inline]
    pub fn len(&self) -> usize {
        self.range.end - self.range.start
    }

    /// Returns `true` if the view is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.range.start == self.range.end
    }

    /// Returns a sub-view of this buffer, without copying.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Bytes {
        let start = match range.start_bound() {
            Bound::Included(&i) => i,
            Bound::Excluded(&i) => i + 1,
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&i) => i + 1,
            Bound::Excluded(&i) => i,
            Bound::Unbounded => self.len(),
        };
        assert!(start <= end && end <= self.len());
        Bytes {
            data: Arc::clone(&self.data),
            range: self.range.start + start..self.range.start + end,
        }
    }

    /// Returns the view as a byte slice.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[self.range.clone()]
    }
}

impl Default for Bytes {
    fn default() -> Self {
        Bytes::new()
    }
}

impl std::ops::Deref for Bytes {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(vec: Vec<u8>) -> Bytes {
        let len = vec.len();
        Bytes {
            data: Arc::from(vec),
            range: 0..len,
        }
    }
}

impl std::fmt::Debug for Bytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bytes(len: {})", self.len())
    }
}

impl PartialEq for Bytes {
    fn eq(&self, other: &Bytes) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for Bytes {}

impl PartialEq<[u8]> for Bytes {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_slice() == other
    }
}

#[cfg(test)]
mod tests {
    use super::Bytes;

    #[test]
    fn test_slice_views() {
        let bytes = Bytes::copy_from_slice(&[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(bytes.len(), 8);

        let mid = bytes.slice(2..6);
        assert_eq!(mid.as_slice(), &[2, 3, 4, 5]);

        let nested = mid.slice(1..3);
        assert_eq!(nested.as_slice(), &[3, 4]);

        let tail = bytes.slice(8..);
        assert!(tail.is_empty());
    }

    #[test]
    fn test_from_vec_no_copy_semantics() {
        let bytes: Bytes = vec![10u8, 20, 30].into();
        let clone = bytes.clone();
        drop(bytes);
        assert_eq!(clone.as_slice(), &[10, 20, 30]);
    }

    #[test]
    #[should_panic]
    fn test_slice_out_of_bounds() {
        let bytes = Bytes::copy_from_slice(&[1, 2, 3]);
        let _ = bytes.slice(2..5);
    }
}
