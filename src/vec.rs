//! Resizable sequence of fixed-width byte records.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;

use tracing::trace;

use crate::FreeFn;

/// Slot count used when a container is created with a requested capacity of
/// zero.
pub const DEFAULT_CAPACITY: usize = 4;

/// A contiguous, growable sequence of equal-width records.
///
/// Storage is one flat buffer of `capacity * elem_size` bytes; live records
/// occupy slots `[0, len)` with no gaps. The buffer doubles in place whenever
/// an append or insert finds the container full, and never shrinks. That
/// growth cadence is part of the contract, not an implementation detail:
/// callers may rely on [`capacity`](Self::capacity) doubling exactly at the
/// full boundary.
///
/// Record content is opaque. Comparison, hashing, and resource release are
/// the caller's business, supplied per call or at construction.
pub struct RecordVec {
    elem_size: usize,
    buf: Vec<u8>,
    len: usize,
    slots: usize,
    free: Option<FreeFn>,
}

impl RecordVec {
    /// Creates a sequence of `elem_size`-byte records with room for
    /// `initial_capacity` of them. A capacity of zero selects
    /// [`DEFAULT_CAPACITY`].
    ///
    /// The free capability, if supplied, runs on a record's bytes right
    /// before the record is overwritten or removed, and once per live record
    /// when the container is dropped.
    ///
    /// # Panics
    ///
    /// Panics if `elem_size` is zero.
    pub fn new(elem_size: usize, initial_capacity: usize, free: Option<FreeFn>) -> Self {
        assert!(elem_size > 0, "element size must be positive");
        let slots = if initial_capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            initial_capacity
        };
        Self {
            elem_size,
            buf: vec![0; slots * elem_size],
            len: 0,
            slots,
            free,
        }
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` when no records are live.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocated capacity, in records.
    pub fn capacity(&self) -> usize {
        self.slots
    }

    /// Fixed byte width of every record.
    pub fn elem_size(&self) -> usize {
        self.elem_size
    }

    /// Borrows the record at `index`.
    ///
    /// # Panics
    ///
    /// Panics unless `index < len`.
    pub fn get(&self, index: usize) -> &[u8] {
        assert!(
            index < self.len,
            "record index {index} out of range (len {})",
            self.len
        );
        &self.buf[self.slot(index)]
    }

    /// Mutably borrows the record at `index`.
    ///
    /// # Panics
    ///
    /// Panics unless `index < len`.
    pub fn get_mut(&mut self, index: usize) -> &mut [u8] {
        assert!(
            index < self.len,
            "record index {index} out of range (len {})",
            self.len
        );
        let range = self.slot(index);
        &mut self.buf[range]
    }

    /// Overwrites the record at `index` with `record`'s bytes, freeing the
    /// old record first.
    ///
    /// # Panics
    ///
    /// Panics unless `index < len` and `record` is exactly `elem_size` bytes.
    pub fn replace(&mut self, index: usize, record: &[u8]) {
        assert!(
            index < self.len,
            "record index {index} out of range (len {})",
            self.len
        );
        self.check_width(record);
        self.free_slot(index);
        let range = self.slot(index);
        self.buf[range].copy_from_slice(record);
    }

    /// Appends `record` to the end, doubling capacity first if full.
    /// Amortized O(1).
    ///
    /// # Panics
    ///
    /// Panics unless `record` is exactly `elem_size` bytes.
    pub fn push(&mut self, record: &[u8]) {
        self.check_width(record);
        if self.len == self.slots {
            self.grow();
        }
        let range = self.slot(self.len);
        self.buf[range].copy_from_slice(record);
        self.len += 1;
    }

    /// Inserts `record` at `index`, shifting the records at and after it one
    /// slot to the right. `index == len` is equivalent to
    /// [`push`](Self::push). O(len − index).
    ///
    /// # Panics
    ///
    /// Panics unless `index <= len` and `record` is exactly `elem_size`
    /// bytes.
    pub fn insert(&mut self, index: usize, record: &[u8]) {
        assert!(
            index <= self.len,
            "insert index {index} out of range (len {})",
            self.len
        );
        if index == self.len {
            self.push(record);
            return;
        }
        self.check_width(record);
        if self.len == self.slots {
            self.grow();
        }
        let start = index * self.elem_size;
        let live_end = self.len * self.elem_size;
        self.buf.copy_within(start..live_end, start + self.elem_size);
        self.buf[start..start + self.elem_size].copy_from_slice(record);
        self.len += 1;
    }

    /// Removes the record at `index`, freeing it and shifting the tail left
    /// one slot. O(len − index).
    ///
    /// # Panics
    ///
    /// Panics unless `index < len`.
    pub fn remove(&mut self, index: usize) {
        assert!(
            index < self.len,
            "record index {index} out of range (len {})",
            self.len
        );
        self.free_slot(index);
        let start = (index + 1) * self.elem_size;
        let live_end = self.len * self.elem_size;
        self.buf.copy_within(start..live_end, index * self.elem_size);
        self.len -= 1;
    }

    /// Frees every live record and resets the length to zero. Capacity is
    /// retained.
    pub fn clear(&mut self) {
        for index in 0..self.len {
            self.free_slot(index);
        }
        self.len = 0;
    }

    /// Sorts the live records in place with a three-way comparator. Heapsort:
    /// O(n log n), not stable.
    pub fn sort_by(&mut self, cmp: impl Fn(&[u8], &[u8]) -> Ordering) {
        let n = self.len;
        for root in (0..n / 2).rev() {
            self.sift_down(root, n, &cmp);
        }
        for end in (1..n).rev() {
            self.swap_records(0, end);
            self.sift_down(0, end, &cmp);
        }
    }

    /// Visits every live record in order.
    pub fn for_each(&self, mut f: impl FnMut(&[u8])) {
        for record in self.iter() {
            f(record);
        }
    }

    /// Visits every live record in order, permitting in-place mutation of
    /// record bytes. The container itself cannot be resized from inside the
    /// visitor; it is mutably borrowed for the whole traversal.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut [u8])) {
        let live = self.len * self.elem_size;
        for record in self.buf[..live].chunks_exact_mut(self.elem_size) {
            f(record);
        }
    }

    /// Iterates over the live records in order.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.buf[..self.len * self.elem_size].chunks_exact(self.elem_size)
    }

    /// Finds a record equal to `key` within `[start, len)`, returning its
    /// index or `None`. The comparator is called as `cmp(key, record)`.
    ///
    /// With `sorted == false` this is a linear scan returning the first
    /// match. With `sorted == true` it binary-searches instead; the scanned
    /// range must already be ordered by the same comparator. A binary search
    /// over an unsorted range returns an unspecified result, it is not a
    /// detected error.
    ///
    /// # Panics
    ///
    /// Panics unless `start <= len`.
    pub fn search(
        &self,
        key: &[u8],
        cmp: impl Fn(&[u8], &[u8]) -> Ordering,
        start: usize,
        sorted: bool,
    ) -> Option<usize> {
        assert!(
            start <= self.len,
            "search start {start} out of range (len {})",
            self.len
        );
        if sorted {
            let mut lo = start;
            let mut hi = self.len;
            while lo < hi {
                let mid = lo + (hi - lo) / 2;
                match cmp(key, self.get(mid)) {
                    Ordering::Less => hi = mid,
                    Ordering::Greater => lo = mid + 1,
                    Ordering::Equal => return Some(mid),
                }
            }
            None
        } else {
            (start..self.len).find(|&i| cmp(key, self.get(i)) == Ordering::Equal)
        }
    }

    fn slot(&self, index: usize) -> Range<usize> {
        let start = index * self.elem_size;
        start..start + self.elem_size
    }

    fn check_width(&self, record: &[u8]) {
        assert!(
            record.len() == self.elem_size,
            "record is {} bytes, element size is {}",
            record.len(),
            self.elem_size
        );
    }

    fn grow(&mut self) {
        self.slots *= 2;
        self.buf.resize(self.slots * self.elem_size, 0);
        trace!(len = self.len, slots = self.slots, "recvec.grow");
    }

    fn free_slot(&mut self, index: usize) {
        if let Some(free) = self.free.clone() {
            let range = self.slot(index);
            free(&mut self.buf[range]);
        }
    }

    fn swap_records(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.buf.split_at_mut(hi * self.elem_size);
        head[lo * self.elem_size..(lo + 1) * self.elem_size]
            .swap_with_slice(&mut tail[..self.elem_size]);
    }

    fn sift_down(&mut self, mut root: usize, end: usize, cmp: &impl Fn(&[u8], &[u8]) -> Ordering) {
        loop {
            let mut child = 2 * root + 1;
            if child >= end {
                return;
            }
            if child + 1 < end && cmp(self.get(child), self.get(child + 1)) == Ordering::Less {
                child += 1;
            }
            if cmp(self.get(root), self.get(child)) == Ordering::Less {
                self.swap_records(root, child);
                root = child;
            } else {
                return;
            }
        }
    }
}

impl Drop for RecordVec {
    fn drop(&mut self) {
        self.clear();
    }
}

impl fmt::Debug for RecordVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordVec")
            .field("elem_size", &self.elem_size)
            .field("len", &self.len)
            .field("capacity", &self.slots)
            .finish()
    }
}
