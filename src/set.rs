//! Hash-bucketed set of fixed-width records.

use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::vec::{RecordVec, DEFAULT_CAPACITY};
use crate::{CompareFn, FreeFn, HashFn};

/// A set of fixed-width records spread over a fixed number of
/// [`RecordVec`] buckets.
///
/// The bucket count is chosen once at construction and never changes; there
/// is no rehashing, so the load factor is the caller's responsibility. Every
/// record is routed by the hash capability and deduplicated by the compare
/// capability within its bucket: inserting a record equal to one already
/// stored replaces the stored value instead of duplicating the key.
///
/// Iteration visits buckets in index order and records in bucket order;
/// there is no global ordering across buckets. Note that
/// [`lookup`](Self::lookup) sorts the routed bucket as a side effect, so
/// per-bucket insertion order does not survive lookups.
pub struct BucketSet {
    buckets: Vec<RecordVec>,
    len: usize,
    hash: HashFn,
    cmp: CompareFn,
}

impl BucketSet {
    /// Creates a set of `elem_size`-byte records with `bucket_count` buckets,
    /// each starting at the default capacity.
    ///
    /// `hash` must route every record to `[0, bucket_count)` and `cmp` must
    /// be a total order consistent with the equality the set deduplicates
    /// by. The free capability, if supplied, is shared by all buckets.
    ///
    /// # Panics
    ///
    /// Panics if `elem_size` or `bucket_count` is zero.
    pub fn new(
        elem_size: usize,
        bucket_count: usize,
        hash: HashFn,
        cmp: CompareFn,
        free: Option<FreeFn>,
    ) -> Self {
        assert!(elem_size > 0, "element size must be positive");
        assert!(bucket_count > 0, "bucket count must be positive");
        let buckets = (0..bucket_count)
            .map(|_| RecordVec::new(elem_size, DEFAULT_CAPACITY, free.clone()))
            .collect();
        Self {
            buckets,
            len: 0,
            hash,
            cmp,
        }
    }

    /// Total number of live records across all buckets.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` when the set holds no records.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of buckets, fixed for the set's lifetime.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Fixed byte width of every record.
    pub fn elem_size(&self) -> usize {
        self.buckets[0].elem_size()
    }

    /// Inserts `record`, replacing any stored record that compares equal.
    ///
    /// The routed bucket is scanned linearly in its current order. On a hit
    /// the old record is freed and overwritten in place and the length is
    /// unchanged; on a miss the record is appended to the bucket. Either
    /// way the stored value for a key is always the most recently inserted
    /// one.
    ///
    /// # Panics
    ///
    /// Panics if the hash capability routes outside `[0, bucket_count)` or
    /// `record` is not exactly `elem_size` bytes.
    pub fn insert(&mut self, record: &[u8]) {
        let index = self.route(record);
        let cmp = Rc::clone(&self.cmp);
        let bucket = &mut self.buckets[index];
        match bucket.search(record, |a, b| (*cmp)(a, b), 0, false) {
            Some(pos) => {
                bucket.replace(pos, record);
                trace!(bucket = index, pos, "bucketset.insert.replace");
            }
            None => {
                bucket.push(record);
                self.len += 1;
                trace!(bucket = index, len = self.len, "bucketset.insert.append");
            }
        }
    }

    /// Finds the stored record equal to `key`, or `None` if absent.
    ///
    /// Destructive: the routed bucket is sorted in place with the compare
    /// capability before the binary search, so any insertion order the
    /// caller relied on within that bucket is permanently disrupted. This
    /// mutation is why lookup takes `&mut self`.
    ///
    /// # Panics
    ///
    /// Panics if the hash capability routes outside `[0, bucket_count)`.
    pub fn lookup(&mut self, key: &[u8]) -> Option<&[u8]> {
        let index = self.route(key);
        let cmp = Rc::clone(&self.cmp);
        let bucket = &mut self.buckets[index];
        bucket.sort_by(|a, b| (*cmp)(a, b));
        trace!(bucket = index, len = bucket.len(), "bucketset.lookup.sorted");
        let pos = bucket.search(key, |a, b| (*cmp)(a, b), 0, true)?;
        Some(self.buckets[index].get(pos))
    }

    /// Visits every record: buckets in index order, records in bucket order.
    pub fn for_each(&self, mut f: impl FnMut(&[u8])) {
        for bucket in &self.buckets {
            bucket.for_each(&mut f);
        }
    }

    /// Visits every record mutably, in the same order as
    /// [`for_each`](Self::for_each). Record bytes may be rewritten in place;
    /// the set itself cannot be restructured from inside the visitor.
    /// Rewriting the fields the hash or compare capabilities inspect breaks
    /// the routing invariant, so visitors should confine themselves to
    /// payload bytes.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut [u8])) {
        for bucket in &mut self.buckets {
            bucket.for_each_mut(&mut f);
        }
    }

    fn route(&self, record: &[u8]) -> usize {
        let index = (*self.hash)(record, self.buckets.len());
        assert!(
            index < self.buckets.len(),
            "hash routed record to bucket {index} of {}",
            self.buckets.len()
        );
        index
    }
}

impl fmt::Debug for BucketSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketSet")
            .field("len", &self.len)
            .field("bucket_count", &self.buckets.len())
            .field("elem_size", &self.elem_size())
            .finish()
    }
}
