#![forbid(unsafe_code)]
//! Containers for fixed-width, opaque byte records.
//!
//! [`RecordVec`] owns one contiguous buffer of equal-width record slots and
//! grows it by doubling. [`BucketSet`] layers set semantics on top: a fixed
//! array of `RecordVec` buckets, with routing, equality, and resource release
//! delegated to caller-supplied capabilities. The containers never interpret
//! record bytes themselves; the caller declares the element width once at
//! construction and supplies every content-aware operation as a closure.
//!
//! All precondition violations (zero element width, out-of-range positions,
//! a hash capability routing outside the bucket range) panic immediately.
//! Misses on search or lookup are ordinary `None` results.
//!
//! The crate is single-threaded by design: capabilities are shared through
//! [`Rc`], so the containers are neither `Send` nor `Sync`.

use std::cmp::Ordering;
use std::rc::Rc;

pub mod set;
pub mod vec;

pub use set::BucketSet;
pub use vec::{RecordVec, DEFAULT_CAPACITY};

/// Releases resources a record's bytes refer to indirectly.
///
/// Invoked on a record immediately before its slot is overwritten or removed
/// and once per surviving record at container teardown. Absence means records
/// own nothing beyond their bytes.
pub type FreeFn = Rc<dyn Fn(&mut [u8])>;

/// Routes a record to a bucket: `(record, bucket_count) -> index`.
///
/// Must be deterministic and must return a value below `bucket_count` for
/// every record ever stored or queried; an out-of-range result panics at the
/// call site that observes it.
pub type HashFn = Rc<dyn Fn(&[u8], usize) -> usize>;

/// Three-way comparison over record bytes.
///
/// The same total order drives deduplication, sorting, and binary search, so
/// it must be consistent: records that compare `Equal` are the same key.
pub type CompareFn = Rc<dyn Fn(&[u8], &[u8]) -> Ordering>;
