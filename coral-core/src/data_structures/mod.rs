//! Data structures for concurrent collections.
//!
//! # Organization
//!
//! - [`lists`] - Concurrent list strategies (CopyOnWriteList, SegmentedList, LockFreeList)
//! - [`sequence_collection`] - The shared ordered-sequence contract
//! - [`atomicity`] - Per-operation atomicity classification
//! - [`internal`] - Internal implementation details (pub(crate))

pub mod atomicity;
pub(crate) mod internal;
pub mod lists;
pub mod sequence_collection;

pub use atomicity::{Atomicity, SequenceOp};
pub use lists::{
    CopyOnWriteList, LockFreeIter, LockFreeList, LockFreeStats, RebalanceStats, SegmentedIter,
    SegmentedList, SnapshotIter,
};
pub use sequence_collection::SequenceCollection;
