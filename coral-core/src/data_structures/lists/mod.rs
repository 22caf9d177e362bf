//! Concurrent list strategies implementing [`SequenceCollection`].
//!
//! | Strategy           | Reads                  | Writes                         |
//! |--------------------|------------------------|--------------------------------|
//! | `CopyOnWriteList`  | lock-free snapshot     | serialized, O(n) copy          |
//! | `SegmentedList`    | one segment lock       | parallel across segments       |
//! | `LockFreeList`     | lock-free traversal    | CAS retry, tombstones          |
//!
//! [`SequenceCollection`]: crate::data_structures::SequenceCollection

pub mod copy_on_write_list;
pub mod lock_free_list;
pub mod segmented_list;

pub use copy_on_write_list::{CopyOnWriteList, SnapshotIter};
pub use lock_free_list::{LockFreeIter, LockFreeList, LockFreeStats};
pub use segmented_list::{RebalanceStats, SegmentedIter, SegmentedList};
