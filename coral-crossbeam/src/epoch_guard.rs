//! Epoch-based guard implementation using crossbeam-epoch.
//!
//! This module provides `EpochGuard`, an implementation of the `Guard` trait
//! using crossbeam-epoch for memory reclamation.
//!
//! # Design
//!
//! `EpochGuard` is a zero-sized type that schedules reclamation on the global
//! epoch collector. A `LockFreeList` parameterized with it recycles unlinked
//! nodes only after every thread that was pinned at unlink time has moved on:
//!
//! ```text
//! LockFreeList<i32, EpochGuard>
//!     │
//!     ├── every operation pins      (epoch::pin)
//!     └── physical_delete defers    (Guard::defer -> node pool)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use coral_core::{LockFreeList, SequenceCollection};
//! use coral_crossbeam::EpochGuard;
//!
//! let list: LockFreeList<i32, EpochGuard> = LockFreeList::new();
//! list.push_all([1, 2, 3]);
//! list.remove(&2);
//!
//! // Unlink the tombstone; its node is recycled once the epoch advances
//! list.physical_delete();
//! EpochGuard::flush();
//! ```

use coral_core::guard::Guard;
use crossbeam_epoch::{self as epoch, Guard as CrossbeamGuard};

/// Epoch-based memory reclamation guard.
///
/// Unlike `DeferredGuard`, which stores pending actions until it drops,
/// `EpochGuard` keeps no state. Deferred actions live in crossbeam's global
/// collector, so the guard can sit inside a collection without affecting its
/// `Send`/`Sync` status.
///
/// When `defer` is called it pins the current thread, hands the action to
/// the collector, and unpins. The action runs once all threads have advanced
/// past the current epoch.
///
#[derive(Debug, Clone, Copy, Default)]
pub struct EpochGuard;

impl EpochGuard {
    pub fn new() -> Self {
        EpochGuard
    }

    /// Push this thread's pending actions to the global queue and try to
    /// advance the epoch.
    ///
    /// Reclamation is lazy; tests and benchmarks that want recycled nodes to
    /// become available call this a few times.
    pub fn flush() {
        epoch::pin().flush();
    }
}

impl Guard for EpochGuard {
    /// A pinned crossbeam guard; nodes loaded while it lives stay valid.
    type ReadGuard = CrossbeamGuard;

    fn pin() -> Self::ReadGuard {
        epoch::pin()
    }

    unsafe fn defer<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        epoch::pin().defer(action);
    }
}
