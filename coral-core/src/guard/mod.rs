//! Guard trait for memory reclamation strategies.
//!
//! This module defines the `Guard` trait that abstracts over different memory
//! reclamation strategies (epoch-based, deferred, etc.).
//!
//! # Design
//!
//! The `Guard` trait lets the lock-free list be generic over how unlinked
//! nodes are reclaimed:
//!
//! ```text
//! LockFreeList<T, G: Guard>
//!     │
//!     ├── LockFreeList<T, EpochGuard>      (production)
//!     └── LockFreeList<T, DeferredGuard>   (testing)
//! ```
//!
//! Reclamation is where the ABA problem lives. `physical_delete` recycles
//! nodes into a pool; a recycled node must never be reachable by a thread
//! that loaded a pointer to it before it was unlinked, otherwise a stale CAS
//! could succeed against the reused address. Guards close that window: the
//! recycle action runs only after every reader that could hold the old
//! pointer has unpinned.
//!
//! # Example
//!
//! ```rust,ignore
//! use coral_core::{LockFreeList, SequenceCollection};
//! use coral_crossbeam::EpochGuard;
//!
//! // Production: epoch-based reclamation
//! let list: LockFreeList<i32, EpochGuard> = LockFreeList::new();
//! list.push(42);
//!
//! // Testing: deferred destruction
//! let test_list: LockFreeList<i32, DeferredGuard> = LockFreeList::new();
//! ```

mod deferred_guard;

pub use deferred_guard::DeferredGuard;

/// A memory reclamation guard that protects concurrent access to nodes.
///
/// Different implementations provide different trade-offs:
///
/// - **EpochGuard**: Low overhead, batched reclamation (crossbeam-epoch)
/// - **DeferredGuard**: Simple, defers all reclamation until guard drops (testing)
///
/// # Safety Contract
///
/// Implementations must ensure that an action passed to `defer` does not run
/// while any `ReadGuard` pinned before the call is still alive.
///
/// # Design Note
///
/// Guards are stored in collections and must be `Send + Sync`. The guard
/// stored in a collection is used for deferred reclamation scheduling.
/// Actual thread pinning (for epoch-based guards) happens per-operation,
/// not when the guard is created.
///
pub trait Guard: Sized + Default + Send + Sync {
    /// An active guard that protects reads for its lifetime.
    ///
    /// For epoch-based guards, this holds an actual pinned `crossbeam_epoch::Guard`.
    /// For deferred guards, this can be a unit type `()` since protection
    /// is provided by the collection's stored guard.
    ///
    type ReadGuard: Sized;

    /// Pin an active read guard.
    ///
    /// This creates a guard that protects all node reads until dropped.
    /// Every list operation pins for its whole duration.
    ///
    fn pin() -> Self::ReadGuard;

    /// Schedule a reclamation action.
    ///
    /// The action will run when it's safe (no readers pinned before this call).
    ///
    /// # Safety
    ///
    /// - every node the action touches must already be unlinked (not reachable
    ///   by traversal from the collection's head)
    /// - the action must be scheduled at most once per node
    ///
    unsafe fn defer<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static;
}
