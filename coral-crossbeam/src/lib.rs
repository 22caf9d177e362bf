//! Crossbeam-based reclamation for coral collections.
//!
//! This crate provides `EpochGuard`, an implementation of the `Guard` trait
//! using crossbeam-epoch for memory reclamation.
//!
//! # Usage
//!
//! ```ignore
//! use coral_core::{LockFreeList, SequenceCollection};
//! use coral_crossbeam::EpochGuard;
//!
//! let list: LockFreeList<i32, EpochGuard> = LockFreeList::new();
//! list.push(42);
//! ```

pub mod epoch_guard;

pub use epoch_guard::EpochGuard;

/// Lock-free list reclaimed through the global epoch collector.
pub type EpochList<T> = coral_core::LockFreeList<T, EpochGuard>;
