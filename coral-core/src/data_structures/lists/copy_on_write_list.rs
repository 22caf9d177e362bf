use std::cmp::Ordering;
use std::fmt;
use std::iter::FusedIterator;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::trace;

use crate::config::{ConfigError, Equaler, ListOptions, fail_construction};
use crate::data_structures::atomicity::{Atomicity, SequenceOp};
use crate::data_structures::sequence_collection::{SequenceCollection, fmt_sequence};

///
/// Copy-on-write list: every write publishes a brand-new immutable snapshot.
///
/// # Performance
///
/// - **Reads**: one atomic pointer load, never block, never wait on writers
/// - **Writes**: serialized by a mutex; full O(n) copy regardless of change size
/// - **Best for**: read-heavy workloads (many readers, rare writers)
///
// Snapshot publication:
//
//            snapshot (ArcSwap)
//                 │
//     ┌───────────┴───────────┐
//     ▼ before write          ▼ after write
// ┌─────────────┐       ┌───────────────┐
// │ [1,2,3,4,5] │       │ [1,2,3,4,5,6] │
// └─────────────┘       └───────────────┘
//     ▲
//     └── iterator started before the write keeps its Arc and
//         finishes over the old, unchanged snapshot
//
// INVARIANTS:
// 1. A published snapshot is never mutated.
// 2. `snapshot` is only stored while `write_lock` is held, so no write is lost
//    between load and publish.
//
pub struct CopyOnWriteList<T> {
    snapshot: ArcSwap<Vec<T>>,
    write_lock: Mutex<()>,
    equaler: Equaler<T>,
    options: ListOptions<T>,
}

impl<T: Clone + PartialEq + 'static> CopyOnWriteList<T> {
    pub fn new() -> Self {
        Self::with_options(ListOptions::native())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_options(ListOptions::native().with_capacity(capacity))
    }
}

impl<T: Clone> CopyOnWriteList<T> {
    /// Create a list comparing elements with `equaler` instead of `PartialEq`.
    pub fn with_equaler<F>(equaler: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        Self::with_options(ListOptions::default().with_equaler(equaler))
    }

    /// Create a list from options.
    ///
    /// # Panics
    ///
    /// Panics if the options are invalid (e.g. no equaler configured).
    pub fn with_options(options: ListOptions<T>) -> Self {
        Self::try_with_options(options).unwrap_or_else(|error| fail_construction(error))
    }

    pub fn try_with_options(options: ListOptions<T>) -> Result<Self, ConfigError> {
        let (equaler, options) = options.resolve()?;
        Ok(CopyOnWriteList {
            snapshot: ArcSwap::from_pointee(Vec::with_capacity(options.capacity)),
            write_lock: Mutex::new(()),
            equaler,
            options,
        })
    }

    /// The currently published snapshot.
    ///
    /// The returned `Arc` never changes; later writes publish new snapshots.
    pub fn snapshot(&self) -> Arc<Vec<T>> {
        self.snapshot.load_full()
    }

    /// Serialize with other writers, copy the current snapshot, apply `f` and
    /// publish the result. `f` returns whatever the caller needs plus whether
    /// anything changed; unchanged copies are not published.
    fn write<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut Vec<T>) -> (R, bool),
    {
        let _writer = self.write_lock.lock();
        let current = self.snapshot.load_full();
        let mut next = Vec::with_capacity(current.len().max(self.options.capacity));
        next.extend_from_slice(&current);
        let (result, changed) = f(&mut next);

        if changed {
            trace!(
                old_len = current.len(),
                new_len = next.len(),
                "publishing copy-on-write snapshot"
            );
            self.snapshot.store(Arc::new(next));
        }
        result
    }
}

impl<T: Clone> SequenceCollection<T> for CopyOnWriteList<T> {
    type Iter<'a>
        = SnapshotIter<T>
    where
        Self: 'a;

    fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    fn clear(&self) {
        let _writer = self.write_lock.lock();
        self.snapshot.store(Arc::new(Vec::with_capacity(self.options.capacity)));
    }

    fn get(&self, index: usize) -> Option<T> {
        self.snapshot.load().get(index).cloned()
    }

    fn set(&self, index: usize, value: T) -> Option<T> {
        self.write(|values| match values.get_mut(index) {
            Some(slot) => (Some(std::mem::replace(slot, value)), true),
            None => (None, false),
        })
    }

    fn push(&self, value: T) {
        self.write(|values| {
            values.push(value);
            ((), true)
        })
    }

    fn insert(&self, index: usize, value: T) -> bool {
        self.write(|values| {
            if index > values.len() {
                return (false, false);
            }
            values.insert(index, value);
            (true, true)
        })
    }

    fn insert_all<I>(&self, index: usize, values: I) -> bool
    where
        I: IntoIterator<Item = T>,
    {
        self.write(|current| {
            if index > current.len() {
                return (false, false);
            }
            let tail = current.split_off(index);
            let before = current.len();
            current.extend(values);
            let changed = current.len() != before;
            current.extend(tail);
            (true, changed)
        })
    }

    fn remove_at(&self, index: usize) -> Option<T> {
        self.write(|values| {
            if index >= values.len() {
                return (None, false);
            }
            (Some(values.remove(index)), true)
        })
    }

    fn remove_func<F>(&self, mut predicate: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        self.write(|values| {
            let before = values.len();
            values.retain(|value| !predicate(value));
            let removed = before - values.len();
            (removed, removed > 0)
        })
    }

    fn sort_by<F>(&self, compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.write(|values| {
            values.sort_by(compare);
            ((), true)
        })
    }

    fn iter(&self) -> Self::Iter<'_> {
        SnapshotIter::new(self.snapshot())
    }

    fn equals(&self, a: &T, b: &T) -> bool {
        (self.equaler)(a, b)
    }

    fn from_vec_like(&self, values: Vec<T>) -> Self {
        CopyOnWriteList {
            snapshot: ArcSwap::from_pointee(values),
            write_lock: Mutex::new(()),
            equaler: Arc::clone(&self.equaler),
            options: self.options.clone(),
        }
    }

    /// Every operation reads one published snapshot or publishes one, so
    /// everything is atomic, iteration included.
    fn atomicity(_op: SequenceOp) -> Atomicity {
        Atomicity::Atomic
    }

    // =========================================================================
    // Snapshot-consistent overrides
    // =========================================================================

    fn is_empty(&self) -> bool {
        self.snapshot.load().is_empty()
    }

    fn to_vec(&self) -> Vec<T> {
        Vec::clone(&self.snapshot.load())
    }

    fn first(&self) -> Option<T> {
        self.snapshot.load().first().cloned()
    }

    fn last(&self) -> Option<T> {
        self.snapshot.load().last().cloned()
    }

    fn push_all<I>(&self, values: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.write(|current| {
            let before = current.len();
            current.extend(values);
            ((), current.len() != before)
        })
    }

    fn remove(&self, value: &T) -> bool {
        self.write(|values| match values.iter().position(|v| self.equals(v, value)) {
            Some(index) => {
                values.remove(index);
                (true, true)
            }
            None => (false, false),
        })
    }

    fn remove_first(&self) -> Option<T> {
        self.remove_at(0)
    }

    fn remove_last(&self) -> Option<T> {
        self.write(|values| {
            let removed = values.pop();
            let changed = removed.is_some();
            (removed, changed)
        })
    }

    fn index_of(&self, value: &T) -> Option<usize> {
        self.snapshot
            .load()
            .iter()
            .position(|candidate| self.equals(candidate, value))
    }

    fn last_index_of(&self, value: &T) -> Option<usize> {
        self.snapshot
            .load()
            .iter()
            .rposition(|candidate| self.equals(candidate, value))
    }

    fn sub_list(&self, from: usize, to: usize) -> Option<Self> {
        let snapshot = self.snapshot.load();
        let values = snapshot.get(from..to)?;
        Some(self.from_vec_like(values.to_vec()))
    }
}

impl<T: Clone + PartialEq + 'static> Default for CopyOnWriteList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for CopyOnWriteList<T> {
    /// Shares the current snapshot; the clone diverges on its first write.
    fn clone(&self) -> Self {
        CopyOnWriteList {
            snapshot: ArcSwap::new(self.snapshot()),
            write_lock: Mutex::new(()),
            equaler: Arc::clone(&self.equaler),
            options: self.options.clone(),
        }
    }
}

impl<T: Clone + fmt::Display> fmt::Display for CopyOnWriteList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_sequence(f, self.snapshot.load().iter())
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for CopyOnWriteList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.snapshot.load().iter()).finish()
    }
}

// ============================================================================
// Iterator Support
// ============================================================================

/// Iterator over one captured snapshot.
///
/// Owns its `Arc`, so writes published after the iterator was created are
/// never observed.
pub struct SnapshotIter<T> {
    snapshot: Arc<Vec<T>>,
    front: usize,
    back: usize,
}

impl<T> SnapshotIter<T> {
    fn new(snapshot: Arc<Vec<T>>) -> Self {
        let back = snapshot.len();
        SnapshotIter {
            snapshot,
            front: 0,
            back,
        }
    }
}

impl<T: Clone> Iterator for SnapshotIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }
        let value = self.snapshot[self.front].clone();
        self.front += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<T: Clone> DoubleEndedIterator for SnapshotIter<T> {
    fn next_back(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(self.snapshot[self.back].clone())
    }
}

impl<T: Clone> ExactSizeIterator for SnapshotIter<T> {}

impl<T: Clone> FusedIterator for SnapshotIter<T> {}

// ============================================================================
// Tests - Unique to CopyOnWriteList
// ============================================================================
// Note: Common tests are in tests/sequence_collection_tests.rs

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_iteration_is_snapshot_isolated() {
        let list: CopyOnWriteList<i32> = CopyOnWriteList::new();
        list.push_all([1, 2, 3, 4, 5]);

        let mut iter = list.iter();
        let mut seen = vec![iter.next().unwrap(), iter.next().unwrap()];

        // Write lands mid-iteration
        list.push(6);
        seen.extend(iter);

        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
        assert_eq!(list.to_vec(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_snapshot_is_immutable() {
        let list: CopyOnWriteList<i32> = CopyOnWriteList::new();
        list.push_all([3, 1, 2]);

        let before = list.snapshot();
        list.sort();
        list.remove_at(0);

        assert_eq!(*before, vec![3, 1, 2]);
        assert_eq!(list.to_vec(), vec![2, 3]);
    }

    #[test]
    fn test_failed_write_does_not_publish() {
        let list: CopyOnWriteList<i32> = CopyOnWriteList::new();
        list.push(1);

        let before = list.snapshot();
        assert!(list.set(5, 10).is_none());
        assert!(!list.insert(3, 10));
        assert!(list.remove_at(1).is_none());
        assert!(!list.remove(&42));

        assert!(Arc::ptr_eq(&before, &list.snapshot()));
    }

    #[test]
    fn test_clone_shares_until_write() {
        let list: CopyOnWriteList<i32> = CopyOnWriteList::new();
        list.push_all([1, 2, 3]);

        let copy = list.clone();
        assert!(Arc::ptr_eq(&list.snapshot(), &copy.snapshot()));

        copy.push(4);
        assert_eq!(list.to_vec(), vec![1, 2, 3]);
        assert_eq!(copy.to_vec(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_reverse_iteration_over_snapshot() {
        let list: CopyOnWriteList<i32> = CopyOnWriteList::new();
        list.push_all([1, 2, 3]);

        let iter = list.iter();
        list.clear();

        assert_eq!(iter.rev().collect::<Vec<_>>(), vec![3, 2, 1]);
        assert!(list.is_empty());
    }

    #[test]
    fn test_readers_never_see_partial_writes() {
        let list: Arc<CopyOnWriteList<usize>> = Arc::new(CopyOnWriteList::new());

        let writer = {
            let list = Arc::clone(&list);
            thread::spawn(move || {
                for i in 0..500 {
                    // Each write keeps the list as 0..n
                    list.push(i);
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let list = Arc::clone(&list);
                thread::spawn(move || {
                    for _ in 0..200 {
                        let snapshot = list.snapshot();
                        for (i, value) in snapshot.iter().enumerate() {
                            assert_eq!(*value, i);
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }

        assert_eq!(list.len(), 500);
    }

    #[test]
    fn test_every_op_is_atomic() {
        for op in SequenceOp::ALL {
            assert_eq!(CopyOnWriteList::<i32>::atomicity(op), Atomicity::Atomic);
        }
    }

    #[test]
    #[should_panic(expected = "invalid list configuration")]
    fn test_missing_equaler_panics() {
        let _list: CopyOnWriteList<i32> = CopyOnWriteList::with_options(ListOptions::default());
    }

    #[test]
    fn test_try_with_options_reports_error() {
        let result = CopyOnWriteList::<i32>::try_with_options(ListOptions::default());
        assert!(matches!(result, Err(ConfigError::MissingEqualer)));
    }

    #[test]
    fn test_capacity_hint_survives_writes() {
        let list: CopyOnWriteList<i32> = CopyOnWriteList::with_capacity(32);
        assert!(list.snapshot().capacity() >= 32);

        list.push(1);
        list.insert(0, 0);
        assert!(list.snapshot().capacity() >= 32);

        list.clear();
        list.push_all(0..4);
        assert!(list.snapshot().capacity() >= 32);

        // Growing past the hint keeps at least the current length
        list.push_all(0..40);
        assert_eq!(list.len(), 44);
        assert!(list.snapshot().capacity() >= 44);
    }
}
