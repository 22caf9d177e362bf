use std::cmp::Ordering;
use std::fmt;
use std::sync::atomic::{self, AtomicBool, AtomicUsize};
use std::vec;

use crossbeam_utils::Backoff;
use parking_lot::{Mutex, MutexGuard, RwLock};
use tracing::debug;

use crate::config::{ConfigError, Equaler, ListOptions, fail_construction};
use crate::data_structures::atomicity::{Atomicity, SequenceOp};
use crate::data_structures::sequence_collection::{SequenceCollection, fmt_sequence};

///
/// List partitioned into bounded segments, each behind its own lock, so that
/// writers touching disjoint regions proceed in parallel.
///
// Layout (segment_capacity = 4):
//
//   directory (RwLock)
//   ┌───────────┬───────────┬───────────┐
//   │ seg 0     │ seg 1     │ seg 2     │
//   │ len 4     │ len 2     │ len 3     │
//   └─────┬─────┴─────┬─────┴─────┬─────┘
//         ▼           ▼           ▼
//   [a, b, c, d]   [e, f]     [g, h, i]
//    0  1  2  3     4  5       6  7  8      <- global index
//
// A global index is resolved against a running prefix of the segments'
// atomic lengths, then re-validated once the target segment is locked.
//
// LOCKING:
// - Element operations hold the directory shared and lock one segment, or two
//   adjacent segments for boundary inserts and refilling an emptied segment.
// - Structural changes (rebalance, clear, sort, bulk inserts) hold the
//   directory exclusively and take no segment locks.
//
// INVARIANTS:
// 1. Segments partition the index space contiguously and in order.
// 2. Segment locks are acquired in ascending segment index order; at most two
//    adjacent segments are held at once.
// 3. A segment's atomic `len` equals its vector's length whenever its lock is free.
// 4. After `rebalance`, every segment holds at most `segment_capacity`
//    elements and none is empty unless the list is.
// 5. The directory lock is never taken twice by one thread.
//
pub struct SegmentedList<T> {
    segments: RwLock<Vec<Segment<T>>>,
    segment_capacity: usize,
    needs_rebalance: AtomicBool,
    equaler: Equaler<T>,
    options: ListOptions<T>,
}

struct Segment<T> {
    items: Mutex<Vec<T>>,
    len: AtomicUsize,
}

impl<T> Segment<T> {
    fn new(items: Vec<T>) -> Self {
        let len = AtomicUsize::new(items.len());
        Segment {
            items: Mutex::new(items),
            len,
        }
    }

    fn len(&self) -> usize {
        self.len.load(atomic::Ordering::Acquire)
    }

    /// Mirror the vector's length; called with the segment lock held.
    fn publish_len(&self, items: &[T]) {
        self.len.store(items.len(), atomic::Ordering::Release);
    }

    fn into_items(self) -> Vec<T> {
        self.items.into_inner()
    }
}

/// Where an insert at a global index lands.
enum InsertSlot {
    /// Strictly inside one segment, or appending to the last one.
    Inside { segment: usize, offset: usize },
    /// Exactly between `left` and `left + 1`.
    Boundary { left: usize },
}

/// Counts reported by one rebalance pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RebalanceStats {
    pub splits: usize,
    pub merges: usize,
    pub dropped: usize,
    pub segments: usize,
}

impl<T: Clone + PartialEq + 'static> SegmentedList<T> {
    pub fn new() -> Self {
        Self::with_options(ListOptions::native())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_options(ListOptions::native().with_capacity(capacity))
    }
}

impl<T: Clone> SegmentedList<T> {
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
    /// Panics if the options are invalid.
    pub fn with_options(options: ListOptions<T>) -> Self {
        Self::try_with_options(options).unwrap_or_else(|error| fail_construction(error))
    }

    pub fn try_with_options(options: ListOptions<T>) -> Result<Self, ConfigError> {
        let (equaler, options) = options.resolve()?;
        let first = Vec::with_capacity(options.capacity.min(options.segment_capacity));
        Ok(SegmentedList {
            segments: RwLock::new(vec![Segment::new(first)]),
            segment_capacity: options.segment_capacity,
            needs_rebalance: AtomicBool::new(false),
            equaler,
            options,
        })
    }

    pub fn segment_capacity(&self) -> usize {
        self.segment_capacity
    }

    pub fn segment_count(&self) -> usize {
        self.segments.read().len()
    }

    /// Current length of every segment, in order.
    pub fn segment_lens(&self) -> Vec<usize> {
        self.segments.read().iter().map(Segment::len).collect()
    }

    /// Split oversized segments, merge small neighbours, drop empty ones.
    ///
    /// Runs automatically after writes that leave a segment above capacity or
    /// empty; can also be invoked as a maintenance operation.
    pub fn rebalance(&self) -> RebalanceStats {
        let mut segments = self.segments.write();
        self.needs_rebalance.store(false, atomic::Ordering::Release);

        let before = segments.len();
        let stats = rebalance_segments(&mut segments, self.segment_capacity);
        debug!(
            before,
            after = stats.segments,
            splits = stats.splits,
            merges = stats.merges,
            dropped = stats.dropped,
            "rebalanced segmented list"
        );
        stats
    }

    fn request_rebalance(&self) {
        self.needs_rebalance.store(true, atomic::Ordering::Release);
    }

    /// Run a pending rebalance. Callers must not hold the directory lock.
    fn maybe_rebalance(&self) {
        if self.needs_rebalance.swap(false, atomic::Ordering::AcqRel) {
            self.rebalance();
        }
    }

    fn check_capacity(&self, items: &[T]) {
        if items.len() > self.segment_capacity {
            self.request_rebalance();
        }
    }

    /// After `items` (segment `segment`, locked) became empty, pull the front
    /// element of the right neighbour into it.
    fn refill_from_right(&self, segments: &[Segment<T>], segment: usize, items: &mut Vec<T>) {
        match segments.get(segment + 1) {
            Some(right) => {
                // Ascending order: `segment` is already held
                let mut right_items = right.items.lock();
                if !right_items.is_empty() {
                    items.push(right_items.remove(0));
                    right.publish_len(&right_items);
                }
                if right_items.is_empty() {
                    self.request_rebalance();
                }
            }
            None if segments.len() > 1 => self.request_rebalance(),
            None => {}
        }
    }

    fn insert_shared(&self, segments: &[Segment<T>], index: usize, value: T) -> bool {
        let backoff = Backoff::new();
        loop {
            let Some(slot) = locate_insert(segments, index) else {
                return false;
            };

            match slot {
                InsertSlot::Inside { segment, offset } => {
                    let mut items = segments[segment].items.lock();
                    if offset <= items.len() && prefix_len(segments, segment) == index - offset {
                        items.insert(offset, value);
                        segments[segment].publish_len(&items);
                        self.check_capacity(&items);
                        return true;
                    }
                }
                InsertSlot::Boundary { left } => {
                    let mut left_items = segments[left].items.lock();
                    let mut right_items = segments[left + 1].items.lock();
                    if prefix_len(segments, left) + left_items.len() == index {
                        // Less loaded side takes the element
                        if left_items.len() <= right_items.len() {
                            left_items.push(value);
                            segments[left].publish_len(&left_items);
                            self.check_capacity(&left_items);
                        } else {
                            right_items.insert(0, value);
                            segments[left + 1].publish_len(&right_items);
                            self.check_capacity(&right_items);
                        }
                        return true;
                    }
                }
            }

            // Another writer shifted the index space between locate and lock
            backoff.snooze();
        }
    }

    /// Remove `offset` from a locked segment, refilling it if it became empty.
    fn take_from(
        &self,
        segments: &[Segment<T>],
        segment: usize,
        items: &mut Vec<T>,
        offset: usize,
    ) -> T {
        let removed = items.remove(offset);
        if items.is_empty() {
            self.refill_from_right(segments, segment, items);
        }
        segments[segment].publish_len(items);
        removed
    }
}

// ============================================================================
// Index resolution
// ============================================================================

fn prefix_len<T>(segments: &[Segment<T>], segment: usize) -> usize {
    segments[..segment].iter().map(Segment::len).sum()
}

/// Resolve `index` to `(segment, offset)` from the atomic lengths.
fn locate<T>(segments: &[Segment<T>], index: usize) -> Option<(usize, usize)> {
    let mut prefix = 0;
    for (segment, entry) in segments.iter().enumerate() {
        let len = entry.len();
        if index < prefix + len {
            return Some((segment, index - prefix));
        }
        prefix += len;
    }
    None
}

fn locate_insert<T>(segments: &[Segment<T>], index: usize) -> Option<InsertSlot> {
    let mut prefix = 0;
    for (segment, entry) in segments.iter().enumerate() {
        let end = prefix + entry.len();
        if index < end {
            return Some(InsertSlot::Inside {
                segment,
                offset: index - prefix,
            });
        }
        if index == end {
            return Some(if segment + 1 < segments.len() {
                InsertSlot::Boundary { left: segment }
            } else {
                InsertSlot::Inside {
                    segment,
                    offset: index - prefix,
                }
            });
        }
        prefix = end;
    }
    None
}

/// Lock the segment holding `index`, retrying while the prefix is stale.
///
/// Returns `None` once the index is out of range.
fn lock_index<T>(
    segments: &[Segment<T>],
    index: usize,
) -> Option<(usize, MutexGuard<'_, Vec<T>>, usize)> {
    let backoff = Backoff::new();
    loop {
        let (segment, offset) = locate(segments, index)?;
        let items = segments[segment].items.lock();
        if offset < items.len() && prefix_len(segments, segment) == index - offset {
            return Some((segment, items, offset));
        }
        drop(items);
        backoff.snooze();
    }
}

// ============================================================================
// Structural maintenance (directory held exclusively)
// ============================================================================

/// Chop `values` into segments of at most `size` elements. Always yields at
/// least one segment.
fn into_segments<T>(mut values: Vec<T>, size: usize) -> Vec<Segment<T>> {
    let mut segments = Vec::with_capacity(values.len().div_ceil(size).max(1));
    while values.len() > size {
        let rest = values.split_off(size);
        segments.push(Segment::new(values));
        values = rest;
    }
    segments.push(Segment::new(values));
    segments
}

fn rebalance_segments<T>(segments: &mut Vec<Segment<T>>, capacity: usize) -> RebalanceStats {
    let half = (capacity / 2).max(1);
    let mut stats = RebalanceStats::default();
    let mut rebuilt: Vec<Vec<T>> = Vec::with_capacity(segments.len());

    for segment in segments.drain(..) {
        let mut items = segment.into_items();
        if items.is_empty() {
            stats.dropped += 1;
            continue;
        }

        if items.len() > capacity {
            stats.splits += 1;
            while items.len() > half {
                let rest = items.split_off(half);
                rebuilt.push(items);
                items = rest;
            }
            rebuilt.push(items);
            continue;
        }

        match rebuilt.last_mut() {
            Some(previous) if previous.len() + items.len() <= half => {
                previous.append(&mut items);
                stats.merges += 1;
            }
            _ => rebuilt.push(items),
        }
    }

    if rebuilt.is_empty() {
        // The list is empty; keep one segment to append into
        stats.dropped = stats.dropped.saturating_sub(1);
        rebuilt.push(Vec::new());
    }

    stats.segments = rebuilt.len();
    *segments = rebuilt.into_iter().map(Segment::new).collect();
    stats
}

impl<T: Clone> SequenceCollection<T> for SegmentedList<T> {
    type Iter<'a>
        = SegmentedIter<'a, T>
    where
        Self: 'a;

    fn len(&self) -> usize {
        self.segments.read().iter().map(Segment::len).sum()
    }

    fn clear(&self) {
        let mut segments = self.segments.write();
        *segments = vec![Segment::new(Vec::new())];
        self.needs_rebalance.store(false, atomic::Ordering::Release);
    }

    fn get(&self, index: usize) -> Option<T> {
        let segments = self.segments.read();
        let (_, items, offset) = lock_index(&segments, index)?;
        Some(items[offset].clone())
    }

    fn set(&self, index: usize, value: T) -> Option<T> {
        let segments = self.segments.read();
        let (_, mut items, offset) = lock_index(&segments, index)?;
        Some(std::mem::replace(&mut items[offset], value))
    }

    fn push(&self, value: T) {
        {
            let segments = self.segments.read();
            let last = segments.len() - 1;
            let mut items = segments[last].items.lock();
            items.push(value);
            segments[last].publish_len(&items);
            self.check_capacity(&items);
        }
        self.maybe_rebalance();
    }

    fn insert(&self, index: usize, value: T) -> bool {
        let inserted = {
            let segments = self.segments.read();
            self.insert_shared(&segments, index, value)
        };
        self.maybe_rebalance();
        inserted
    }

    fn insert_all<I>(&self, index: usize, values: I) -> bool
    where
        I: IntoIterator<Item = T>,
    {
        let mut segments = self.segments.write();

        let mut prefix = 0;
        let mut target = None;
        for (segment, entry) in segments.iter().enumerate() {
            let len = entry.len();
            if index <= prefix + len {
                target = Some((segment, index - prefix));
                break;
            }
            prefix += len;
        }
        let Some((segment, offset)) = target else {
            return false;
        };

        let entry = &mut segments[segment];
        let items = entry.items.get_mut();
        let tail = items.split_off(offset);
        items.extend(values);
        items.extend(tail);
        let oversized = items.len() > self.segment_capacity;
        *entry.len.get_mut() = items.len();

        if oversized {
            let stats = rebalance_segments(&mut segments, self.segment_capacity);
            debug!(splits = stats.splits, segments = stats.segments, "split after bulk insert");
        }
        true
    }

    fn remove_at(&self, index: usize) -> Option<T> {
        let removed = {
            let segments = self.segments.read();
            let (segment, mut items, offset) = lock_index(&segments, index)?;
            self.take_from(&segments, segment, &mut items, offset)
        };
        self.maybe_rebalance();
        Some(removed)
    }

    fn remove_func<F>(&self, mut predicate: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let removed = {
            let segments = self.segments.read();
            let mut removed = 0;
            for segment in segments.iter() {
                let mut items = segment.items.lock();
                let before = items.len();
                items.retain(|value| !predicate(value));
                if items.len() != before {
                    removed += before - items.len();
                    segment.publish_len(&items);
                    if items.is_empty() && segments.len() > 1 {
                        self.request_rebalance();
                    }
                }
            }
            removed
        };
        self.maybe_rebalance();
        removed
    }

    fn sort_by<F>(&self, compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let mut segments = self.segments.write();
        let mut values: Vec<T> = segments
            .drain(..)
            .flat_map(|segment| segment.into_items())
            .collect();
        values.sort_by(compare);

        let half = (self.segment_capacity / 2).max(1);
        *segments = into_segments(values, half);
    }

    fn iter(&self) -> Self::Iter<'_> {
        SegmentedIter {
            list: self,
            position: 0,
            buffer: Vec::new().into_iter(),
            finished: false,
        }
    }

    fn equals(&self, a: &T, b: &T) -> bool {
        (self.equaler)(a, b)
    }

    fn from_vec_like(&self, values: Vec<T>) -> Self {
        SegmentedList {
            segments: RwLock::new(into_segments(values, self.segment_capacity)),
            segment_capacity: self.segment_capacity,
            needs_rebalance: AtomicBool::new(false),
            equaler: self.equaler.clone(),
            options: self.options.clone(),
        }
    }

    fn atomicity(op: SequenceOp) -> Atomicity {
        match op {
            // Single lock acquisition (segment or exclusive directory)
            SequenceOp::Push
            | SequenceOp::PushAll
            | SequenceOp::InsertAll
            | SequenceOp::Clear
            | SequenceOp::Sort => Atomicity::Atomic,

            // Resolve the index, then lock and re-validate
            SequenceOp::Get
            | SequenceOp::Set
            | SequenceOp::First
            | SequenceOp::Last
            | SequenceOp::Insert
            | SequenceOp::RemoveAt
            | SequenceOp::Remove
            | SequenceOp::RemoveFirst
            | SequenceOp::RemoveLast => Atomicity::BestEffort,

            _ => Atomicity::NonAtomic,
        }
    }

    // =========================================================================
    // Overrides
    // =========================================================================

    fn is_empty(&self) -> bool {
        self.segments.read().iter().all(|segment| segment.len() == 0)
    }

    fn to_vec(&self) -> Vec<T> {
        let segments = self.segments.read();
        let mut values = Vec::with_capacity(segments.iter().map(Segment::len).sum());
        for segment in segments.iter() {
            values.extend_from_slice(&segment.items.lock());
        }
        values
    }

    fn first(&self) -> Option<T> {
        let segments = self.segments.read();
        segments
            .iter()
            .find_map(|segment| segment.items.lock().first().cloned())
    }

    fn last(&self) -> Option<T> {
        let segments = self.segments.read();
        segments
            .iter()
            .rev()
            .find_map(|segment| segment.items.lock().last().cloned())
    }

    /// Appends all values under one exclusive directory lock.
    fn push_all<I>(&self, values: I)
    where
        I: IntoIterator<Item = T>,
    {
        let mut values: Vec<T> = values.into_iter().collect();
        if values.is_empty() {
            return;
        }

        let mut segments = self.segments.write();
        if let Some(last) = segments.last_mut() {
            let items = last.items.get_mut();
            let room = self.segment_capacity.saturating_sub(items.len());
            let take = room.min(values.len());
            items.extend(values.drain(..take));
            *last.len.get_mut() = items.len();
        }
        if !values.is_empty() {
            let tail = into_segments(values, self.segment_capacity);
            segments.extend(tail);
        }
    }

    fn remove(&self, value: &T) -> bool {
        let removed = {
            let segments = self.segments.read();
            let mut removed = false;
            for (segment, entry) in segments.iter().enumerate() {
                let mut items = entry.items.lock();
                if let Some(offset) = items.iter().position(|candidate| self.equals(candidate, value)) {
                    self.take_from(&segments, segment, &mut items, offset);
                    removed = true;
                    break;
                }
            }
            removed
        };
        self.maybe_rebalance();
        removed
    }

    fn remove_last(&self) -> Option<T> {
        let removed = {
            let segments = self.segments.read();
            let mut removed = None;
            for (segment, entry) in segments.iter().enumerate().rev() {
                let mut items = entry.items.lock();
                if let Some(value) = items.pop() {
                    if items.is_empty() && segments.len() > 1 {
                        self.request_rebalance();
                    }
                    segments[segment].publish_len(&items);
                    removed = Some(value);
                    break;
                }
            }
            removed
        };
        self.maybe_rebalance();
        removed
    }
}

impl<T: Clone + PartialEq + 'static> Default for SegmentedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for SegmentedList<T> {
    fn clone(&self) -> Self {
        self.from_vec_like(self.to_vec())
    }
}

impl<T: Clone + fmt::Display> fmt::Display for SegmentedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_sequence(f, self.to_vec())
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for SegmentedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentedList")
            .field("segment_capacity", &self.segment_capacity)
            .field("segments", &self.segment_lens())
            .field("values", &self.to_vec())
            .finish()
    }
}

// ============================================================================
// Iterator Support
// ============================================================================

/// Forward iterator that copies out one segment at a time.
///
/// Holds no lock between calls to `next`, so the list may be mutated while
/// iterating. Concurrent writes can cause elements to be skipped or seen twice.
pub struct SegmentedIter<'a, T> {
    list: &'a SegmentedList<T>,
    position: usize,
    buffer: vec::IntoIter<T>,
    finished: bool,
}

impl<T: Clone> SegmentedIter<'_, T> {
    /// Copy the rest of the segment containing `position` into the buffer.
    fn fill(&mut self) -> bool {
        let segments = self.list.segments.read();
        let mut prefix = 0;
        for segment in segments.iter() {
            let items = segment.items.lock();
            if self.position < prefix + items.len() {
                let batch = items[self.position - prefix..].to_vec();
                self.position += batch.len();
                self.buffer = batch.into_iter();
                return true;
            }
            prefix += items.len();
        }
        false
    }
}

impl<T: Clone> Iterator for SegmentedIter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.finished {
            return None;
        }
        if let Some(value) = self.buffer.next() {
            return Some(value);
        }
        if !self.fill() {
            self.finished = true;
            return None;
        }
        self.buffer.next()
    }
}

// ============================================================================
// Tests - Unique to SegmentedList
// ============================================================================
