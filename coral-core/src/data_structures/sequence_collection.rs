use std::cmp::Ordering;
use std::fmt;
use std::iter::Rev;
use std::vec;

use crate::data_structures::atomicity::{Atomicity, SequenceOp};

/// An ordered sequence with positional access under concurrent mutation.
///
/// # Type Parameters
///
/// - `T`: The element type. Reads hand out clones, never references, so a
///   value can be returned after a concurrent writer has already replaced
///   or removed it.
///
/// # Design
///
/// The trait combines a small set of required primitives with default
/// high-level methods derived from them. Each strategy overrides the
/// defaults where it can give a stronger guarantee:
///
/// ```text
/// CopyOnWriteList<i32>                 - every read answered from one snapshot
/// SegmentedList<i32>                   - per-segment locking, parallel writers
/// LockFreeList<i32, EpochGuard>        - CAS + tombstones, never blocks
/// ```
///
/// # Absence
///
/// Lookups and removals return `Option`/`bool`. `None` means "not present"
/// or "index invalid", never a fault. Losing a race against another remover
/// is reported the same way.
///
/// # Atomicity
///
/// Which guarantee each operation gives is strategy-specific and queryable
/// through [`SequenceCollection::atomicity`].
///
pub trait SequenceCollection<T: Clone> {
    /// Forward iterator yielding owned values.
    type Iter<'a>: Iterator<Item = T>
    where
        Self: 'a;

    // =========================================================================
    // Required primitives
    // =========================================================================

    /// Returns the number of elements.
    fn len(&self) -> usize;

    /// Removes every element.
    fn clear(&self);

    /// Returns the element at `index`.
    fn get(&self, index: usize) -> Option<T>;

    /// Replaces the element at `index`, returning the previous value.
    fn set(&self, index: usize, value: T) -> Option<T>;

    /// Appends a value.
    fn push(&self, value: T);

    /// Inserts a value at `index` (`0..=len`).
    ///
    /// Returns `false` when `index` is out of range; the value is dropped.
    fn insert(&self, index: usize, value: T) -> bool;

    /// Inserts all values, in order, starting at `index` (`0..=len`).
    ///
    /// Returns `false` when `index` is out of range; nothing is inserted.
    fn insert_all<I>(&self, index: usize, values: I) -> bool
    where
        I: IntoIterator<Item = T>;

    /// Removes and returns the element at `index`.
    fn remove_at(&self, index: usize) -> Option<T>;

    /// Removes every element matching `predicate`, returning how many were removed.
    fn remove_func<F>(&self, predicate: F) -> usize
    where
        F: FnMut(&T) -> bool;

    /// Stable in-place sort.
    fn sort_by<F>(&self, compare: F)
    where
        F: FnMut(&T, &T) -> Ordering;

    /// Returns a forward iterator.
    fn iter(&self) -> Self::Iter<'_>;

    /// Compare two values with the collection's configured equality.
    fn equals(&self, a: &T, b: &T) -> bool;

    /// Build a new, independent collection with this collection's
    /// configuration holding `values`.
    fn from_vec_like(&self, values: Vec<T>) -> Self
    where
        Self: Sized;

    /// The guarantee this strategy gives for `op`.
    fn atomicity(op: SequenceOp) -> Atomicity
    where
        Self: Sized;

    // =========================================================================
    // Derived operations
    // =========================================================================

    /// Returns true if the collection is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Collects all elements into a Vec.
    fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    fn first(&self) -> Option<T> {
        self.iter().next()
    }

    fn last(&self) -> Option<T> {
        self.iter().last()
    }

    /// Appends all values, in order.
    fn push_all<I>(&self, values: I)
    where
        I: IntoIterator<Item = T>,
    {
        for value in values {
            self.push(value);
        }
    }

    /// Removes the first element equal to `value`.
    ///
    /// Returns `true` if an element was removed, `false` if not found.
    fn remove(&self, value: &T) -> bool {
        match self.index_of(value) {
            Some(index) => self.remove_at(index).is_some(),
            None => false,
        }
    }

    fn remove_first(&self) -> Option<T> {
        self.remove_at(0)
    }

    fn remove_last(&self) -> Option<T> {
        let len = self.len();
        len.checked_sub(1).and_then(|index| self.remove_at(index))
    }

    /// Keeps only the elements matching `predicate`, returning how many were removed.
    fn retain_func<F>(&self, mut predicate: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        self.remove_func(|value| !predicate(value))
    }

    fn index_of(&self, value: &T) -> Option<usize> {
        self.iter().position(|candidate| self.equals(&candidate, value))
    }

    fn last_index_of(&self, value: &T) -> Option<usize> {
        let mut found = None;
        for (index, candidate) in self.iter().enumerate() {
            if self.equals(&candidate, value) {
                found = Some(index);
            }
        }
        found
    }

    fn contains(&self, value: &T) -> bool {
        self.index_of(value).is_some()
    }

    /// Returns the first element matching `predicate`.
    fn find<F>(&self, mut predicate: F) -> Option<T>
    where
        F: FnMut(&T) -> bool,
    {
        self.iter().find(|value| predicate(value))
    }

    /// Returns the index of the first element matching `predicate`.
    fn find_index<F>(&self, mut predicate: F) -> Option<usize>
    where
        F: FnMut(&T) -> bool,
    {
        self.iter().position(|value| predicate(&value))
    }

    /// A new collection holding the elements in `[from, to)`.
    ///
    /// Returns `None` if the range is invalid.
    fn sub_list(&self, from: usize, to: usize) -> Option<Self>
    where
        Self: Sized,
    {
        let values = self.to_vec();
        if from > to || to > values.len() {
            return None;
        }
        Some(self.from_vec_like(values[from..to].to_vec()))
    }

    /// Iterates the elements back to front.
    fn reversed(&self) -> Rev<vec::IntoIter<T>> {
        self.to_vec().into_iter().rev()
    }

    /// A new collection holding the elements matching `predicate`.
    fn filter<F>(&self, mut predicate: F) -> Self
    where
        Self: Sized,
        F: FnMut(&T) -> bool,
    {
        let values = self.iter().filter(|value| predicate(value)).collect();
        self.from_vec_like(values)
    }

    /// Stable in-place sort by the natural order.
    fn sort(&self)
    where
        T: Ord,
    {
        self.sort_by(|a, b| a.cmp(b));
    }

    fn any<F>(&self, mut predicate: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        self.iter().any(|value| predicate(&value))
    }

    fn every<F>(&self, mut predicate: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        self.iter().all(|value| predicate(&value))
    }
}

/// Formats values as `[a, b, c]`.
pub(crate) fn fmt_sequence<T, I>(f: &mut fmt::Formatter<'_>, values: I) -> fmt::Result
where
    T: fmt::Display,
    I: IntoIterator<Item = T>,
{
    f.write_str("[")?;
    for (index, value) in values.into_iter().enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", value)?;
    }
    f.write_str("]")
}
