use std::cmp;
use std::fmt;
use std::iter;
use std::marker::PhantomData;
use std::ops::ControlFlow;
use std::ptr;
use std::sync::Arc;
use std::sync::atomic::{AtomicIsize, AtomicPtr, AtomicUsize, Ordering};

use crossbeam_utils::Backoff;
use tracing::{debug, trace};

use crate::config::{ConfigError, Equaler, ListOptions, fail_construction};
use crate::data_structures::atomicity::{Atomicity, SequenceOp};
use crate::data_structures::internal::{MarkedPtr, NodePool};
use crate::data_structures::sequence_collection::{SequenceCollection, fmt_sequence};
use crate::guard::Guard;

type NodePtr<T> = *mut LockFreeNode<T>;

///
/// Lock-free positional list based on Harris's 'A Pragmatic Implementation of
/// Non-Blocking Linked-Lists', with removal split into logical deletion and an
/// explicit physical reclamation pass.
///
// =============================================================================
// LIST STRUCTURE
// =============================================================================
//
// ┌──────┐    ┌──────┐    ┌──────┐    ┌──────┐
// │ HEAD │───►│  a   │───►│  b   │───►│  c   │───► NULL (tail)
// │(sent)│    │      │    │ DEL  │    │      │
// └──────┘    └──────┘    └──────┘    └──────┘
//                            ▲
//                 tombstoned: b.next = (c | DELETE)
//
// The mark on a node's own `next` describes that node. Readers skip marked
// nodes, so `b` above is invisible (live view: [a, c]) until `physical_delete`
// unlinks it.
//
// Node lifecycle:
//
//   Live ──tombstone/set──► LogicallyDeleted ──physical_delete──► Reclaimed
//
// `Reclaimed` means: unlinked by CAS, handed to the guard, and after the
// grace period returned to the node pool (or freed).
//
// =============================================================================
// SET BY FORWARD INSERTION
// =============================================================================
//
// Before:  pred ──► X(old) ──► succ
//
// One CAS on X.next installs the replacement R and kills X at once:
//
//          pred ──► X(old) ══UPDATE══► R(new) ──► succ
//
// A reader either loaded X.next before the CAS (sees X, skips R) or after
// it (skips X, sees R). It never sees both or neither.
//
// =============================================================================
// INVARIANTS
// =============================================================================
//
// 1. HEAD sentinel is never marked or removed.
// 2. Marks are monotonic; a marked node's `next` never changes again, because
//    every CAS on `next` expects an unmarked value.
// 3. Only `physical_delete` unlinks nodes, and each unlinked node is handed to
//    the guard exactly once.
// 4. A node leaves the pool only after no pinned thread can reach it, so a
//    stale CAS can never succeed against a recycled address (no ABA).
// 5. `len` is adjusted after each successful link (+) and tombstone (-); it
//    can lag a concurrent scan but is exact once writers are quiescent.
//
pub struct LockFreeList<T, G: Guard> {
    head: NodePtr<T>,
    len: AtomicIsize,
    pool: Arc<NodePool<LockFreeNode<T>>>,
    cas_failures: AtomicUsize,
    unlinked: AtomicUsize,
    unlinked_replaced: AtomicUsize,
    /// Schedules recycling of unlinked nodes.
    guard: G,
    equaler: Equaler<T>,
    options: ListOptions<T>,
}

struct LockFreeNode<T> {
    data: Option<T>,
    next: AtomicPtr<LockFreeNode<T>>,
}

impl<T> LockFreeNode<T> {
    /// A node without a value: the head sentinel, or a pooled allocation.
    fn vacant() -> Self {
        LockFreeNode {
            data: None,
            next: AtomicPtr::new(ptr::null_mut()),
        }
    }

    // =========================================================================
    // Next pointer accessors
    // =========================================================================

    #[inline]
    fn get_next(&self) -> NodePtr<T> {
        self.next.load(Ordering::Acquire)
    }

    #[inline]
    fn set_next(&self, ptr: NodePtr<T>) {
        self.next.store(ptr, Ordering::Release)
    }

    #[inline]
    fn cas_next(&self, expected: NodePtr<T>, new: NodePtr<T>) -> Result<NodePtr<T>, NodePtr<T>> {
        self.next
            .compare_exchange(expected, new, Ordering::AcqRel, Ordering::Acquire)
    }
}

/// A privately built run of linked nodes, not yet published.
struct Chain<T> {
    first: NodePtr<T>,
    last: NodePtr<T>,
    count: usize,
}

/// Raw node pointer moved into a deferred reclamation action.
struct RetiredNode<T>(NodePtr<T>);

// Safety: a retired node is unreachable and owned solely by its deferred action.
unsafe impl<T: Send> Send for RetiredNode<T> {}

impl<T> RetiredNode<T> {
    fn into_inner(self) -> NodePtr<T> {
        self.0
    }
}

/// Clear a node and hand it back to the pool (or free it).
///
/// # Safety
/// `node` must be unreachable from any list and not referenced by any thread.
unsafe fn recycle_node<T>(pool: &NodePool<LockFreeNode<T>>, node: NodePtr<T>) {
    // Safety: ownership is transferred by the caller
    let mut node = unsafe { Box::from_raw(node) };
    node.data = None;
    *node.next.get_mut() = ptr::null_mut();
    pool.put(node);
}

/// Counters describing a list's contention and reclamation history.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LockFreeStats {
    /// CAS attempts that lost a race and were retried.
    pub cas_failures: usize,
    /// Nodes unlinked by `physical_delete` so far.
    pub unlinked: usize,
    /// Of those, nodes that had been replaced by `set` rather than removed.
    pub unlinked_replaced: usize,
    /// Allocations served from the node pool.
    pub pool_reuses: usize,
    /// Nodes currently sitting in the pool.
    pub pooled: usize,
}

impl<T, G> LockFreeList<T, G>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    G: Guard,
{
    pub fn new() -> Self {
        Self::with_options(ListOptions::native())
    }

    /// Pre-fills the node pool with up to `capacity` allocations.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_options(ListOptions::native().with_capacity(capacity))
    }
}

impl<T, G> LockFreeList<T, G>
where
    T: Clone + Send + Sync + 'static,
    G: Guard,
{
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
        Ok(Self::from_resolved(equaler, options))
    }

    fn from_resolved(equaler: Equaler<T>, options: ListOptions<T>) -> Self {
        let pool = NodePool::new(options.pool_capacity);
        for _ in 0..options.capacity.min(options.pool_capacity) {
            pool.put(Box::new(LockFreeNode::vacant()));
        }

        LockFreeList {
            head: Box::into_raw(Box::new(LockFreeNode::vacant())),
            len: AtomicIsize::new(0),
            pool: Arc::new(pool),
            cas_failures: AtomicUsize::new(0),
            unlinked: AtomicUsize::new(0),
            unlinked_replaced: AtomicUsize::new(0),
            guard: G::default(),
            equaler,
            options,
        }
    }

    /// Get the guard that schedules node reclamation.
    pub fn guard(&self) -> &G {
        &self.guard
    }

    pub fn stats(&self) -> LockFreeStats {
        LockFreeStats {
            cas_failures: self.cas_failures.load(Ordering::Relaxed),
            unlinked: self.unlinked.load(Ordering::Relaxed),
            unlinked_replaced: self.unlinked_replaced.load(Ordering::Relaxed),
            pool_reuses: self.pool.reused(),
            pooled: self.pool.len(),
        }
    }

    /// Unlink every tombstoned node and schedule it for reclamation.
    ///
    /// Returns the number of nodes unlinked. Running it again without
    /// intervening removals returns 0 and changes nothing observable.
    ///
    pub fn physical_delete(&self) -> usize {
        let _guard = G::pin();
        let backoff = Backoff::new();
        let mut unlinked = 0;
        let mut replaced = 0;

        'restart: loop {
            let mut pred = self.head;
            // Safety: head lives as long as the list
            let mut curr = MarkedPtr::unmask(unsafe { (*pred).get_next() });

            while !curr.is_null() {
                // Safety: reachable from head while pinned
                let next = unsafe { (*curr).get_next() };
                if !MarkedPtr::new(next).is_any_marked() {
                    pred = curr;
                    curr = MarkedPtr::unmask(next);
                    continue;
                }

                // curr starts a run of dead nodes; find the first live node after it
                let mut succ = MarkedPtr::unmask(next);
                while !succ.is_null() {
                    // Safety: dead nodes' links are frozen and still pinned
                    let succ_next = unsafe { (*succ).get_next() };
                    if !MarkedPtr::new(succ_next).is_any_marked() {
                        break;
                    }
                    succ = MarkedPtr::unmask(succ_next);
                }

                // Safety: pred was observed live; the CAS fails if it died since
                if unsafe { (*pred).cas_next(curr, succ) }.is_err() {
                    // pred died or gained a new successor
                    self.note_contention(&backoff);
                    continue 'restart;
                }

                let (run, run_replaced) = self.retire_run(curr, succ);
                unlinked += run;
                replaced += run_replaced;
                curr = succ;
            }
            break;
        }

        self.unlinked.fetch_add(unlinked, Ordering::Relaxed);
        self.unlinked_replaced.fetch_add(replaced, Ordering::Relaxed);
        debug!(unlinked, replaced, remaining = self.len(), "physical delete pass");
        unlinked
    }

    /// Hand the unlinked run `[first, end)` to the guard.
    ///
    /// Returns the run length and how many of its nodes were replaced by `set`.
    fn retire_run(&self, first: NodePtr<T>, end: NodePtr<T>) -> (usize, usize) {
        let mut count = 0;
        let mut replaced = 0;
        let mut node = first;
        while node != end {
            // Safety: run nodes are marked, so their links are frozen
            let link = MarkedPtr::new(unsafe { (*node).get_next() });
            debug_assert!(
                link.is_marked() != link.is_update_marked(),
                "dead node must carry exactly one mark"
            );
            if link.is_update_marked() {
                replaced += 1;
            }
            let next = link.as_ptr();

            let pool = Arc::clone(&self.pool);
            let retired = RetiredNode(node);
            // Safety: our CAS unlinked the run, so it is unreachable from head,
            // and each node of the run is visited exactly once
            unsafe {
                self.guard
                    .defer(move || recycle_node(&pool, retired.into_inner()));
            }

            count += 1;
            node = next;
        }
        (count, replaced)
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    fn alloc(&self, value: T) -> NodePtr<T> {
        let mut node = self
            .pool
            .take()
            .unwrap_or_else(|| Box::new(LockFreeNode::vacant()));
        node.data = Some(value);
        *node.next.get_mut() = ptr::null_mut();
        Box::into_raw(node)
    }

    fn build_chain<I>(&self, values: I) -> Option<Chain<T>>
    where
        I: IntoIterator<Item = T>,
    {
        let mut values = values.into_iter();
        let first = self.alloc(values.next()?);
        let mut chain = Chain {
            first,
            last: first,
            count: 1,
        };
        for value in values {
            let node = self.alloc(value);
            // Safety: the chain is private to this thread
            unsafe { (*chain.last).set_next(node) };
            chain.last = node;
            chain.count += 1;
        }
        Some(chain)
    }

    /// Return a chain that was never published.
    fn release_chain(&self, chain: &Chain<T>) {
        let mut node = chain.first;
        loop {
            // Safety: the chain is private to this thread
            let next = unsafe { (*node).get_next() };
            let done = node == chain.last;
            // Safety: never published, so nobody else can reference it
            unsafe { recycle_node(&self.pool, node) };
            if done {
                break;
            }
            node = next;
        }
    }

    fn note_contention(&self, backoff: &Backoff) {
        self.cas_failures.fetch_add(1, Ordering::Relaxed);
        if backoff.is_completed() {
            trace!("lock-free list CAS retry storm");
        }
        backoff.spin();
    }

    // =========================================================================
    // Traversal (callers must be pinned)
    // =========================================================================

    fn first_link(&self) -> NodePtr<T> {
        // Safety: head lives as long as the list and is never marked
        unsafe { (*self.head).get_next() }
    }

    /// The `index`-th live node and its (unmarked) successor link.
    fn live_at(&self, index: usize) -> Option<(NodePtr<T>, NodePtr<T>)> {
        let mut remaining = index;
        let mut curr = MarkedPtr::unmask(self.first_link());
        while !curr.is_null() {
            // Safety: reachable from head while pinned
            let next = unsafe { (*curr).get_next() };
            if !MarkedPtr::new(next).is_any_marked() {
                if remaining == 0 {
                    return Some((curr, next));
                }
                remaining -= 1;
            }
            curr = MarkedPtr::unmask(next);
        }
        None
    }

    /// The last live node (or head) and its successor link.
    ///
    /// The link may point at trailing tombstones; appending before them is fine.
    fn last_live(&self) -> (NodePtr<T>, NodePtr<T>) {
        let mut pred = self.head;
        let mut pred_next = self.first_link();
        let mut curr = MarkedPtr::unmask(pred_next);
        while !curr.is_null() {
            // Safety: reachable from head while pinned
            let next = unsafe { (*curr).get_next() };
            if !MarkedPtr::new(next).is_any_marked() {
                pred = curr;
                pred_next = next;
            }
            curr = MarkedPtr::unmask(next);
        }
        (pred, pred_next)
    }

    /// Predecessor for inserting at `index`, or `None` if out of range.
    fn insert_pred(&self, index: usize) -> Option<(NodePtr<T>, NodePtr<T>)> {
        match index {
            0 => Some((self.head, self.first_link())),
            _ => self.live_at(index - 1),
        }
    }

    /// Visit live nodes in order until `visit` breaks.
    fn scan_live<R, F>(&self, mut visit: F) -> Option<R>
    where
        F: FnMut(NodePtr<T>, &T) -> ControlFlow<R>,
    {
        let mut curr = MarkedPtr::unmask(self.first_link());
        while !curr.is_null() {
            // Safety: reachable from head while pinned
            let node = unsafe { &*curr };
            let next = node.get_next();
            if !MarkedPtr::new(next).is_any_marked() {
                if let Some(value) = node.data.as_ref() {
                    if let ControlFlow::Break(result) = visit(curr, value) {
                        return Some(result);
                    }
                }
            }
            curr = MarkedPtr::unmask(next);
        }
        None
    }

    // =========================================================================
    // Mutation primitives
    // =========================================================================

    /// Link `chain` after the predecessor returned by `locate`, retrying on
    /// contention. Releases the chain and returns false if `locate` fails.
    fn splice<L>(&self, chain: Chain<T>, mut locate: L) -> bool
    where
        L: FnMut() -> Option<(NodePtr<T>, NodePtr<T>)>,
    {
        let backoff = Backoff::new();
        loop {
            let Some((pred, pred_next)) = locate() else {
                self.release_chain(&chain);
                return false;
            };

            // Safety: chain is private until the CAS below succeeds
            unsafe { (*chain.last).set_next(pred_next) };

            // Safety: pred was reached while pinned; fails if pred died
            match unsafe { (*pred).cas_next(pred_next, chain.first) } {
                Ok(_) => {
                    self.len.fetch_add(chain.count as isize, Ordering::Relaxed);
                    return true;
                }
                Err(_) => self.note_contention(&backoff),
            }
        }
    }

    /// Flip the DELETE mark onto `node`.
    ///
    /// Returns false if another thread killed it first.
    fn tombstone(&self, node: NodePtr<T>) -> bool {
        loop {
            // Safety: node was reached while pinned
            let next = unsafe { (*node).get_next() };
            let current = MarkedPtr::new(next);
            if current.is_any_marked() {
                return false;
            }

            let marked = current.with_mark();
            // Safety: as above
            if unsafe { (*node).cas_next(next, marked.as_raw()) }.is_ok() {
                self.len.fetch_sub(1, Ordering::Relaxed);
                return true;
            }

            // A node was linked right after `node`; it is still live
            self.cas_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn value_of(node: NodePtr<T>) -> Option<T> {
        // Safety: node was reached while pinned; data never changes after publication
        unsafe { (*node).data.clone() }
    }
}

impl<T, G> SequenceCollection<T> for LockFreeList<T, G>
where
    T: Clone + Send + Sync + 'static,
    G: Guard,
{
    type Iter<'a>
        = LockFreeIter<'a, T, G>
    where
        Self: 'a;

    /// Approximate counter; exact once concurrent writers are done.
    fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed).max(0) as usize
    }

    /// Tombstones every live node. Memory is reclaimed by `physical_delete`.
    fn clear(&self) {
        let _guard = G::pin();
        self.scan_live::<(), _>(|node, _| {
            self.tombstone(node);
            ControlFlow::Continue(())
        });
    }

    fn get(&self, index: usize) -> Option<T> {
        let _guard = G::pin();
        let (node, _) = self.live_at(index)?;
        Self::value_of(node)
    }

    fn set(&self, index: usize, value: T) -> Option<T> {
        let _guard = G::pin();
        let replacement = self.alloc(value);
        let backoff = Backoff::new();

        loop {
            let Some((node, next)) = self.live_at(index) else {
                self.release_chain(&Chain {
                    first: replacement,
                    last: replacement,
                    count: 1,
                });
                return None;
            };

            // Safety: replacement is private until the CAS succeeds
            unsafe { (*replacement).set_next(next) };
            let marked = MarkedPtr::new(replacement).with_update_mark();

            // Safety: node was reached while pinned
            if unsafe { (*node).cas_next(next, marked.as_raw()) }.is_ok() {
                return Self::value_of(node);
            }
            self.note_contention(&backoff);
        }
    }

    fn push(&self, value: T) {
        let _guard = G::pin();
        if let Some(chain) = self.build_chain(iter::once(value)) {
            self.splice(chain, || Some(self.last_live()));
        }
    }

    fn insert(&self, index: usize, value: T) -> bool {
        let _guard = G::pin();
        match self.build_chain(iter::once(value)) {
            Some(chain) => self.splice(chain, || self.insert_pred(index)),
            None => false,
        }
    }

    /// Links all values with a single CAS.
    fn insert_all<I>(&self, index: usize, values: I) -> bool
    where
        I: IntoIterator<Item = T>,
    {
        let _guard = G::pin();
        match self.build_chain(values) {
            Some(chain) => self.splice(chain, || self.insert_pred(index)),
            None => self.insert_pred(index).is_some(),
        }
    }

    /// Returns `None` if the index is out of range or another remover won.
    fn remove_at(&self, index: usize) -> Option<T> {
        let _guard = G::pin();
        let (node, _) = self.live_at(index)?;
        if self.tombstone(node) {
            Self::value_of(node)
        } else {
            None
        }
    }

    fn remove_func<F>(&self, mut predicate: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let _guard = G::pin();
        let mut removed = 0;
        self.scan_live::<(), _>(|node, value| {
            if predicate(value) && self.tombstone(node) {
                removed += 1;
            }
            ControlFlow::Continue(())
        });
        removed
    }

    /// Tombstones the current contents, sorts the values it won, and links
    /// them back at the front as one chain.
    fn sort_by<F>(&self, compare: F)
    where
        F: FnMut(&T, &T) -> cmp::Ordering,
    {
        let _guard = G::pin();
        let mut values = Vec::with_capacity(self.len());
        self.scan_live::<(), _>(|node, value| {
            if self.tombstone(node) {
                values.push(value.clone());
            }
            ControlFlow::Continue(())
        });

        values.sort_by(compare);
        if let Some(chain) = self.build_chain(values) {
            self.splice(chain, || self.insert_pred(0));
        }
    }

    fn iter(&self) -> Self::Iter<'_> {
        let guard = G::pin();
        LockFreeIter {
            _guard: guard,
            curr: MarkedPtr::unmask(self.first_link()),
            _list: PhantomData,
        }
    }

    fn equals(&self, a: &T, b: &T) -> bool {
        (self.equaler)(a, b)
    }

    fn from_vec_like(&self, values: Vec<T>) -> Self {
        let list = Self::from_resolved(Arc::clone(&self.equaler), self.options.clone());
        list.push_all(values);
        list
    }

    fn atomicity(op: SequenceOp) -> Atomicity {
        match op {
            // One successful CAS
            SequenceOp::Push
            | SequenceOp::PushAll
            | SequenceOp::InsertAll
            | SequenceOp::Remove => Atomicity::Atomic,

            // Walk to a position, then CAS there
            SequenceOp::Len
            | SequenceOp::IsEmpty
            | SequenceOp::Get
            | SequenceOp::Set
            | SequenceOp::First
            | SequenceOp::Last
            | SequenceOp::Insert
            | SequenceOp::RemoveAt
            | SequenceOp::RemoveFirst
            | SequenceOp::RemoveLast => Atomicity::BestEffort,

            _ => Atomicity::NonAtomic,
        }
    }

    // =========================================================================
    // Overrides
    // =========================================================================

    fn is_empty(&self) -> bool {
        let _guard = G::pin();
        self.live_at(0).is_none()
    }

    fn first(&self) -> Option<T> {
        self.get(0)
    }

    fn last(&self) -> Option<T> {
        let _guard = G::pin();
        let (node, _) = self.last_live();
        if node == self.head {
            return None;
        }
        Self::value_of(node)
    }

    /// Links all values with a single CAS.
    fn push_all<I>(&self, values: I)
    where
        I: IntoIterator<Item = T>,
    {
        let _guard = G::pin();
        if let Some(chain) = self.build_chain(values) {
            self.splice(chain, || Some(self.last_live()));
        }
    }

    /// Tombstones the first matching live node. A node lost to a concurrent
    /// remover is skipped and the scan continues.
    fn remove(&self, value: &T) -> bool {
        let _guard = G::pin();
        self.scan_live(|node, candidate| {
            if self.equals(candidate, value) && self.tombstone(node) {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .is_some()
    }

    fn remove_first(&self) -> Option<T> {
        let _guard = G::pin();
        self.scan_live(|node, value| {
            if self.tombstone(node) {
                ControlFlow::Break(value.clone())
            } else {
                ControlFlow::Continue(())
            }
        })
    }

    fn remove_last(&self) -> Option<T> {
        let _guard = G::pin();
        let backoff = Backoff::new();
        loop {
            let (node, _) = self.last_live();
            if node == self.head {
                return None;
            }
            if self.tombstone(node) {
                return Self::value_of(node);
            }
            self.note_contention(&backoff);
        }
    }
}

impl<T, G> Default for LockFreeList<T, G>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    G: Guard,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, G> Clone for LockFreeList<T, G>
where
    T: Clone + Send + Sync + 'static,
    G: Guard,
{
    fn clone(&self) -> Self {
        self.from_vec_like(self.to_vec())
    }
}

impl<T, G> fmt::Display for LockFreeList<T, G>
where
    T: Clone + Send + Sync + fmt::Display + 'static,
    G: Guard,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_sequence(f, self.iter())
    }
}

impl<T, G> fmt::Debug for LockFreeList<T, G>
where
    T: Clone + Send + Sync + fmt::Debug + 'static,
    G: Guard,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, G: Guard> Drop for LockFreeList<T, G> {
    fn drop(&mut self) {
        // Safety: &mut self, so no operation is in flight. Every node still
        // linked from head (live or tombstoned) is owned by the list; unlinked
        // nodes belong to their deferred actions.
        let mut curr = self.head;
        debug_assert!(
            // Safety: as above
            !MarkedPtr::new(unsafe { (*curr).get_next() }).is_any_marked(),
            "head sentinel must never be marked"
        );
        while !curr.is_null() {
            // Safety: as above
            let mut node = unsafe { Box::from_raw(curr) };
            curr = MarkedPtr::unmask(*node.next.get_mut());
        }
    }
}

// Safety: nodes are only shared through CAS-protected links and the guard
// delays reclamation, so the list is as thread-safe as its elements.
unsafe impl<T: Send + Sync, G: Guard> Send for LockFreeList<T, G> {}
unsafe impl<T: Send + Sync, G: Guard> Sync for LockFreeList<T, G> {}

// ============================================================================
// Iterator Support
// ============================================================================

/// Iterator over the live nodes of a [`LockFreeList`].
///
/// Holds a pinned read guard for its whole lifetime so the nodes it walks
/// cannot be recycled underneath it. Nodes linked or tombstoned during the
/// walk may or may not be observed.
pub struct LockFreeIter<'a, T, G: Guard> {
    _guard: G::ReadGuard,
    curr: NodePtr<T>,
    _list: PhantomData<&'a LockFreeList<T, G>>,
}

impl<T: Clone, G: Guard> Iterator for LockFreeIter<'_, T, G> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        while !self.curr.is_null() {
            // Safety: the read guard keeps every node reached from head alive
            let node = unsafe { &*self.curr };
            let next = node.get_next();
            self.curr = MarkedPtr::unmask(next);
            if !MarkedPtr::new(next).is_any_marked() {
                return node.data.clone();
            }
        }
        None
    }
}

// ============================================================================
// Tests - Unique to LockFreeList
// ============================================================================
// Note: Common tests are in tests/sequence_collection_tests.rs
