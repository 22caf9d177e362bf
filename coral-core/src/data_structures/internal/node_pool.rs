use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_queue::ArrayQueue;

/// Bounded pool of node allocations for reuse.
///
/// The pool only ever holds nodes that nobody can reach: fresh nodes that
/// never got linked, or unlinked nodes whose guard grace period has passed.
/// That is what makes reuse ABA-safe; the pool itself performs no checks.
///
/// A pool with capacity `0` is disabled: `take` always misses and `put`
/// frees the node.
///
pub(crate) struct NodePool<N> {
    free: Option<ArrayQueue<Box<N>>>,
    reused: AtomicUsize,
}

impl<N> NodePool<N> {
    pub(crate) fn new(capacity: usize) -> Self {
        NodePool {
            free: (capacity > 0).then(|| ArrayQueue::new(capacity)),
            reused: AtomicUsize::new(0),
        }
    }

    /// Take a recycled node, if one is available.
    pub(crate) fn take(&self) -> Option<Box<N>> {
        let node = self.free.as_ref()?.pop()?;
        self.reused.fetch_add(1, Ordering::Relaxed);
        Some(node)
    }

    /// Return a node to the pool. Frees it when the pool is full or disabled.
    ///
    /// Returns `true` if the node was kept.
    pub(crate) fn put(&self, node: Box<N>) -> bool {
        match &self.free {
            Some(free) => free.push(node).is_ok(),
            None => false,
        }
    }

    /// Number of nodes currently pooled.
    pub(crate) fn len(&self) -> usize {
        self.free.as_ref().map_or(0, |free| free.len())
    }

    /// Number of allocations served from the pool so far.
    pub(crate) fn reused(&self) -> usize {
        self.reused.load(Ordering::Relaxed)
    }
}
