//! Deferred guard implementation for testing.
//!
//! This module provides `DeferredGuard`, a simple guard implementation that
//! defers all reclamation until the guard is dropped.

use parking_lot::Mutex;

use super::Guard;

type DeferredAction = Box<dyn FnOnce() + Send>;

/// A simple guard that defers all reclamation until the guard is dropped.
///
/// This is useful for testing where you want predictable reclamation timing:
/// an unlinked node is never recycled while the owning collection is alive,
/// so any use-after-unlink bug reads stale-but-valid memory instead of a
/// reused node.
/// Not suitable for production use in long-running applications as memory
/// will accumulate until the guard is dropped.
///
/// # Thread Safety
///
/// `DeferredGuard` uses a `Mutex` internally to safely collect actions from
/// multiple threads. The actions run when the guard is dropped.
///
pub struct DeferredGuard {
    deferred: Mutex<Vec<DeferredAction>>,
}

impl DeferredGuard {
    /// Create a new deferred guard.
    pub fn new() -> Self {
        DeferredGuard {
            deferred: Mutex::new(Vec::new()),
        }
    }

    /// Number of actions waiting for the guard to drop.
    pub fn pending(&self) -> usize {
        self.deferred.lock().len()
    }
}

impl Default for DeferredGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DeferredGuard {
    fn drop(&mut self) {
        let actions = self.deferred.get_mut();
        for action in actions.drain(..) {
            action();
        }
    }
}

impl Guard for DeferredGuard {
    /// For DeferredGuard, ReadGuard is a no-op since all nodes are protected
    /// until the collection's stored guard drops.
    type ReadGuard = ();

    fn pin() -> Self::ReadGuard {
        // No-op for DeferredGuard - protection is provided by the stored guard
    }

    unsafe fn defer<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.deferred.lock().push(Box::new(action));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_deferred_guard_basic() {
        let guard = DeferredGuard::default();

        // Create some test data
        let boxed = Box::new(42i32);
        let ptr = Box::into_raw(boxed) as usize;

        // Defer destruction
        unsafe {
            guard.defer(move || {
                drop(Box::from_raw(ptr as *mut i32));
            });
        }

        assert_eq!(guard.pending(), 1);
        // Guard dropped here, box should be freed
    }

    #[test]
    fn test_actions_run_on_drop() {
        let ran = Arc::new(AtomicUsize::new(0));
        let guard = DeferredGuard::default();

        for _ in 0..10 {
            let ran = Arc::clone(&ran);
            unsafe {
                guard.defer(move || {
                    ran.fetch_add(1, Ordering::Relaxed);
                });
            }
        }

        // Nothing runs while the guard is alive
        assert_eq!(ran.load(Ordering::Relaxed), 0);
        assert_eq!(guard.pending(), 10);

        drop(guard);
        assert_eq!(ran.load(Ordering::Relaxed), 10);
    }

    #[test]
    fn test_pin_is_noop() {
        let _guard = DeferredGuard::pin(); // ReadGuard is ()
    }
}
