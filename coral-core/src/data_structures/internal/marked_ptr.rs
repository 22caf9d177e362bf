// Marked pointer operations using two LSBs as mark bits.
//
// The mark lives on a node's own `next` field and describes that node:
//
//   Bit 0: DELETE_MARK - node is tombstoned (logically removed from list)
//   Bit 1: UPDATE_MARK - node was replaced by `set`; `next` points at the replacement
//
// Mark combinations:
//   0b00 (0): Live node
//   0b01 (1): DELETE-marked - logically deleted, awaiting physical_delete
//   0b10 (2): UPDATE-marked - logically replaced, awaiting physical_delete
//   0b11 (3): Invalid (a marked node is never marked again)
//
// Marks are monotonic: once set they are never cleared, and a marked node's
// successor never changes, because every CAS on `next` expects an unmarked value.
//
const DELETE_MARK: usize = 0b01;
const UPDATE_MARK: usize = 0b10;
const ALL_MARKS: usize = 0b11;

/// A pointer that uses the two least significant bits as mark flags.
#[derive(Copy, Clone)]
pub(crate) struct MarkedPtr<T> {
    ptr: *mut T,
}

impl<T> MarkedPtr<T> {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Create a new MarkedPtr from a (possibly marked) pointer.
    #[inline]
    pub(crate) fn new(ptr: *mut T) -> Self {
        MarkedPtr { ptr }
    }

    /// Strip mark bits from a raw pointer without creating a MarkedPtr instance.
    #[inline]
    pub(crate) fn unmask(ptr: *mut T) -> *mut T {
        (ptr as usize & !ALL_MARKS) as *mut T
    }

    // =========================================================================
    // Extraction
    // =========================================================================

    /// Get the clean pointer without mark bits (the one you dereference).
    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut T {
        (self.ptr as usize & !ALL_MARKS) as *mut T
    }

    /// Get the raw pointer with mark bits intact (for CAS operations).
    #[inline]
    pub(crate) fn as_raw(&self) -> *mut T {
        self.ptr
    }

    // =========================================================================
    // Predicates
    // =========================================================================

    /// Check if DELETE-marked (bit 0).
    #[inline]
    pub(crate) fn is_marked(&self) -> bool {
        (self.ptr as usize & DELETE_MARK) != 0
    }

    /// Check if UPDATE-marked (bit 1).
    #[inline]
    pub(crate) fn is_update_marked(&self) -> bool {
        (self.ptr as usize & UPDATE_MARK) != 0
    }

    /// Check if any mark bit is set.
    #[inline]
    pub(crate) fn is_any_marked(&self) -> bool {
        (self.ptr as usize & ALL_MARKS) != 0
    }

    // =========================================================================
    // Transformers
    // =========================================================================

    /// Create DELETE-marked version of this pointer.
    #[inline]
    pub(crate) fn with_mark(&self) -> Self {
        MarkedPtr {
            ptr: (self.as_ptr() as usize | DELETE_MARK) as *mut T,
        }
    }

    /// Create UPDATE-marked version of this pointer.
    #[inline]
    pub(crate) fn with_update_mark(&self) -> Self {
        MarkedPtr {
            ptr: (self.as_ptr() as usize | UPDATE_MARK) as *mut T,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marks_are_independent_of_address() {
        let boxed = Box::into_raw(Box::new(7u64));
        let clean = MarkedPtr::new(boxed);
        assert!(!clean.is_any_marked());

        let deleted = clean.with_mark();
        assert!(deleted.is_marked());
        assert!(!deleted.is_update_marked());
        assert_eq!(deleted.as_ptr(), boxed);
        assert_ne!(deleted.as_raw(), boxed);

        let updated = clean.with_update_mark();
        assert!(updated.is_update_marked());
        assert!(!updated.is_marked());
        assert_eq!(MarkedPtr::unmask(updated.as_raw()), boxed);

        unsafe { drop(Box::from_raw(boxed)) };
    }

    #[test]
    fn test_null_can_be_marked() {
        let null: *mut u64 = std::ptr::null_mut();
        let marked = MarkedPtr::new(null).with_mark();
        assert!(marked.is_marked());
        assert!(marked.as_ptr().is_null());
    }
}
