//! Atomicity classification for concurrent sequence operations.
//!
//! Every concurrent collection documents, per operation, which of three
//! guarantees it gives:
//!
//! ```text
//! Atomic      one logical step; linearizable at a CAS or lock acquisition
//! BestEffort  load-then-modify (e.g. resolve an index, then act on it);
//!             the target may move between the two under contention
//! NonAtomic   bulk scan or iteration over live state; may observe a state
//!             that never existed as one coherent moment
//! ```
//!
//! The classification is queryable so that callers and tests can check a
//! strategy's promise instead of reading its source.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Atomicity {
    Atomic,
    BestEffort,
    NonAtomic,
}

impl Atomicity {
    /// True when the operation takes effect in a single logical step.
    pub fn is_atomic(self) -> bool {
        self == Atomicity::Atomic
    }
}

impl fmt::Display for Atomicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Atomicity::Atomic => "atomic",
            Atomicity::BestEffort => "best-effort",
            Atomicity::NonAtomic => "non-atomic",
        };
        f.write_str(name)
    }
}

/// Operations of the sequence contract, for atomicity queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceOp {
    Len,
    IsEmpty,
    Clear,
    ToVec,
    Get,
    Set,
    First,
    Last,
    Push,
    PushAll,
    Insert,
    InsertAll,
    RemoveAt,
    Remove,
    RemoveFirst,
    RemoveLast,
    RemoveFunc,
    RetainFunc,
    IndexOf,
    LastIndexOf,
    Contains,
    Find,
    FindIndex,
    SubList,
    Reversed,
    Clone,
    Filter,
    Sort,
    Any,
    Every,
    Iterate,
}

impl SequenceOp {
    pub const ALL: [SequenceOp; 31] = [
        SequenceOp::Len,
        SequenceOp::IsEmpty,
        SequenceOp::Clear,
        SequenceOp::ToVec,
        SequenceOp::Get,
        SequenceOp::Set,
        SequenceOp::First,
        SequenceOp::Last,
        SequenceOp::Push,
        SequenceOp::PushAll,
        SequenceOp::Insert,
        SequenceOp::InsertAll,
        SequenceOp::RemoveAt,
        SequenceOp::Remove,
        SequenceOp::RemoveFirst,
        SequenceOp::RemoveLast,
        SequenceOp::RemoveFunc,
        SequenceOp::RetainFunc,
        SequenceOp::IndexOf,
        SequenceOp::LastIndexOf,
        SequenceOp::Contains,
        SequenceOp::Find,
        SequenceOp::FindIndex,
        SequenceOp::SubList,
        SequenceOp::Reversed,
        SequenceOp::Clone,
        SequenceOp::Filter,
        SequenceOp::Sort,
        SequenceOp::Any,
        SequenceOp::Every,
        SequenceOp::Iterate,
    ];

    /// Bulk operations visit every element.
    pub fn is_bulk(self) -> bool {
        matches!(
            self,
            SequenceOp::ToVec
                | SequenceOp::Clear
                | SequenceOp::RemoveFunc
                | SequenceOp::RetainFunc
                | SequenceOp::IndexOf
                | SequenceOp::LastIndexOf
                | SequenceOp::Contains
                | SequenceOp::Find
                | SequenceOp::FindIndex
                | SequenceOp::SubList
                | SequenceOp::Reversed
                | SequenceOp::Clone
                | SequenceOp::Filter
                | SequenceOp::Sort
                | SequenceOp::Any
                | SequenceOp::Every
                | SequenceOp::Iterate
        )
    }
}
