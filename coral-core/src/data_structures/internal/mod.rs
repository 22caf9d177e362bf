//! Internal implementation details.
//!
//! These are pub(crate) and not intended for external use.

pub mod marked_ptr;
pub mod node_pool;

pub(crate) use marked_ptr::MarkedPtr;
pub(crate) use node_pool::NodePool;
