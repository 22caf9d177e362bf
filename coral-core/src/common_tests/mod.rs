//! Reusable test bodies shared by every [`SequenceCollection`] strategy.
//!
//! Each function is generic over the collection type and is driven from the
//! integration tests with one `rstest` case per strategy.
//!
//! [`SequenceCollection`]: crate::data_structures::SequenceCollection
