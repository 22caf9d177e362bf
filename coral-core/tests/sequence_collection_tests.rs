use std::fmt::Display;

use rstest::rstest;

use coral_core::common_tests::sequence_core_tests::*;
use coral_core::{
    CopyOnWriteList, DeferredGuard, ListOptions, LockFreeList, SegmentedList, SequenceCollection,
};

// Trait for type-level parametrization
trait TestSequenceCollection {
    type CollectionType: SequenceCollection<i32> + Default + Clone + Display;

    /// Fresh collection; overridable to exercise non-default configurations.
    fn create() -> Self::CollectionType {
        Self::CollectionType::default()
    }
}

// Marker types for each collection
struct UseCopyOnWriteList;
struct UseSegmentedList;
struct UseSmallSegments;
struct UseLockFreeList;

impl TestSequenceCollection for UseCopyOnWriteList {
    type CollectionType = CopyOnWriteList<i32>;
}

impl TestSequenceCollection for UseSegmentedList {
    type CollectionType = SegmentedList<i32>;
}

impl TestSequenceCollection for UseSmallSegments {
    type CollectionType = SegmentedList<i32>;

    // Two elements per segment puts nearly every index on a boundary
    fn create() -> Self::CollectionType {
        SegmentedList::with_options(ListOptions::native().with_segment_capacity(2))
    }
}

impl TestSequenceCollection for UseLockFreeList {
    type CollectionType = LockFreeList<i32, DeferredGuard>;
}

#[rstest]
#[case::copy_on_write(UseCopyOnWriteList)]
#[case::segmented(UseSegmentedList)]
#[case::small_segments(UseSmallSegments)]
#[case::lock_free(UseLockFreeList)]
fn basic_operations<T: TestSequenceCollection>(#[case] _type: T) {
    test_basic_operations(&T::create());
}

#[rstest]
#[case::copy_on_write(UseCopyOnWriteList)]
#[case::segmented(UseSegmentedList)]
#[case::small_segments(UseSmallSegments)]
#[case::lock_free(UseLockFreeList)]
fn empty_collection<T: TestSequenceCollection>(#[case] _type: T) {
    test_empty_collection(&T::create());
}

#[rstest]
#[case::copy_on_write(UseCopyOnWriteList)]
#[case::segmented(UseSegmentedList)]
#[case::small_segments(UseSmallSegments)]
#[case::lock_free(UseLockFreeList)]
fn positional_insert<T: TestSequenceCollection>(#[case] _type: T) {
    test_positional_insert(&T::create());
}

#[rstest]
#[case::copy_on_write(UseCopyOnWriteList)]
#[case::segmented(UseSegmentedList)]
#[case::small_segments(UseSmallSegments)]
#[case::lock_free(UseLockFreeList)]
fn removals<T: TestSequenceCollection>(#[case] _type: T) {
    test_removals(&T::create());
}

#[rstest]
#[case::copy_on_write(UseCopyOnWriteList)]
#[case::segmented(UseSegmentedList)]
#[case::small_segments(UseSmallSegments)]
#[case::lock_free(UseLockFreeList)]
fn remove_first_occurrence<T: TestSequenceCollection>(#[case] _type: T) {
    test_remove_first_occurrence(&T::create());
}

#[rstest]
#[case::copy_on_write(UseCopyOnWriteList)]
#[case::segmented(UseSegmentedList)]
#[case::small_segments(UseSmallSegments)]
#[case::lock_free(UseLockFreeList)]
fn search<T: TestSequenceCollection>(#[case] _type: T) {
    test_search(&T::create());
}

#[rstest]
#[case::copy_on_write(UseCopyOnWriteList)]
#[case::segmented(UseSegmentedList)]
#[case::small_segments(UseSmallSegments)]
#[case::lock_free(UseLockFreeList)]
fn derived_collections<T: TestSequenceCollection>(#[case] _type: T) {
    test_derived_collections(&T::create());
}

#[rstest]
#[case::copy_on_write(UseCopyOnWriteList)]
#[case::segmented(UseSegmentedList)]
#[case::small_segments(UseSmallSegments)]
#[case::lock_free(UseLockFreeList)]
fn sort<T: TestSequenceCollection>(#[case] _type: T) {
    test_sort(&T::create());
}

#[rstest]
#[case::copy_on_write(UseCopyOnWriteList)]
#[case::segmented(UseSegmentedList)]
#[case::small_segments(UseSmallSegments)]
#[case::lock_free(UseLockFreeList)]
fn display<T: TestSequenceCollection>(#[case] _type: T) {
    test_display(&T::create());
}

#[rstest]
#[case::copy_on_write(UseCopyOnWriteList)]
#[case::segmented(UseSegmentedList)]
#[case::small_segments(UseSmallSegments)]
#[case::lock_free(UseLockFreeList)]
fn insert_matches_reference<T: TestSequenceCollection>(#[case] _type: T) {
    test_insert_matches_reference(&T::create());
}

// ============================================================================
// Custom equality
// ============================================================================

fn same_ignoring_case(a: &String, b: &String) -> bool {
    a.eq_ignore_ascii_case(b)
}

#[test]
fn case_insensitive_copy_on_write() {
    test_case_insensitive_equaler(&CopyOnWriteList::with_equaler(same_ignoring_case));
}

#[test]
fn case_insensitive_segmented() {
    test_case_insensitive_equaler(&SegmentedList::with_equaler(same_ignoring_case));
}

#[test]
fn case_insensitive_lock_free() {
    let list: LockFreeList<String, DeferredGuard> = LockFreeList::with_equaler(same_ignoring_case);
    test_case_insensitive_equaler(&list);
}

// ============================================================================
// Boundary inserts on 4-element segments
// ============================================================================

#[test]
fn segmented_boundary_insert_shifts_following_indices() {
    let reference: Vec<i32> = (0..1000).collect();

    for k in [4, 8, 400, 996, 1000] {
        let list = SegmentedList::with_options(ListOptions::native().with_segment_capacity(4));
        list.push_all(reference.clone());
        assert!(list.segment_lens().iter().all(|len| *len == 4));

        assert!(list.insert(k, -1));

        let mut expected = reference.clone();
        expected.insert(k, -1);
        assert_eq!(list.get(k), Some(-1));
        for index in k + 1..expected.len() {
            assert_eq!(list.get(index), Some(expected[index]), "index {} after insert at {}", index, k);
        }
        assert_eq!(list.to_vec(), expected);
    }
}
