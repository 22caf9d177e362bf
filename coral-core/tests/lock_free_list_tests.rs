use std::sync::{Arc, Barrier};
use std::thread;

use serial_test::serial;

use coral_core::{DeferredGuard, ListOptions, LockFreeList, SequenceCollection};

type List<T> = LockFreeList<T, DeferredGuard>;

#[test]
fn physical_delete_is_idempotent() {
    let list: List<i32> = List::new();
    list.push_all(0..100);
    assert_eq!(list.remove_func(|value| value % 3 == 0), 34);

    assert_eq!(list.physical_delete(), 34);
    assert_eq!(list.physical_delete(), 0);
    assert_eq!(list.len(), 66);
    assert!(list.iter().all(|value| value % 3 != 0));
}

#[test]
fn unlinked_nodes_are_counted() {
    let list: List<i32> = List::with_options(ListOptions::native().with_pool_capacity(0));
    list.push_all(0..10);
    list.remove_first();
    list.remove_last();
    list.physical_delete();

    let stats = list.stats();
    assert_eq!(stats.unlinked, 2);
    assert_eq!(stats.pooled, 0);
}

#[test]
#[serial(stress_tests)]
fn concurrent_remove_func_partitions() {
    let list = Arc::new(List::<usize>::new());
    list.push_all(0..4000);
    let num_threads = 4;
    let barrier = Arc::new(Barrier::new(num_threads));

    // Thread t removes values congruent to t; the partitions are disjoint
    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let list = Arc::clone(&list);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let removed = list.remove_func(|value| value % 8 == thread_id);
                list.physical_delete();
                removed
            })
        })
        .collect();

    let removed: usize = handles.into_iter().map(|handle| handle.join().unwrap()).sum();
    list.physical_delete();

    assert_eq!(removed, 2000);
    assert_eq!(list.len(), 2000);
    let remaining = list.to_vec();
    assert_eq!(remaining.len(), 2000);
    assert!(remaining.iter().all(|value| value % 8 >= 4));
    assert!(remaining.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(list.physical_delete(), 0);
}

#[test]
#[serial(stress_tests)]
fn concurrent_physical_delete_with_pushes() {
    let list = Arc::new(List::<usize>::new());
    let num_threads = 4;

    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let list = Arc::clone(&list);
            thread::spawn(move || {
                let mut reclaimed = 0;
                for i in 0..500 {
                    list.push(thread_id * 1000 + i);
                    if i % 3 == 0 {
                        list.remove(&(thread_id * 1000 + i));
                    }
                    if i % 50 == 0 {
                        reclaimed += list.physical_delete();
                    }
                }
                reclaimed
            })
        })
        .collect();

    let reclaimed: usize = handles.into_iter().map(|handle| handle.join().unwrap()).sum();
    let reclaimed = reclaimed + list.physical_delete();

    // 167 values per thread are divisible by 3 in 0..500
    assert_eq!(reclaimed, num_threads * 167);
    assert_eq!(list.len(), num_threads * 333);
    assert_eq!(list.iter().count(), num_threads * 333);
}
