//! Benchmark comparing the sequence strategies:
//! - CopyOnWriteList, SegmentedList, LockFreeList vs a `RwLock<Vec>` baseline
//!
//! Run with: cargo bench --package coral-crossbeam --bench sequence_benchmark

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;
use mimalloc::MiMalloc;
use parking_lot::RwLock;
use std::sync::Arc;
use std::thread;

use coral_core::CopyOnWriteList;
use coral_core::SegmentedList;
use coral_core::SequenceCollection;
use coral_crossbeam::EpochList;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const OPS_PER_THREAD: usize = 2_000;
const THREADS: [usize; 4] = [1, 2, 4, 8];

// ============================================================================
// Generic helpers for SequenceCollection
// ============================================================================

/// Every thread appends its own range
fn bench_push<C>(thread_count: usize, ops_per_thread: usize)
where
    C: SequenceCollection<i64> + Default + Send + Sync + 'static,
{
    let list = Arc::new(C::default());
    let mut handles = vec![];

    for t in 0..thread_count {
        let list_clone = Arc::clone(&list);
        let handle = thread::spawn(move || {
            let base = (t * ops_per_thread) as i64;
            for i in 0..ops_per_thread {
                list_clone.push(base + i as i64);
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

/// One writer, the remaining threads read by index and iterate
fn bench_read_mostly<C>(thread_count: usize, ops_per_thread: usize)
where
    C: SequenceCollection<i64> + Default + Send + Sync + 'static,
{
    let list = Arc::new(C::default());
    list.push_all(0..1_000);
    let mut handles = vec![];

    for t in 0..thread_count {
        let list_clone = Arc::clone(&list);
        let handle = thread::spawn(move || {
            for i in 0..ops_per_thread {
                if t == 0 && i % 10 == 0 {
                    list_clone.set(i % 1_000, i as i64);
                } else if i % 100 == 0 {
                    black_box(list_clone.iter().take(64).sum::<i64>());
                } else {
                    black_box(list_clone.get(i % 1_000));
                }
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

/// Insert and remove in the middle of the sequence
fn bench_middle_churn<C>(thread_count: usize, ops_per_thread: usize)
where
    C: SequenceCollection<i64> + Default + Send + Sync + 'static,
{
    let list = Arc::new(C::default());
    list.push_all(0..512);
    let mut handles = vec![];

    for t in 0..thread_count {
        let list_clone = Arc::clone(&list);
        let handle = thread::spawn(move || {
            for i in 0..ops_per_thread {
                let index = (t * 37 + i * 13) % 256;
                if i % 2 == 0 {
                    list_clone.insert(index, i as i64);
                } else {
                    list_clone.remove_at(index);
                }
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

// ============================================================================
// Baseline: a single reader-writer lock around a Vec
// ============================================================================

fn bench_rwlock_push(thread_count: usize, ops_per_thread: usize) {
    let list: Arc<RwLock<Vec<i64>>> = Arc::new(RwLock::new(Vec::new()));
    let mut handles = vec![];

    for t in 0..thread_count {
        let list_clone = Arc::clone(&list);
        let handle = thread::spawn(move || {
            let base = (t * ops_per_thread) as i64;
            for i in 0..ops_per_thread {
                list_clone.write().push(base + i as i64);
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

fn bench_rwlock_read_mostly(thread_count: usize, ops_per_thread: usize) {
    let list: Arc<RwLock<Vec<i64>>> = Arc::new(RwLock::new((0..1_000).collect()));
    let mut handles = vec![];

    for t in 0..thread_count {
        let list_clone = Arc::clone(&list);
        let handle = thread::spawn(move || {
            for i in 0..ops_per_thread {
                if t == 0 && i % 10 == 0 {
                    list_clone.write()[i % 1_000] = i as i64;
                } else if i % 100 == 0 {
                    black_box(list_clone.read().iter().take(64).sum::<i64>());
                } else {
                    black_box(list_clone.read().get(i % 1_000).copied());
                }
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

fn bench_rwlock_middle_churn(thread_count: usize, ops_per_thread: usize) {
    let list: Arc<RwLock<Vec<i64>>> = Arc::new(RwLock::new((0..512).collect()));
    let mut handles = vec![];

    for t in 0..thread_count {
        let list_clone = Arc::clone(&list);
        let handle = thread::spawn(move || {
            for i in 0..ops_per_thread {
                let index = (t * 37 + i * 13) % 256;
                let mut guard = list_clone.write();
                if i % 2 == 0 {
                    if index <= guard.len() {
                        guard.insert(index, i as i64);
                    }
                } else if index < guard.len() {
                    guard.remove(index);
                }
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

// ============================================================================
// Criterion benchmark groups
// ============================================================================

type Scenario = fn(usize, usize);

fn run_group(c: &mut Criterion, name: &str, scenarios: [(&str, Scenario); 4]) {
    let mut group = c.benchmark_group(name);

    for threads in THREADS {
        for (label, scenario) in scenarios {
            group.bench_with_input(BenchmarkId::new(label, threads), &threads, |b, &threads| {
                b.iter(|| scenario(black_box(threads), black_box(OPS_PER_THREAD)))
            });
        }
    }

    group.finish();
}

fn push_benchmark(c: &mut Criterion) {
    run_group(
        c,
        "push_benchmark_sequence",
        [
            ("copy_on_write", bench_push::<CopyOnWriteList<i64>>),
            ("segmented", bench_push::<SegmentedList<i64>>),
            ("lock_free", bench_push::<EpochList<i64>>),
            ("rwlock_vec", bench_rwlock_push),
        ],
    );
}

fn read_mostly_benchmark(c: &mut Criterion) {
    run_group(
        c,
        "read_mostly_benchmark_sequence",
        [
            ("copy_on_write", bench_read_mostly::<CopyOnWriteList<i64>>),
            ("segmented", bench_read_mostly::<SegmentedList<i64>>),
            ("lock_free", bench_read_mostly::<EpochList<i64>>),
            ("rwlock_vec", bench_rwlock_read_mostly),
        ],
    );
}

fn middle_churn_benchmark(c: &mut Criterion) {
    run_group(
        c,
        "middle_churn_benchmark_sequence",
        [
            ("copy_on_write", bench_middle_churn::<CopyOnWriteList<i64>>),
            ("segmented", bench_middle_churn::<SegmentedList<i64>>),
            ("lock_free", bench_middle_churn::<EpochList<i64>>),
            ("rwlock_vec", bench_rwlock_middle_churn),
        ],
    );
}

criterion_group!(
    benches,
    push_benchmark,
    read_mostly_benchmark,
    middle_churn_benchmark
);
criterion_main!(benches);
