pub mod common_tests;
pub mod config;
pub mod data_structures;
pub mod guard;

// Re-export the public surface for convenience
pub use config::{ConfigError, Equaler, ListOptions};
pub use data_structures::{
    Atomicity, CopyOnWriteList, LockFreeList, LockFreeStats, SegmentedList, SequenceCollection,
    SequenceOp,
};
pub use guard::{DeferredGuard, Guard};

/*
Benchmark:

- [ ] https://github.com/bheisler/iai

cargo llvm-cov --html

sudo CARGO_PROFILE_RELEASE_DEBUG=true cargo flamegraph --bench sequence_benchmark --root --
*/
