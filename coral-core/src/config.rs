//! Construction-time configuration shared by every sequence collection.
//!
//! A list is configured once, when it is built. Misconfiguration is the only
//! fatal condition in this crate: `with_options` constructors panic with the
//! [`ConfigError`] message, `try_with_options` constructors return it.
//!
//! ```rust,ignore
//! use coral_core::{CopyOnWriteList, ListOptions};
//!
//! // Case-insensitive identity for strings
//! let options = ListOptions::<String>::default()
//!     .with_equaler(|a: &String, b: &String| a.eq_ignore_ascii_case(b));
//! let list = CopyOnWriteList::with_options(options);
//! ```

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Value equality used by searches and value-based removal.
///
/// Supplied once at construction; must be pure.
pub type Equaler<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// Default target number of elements per segment of a `SegmentedList`.
pub const DEFAULT_SEGMENT_CAPACITY: usize = 64;

/// Upper bound for `segment_capacity`.
pub const MAX_SEGMENT_CAPACITY: usize = 1 << 20;

/// Default number of recycled nodes a `LockFreeList` keeps around.
pub const DEFAULT_POOL_CAPACITY: usize = 1024;

/// Builds an [`Equaler`] from the element type's native `PartialEq`.
pub fn native_equaler<T: PartialEq>() -> Equaler<T> {
    Arc::new(|a: &T, b: &T| a == b)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("an equality function is required but none was configured")]
    MissingEqualer,
    #[error("segment capacity must be greater than zero")]
    ZeroSegmentCapacity,
    #[error("segment capacity {capacity} exceeds the maximum of {max}")]
    SegmentCapacityTooLarge { capacity: usize, max: usize },
}

/// Options accepted by every list constructor.
///
/// Strategies ignore the knobs that do not apply to them: only
/// `SegmentedList` reads `segment_capacity`, only `LockFreeList` reads
/// `pool_capacity`.
pub struct ListOptions<T> {
    /// Initial capacity hint.
    pub capacity: usize,
    /// Target element count per segment.
    pub segment_capacity: usize,
    /// Maximum number of pooled nodes; `0` disables pooling.
    pub pool_capacity: usize,
    /// Value equality; required.
    pub equaler: Option<Equaler<T>>,
}

impl<T> Default for ListOptions<T> {
    fn default() -> Self {
        ListOptions {
            capacity: 0,
            segment_capacity: DEFAULT_SEGMENT_CAPACITY,
            pool_capacity: DEFAULT_POOL_CAPACITY,
            equaler: None,
        }
    }
}

impl<T: PartialEq> ListOptions<T> {
    /// Default options using the native `PartialEq` as equality.
    pub fn native() -> Self {
        ListOptions {
            equaler: Some(native_equaler()),
            ..Default::default()
        }
    }
}

impl<T> ListOptions<T> {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_segment_capacity(mut self, segment_capacity: usize) -> Self {
        self.segment_capacity = segment_capacity;
        self
    }

    pub fn with_pool_capacity(mut self, pool_capacity: usize) -> Self {
        self.pool_capacity = pool_capacity;
        self
    }

    pub fn with_equaler<F>(mut self, equaler: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        self.equaler = Some(Arc::new(equaler));
        self
    }

    /// Check the options without consuming them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.equaler.is_none() {
            return Err(ConfigError::MissingEqualer);
        }
        if self.segment_capacity == 0 {
            return Err(ConfigError::ZeroSegmentCapacity);
        }
        if self.segment_capacity > MAX_SEGMENT_CAPACITY {
            return Err(ConfigError::SegmentCapacityTooLarge {
                capacity: self.segment_capacity,
                max: MAX_SEGMENT_CAPACITY,
            });
        }
        Ok(())
    }

    /// Validate and split off the equaler, which is guaranteed present afterwards.
    pub(crate) fn resolve(self) -> Result<(Equaler<T>, Self), ConfigError> {
        self.validate()?;
        let equaler = match &self.equaler {
            Some(equaler) => Arc::clone(equaler),
            None => return Err(ConfigError::MissingEqualer),
        };
        Ok((equaler, self))
    }
}

/// Panic with the configuration error. Construction-time misconfiguration
/// must surface immediately rather than as a later silent failure.
pub(crate) fn fail_construction(error: ConfigError) -> ! {
    panic!("invalid list configuration: {error}")
}

impl<T> Clone for ListOptions<T> {
    fn clone(&self) -> Self {
        ListOptions {
            capacity: self.capacity,
            segment_capacity: self.segment_capacity,
            pool_capacity: self.pool_capacity,
            equaler: self.equaler.clone(),
        }
    }
}

impl<T> fmt::Debug for ListOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListOptions")
            .field("capacity", &self.capacity)
            .field("segment_capacity", &self.segment_capacity)
            .field("pool_capacity", &self.pool_capacity)
            .field("equaler", &self.equaler.as_ref().map(|_| "<fn>"))
            .finish()
    }
}
