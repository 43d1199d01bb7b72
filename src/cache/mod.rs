//! Change cache: the dedup gate in front of every content fetch
//!
//! The cache maps a link to the last freshness signal seen for it. Workers
//! call [`ChangeCache::should_process`] before downloading anything; the
//! persistence store is the durable copy and refills the cache through
//! [`warm_start`] when a process starts with an empty cache.

mod memory;

pub use memory::MemoryCache;

use crate::storage::{lock, SharedStorage, Storage, StorageError};
use thiserror::Error;

/// Errors that can occur while talking to a cache backend
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Key-value store of link -> last seen freshness signal
///
/// Implementations must make `should_process` a single atomic
/// check-and-set; workers call it concurrently.
pub trait ChangeCache: Send + Sync {
    /// Returns the recorded signal for a link
    fn lookup(&self, link: &str) -> CacheResult<Option<String>>;

    /// Records `signal` for `link` unless it is already the recorded value
    ///
    /// Returns `true` when the signal was absent or different (the link
    /// changed and must be fetched) and `false` when it matched.
    fn should_process(&self, link: &str, signal: &str) -> CacheResult<bool>;

    /// Unconditionally records a signal
    fn insert(&self, link: &str, signal: &str) -> CacheResult<()>;

    /// Number of cached links
    fn len(&self) -> CacheResult<usize>;

    fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// Errors from a warm start
#[derive(Debug, Error)]
pub enum WarmStartError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Fills the cache with every record held by the persistence store
///
/// Returns the number of records loaded. Stops at the first cache error.
pub fn warm_start(
    cache: &dyn ChangeCache,
    storage: &SharedStorage,
) -> Result<usize, WarmStartError> {
    let storage = lock(storage)?;

    let mut loaded = 0;
    let mut failure = None;
    storage.for_each_record(&mut |record| {
        if failure.is_some() {
            return;
        }
        match cache.insert(&record.link, &record.signal) {
            Ok(()) => loaded += 1,
            Err(e) => failure = Some(e),
        }
    })?;

    if let Some(e) = failure {
        return Err(e.into());
    }

    tracing::info!("Warm-started change cache with {} records", loaded);
    Ok(loaded)
}
