//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{CrawlRecord, StoredLink};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Link not found: {0}")]
    LinkNotFound(String),

    #[error("Link already exists: {0}")]
    LinkExists(String),

    #[error("Storage lock poisoned")]
    Poisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Write operations take `&mut self`; callers that share a store across
/// tasks wrap it in a mutex.
pub trait Storage {
    // ===== Cycle Scheduling =====

    /// Checks whether a cycle is due at `now` and claims it if so
    ///
    /// Reads the stored cycle timestamp and, when `now - stored >= interval_secs`,
    /// advances it to `now` within the same transaction.
    fn is_cycle_due_at(&mut self, interval_secs: u64, now: i64) -> StorageResult<bool>;

    /// Same as [`Storage::is_cycle_due_at`] using the current wall-clock time
    fn is_cycle_due(&mut self, interval_secs: u64) -> StorageResult<bool> {
        self.is_cycle_due_at(interval_secs, chrono::Utc::now().timestamp())
    }

    /// Returns the stored start time of the last cycle
    fn cycle_timestamp(&self) -> StorageResult<i64>;

    /// Overwrites the stored cycle timestamp
    fn set_cycle_timestamp(&mut self, time: i64) -> StorageResult<()>;

    // ===== Crawl Records =====

    /// Upserts a batch of records in one transaction
    ///
    /// Either every record is written or none is.
    fn upsert_records(&mut self, records: &[CrawlRecord]) -> StorageResult<usize>;

    /// Visits every stored record in a single pass
    ///
    /// Rows are read lazily from the database cursor; nothing is buffered.
    fn for_each_record(&self, visit: &mut dyn FnMut(CrawlRecord)) -> StorageResult<usize>;

    /// Counts stored records
    fn count_records(&self) -> StorageResult<u64>;

    // ===== Link Administration =====

    /// Lists stored links ordered by id
    fn list_links(&self, skip: u32, limit: u32) -> StorageResult<Vec<StoredLink>>;

    /// Gets a stored link by id
    fn get_link(&self, id: i64) -> StorageResult<Option<StoredLink>>;

    /// Gets a stored link by URL
    fn get_link_by_url(&self, link: &str) -> StorageResult<Option<StoredLink>>;

    /// Inserts a new link, failing if the URL is already stored
    fn create_link(&mut self, link: &str, modified: &str) -> StorageResult<StoredLink>;

    /// Replaces the freshness signal of an existing link
    fn update_modified(&mut self, id: i64, modified: &str) -> StorageResult<StoredLink>;

    /// Deletes a link and returns what was removed
    fn delete_link(&mut self, id: i64) -> StorageResult<StoredLink>;
}
