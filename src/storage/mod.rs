//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - The cycle timestamp that gates when the next crawl may start
//! - Batched upserts of (link, freshness signal) records
//! - Link administration used by the HTTP API

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// A store handle shared between the scheduler, coordinator and API
pub type SharedStorage = Arc<Mutex<SqliteStorage>>;

/// Opens (or creates) the database and wraps it for sharing
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
pub fn open_shared(path: &Path) -> StorageResult<SharedStorage> {
    Ok(Arc::new(Mutex::new(SqliteStorage::new(path)?)))
}

/// Locks a shared store, turning a poisoned mutex into a storage error
pub fn lock(storage: &SharedStorage) -> StorageResult<MutexGuard<'_, SqliteStorage>> {
    storage.lock().map_err(|_| StorageError::Poisoned)
}

/// A link and the freshness signal it had when it was last downloaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRecord {
    pub link: String,
    pub signal: String,
}

/// A row of the `links` table as exposed to administrators
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredLink {
    pub id: i64,
    pub link: String,
    pub modified: String,
}
