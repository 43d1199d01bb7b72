//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{CrawlRecord, StoredLink};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn stored_link_from_row(row: &Row<'_>) -> rusqlite::Result<StoredLink> {
    Ok(StoredLink {
        id: row.get(0)?,
        link: row.get(1)?,
        modified: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
    })
}

impl Storage for SqliteStorage {
    // ===== Cycle Scheduling =====

    fn is_cycle_due_at(&mut self, interval_secs: u64, now: i64) -> StorageResult<bool> {
        // IMMEDIATE takes the write lock up front so two processes cannot
        // both read a stale timestamp and both claim the cycle.
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let last: i64 = tx.query_row(
            "SELECT time FROM cycle_timestamp WHERE id = 1",
            [],
            |row| row.get(0),
        )?;

        let interval = i64::try_from(interval_secs).unwrap_or(i64::MAX);
        if now.saturating_sub(last) < interval {
            return Ok(false);
        }

        tx.execute(
            "UPDATE cycle_timestamp SET time = ?1 WHERE id = 1",
            params![now],
        )?;
        tx.commit()?;

        Ok(true)
    }

    fn cycle_timestamp(&self) -> StorageResult<i64> {
        let time = self.conn.query_row(
            "SELECT time FROM cycle_timestamp WHERE id = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(time)
    }

    fn set_cycle_timestamp(&mut self, time: i64) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO cycle_timestamp (id, time) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET time = excluded.time",
            params![time],
        )?;
        Ok(())
    }

    // ===== Crawl Records =====

    fn upsert_records(&mut self, records: &[CrawlRecord]) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO links (link, modified) VALUES (?1, ?2)
                 ON CONFLICT(link) DO UPDATE SET modified = excluded.modified",
            )?;
            for record in records {
                stmt.execute(params![record.link, record.signal])?;
            }
        }
        // Dropping an uncommitted transaction rolls it back, so an error above
        // leaves the table untouched.
        tx.commit()?;
        Ok(records.len())
    }

    fn for_each_record(&self, visit: &mut dyn FnMut(CrawlRecord)) -> StorageResult<usize> {
        let mut stmt = self
            .conn
            .prepare("SELECT link, modified FROM links WHERE modified IS NOT NULL")?;
        let mut rows = stmt.query([])?;

        let mut visited = 0;
        while let Some(row) = rows.next()? {
            visit(CrawlRecord {
                link: row.get(0)?,
                signal: row.get(1)?,
            });
            visited += 1;
        }

        Ok(visited)
    }

    fn count_records(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM links", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Link Administration =====

    fn list_links(&self, skip: u32, limit: u32) -> StorageResult<Vec<StoredLink>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, link, modified FROM links ORDER BY id LIMIT ?1 OFFSET ?2")?;

        let links = stmt
            .query_map(params![limit, skip], stored_link_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(links)
    }

    fn get_link(&self, id: i64) -> StorageResult<Option<StoredLink>> {
        let link = self
            .conn
            .query_row(
                "SELECT id, link, modified FROM links WHERE id = ?1",
                params![id],
                stored_link_from_row,
            )
            .optional()?;
        Ok(link)
    }

    fn get_link_by_url(&self, link: &str) -> StorageResult<Option<StoredLink>> {
        let link = self
            .conn
            .query_row(
                "SELECT id, link, modified FROM links WHERE link = ?1",
                params![link],
                stored_link_from_row,
            )
            .optional()?;
        Ok(link)
    }

    fn create_link(&mut self, link: &str, modified: &str) -> StorageResult<StoredLink> {
        if self.get_link_by_url(link)?.is_some() {
            return Err(StorageError::LinkExists(link.to_string()));
        }

        self.conn.execute(
            "INSERT INTO links (link, modified) VALUES (?1, ?2)",
            params![link, modified],
        )?;

        Ok(StoredLink {
            id: self.conn.last_insert_rowid(),
            link: link.to_string(),
            modified: modified.to_string(),
        })
    }

    fn update_modified(&mut self, id: i64, modified: &str) -> StorageResult<StoredLink> {
        let updated = self.conn.execute(
            "UPDATE links SET modified = ?1 WHERE id = ?2",
            params![modified, id],
        )?;

        if updated == 0 {
            return Err(StorageError::LinkNotFound(format!("Link ID {}", id)));
        }

        self.get_link(id)?
            .ok_or_else(|| StorageError::LinkNotFound(format!("Link ID {}", id)))
    }

    fn delete_link(&mut self, id: i64) -> StorageResult<StoredLink> {
        let existing = self
            .get_link(id)?
            .ok_or_else(|| StorageError::LinkNotFound(format!("Link ID {}", id)))?;

        self.conn
            .execute("DELETE FROM links WHERE id = ?1", params![id])?;

        Ok(existing)
    }
}
