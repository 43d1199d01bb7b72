//! Database schema definitions
//!
//! This module contains the SQL schema for the Recrawl database. The same
//! tables are read and written by the admin API.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Start time of the most recent crawl cycle (single row, id = 1)
CREATE TABLE IF NOT EXISTS cycle_timestamp (
    id INTEGER PRIMARY KEY,
    time INTEGER
);

-- Last freshness signal seen for every downloaded link
CREATE TABLE IF NOT EXISTS links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    link TEXT UNIQUE NOT NULL,
    modified TEXT
);

-- Epoch 0 is older than any interval, so the first check always passes
INSERT OR IGNORE INTO cycle_timestamp (id, time) VALUES (1, 0);
"#;

/// Initializes the database schema
///
/// Safe to call on every start: tables are created only if missing and the
/// timestamp row is never overwritten once it exists.
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
