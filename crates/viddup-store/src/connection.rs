//! Connection setup: one SQLite file per library, opened with a large
//! busy timeout so background readers (e.g. a concurrent `search`) do not
//! make a concurrent `ingest` fail outright. There is nothing to pool
//! here -- a single `rusqlite::Connection` per `Store` is the whole story.

use std::path::Path;

use rusqlite::Connection;

use crate::error::StoreError;

pub fn open(path: &Path, busy_timeout_ms: u32) -> Result<Connection, StoreError> {
    let conn = Connection::open(path)?;
    configure(&conn, busy_timeout_ms)?;
    Ok(conn)
}

pub fn open_in_memory(busy_timeout_ms: u32) -> Result<Connection, StoreError> {
    let conn = Connection::open_in_memory()?;
    configure(&conn, busy_timeout_ms)?;
    Ok(conn)
}

fn configure(conn: &Connection, busy_timeout_ms: u32) -> Result<(), StoreError> {
    conn.busy_timeout(std::time::Duration::from_millis(busy_timeout_ms as u64))?;
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_in_memory_connection() {
        let conn = open_in_memory(5000).unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        // in-memory databases cannot use WAL; sqlite silently falls back.
        assert!(!mode.is_empty());
    }
}
