//! All SQL for the duplicate-detection pipeline lives here: one function
//! per CRUD concern, synchronous against `rusqlite`, with queries returning
//! named-field records from `viddup_core::model` rather than loose tuples.

use std::collections::HashSet;
use std::path::Path;

use rusqlite::{params, Connection};

use viddup_core::model::{FileRecord, Fingerprint};
use viddup_core::whitelist::Pair;

use crate::connection;
use crate::error::StoreError;
use crate::models::PurgeReport;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS filenames (
    id       INTEGER PRIMARY KEY,
    name     TEXT UNIQUE NOT NULL,
    fps      REAL NOT NULL,
    duration REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS hashes (
    filename_id INTEGER NOT NULL REFERENCES filenames(id),
    frame       INTEGER NOT NULL,
    value       REAL NOT NULL,
    UNIQUE(filename_id, frame)
);
CREATE INDEX IF NOT EXISTS idx_hashes_filename ON hashes(filename_id, frame);

CREATE TABLE IF NOT EXISTS brightness (
    filename_id INTEGER NOT NULL REFERENCES filenames(id),
    frame       INTEGER NOT NULL,
    value       REAL NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_brightness_filename ON brightness(filename_id, frame);

CREATE TABLE IF NOT EXISTS whitelist (
    id1 INTEGER NOT NULL,
    id2 INTEGER NOT NULL,
    UNIQUE(id1, id2)
);
"#;

/// A handle to one library's database file. Threaded explicitly through the
/// ingest controller and the search pass -- there is no ambient global path.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path, busy_timeout_ms: u32) -> Result<Self, StoreError> {
        let conn = connection::open(path, busy_timeout_ms)?;
        let store = Self { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    pub fn open_in_memory(busy_timeout_ms: u32) -> Result<Self, StoreError> {
        let conn = connection::open_in_memory(busy_timeout_ms)?;
        let store = Self { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Idempotent schema creation.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    pub fn is_ingested(&self, path: &str) -> Result<bool, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM filenames WHERE name = ?1",
            params![path],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn file_id_by_path(&self, path: &str) -> Result<Option<i64>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT id FROM filenames WHERE name = ?1")?;
        let mut rows = stmt.query_map(params![path], |row| row.get(0))?;
        match rows.next() {
            Some(id) => Ok(Some(id?)),
            None => Ok(None),
        }
    }

    /// Insert a file record plus its brightness samples and fingerprints in
    /// one transaction. Readers never observe a partially-ingested file:
    /// either all three land, or none do.
    pub fn ingest_file(
        &mut self,
        path: &str,
        fps: f64,
        duration_secs: f64,
        brightness: &[(usize, f64)],
        fingerprints: &[Fingerprint],
    ) -> Result<i64, StoreError> {
        if self.is_ingested(path)? {
            return Err(StoreError::AlreadyIngested(path.to_string()));
        }
        for pair in fingerprints.windows(2) {
            if pair[1].frame <= pair[0].frame {
                return Err(StoreError::Invariant(
                    "fingerprint frame indices must be strictly increasing".into(),
                ));
            }
        }

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO filenames (name, fps, duration) VALUES (?1, ?2, ?3)",
            params![path, fps, duration_secs],
        )?;
        let file_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO brightness (filename_id, frame, value) VALUES (?1, ?2, ?3)",
            )?;
            for &(frame, value) in brightness {
                stmt.execute(params![file_id, frame as i64, value])?;
            }
        }
        {
            let mut stmt =
                tx.prepare("INSERT INTO hashes (filename_id, frame, value) VALUES (?1, ?2, ?3)")?;
            for fp in fingerprints {
                stmt.execute(params![file_id, fp.frame as i64, fp.value])?;
            }
        }

        tx.commit()?;
        Ok(file_id)
    }

    pub fn iter_files(&self) -> Result<Vec<FileRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, fps, duration FROM filenames ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(FileRecord {
                id: row.get(0)?,
                path: row.get(1)?,
                fps: row.get(2)?,
                duration_secs: row.get(3)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn file_by_id(&self, file_id: i64) -> Result<Option<FileRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, fps, duration FROM filenames WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![file_id], |row| {
            Ok(FileRecord {
                id: row.get(0)?,
                path: row.get(1)?,
                fps: row.get(2)?,
                duration_secs: row.get(3)?,
            })
        })?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Fingerprints for one file, ordered by frame, restricted to
    /// `[min_frame, max_frame]` inclusive.
    pub fn fingerprints_for_file(
        &self,
        file_id: i64,
        min_frame: i64,
        max_frame: i64,
    ) -> Result<Vec<Fingerprint>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT frame, value FROM hashes \
             WHERE filename_id = ?1 AND frame >= ?2 AND frame <= ?3 \
             ORDER BY frame",
        )?;
        let rows = stmt.query_map(params![file_id, min_frame, max_frame], |row| {
            let frame: i64 = row.get(0)?;
            let value: f64 = row.get(1)?;
            Ok(Fingerprint {
                frame: frame as usize,
                value,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Reject the whole add if any referenced file id does not exist.
    pub fn whitelist_add(&mut self, pairs: &[Pair]) -> Result<(), StoreError> {
        let live_ids: HashSet<i64> = self.iter_files()?.iter().map(|f| f.id).collect();
        for pair in pairs {
            if !live_ids.contains(&pair.0) {
                return Err(StoreError::UnknownFile(pair.0));
            }
            if !live_ids.contains(&pair.1) {
                return Err(StoreError::UnknownFile(pair.1));
            }
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt =
                tx.prepare("INSERT OR IGNORE INTO whitelist (id1, id2) VALUES (?1, ?2)")?;
            for pair in pairs {
                stmt.execute(params![pair.0, pair.1])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn whitelist_contains(&self, pair: Pair) -> Result<bool, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM whitelist WHERE id1 = ?1 AND id2 = ?2",
            params![pair.0, pair.1],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// The sole sanctioned mutation of an existing file record.
    pub fn update_file_metadata(
        &self,
        file_id: i64,
        fps: f64,
        duration_secs: f64,
    ) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE filenames SET fps = ?1, duration = ?2 WHERE id = ?3",
            params![fps, duration_secs, file_id],
        )?;
        if changed == 0 {
            return Err(StoreError::UnknownFile(file_id));
        }
        Ok(())
    }

    /// Report (and, unless `dry_run`, delete) records for files whose path
    /// is no longer readable, plus any orphaned fingerprint/brightness/
    /// whitelist rows those deletions leave behind.
    pub fn purge(&mut self, dry_run: bool) -> Result<PurgeReport, StoreError> {
        let files = self.iter_files()?;
        let mut missing_ids = Vec::new();
        let mut missing_files = Vec::new();
        for file in &files {
            if !Path::new(&file.path).exists() {
                missing_ids.push(file.id);
                missing_files.push(file.path.clone());
            }
        }
        let live_ids: HashSet<i64> = files.iter().map(|f| f.id).collect();

        let orphan_hash_rows = self.count_orphan_rows("hashes", &live_ids)?;
        let orphan_brightness_rows = self.count_orphan_rows("brightness", &live_ids)?;
        let orphan_fingerprint_rows = orphan_hash_rows + orphan_brightness_rows;

        let mut whitelist_stmt = self.conn.prepare("SELECT id1, id2 FROM whitelist")?;
        let whitelist_pairs: Vec<(i64, i64)> = whitelist_stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        drop(whitelist_stmt);
        let missing_set: HashSet<i64> = missing_ids.iter().copied().collect();
        let orphan_whitelist_rows = whitelist_pairs
            .iter()
            .filter(|(a, b)| missing_set.contains(a) || missing_set.contains(b))
            .count();

        if dry_run {
            return Ok(PurgeReport {
                missing_files,
                orphan_fingerprint_rows,
                orphan_whitelist_rows,
                deleted: false,
            });
        }

        let tx = self.conn.transaction()?;
        for id in &missing_ids {
            tx.execute("DELETE FROM hashes WHERE filename_id = ?1", params![id])?;
            tx.execute("DELETE FROM brightness WHERE filename_id = ?1", params![id])?;
            tx.execute(
                "DELETE FROM whitelist WHERE id1 = ?1 OR id2 = ?1",
                params![id],
            )?;
            tx.execute("DELETE FROM filenames WHERE id = ?1", params![id])?;
        }
        tx.execute(
            "DELETE FROM hashes WHERE filename_id NOT IN (SELECT id FROM filenames)",
            [],
        )?;
        tx.execute(
            "DELETE FROM brightness WHERE filename_id NOT IN (SELECT id FROM filenames)",
            [],
        )?;
        tx.commit()?;

        Ok(PurgeReport {
            missing_files,
            orphan_fingerprint_rows,
            orphan_whitelist_rows,
            deleted: true,
        })
    }

    fn count_orphan_rows(&self, table: &str, live_ids: &HashSet<i64>) -> Result<usize, StoreError> {
        let sql = format!("SELECT DISTINCT filename_id FROM {table}");
        let mut stmt = self.conn.prepare(&sql)?;
        let ids: Vec<i64> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids.iter().filter(|id| !live_ids.contains(id)).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fingerprints() -> Vec<Fingerprint> {
        vec![
            Fingerprint { frame: 10, value: 1.0 },
            Fingerprint { frame: 30, value: 2.0 },
            Fingerprint { frame: 70, value: 2.0 },
        ]
    }

    #[test]
    fn file_id_by_path_finds_ingested_file() {
        let mut store = Store::open_in_memory(1000).unwrap();
        assert_eq!(store.file_id_by_path("/a.mp4").unwrap(), None);
        let id = store.ingest_file("/a.mp4", 25.0, 600.0, &[], &[]).unwrap();
        assert_eq!(store.file_id_by_path("/a.mp4").unwrap(), Some(id));
    }

    #[test]
    fn ensure_schema_is_idempotent() {
        let store = Store::open_in_memory(1000).unwrap();
        store.ensure_schema().unwrap();
        store.ensure_schema().unwrap();
    }

    #[test]
    fn ingest_then_is_ingested() {
        let mut store = Store::open_in_memory(1000).unwrap();
        assert!(!store.is_ingested("/a.mp4").unwrap());
        let id = store
            .ingest_file("/a.mp4", 25.0, 600.0, &[(10, 1.0), (30, 2.0)], &sample_fingerprints())
            .unwrap();
        assert!(id > 0);
        assert!(store.is_ingested("/a.mp4").unwrap());
    }

    #[test]
    fn reingesting_same_path_is_rejected() {
        let mut store = Store::open_in_memory(1000).unwrap();
        store
            .ingest_file("/a.mp4", 25.0, 600.0, &[], &sample_fingerprints())
            .unwrap();
        let result = store.ingest_file("/a.mp4", 25.0, 600.0, &[], &sample_fingerprints());
        assert!(matches!(result, Err(StoreError::AlreadyIngested(_))));
    }

    #[test]
    fn non_increasing_fingerprints_are_rejected_and_nothing_is_written() {
        let mut store = Store::open_in_memory(1000).unwrap();
        let bad = vec![
            Fingerprint { frame: 10, value: 1.0 },
            Fingerprint { frame: 10, value: 2.0 },
        ];
        let result = store.ingest_file("/bad.mp4", 25.0, 600.0, &[], &bad);
        assert!(result.is_err());
        assert!(!store.is_ingested("/bad.mp4").unwrap());
    }

    #[test]
    fn fingerprints_for_file_respects_range_and_order() {
        let mut store = Store::open_in_memory(1000).unwrap();
        let id = store
            .ingest_file("/a.mp4", 25.0, 600.0, &[], &sample_fingerprints())
            .unwrap();
        let fps = store.fingerprints_for_file(id, 20, 1000).unwrap();
        assert_eq!(fps.len(), 2);
        assert_eq!(fps[0].frame, 30);
        assert_eq!(fps[1].frame, 70);
    }

    #[test]
    fn whitelist_add_and_contains() {
        let mut store = Store::open_in_memory(1000).unwrap();
        let a = store.ingest_file("/a.mp4", 25.0, 600.0, &[], &[]).unwrap();
        let b = store.ingest_file("/b.mp4", 25.0, 600.0, &[], &[]).unwrap();
        let pair = Pair::canonicalize(b, a).unwrap();
        assert!(!store.whitelist_contains(pair).unwrap());
        store.whitelist_add(&[pair]).unwrap();
        assert!(store.whitelist_contains(pair).unwrap());
    }

    #[test]
    fn whitelist_add_is_idempotent() {
        let mut store = Store::open_in_memory(1000).unwrap();
        let a = store.ingest_file("/a.mp4", 25.0, 600.0, &[], &[]).unwrap();
        let b = store.ingest_file("/b.mp4", 25.0, 600.0, &[], &[]).unwrap();
        let pair = Pair::canonicalize(a, b).unwrap();
        store.whitelist_add(&[pair]).unwrap();
        store.whitelist_add(&[pair]).unwrap();
        assert!(store.whitelist_contains(pair).unwrap());
    }

    #[test]
    fn purge_dry_run_reports_without_deleting() {
        let mut store = Store::open_in_memory(1000).unwrap();
        store
            .ingest_file("/does/not/exist.mp4", 25.0, 600.0, &[], &sample_fingerprints())
            .unwrap();
        let report = store.purge(true).unwrap();
        assert_eq!(report.missing_files.len(), 1);
        assert!(!report.deleted);
        assert!(store.is_ingested("/does/not/exist.mp4").unwrap());
    }

    #[test]
    fn purge_delete_removes_missing_file_and_its_rows() {
        let mut store = Store::open_in_memory(1000).unwrap();
        let id = store
            .ingest_file("/does/not/exist.mp4", 25.0, 600.0, &[], &sample_fingerprints())
            .unwrap();
        let other_id = store
            .ingest_file("/also/gone.mp4", 25.0, 600.0, &[], &sample_fingerprints())
            .unwrap();
        let pair = Pair::canonicalize(id, other_id).unwrap();
        store.whitelist_add(&[pair]).unwrap();

        let report = store.purge(false).unwrap();
        assert!(report.deleted);
        assert!(!store.is_ingested("/does/not/exist.mp4").unwrap());
        assert!(!store.whitelist_contains(pair).unwrap());
        assert_eq!(store.fingerprints_for_file(id, 0, 10_000).unwrap().len(), 0);
    }

    #[test]
    fn whitelist_add_rejects_unknown_file_id() {
        let mut store = Store::open_in_memory(1000).unwrap();
        let id = store
            .ingest_file("/a.mp4", 25.0, 600.0, &[], &sample_fingerprints())
            .unwrap();
        let pair = Pair::canonicalize(id, id + 999).unwrap();
        assert!(store.whitelist_add(&[pair]).is_err());
    }

    #[test]
    fn purge_is_idempotent() {
        let mut store = Store::open_in_memory(1000).unwrap();
        store
            .ingest_file("/gone.mp4", 25.0, 600.0, &[], &sample_fingerprints())
            .unwrap();
        store.purge(false).unwrap();
        let second = store.purge(false).unwrap();
        assert!(second.missing_files.is_empty());
    }

    #[test]
    fn update_file_metadata_rejects_unknown_id() {
        let store = Store::open_in_memory(1000).unwrap();
        let result = store.update_file_metadata(999, 30.0, 120.0);
        assert!(matches!(result, Err(StoreError::UnknownFile(999))));
    }

    #[test]
    fn data_survives_across_connections_to_the_same_file() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("library.db");

        {
            let mut store = Store::open(&db_path, 1000).unwrap();
            store
                .ingest_file("/a.mp4", 25.0, 600.0, &[(0, 1.0)], &sample_fingerprints())
                .unwrap();
        }

        let store = Store::open(&db_path, 1000).unwrap();
        assert!(store.is_ingested("/a.mp4").unwrap());
        let files = store.iter_files().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "/a.mp4");
    }
}
