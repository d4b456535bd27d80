//! Named-field records specific to the Store's reporting operations. The
//! core pipeline's shared records (`FileRecord`, `Fingerprint`) live in
//! `viddup_core::model` and are re-used here rather than duplicated.

/// Outcome of a `purge` run, whether or not it actually deleted anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PurgeReport {
    /// Paths recorded in the Store whose file no longer exists on disk.
    pub missing_files: Vec<String>,
    /// Fingerprint/brightness rows that reference a file id with no
    /// corresponding `filenames` row (should not occur under normal
    /// operation, but purge repairs it if it ever does).
    pub orphan_fingerprint_rows: usize,
    /// Whitelist rows removed because they reference a purged file id.
    pub orphan_whitelist_rows: usize,
    /// Whether `--delete` was honored (false means this was a dry run).
    pub deleted: bool,
}
