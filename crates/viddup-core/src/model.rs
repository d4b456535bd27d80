//! Named-field records shared across the pipeline. Deliberately not tuples:
//! every field that crosses a component boundary gets a name.

/// A file known to the Store.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    pub id: i64,
    pub path: String,
    pub fps: f64,
    pub duration_secs: f64,
}

/// A single scene fingerprint entry belonging to one file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fingerprint {
    pub frame: usize,
    pub value: f64,
}

/// One file's contribution to an emitted duplicate cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterEntry {
    pub file: FileRecord,
    pub offset_secs: f64,
}

/// A group of two or more files suspected to share duplicate content.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub entries: Vec<ClusterEntry>,
}
