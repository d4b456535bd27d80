//! The persistent store: one SQLite database file per library, holding
//! file records, per-frame brightness samples, scene fingerprints, and the
//! whitelist. A synchronous embedded database with a generous busy timeout
//! rather than a client/server backend, since each library is a single
//! file meant to be opened concurrently by a handful of local processes.

pub mod connection;
pub mod error;
pub mod models;
pub mod operations;

pub use error::StoreError;
pub use models::PurgeReport;
pub use operations::Store;
