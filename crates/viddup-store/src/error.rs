use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("file already ingested: {0}")]
    AlreadyIngested(String),

    #[error("unknown file id: {0}")]
    UnknownFile(i64),

    #[error("invariant violation: {0}")]
    Invariant(String),

    #[error(transparent)]
    Core(#[from] viddup_core::CoreError),
}
