use thiserror::Error;

/// Failure domain for `viddup-core`'s pure algorithms and configuration.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("frame source error: {0}")]
    FrameSource(String),

    #[error("operation cancelled")]
    Cancelled,
}
