use thiserror::Error;

/// Errors from media record store operations.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("invalid upload filename: {0:?}")]
    InvalidFilename(String),

    #[error("backend error: {0}")]
    Backend(String),
}
