use thiserror::Error;

/// Errors from storage backend operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested object does not exist in the backend.
    #[error("object not found: {0}")]
    NotFound(String),

    /// The backend failed to persist bytes. Surfaced to the caller and never
    /// retried; the caller decides what to do with any dangling record.
    #[error("storage write failed: {0}")]
    Write(String),

    /// The backend failed to read bytes.
    #[error("storage read failed: {0}")]
    Read(String),

    /// Bucket or directory provisioning failed.
    #[error("bootstrap failed: {0}")]
    Bootstrap(String),

    /// Static asset mirroring failed.
    #[error("static sync failed: {0}")]
    StaticSync(String),

    /// The backend itself reported an error.
    #[error("backend error: {0}")]
    Backend(String),
}
