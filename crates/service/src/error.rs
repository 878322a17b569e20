use tansu_record::{MediaId, RecordError};
use tansu_storage::StorageError;
use tansu_thumbnail::ThumbnailError;
use thiserror::Error;

/// Errors surfaced by [`MediaService`](crate::MediaService) operations.
///
/// Nothing here is retried automatically; every failure propagates to the
/// immediate caller, which maps it to whatever its own surface needs.
#[derive(Debug, Error)]
pub enum MediaError {
    /// No record exists with the given id.
    #[error("no media with id {0}")]
    NotFound(MediaId),

    /// The declared upload filename had no usable extension.
    #[error("invalid upload filename: {0:?}")]
    InvalidFilename(String),

    /// Record store failure.
    #[error(transparent)]
    Record(RecordError),

    /// Storage backend failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Thumbnail derivation failure; the save was rolled back.
    #[error(transparent)]
    Thumbnail(#[from] ThumbnailError),
}

impl From<RecordError> for MediaError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::InvalidFilename(name) => Self::InvalidFilename(name),
            other => Self::Record(other),
        }
    }
}

/// Errors raised while parsing configuration or constructing the service.
///
/// All of these are fatal at startup; an unrecognized backend selector in
/// particular must never degrade into a silently missing backend.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("unknown storage provider {0:?} (expected \"FOLDER\" or \"S3\")")]
    UnknownProvider(String),

    #[error("storage provider {provider} selected but the [{section}] section is missing")]
    MissingSection {
        provider: &'static str,
        section: &'static str,
    },

    #[error("record store initialization failed: {0}")]
    RecordStore(String),
}
