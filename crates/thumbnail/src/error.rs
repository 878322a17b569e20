use std::time::Duration;

use thiserror::Error;

/// Errors from thumbnail derivation.
#[derive(Debug, Error)]
pub enum ThumbnailError {
    /// The transcoder process could not be spawned.
    #[error("failed to spawn transcoder {command:?}: {message}")]
    Spawn { command: String, message: String },

    /// The transcoder exited non-zero or produced no output.
    #[error("transcoding failed: {0}")]
    Transcode(String),

    /// The transcoder exceeded the configured deadline and was killed.
    #[error("transcoding timed out after {0:?}")]
    Timeout(Duration),

    /// Feeding input to or reading output from the transcoder failed.
    #[error("transcoder I/O error: {0}")]
    Io(String),
}
