use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RecordError;

/// Identifier of a stored media record.
///
/// Assigned by the record store on insert and never reused; the id doubles as
/// the stable part of the object key in the storage backend, so it must exist
/// before any bytes are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaId(pub i64);

impl MediaId {
    /// Return the raw integer value.
    #[must_use]
    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for MediaId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// The persisted metadata row for one uploaded file.
///
/// A record is created before the original bytes are written (so the storage
/// key is stable), mutated exactly once when thumbnail derivation reports
/// whether the source is animated, and deleted together with its backing
/// objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRecord {
    /// Unique id assigned by the record store.
    pub id: MediaId,
    /// Lowercase filename suffix of the upload (e.g. `"jpg"`, `"webm"`).
    pub extension: String,
    /// Client-declared content type at upload time. Stored verbatim; the
    /// declared value is not verified against the actual bytes.
    pub mimetype: String,
    /// Whether the source media had more than one frame. Set after thumbnail
    /// derivation completes.
    pub is_animated: bool,
}

/// Derive the storage extension from a declared upload filename.
///
/// The extension is the lowercased text after the last `.`. A filename with
/// no suffix cannot be keyed in the backend and is rejected.
pub fn infer_extension(filename: &str) -> Result<String, RecordError> {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Ok(ext.to_lowercase()),
        _ => Err(RecordError::InvalidFilename(filename.to_owned())),
    }
}
