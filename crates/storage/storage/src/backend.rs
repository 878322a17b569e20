use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use tansu_record::{MediaId, MediaRecord};

use crate::error::StorageError;

/// How a backend answers a fetch: either the bytes themselves, or a URL the
/// caller should redirect to.
#[derive(Debug, Clone)]
pub enum FetchResponse {
    /// The backend holds the bytes locally and streams them directly.
    Bytes {
        data: Bytes,
        /// Content type for the response, taken from the stored record.
        content_type: String,
        /// Modification time of the backing object.
        last_modified: DateTime<Utc>,
    },
    /// The bytes live elsewhere; the caller should redirect to this URL.
    Redirect { url: String },
}

/// Pluggable storage backend for attachment and thumbnail bytes.
///
/// Implementations own the physical bytes exclusively; the record store is
/// the ground truth for which objects are expected to exist. A deployment
/// must never mix backends: objects written by one variant are invisible to
/// the other.
///
/// URL resolution methods are pure — same arguments and configuration always
/// produce the same string, with no I/O.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Persist the original attachment bytes keyed by `(id, extension)`.
    async fn put_attachment(
        &self,
        id: MediaId,
        extension: &str,
        mimetype: &str,
        data: Bytes,
    ) -> Result<(), StorageError>;

    /// Persist thumbnail bytes keyed by id (thumbnails are always JPEG).
    async fn put_thumbnail(&self, id: MediaId, data: Bytes) -> Result<(), StorageError>;

    /// Retrieve the original attachment for a record.
    ///
    /// Returns [`StorageError::NotFound`] if the backing object is missing.
    async fn fetch(&self, record: &MediaRecord) -> Result<FetchResponse, StorageError>;

    /// Remove the original attachment object.
    ///
    /// Not idempotent: deleting an object that does not exist returns
    /// [`StorageError::NotFound`].
    async fn delete_attachment(&self, id: MediaId, extension: &str) -> Result<(), StorageError>;

    /// Remove the thumbnail object.
    async fn delete_thumbnail(&self, id: MediaId) -> Result<(), StorageError>;

    /// Public URL of the original attachment.
    fn attachment_url(&self, id: MediaId, extension: &str) -> String;

    /// Public URL of the thumbnail.
    fn thumbnail_url(&self, id: MediaId) -> String;

    /// Public URL of a static asset by relative path.
    fn static_url(&self, path: &str) -> String;

    /// Idempotent one-time setup: ensure directories or buckets exist.
    async fn bootstrap(&self) -> Result<(), StorageError>;

    /// Mirror the local static asset tree into the backend.
    ///
    /// No-op for backends that serve static files from local disk.
    async fn sync_static_assets(&self) -> Result<(), StorageError>;
}
