use async_trait::async_trait;

use crate::error::RecordError;
use crate::record::{MediaId, MediaRecord};

/// Trait for persisting media records.
///
/// The store is the sole arbiter of id uniqueness: `insert` must allocate ids
/// atomically so that two concurrent saves can never observe the same id.
/// Implementations must be `Send + Sync` and safe for concurrent access.
#[async_trait]
pub trait MediaRecordStore: Send + Sync {
    /// Insert a new record and return it with its assigned id.
    ///
    /// The returned record has `is_animated = false`; the flag is persisted
    /// later via [`set_animated`](Self::set_animated) once thumbnail
    /// derivation has inspected the source.
    async fn insert(&self, extension: &str, mimetype: &str) -> Result<MediaRecord, RecordError>;

    /// Look up a record by id. Returns `None` if no such record exists.
    async fn get(&self, id: MediaId) -> Result<Option<MediaRecord>, RecordError>;

    /// Persist the animated flag for an existing record.
    ///
    /// Returns [`RecordError::NotFound`] if the record does not exist.
    async fn set_animated(&self, id: MediaId, is_animated: bool) -> Result<(), RecordError>;

    /// Delete a record by id. Returns `true` if the record existed.
    async fn delete(&self, id: MediaId) -> Result<bool, RecordError>;
}
