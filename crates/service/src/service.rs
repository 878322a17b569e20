use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, instrument, warn};

use tansu_record::{MediaId, MediaRecord, MediaRecordStore, infer_extension};
use tansu_storage::{FetchResponse, StorageBackend, StorageError};
use tansu_thumbnail::Thumbnailer;

use crate::error::MediaError;

/// Orchestrates uploads across the record store, storage backend, and
/// thumbnail pipeline.
///
/// All three collaborators are injected at construction; the service holds
/// no ambient state. Operations are synchronous sequences of I/O within one
/// call — there is no internal queueing or retry.
pub struct MediaService {
    records: Arc<dyn MediaRecordStore>,
    backend: Arc<dyn StorageBackend>,
    thumbnailer: Arc<dyn Thumbnailer>,
}

impl MediaService {
    /// Create a service from its collaborators.
    pub fn new(
        records: Arc<dyn MediaRecordStore>,
        backend: Arc<dyn StorageBackend>,
        thumbnailer: Arc<dyn Thumbnailer>,
    ) -> Self {
        Self {
            records,
            backend,
            thumbnailer,
        }
    }

    /// Store an upload: allocate a record, persist the original bytes,
    /// derive and persist a thumbnail, and return the populated record.
    ///
    /// The record is inserted before any bytes are written so the storage
    /// key `(id, extension)` is stable. If any later step fails, everything
    /// written so far is compensated in reverse order — no thumbnail-less
    /// records and no unreferenced blobs are left behind. Compensation
    /// failures are logged and the primary error is surfaced.
    #[instrument(skip(self, data), fields(filename = %filename, size = data.len()))]
    pub async fn save(
        &self,
        filename: &str,
        mimetype: &str,
        data: Bytes,
    ) -> Result<MediaRecord, MediaError> {
        let extension = infer_extension(filename)?;
        let mut record = self.records.insert(&extension, mimetype).await?;
        let id = record.id;

        if let Err(err) = self
            .backend
            .put_attachment(id, &extension, mimetype, data.clone())
            .await
        {
            self.compensate(id, &extension, false, false).await;
            return Err(err.into());
        }

        let thumbnail = match self.thumbnailer.render(data).await {
            Ok(thumbnail) => thumbnail,
            Err(err) => {
                self.compensate(id, &extension, true, false).await;
                return Err(err.into());
            }
        };

        if let Err(err) = self.backend.put_thumbnail(id, thumbnail.data).await {
            self.compensate(id, &extension, true, false).await;
            return Err(err.into());
        }

        if let Err(err) = self.records.set_animated(id, thumbnail.is_animated).await {
            self.compensate(id, &extension, true, true).await;
            return Err(err.into());
        }
        record.is_animated = thumbnail.is_animated;

        info!(media_id = %id, extension = %record.extension, is_animated = record.is_animated, "media saved");
        Ok(record)
    }

    /// Undo a partial save: remove whatever objects were written, then the
    /// record. Each step is best-effort; failures are logged at `warn` so
    /// they never mask the error that triggered the rollback.
    async fn compensate(
        &self,
        id: MediaId,
        extension: &str,
        original_written: bool,
        thumbnail_written: bool,
    ) {
        if thumbnail_written {
            if let Err(err) = self.backend.delete_thumbnail(id).await {
                warn!(media_id = %id, error = %err, "rollback: thumbnail delete failed");
            }
        }
        if original_written {
            if let Err(err) = self.backend.delete_attachment(id, extension).await {
                warn!(media_id = %id, error = %err, "rollback: attachment delete failed");
            }
        }
        if let Err(err) = self.records.delete(id).await {
            warn!(media_id = %id, error = %err, "rollback: record delete failed");
        }
    }

    /// Retrieve the original attachment for a media id.
    ///
    /// The folder backend answers with the bytes and a last-modified stamp;
    /// the S3 backend answers with a redirect URL.
    #[instrument(skip(self), fields(media_id = %id))]
    pub async fn fetch(&self, id: MediaId) -> Result<FetchResponse, MediaError> {
        let record = self.get(id).await?;
        Ok(self.backend.fetch(&record).await?)
    }

    /// Look up a record's metadata (extension, mimetype, animated flag).
    pub async fn get(&self, id: MediaId) -> Result<MediaRecord, MediaError> {
        self.records
            .get(id)
            .await?
            .ok_or(MediaError::NotFound(id))
    }

    /// Delete a media item: its original, its thumbnail, and its record.
    ///
    /// Objects go first so a failure can never strand blobs behind a deleted
    /// row. A thumbnail that is already absent (e.g. left behind by an
    /// interrupted earlier delete) is tolerated, so a retry can still reach
    /// the record delete; any other thumbnail failure leaves the record in
    /// place and surfaces. Deleting an unknown id is [`MediaError::NotFound`].
    #[instrument(skip(self), fields(media_id = %id))]
    pub async fn delete(&self, id: MediaId) -> Result<(), MediaError> {
        let record = self.get(id).await?;
        self.backend
            .delete_attachment(record.id, &record.extension)
            .await?;
        match self.backend.delete_thumbnail(record.id).await {
            Ok(()) => {}
            Err(StorageError::NotFound(_)) => {
                warn!(media_id = %id, "thumbnail already absent during delete");
            }
            Err(err) => return Err(err.into()),
        }
        self.records.delete(record.id).await?;
        info!(media_id = %id, "media deleted");
        Ok(())
    }

    /// Public URL of a record's original attachment. Pure.
    pub fn media_url(&self, record: &MediaRecord) -> String {
        self.backend.attachment_url(record.id, &record.extension)
    }

    /// Public URL of a record's thumbnail. Pure.
    pub fn thumbnail_url(&self, record: &MediaRecord) -> String {
        self.backend.thumbnail_url(record.id)
    }

    /// Public URL of a static asset. Pure.
    pub fn static_url(&self, path: &str) -> String {
        self.backend.static_url(path)
    }

    /// Ensure the backend's directories or buckets exist. Idempotent.
    pub async fn bootstrap(&self) -> Result<(), MediaError> {
        Ok(self.backend.bootstrap().await?)
    }

    /// Mirror static assets into the backend (no-op for folder storage).
    pub async fn sync_static_assets(&self) -> Result<(), MediaError> {
        Ok(self.backend.sync_static_assets().await?)
    }
}
