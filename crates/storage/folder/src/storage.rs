use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use tansu_record::{MediaId, MediaRecord};
use tansu_storage::backend::{FetchResponse, StorageBackend};
use tansu_storage::error::StorageError;
use tansu_storage::key::{attachment_object_name, thumbnail_object_name};

fn default_route_prefix() -> String {
    String::from("/media")
}

/// Configuration for the local-filesystem storage backend.
#[derive(Debug, Clone, Deserialize)]
pub struct FolderConfig {
    /// Directory attachment and thumbnail files are written to.
    pub upload_dir: PathBuf,

    /// Route prefix used when resolving attachment URLs (the web layer is
    /// expected to serve `{route_prefix}/{id}.{ext}` from `upload_dir`).
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,

    /// Route prefix for static assets, which the folder backend leaves on
    /// local disk for the web layer to serve.
    #[serde(default = "default_static_prefix")]
    pub static_prefix: String,
}

fn default_static_prefix() -> String {
    String::from("/static")
}

impl Default for FolderConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            route_prefix: default_route_prefix(),
            static_prefix: default_static_prefix(),
        }
    }
}

/// Local-filesystem implementation of [`StorageBackend`].
///
/// Files are named `{id}.{ext}` for originals and `thumb-{id}.jpg` for
/// thumbnails, all in one configured directory. Static assets are not mirrored anywhere;
/// the web layer serves them from disk directly.
#[derive(Debug)]
pub struct FolderStorage {
    config: FolderConfig,
}

impl FolderStorage {
    /// Create a new folder backend. No I/O happens until
    /// [`bootstrap`](StorageBackend::bootstrap) or the first write.
    pub fn new(config: FolderConfig) -> Self {
        Self { config }
    }

    fn object_path(&self, name: &str) -> PathBuf {
        self.config.upload_dir.join(name)
    }

    async fn write_object(&self, name: &str, data: Bytes) -> Result<(), StorageError> {
        let path = self.object_path(name);
        debug!(path = %path.display(), size = data.len(), "writing object");
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| StorageError::Write(format!("{}: {e}", path.display())))
    }

    async fn remove_object(&self, name: &str) -> Result<(), StorageError> {
        let path = self.object_path(name);
        tokio::fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(name.to_owned())
            } else {
                StorageError::Backend(format!("{}: {e}", path.display()))
            }
        })
    }

    async fn modified_time(path: &Path) -> Result<DateTime<Utc>, StorageError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| StorageError::Read(format!("{}: {e}", path.display())))?;
        let modified = metadata
            .modified()
            .map_err(|e| StorageError::Read(format!("{}: {e}", path.display())))?;
        Ok(DateTime::<Utc>::from(modified))
    }
}

#[async_trait]
impl StorageBackend for FolderStorage {
    #[instrument(skip(self, data), fields(media_id = %id))]
    async fn put_attachment(
        &self,
        id: MediaId,
        extension: &str,
        _mimetype: &str,
        data: Bytes,
    ) -> Result<(), StorageError> {
        self.write_object(&attachment_object_name(id, extension), data)
            .await
    }

    #[instrument(skip(self, data), fields(media_id = %id))]
    async fn put_thumbnail(&self, id: MediaId, data: Bytes) -> Result<(), StorageError> {
        self.write_object(&thumbnail_object_name(id), data).await
    }

    #[instrument(skip(self, record), fields(media_id = %record.id))]
    async fn fetch(&self, record: &MediaRecord) -> Result<FetchResponse, StorageError> {
        let name = attachment_object_name(record.id, &record.extension);
        let path = self.object_path(&name);

        let data = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(name.clone())
            } else {
                StorageError::Read(format!("{}: {e}", path.display()))
            }
        })?;
        let last_modified = Self::modified_time(&path).await?;

        Ok(FetchResponse::Bytes {
            data: Bytes::from(data),
            content_type: record.mimetype.clone(),
            last_modified,
        })
    }

    #[instrument(skip(self), fields(media_id = %id))]
    async fn delete_attachment(&self, id: MediaId, extension: &str) -> Result<(), StorageError> {
        self.remove_object(&attachment_object_name(id, extension))
            .await
    }

    #[instrument(skip(self), fields(media_id = %id))]
    async fn delete_thumbnail(&self, id: MediaId) -> Result<(), StorageError> {
        self.remove_object(&thumbnail_object_name(id)).await
    }

    fn attachment_url(&self, id: MediaId, extension: &str) -> String {
        format!(
            "{}/{}",
            self.config.route_prefix,
            attachment_object_name(id, extension)
        )
    }

    fn thumbnail_url(&self, id: MediaId) -> String {
        format!("{}/{}", self.config.route_prefix, thumbnail_object_name(id))
    }

    fn static_url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.static_prefix)
    }

    async fn bootstrap(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.config.upload_dir)
            .await
            .map_err(|e| {
                StorageError::Bootstrap(format!(
                    "{}: {e}",
                    self.config.upload_dir.display()
                ))
            })?;
        info!(dir = %self.config.upload_dir.display(), "upload directory ready");
        Ok(())
    }

    async fn sync_static_assets(&self) -> Result<(), StorageError> {
        // Static files are served straight from disk; nothing to mirror.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_storage() -> (tempfile::TempDir, FolderStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = FolderStorage::new(FolderConfig {
            upload_dir: dir.path().to_path_buf(),
            ..FolderConfig::default()
        });
        (dir, storage)
    }

    fn test_record(id: i64, extension: &str) -> MediaRecord {
        MediaRecord {
            id: MediaId(id),
            extension: extension.to_owned(),
            mimetype: "image/jpeg".to_owned(),
            is_animated: false,
        }
    }

    #[tokio::test]
    async fn roundtrip_is_byte_identical() {
        let (_dir, storage) = test_storage();
        let payload = Bytes::from_static(b"\xff\xd8\xff\xe0 not really a jpeg");

        storage
            .put_attachment(MediaId(1), "jpg", "image/jpeg", payload.clone())
            .await
            .unwrap();

        match storage.fetch(&test_record(1, "jpg")).await.unwrap() {
            FetchResponse::Bytes {
                data, content_type, ..
            } => {
                assert_eq!(data, payload);
                assert_eq!(content_type, "image/jpeg");
            }
            FetchResponse::Redirect { .. } => panic!("folder backend should stream bytes"),
        }
    }

    #[tokio::test]
    async fn fetch_missing_is_not_found() {
        let (_dir, storage) = test_storage();
        let result = storage.fetch(&test_record(99, "png")).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_then_fetch_is_not_found() {
        let (_dir, storage) = test_storage();
        storage
            .put_attachment(MediaId(2), "png", "image/png", Bytes::from_static(b"png"))
            .await
            .unwrap();

        storage.delete_attachment(MediaId(2), "png").await.unwrap();
        let result = storage.fetch(&test_record(2, "png")).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn second_delete_errors() {
        let (_dir, storage) = test_storage();
        storage
            .put_attachment(MediaId(3), "gif", "image/gif", Bytes::from_static(b"gif"))
            .await
            .unwrap();

        storage.delete_attachment(MediaId(3), "gif").await.unwrap();
        let result = storage.delete_attachment(MediaId(3), "gif").await;
        assert!(
            matches!(result, Err(StorageError::NotFound(_))),
            "delete is not idempotent"
        );
    }

    #[tokio::test]
    async fn thumbnail_writes_under_fixed_jpg_name() {
        let (dir, storage) = test_storage();
        storage
            .put_thumbnail(MediaId(4), Bytes::from_static(b"thumb"))
            .await
            .unwrap();
        assert!(dir.path().join("thumb-4.jpg").exists());
    }

    #[tokio::test]
    async fn jpg_original_and_thumbnail_coexist() {
        let (dir, storage) = test_storage();
        let payload = Bytes::from_static(b"original-jpeg-bytes");
        storage
            .put_attachment(MediaId(6), "jpg", "image/jpeg", payload.clone())
            .await
            .unwrap();
        storage
            .put_thumbnail(MediaId(6), Bytes::from_static(b"thumbnail-bytes"))
            .await
            .unwrap();

        assert!(dir.path().join("6.jpg").exists());
        assert!(dir.path().join("thumb-6.jpg").exists());
        match storage.fetch(&test_record(6, "jpg")).await.unwrap() {
            FetchResponse::Bytes { data, .. } => assert_eq!(data, payload),
            FetchResponse::Redirect { .. } => panic!("folder backend should stream bytes"),
        }
    }

    #[tokio::test]
    async fn bootstrap_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FolderStorage::new(FolderConfig {
            upload_dir: dir.path().join("banners"),
            ..FolderConfig::default()
        });
        storage.bootstrap().await.unwrap();
        storage.bootstrap().await.unwrap();
        assert!(dir.path().join("banners").is_dir());
    }

    #[test]
    fn urls_are_pure_and_route_based() {
        let storage = FolderStorage::new(FolderConfig::default());
        let first = storage.attachment_url(MediaId(5), "webm");
        let second = storage.attachment_url(MediaId(5), "webm");
        assert_eq!(first, "/media/5.webm");
        assert_eq!(first, second);
        assert_eq!(storage.thumbnail_url(MediaId(5)), "/media/thumb-5.jpg");
        assert_eq!(storage.static_url("css/site.css"), "/static/css/site.css");
    }
}
