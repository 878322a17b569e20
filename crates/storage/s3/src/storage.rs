use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, error, info, instrument, warn};

use tansu_record::{MediaId, MediaRecord};
use tansu_storage::backend::{FetchResponse, StorageBackend};
use tansu_storage::error::StorageError;
use tansu_storage::key::{attachment_object_name, thumbnail_object_name};
use tansu_storage::static_assets::{collect_static_files, guess_content_type};

use crate::config::S3Config;
use crate::policy::public_read_policy;

/// Logical bucket holding original attachments and thumbnails.
const ATTACHMENT_BUCKET: &str = "attachments";
/// Logical bucket holding mirrored static assets.
const STATIC_BUCKET: &str = "static";

/// S3-compatible implementation of [`StorageBackend`].
///
/// Objects are publicly readable once [`bootstrap`](StorageBackend::bootstrap)
/// has applied the bucket policy, so `fetch` answers with a redirect to the
/// object URL instead of proxying bytes through the application.
pub struct S3Storage {
    config: S3Config,
    client: aws_sdk_s3::Client,
}

impl std::fmt::Debug for S3Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Storage")
            .field("config", &self.config)
            .field("client", &"<S3Client>")
            .finish()
    }
}

impl S3Storage {
    /// Create a new `S3Storage` by building an SDK client from the config.
    ///
    /// Uses static credentials, the configured endpoint, and path-style
    /// addressing (`MinIO` and most self-hosted services require it).
    pub async fn new(config: S3Config) -> Self {
        let credentials = aws_sdk_s3::config::Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "tansu-s3",
        );
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .endpoint_url(&config.endpoint)
            .credentials_provider(credentials)
            .load()
            .await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();
        let client = aws_sdk_s3::Client::from_conf(s3_config);
        Self { config, client }
    }

    /// Create an `S3Storage` with a pre-built client (for testing).
    pub fn with_client(config: S3Config, client: aws_sdk_s3::Client) -> Self {
        Self { config, client }
    }

    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<(), StorageError> {
        let bucket = self.config.bucket_name(ATTACHMENT_BUCKET);
        debug!(bucket = %bucket, key = %key, size = data.len(), "uploading object");

        self.client
            .put_object()
            .bucket(&bucket)
            .key(key)
            .content_type(content_type)
            .body(aws_sdk_s3::primitives::ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                error!(bucket = %bucket, key = %key, error = %e, "put_object failed");
                StorageError::Write(e.to_string())
            })?;

        info!(bucket = %bucket, key = %key, "object uploaded");
        Ok(())
    }

    async fn remove_object(&self, key: &str) -> Result<(), StorageError> {
        let bucket = self.config.bucket_name(ATTACHMENT_BUCKET);

        // DeleteObject succeeds on missing keys, so probe first: a second
        // delete of the same object must surface NotFound.
        self.client
            .head_object()
            .bucket(&bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_err = e.into_service_error();
                if service_err.is_not_found() {
                    StorageError::NotFound(key.to_owned())
                } else {
                    StorageError::Backend(service_err.to_string())
                }
            })?;

        self.client
            .delete_object()
            .bucket(&bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                error!(bucket = %bucket, key = %key, error = %e, "delete_object failed");
                StorageError::Backend(e.to_string())
            })?;

        info!(bucket = %bucket, key = %key, "object deleted");
        Ok(())
    }

    async fn create_bucket(&self, logical: &str) -> Result<(), StorageError> {
        let name = self.config.bucket_name(logical);
        match self.client.create_bucket().bucket(&name).send().await {
            Ok(_) => {
                info!(bucket = %name, "bucket created");
                Ok(())
            }
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_bucket_already_owned_by_you()
                    || service_err.is_bucket_already_exists()
                {
                    debug!(bucket = %name, "bucket already present");
                    Ok(())
                } else {
                    Err(StorageError::Bootstrap(service_err.to_string()))
                }
            }
        }
    }

    async fn apply_public_read_policy(&self, logical: &str) -> Result<(), StorageError> {
        let name = self.config.bucket_name(logical);
        let policy = public_read_policy(&name);
        self.client
            .put_bucket_policy()
            .bucket(&name)
            .policy(policy)
            .send()
            .await
            .map_err(|e| {
                error!(bucket = %name, error = %e, "put_bucket_policy failed");
                StorageError::Bootstrap(e.to_string())
            })?;
        debug!(bucket = %name, "public-read policy applied");
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for S3Storage {
    #[instrument(skip(self, data), fields(media_id = %id))]
    async fn put_attachment(
        &self,
        id: MediaId,
        extension: &str,
        mimetype: &str,
        data: Bytes,
    ) -> Result<(), StorageError> {
        let key = attachment_object_name(id, extension);
        self.put_object(&key, mimetype, data).await
    }

    #[instrument(skip(self, data), fields(media_id = %id))]
    async fn put_thumbnail(&self, id: MediaId, data: Bytes) -> Result<(), StorageError> {
        let key = thumbnail_object_name(id);
        self.put_object(&key, "image/jpeg", data).await
    }

    async fn fetch(&self, record: &MediaRecord) -> Result<FetchResponse, StorageError> {
        Ok(FetchResponse::Redirect {
            url: self.attachment_url(record.id, &record.extension),
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
        self.config
            .format_url(ATTACHMENT_BUCKET, &attachment_object_name(id, extension))
    }

    fn thumbnail_url(&self, id: MediaId) -> String {
        self.config
            .format_url(ATTACHMENT_BUCKET, &thumbnail_object_name(id))
    }

    fn static_url(&self, path: &str) -> String {
        self.config.format_url(STATIC_BUCKET, path)
    }

    #[instrument(skip(self))]
    async fn bootstrap(&self) -> Result<(), StorageError> {
        self.create_bucket(ATTACHMENT_BUCKET).await?;
        self.create_bucket(STATIC_BUCKET).await?;
        // Apply policies right away so a fresh deployment serves public
        // objects before the first static sync runs.
        self.apply_public_read_policy(ATTACHMENT_BUCKET).await?;
        self.apply_public_read_policy(STATIC_BUCKET).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn sync_static_assets(&self) -> Result<(), StorageError> {
        let assets = collect_static_files(
            &self.config.static_dir,
            self.config.static_override_dir.as_deref(),
        )?;
        let bucket = self.config.bucket_name(STATIC_BUCKET);

        for asset in &assets {
            let data = tokio::fs::read(&asset.path)
                .await
                .map_err(|e| {
                    StorageError::StaticSync(format!("{}: {e}", asset.path.display()))
                })?;
            let content_type = guess_content_type(&asset.path);

            self.client
                .put_object()
                .bucket(&bucket)
                .key(&asset.key)
                .content_type(content_type)
                .body(aws_sdk_s3::primitives::ByteStream::from(data))
                .send()
                .await
                .map_err(|e| {
                    warn!(bucket = %bucket, key = %asset.key, error = %e, "static upload failed");
                    StorageError::StaticSync(e.to_string())
                })?;
            debug!(bucket = %bucket, key = %asset.key, content_type, "static asset mirrored");
        }

        info!(bucket = %bucket, count = assets.len(), "static assets synced");

        self.apply_public_read_policy(ATTACHMENT_BUCKET).await?;
        self.apply_public_read_policy(STATIC_BUCKET).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_storage(config: S3Config) -> S3Storage {
        // URL resolution needs no network; build a bare client that is
        // never exercised instead of going through the SDK's env loader.
        let sdk_config = aws_sdk_s3::config::Builder::new()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new("us-east-1"))
            .build();
        let client = aws_sdk_s3::Client::from_conf(sdk_config);
        S3Storage::with_client(config, client)
    }

    #[test]
    fn attachment_url_is_bucket_direct() {
        let storage = test_storage(S3Config::new("https://s3.example.com", "ak", "sk"));
        assert_eq!(
            storage.attachment_url(MediaId(12), "png"),
            "https://s3.example.com/attachments/12.png"
        );
        assert_eq!(
            storage.thumbnail_url(MediaId(12)),
            "https://s3.example.com/attachments/thumb-12.jpg"
        );
    }

    #[test]
    fn static_url_uses_static_bucket() {
        let storage = test_storage(
            S3Config::new("https://s3.example.com", "ak", "sk").with_bucket_prefix("t1-"),
        );
        assert_eq!(
            storage.static_url("css/stock/theme-stock.css"),
            "https://s3.example.com/t1-static/css/stock/theme-stock.css"
        );
    }

    #[tokio::test]
    async fn fetch_redirects_to_attachment_url() {
        let storage = test_storage(S3Config::new("https://s3.example.com", "ak", "sk"));
        let record = MediaRecord {
            id: MediaId(3),
            extension: "webm".into(),
            mimetype: "video/webm".into(),
            is_animated: true,
        };
        match storage.fetch(&record).await.unwrap() {
            FetchResponse::Redirect { url } => {
                assert_eq!(url, "https://s3.example.com/attachments/3.webm");
            }
            FetchResponse::Bytes { .. } => panic!("S3 backend should redirect"),
        }
    }

    #[test]
    fn cdn_rewrite_applies_to_all_urls() {
        let storage = test_storage(
            S3Config::new("https://s3.example.com", "ak", "sk")
                .with_cdn_rewrite("https://cdn.example.net/{bucket}/{path}"),
        );
        assert_eq!(
            storage.attachment_url(MediaId(8), "gif"),
            "https://cdn.example.net/attachments/8.gif"
        );
        assert_eq!(
            storage.static_url("favicon.ico"),
            "https://cdn.example.net/static/favicon.ico"
        );
    }
}
