use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use tansu_record::MediaRecordStore;
use tansu_record_memory::MemoryMediaStore;
use tansu_record_postgres::{PostgresConfig, PostgresMediaStore};
use tansu_storage::StorageBackend;
use tansu_storage_folder::{FolderConfig, FolderStorage};
use tansu_storage_s3::{S3Config, S3Storage};
use tansu_thumbnail::{FfmpegThumbnailer, ThumbnailConfig};

use crate::error::ConfigError;
use crate::service::MediaService;

/// Which storage backend a deployment uses.
///
/// A closed set: the selector string must be one of the recognized spellings,
/// and anything else fails configuration parsing outright. Switching the
/// provider on an existing deployment strands previously stored objects in
/// the old backend; operators must migrate bytes out-of-band first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum StorageProvider {
    /// Local filesystem storage.
    #[default]
    #[serde(rename = "FOLDER")]
    Folder,
    /// S3-compatible object storage.
    #[serde(rename = "S3")]
    S3,
}

impl FromStr for StorageProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FOLDER" => Ok(Self::Folder),
            "S3" => Ok(Self::S3),
            other => Err(ConfigError::UnknownProvider(other.to_owned())),
        }
    }
}

/// Top-level configuration for the media storage layer, loaded from TOML.
#[derive(Debug, Default, Deserialize)]
pub struct MediaConfig {
    /// Storage backend selector. Defaults to local folder storage.
    #[serde(default)]
    pub provider: StorageProvider,

    /// Folder backend settings.
    #[serde(default)]
    pub folder: FolderConfig,

    /// S3 backend settings; required when `provider = "S3"`.
    #[serde(default)]
    pub s3: Option<S3Config>,

    /// Thumbnail pipeline settings.
    #[serde(default)]
    pub thumbnail: ThumbnailConfig,

    /// Record store database settings. When absent, records live in memory
    /// and do not survive a restart.
    #[serde(default)]
    pub database: Option<PostgresConfig>,
}

impl MediaConfig {
    /// Parse a configuration from a TOML string.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&input)
    }
}

/// Construct the storage backend selected by the configuration.
pub async fn build_backend(
    config: &MediaConfig,
) -> Result<Arc<dyn StorageBackend>, ConfigError> {
    match config.provider {
        StorageProvider::Folder => {
            info!(dir = %config.folder.upload_dir.display(), "using folder storage backend");
            Ok(Arc::new(FolderStorage::new(config.folder.clone())))
        }
        StorageProvider::S3 => {
            let s3_config = config.s3.as_ref().ok_or(ConfigError::MissingSection {
                provider: "S3",
                section: "s3",
            })?;
            info!(endpoint = %s3_config.endpoint, "using S3 storage backend");
            Ok(Arc::new(S3Storage::new(s3_config.clone()).await))
        }
    }
}

/// Construct the record store selected by the configuration.
pub async fn build_record_store(
    config: &MediaConfig,
) -> Result<Arc<dyn MediaRecordStore>, ConfigError> {
    match &config.database {
        Some(db_config) => {
            info!("using PostgreSQL record store");
            let store = PostgresMediaStore::new(db_config.clone())
                .await
                .map_err(|e| ConfigError::RecordStore(e.to_string()))?;
            Ok(Arc::new(store))
        }
        None => {
            info!("using in-memory record store");
            Ok(Arc::new(MemoryMediaStore::new()))
        }
    }
}

/// Wire up a complete [`MediaService`] from configuration.
///
/// This is the single composition point: the backend, record store, and
/// thumbnailer are constructed here and injected, never looked up from
/// ambient state. Any failure is fatal to startup.
pub async fn build_service(config: &MediaConfig) -> Result<MediaService, ConfigError> {
    let backend = build_backend(config).await?;
    let records = build_record_store(config).await?;
    let thumbnailer = Arc::new(FfmpegThumbnailer::new(config.thumbnail.clone()));
    Ok(MediaService::new(records, backend, thumbnailer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_defaults_to_folder() {
        let config = MediaConfig::from_toml_str("").unwrap();
        assert_eq!(config.provider, StorageProvider::Folder);
        assert!(config.s3.is_none());
        assert!(config.database.is_none());
    }

    #[test]
    fn recognized_selectors_parse() {
        let config = MediaConfig::from_toml_str("provider = \"FOLDER\"").unwrap();
        assert_eq!(config.provider, StorageProvider::Folder);

        let config = MediaConfig::from_toml_str(
            "provider = \"S3\"\n\
             [s3]\n\
             endpoint = \"https://s3.example.com\"\n\
             access_key = \"ak\"\n\
             secret_key = \"sk\"\n",
        )
        .unwrap();
        assert_eq!(config.provider, StorageProvider::S3);
        assert!(config.s3.is_some());
    }

    #[test]
    fn unknown_selector_is_a_parse_error() {
        let result = MediaConfig::from_toml_str("provider = \"GLACIER\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn from_str_rejects_unknown_selector() {
        assert_eq!("FOLDER".parse::<StorageProvider>().unwrap(), StorageProvider::Folder);
        assert_eq!("S3".parse::<StorageProvider>().unwrap(), StorageProvider::S3);
        let err = "tape".parse::<StorageProvider>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProvider(ref s) if s == "tape"));
    }

    #[test]
    fn folder_and_thumbnail_sections_have_defaults() {
        let config = MediaConfig::from_toml_str(
            "[folder]\n\
             upload_dir = \"banners\"\n\
             [thumbnail]\n\
             timeout_seconds = 10\n",
        )
        .unwrap();
        assert_eq!(config.folder.upload_dir.to_str(), Some("banners"));
        assert_eq!(config.folder.route_prefix, "/media");
        assert_eq!(config.thumbnail.timeout_seconds, 10);
        assert_eq!(config.thumbnail.bound, 500);
    }

    #[tokio::test]
    async fn s3_provider_without_section_fails_loudly() {
        let config = MediaConfig::from_toml_str("provider = \"S3\"").unwrap();
        let result = build_backend(&config).await;
        assert!(matches!(
            result,
            Err(ConfigError::MissingSection { provider: "S3", .. })
        ));
    }

    #[tokio::test]
    async fn folder_provider_builds() {
        let config = MediaConfig::from_toml_str("").unwrap();
        let backend = build_backend(&config).await.unwrap();
        assert_eq!(
            backend.static_url("css/site.css"),
            "/static/css/site.css"
        );
    }
}
