use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;

use tansu_record::error::RecordError;
use tansu_record::record::{MediaId, MediaRecord};
use tansu_record::store::MediaRecordStore;

use crate::config::PostgresConfig;
use crate::migrations;

/// Build `PgConnectOptions` from a [`PostgresConfig`], applying SSL settings
/// when configured.
pub(crate) fn build_connect_options(
    config: &PostgresConfig,
) -> Result<sqlx::postgres::PgConnectOptions, RecordError> {
    let mut options: sqlx::postgres::PgConnectOptions = config
        .url
        .parse()
        .map_err(|e: sqlx::Error| RecordError::Connection(e.to_string()))?;

    if let Some(ref mode) = config.ssl_mode {
        let ssl_mode = match mode.as_str() {
            "disable" => sqlx::postgres::PgSslMode::Disable,
            "prefer" => sqlx::postgres::PgSslMode::Prefer,
            "require" => sqlx::postgres::PgSslMode::Require,
            "verify-ca" => sqlx::postgres::PgSslMode::VerifyCa,
            "verify-full" => sqlx::postgres::PgSslMode::VerifyFull,
            other => {
                return Err(RecordError::Connection(format!("unknown ssl_mode: {other}")));
            }
        };
        options = options.ssl_mode(ssl_mode);
    }

    if let Some(ref path) = config.ssl_root_cert {
        options = options.ssl_root_cert(path);
    }

    Ok(options)
}

/// PostgreSQL-backed implementation of [`MediaRecordStore`].
///
/// Uses `sqlx::PgPool` for connection pooling. Ids come from a `BIGSERIAL`
/// column via `INSERT ... RETURNING id`, so allocation is atomic and visible
/// to the inserting session before any attachment bytes are written.
pub struct PostgresMediaStore {
    pool: PgPool,
    config: Arc<PostgresConfig>,
}

impl PostgresMediaStore {
    /// Create a new `PostgresMediaStore` from the provided configuration.
    ///
    /// Connects to `PostgreSQL`, creates the connection pool, and runs
    /// migrations to ensure the media table exists.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Connection`] if pool creation fails, or
    /// [`RecordError::Backend`] if migrations fail.
    pub async fn new(config: PostgresConfig) -> Result<Self, RecordError> {
        let connect_options = build_connect_options(&config)?;
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.pool_size)
            .connect_with(connect_options)
            .await
            .map_err(|e| RecordError::Connection(e.to_string()))?;

        migrations::run_migrations(&pool, &config)
            .await
            .map_err(|e| RecordError::Backend(e.to_string()))?;

        Ok(Self {
            pool,
            config: Arc::new(config),
        })
    }

    /// Create a `PostgresMediaStore` from an existing pool and config.
    ///
    /// Runs migrations on creation.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Backend`] if migrations fail.
    pub async fn from_pool(pool: PgPool, config: PostgresConfig) -> Result<Self, RecordError> {
        migrations::run_migrations(&pool, &config)
            .await
            .map_err(|e| RecordError::Backend(e.to_string()))?;

        Ok(Self {
            pool,
            config: Arc::new(config),
        })
    }
}

#[async_trait]
impl MediaRecordStore for PostgresMediaStore {
    #[instrument(skip(self))]
    async fn insert(&self, extension: &str, mimetype: &str) -> Result<MediaRecord, RecordError> {
        let table = self.config.media_table();
        let query = format!(
            "INSERT INTO {table} (extension, mimetype, is_animated) \
             VALUES ($1, $2, FALSE) \
             RETURNING id"
        );

        let row = sqlx::query(&query)
            .bind(extension)
            .bind(mimetype)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RecordError::Backend(e.to_string()))?;

        let id: i64 = row
            .try_get("id")
            .map_err(|e| RecordError::Backend(e.to_string()))?;

        Ok(MediaRecord {
            id: MediaId(id),
            extension: extension.to_owned(),
            mimetype: mimetype.to_owned(),
            is_animated: false,
        })
    }

    #[instrument(skip(self))]
    async fn get(&self, id: MediaId) -> Result<Option<MediaRecord>, RecordError> {
        let table = self.config.media_table();
        let query = format!(
            "SELECT id, extension, mimetype, is_animated FROM {table} WHERE id = $1"
        );

        let row = sqlx::query(&query)
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RecordError::Backend(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let record = MediaRecord {
            id: MediaId(
                row.try_get("id")
                    .map_err(|e| RecordError::Backend(e.to_string()))?,
            ),
            extension: row
                .try_get("extension")
                .map_err(|e| RecordError::Backend(e.to_string()))?,
            mimetype: row
                .try_get("mimetype")
                .map_err(|e| RecordError::Backend(e.to_string()))?,
            is_animated: row
                .try_get("is_animated")
                .map_err(|e| RecordError::Backend(e.to_string()))?,
        };

        Ok(Some(record))
    }

    #[instrument(skip(self))]
    async fn set_animated(&self, id: MediaId, is_animated: bool) -> Result<(), RecordError> {
        let table = self.config.media_table();
        let query = format!("UPDATE {table} SET is_animated = $2 WHERE id = $1");

        let result = sqlx::query(&query)
            .bind(id.value())
            .bind(is_animated)
            .execute(&self.pool)
            .await
            .map_err(|e| RecordError::Backend(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RecordError::NotFound(id.to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: MediaId) -> Result<bool, RecordError> {
        let table = self.config.media_table();
        let query = format!("DELETE FROM {table} WHERE id = $1");

        let result = sqlx::query(&query)
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(|e| RecordError::Backend(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}


/// Integration tests against a live database, gated behind the `integration`
/// feature and the `TANSU_TEST_DATABASE_URL` environment variable.
#[cfg(all(test, feature = "integration"))]
mod integration_tests {
    use super::*;
    use tansu_record::testing::run_record_store_conformance_tests;

    async fn test_store() -> PostgresMediaStore {
        let url = std::env::var("TANSU_TEST_DATABASE_URL")
            .expect("TANSU_TEST_DATABASE_URL must be set for integration tests");
        let config = PostgresConfig {
            url,
            table_prefix: "tansu_test_".into(),
            ..PostgresConfig::default()
        };
        PostgresMediaStore::new(config)
            .await
            .expect("store should connect")
    }

    #[tokio::test]
    async fn conformance() {
        let store = test_store().await;
        run_record_store_conformance_tests(&store)
            .await
            .expect("conformance suite should pass");
    }
}
