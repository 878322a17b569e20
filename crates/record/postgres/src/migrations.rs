use sqlx::PgPool;

use crate::config::PostgresConfig;

/// Run database migrations, creating the media table if it does not exist.
///
/// # Errors
///
/// Returns a [`sqlx::Error`] if the DDL statement fails.
pub async fn run_migrations(pool: &PgPool, config: &PostgresConfig) -> Result<(), sqlx::Error> {
    let media_table = config.media_table();

    // BIGSERIAL makes id allocation atomic in the database, which is what
    // keeps two concurrent saves from racing onto the same storage key.
    let create_media = format!(
        "CREATE TABLE IF NOT EXISTS {media_table} (
            id BIGSERIAL PRIMARY KEY,
            extension TEXT NOT NULL,
            mimetype TEXT NOT NULL,
            is_animated BOOLEAN NOT NULL DEFAULT FALSE
        )"
    );

    sqlx::query(&create_media).execute(pool).await?;

    Ok(())
}
