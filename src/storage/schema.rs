use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

use super::types::StorageError;

// ============================================================================
// History store
// ============================================================================

/// Durable record of which (feed, title) pairs have already been downloaded.
///
/// Backed by a single SQLite file. The table is append-only: rows are
/// inserted after a successful download and never updated or deleted.
#[derive(Clone)]
pub struct History {
    pub(crate) pool: SqlitePool,
}

impl History {
    /// Open the store at `path`, creating the file and schema if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] when the path is unwritable and
    /// [`StorageError::Migration`] when the schema cannot be created (for
    /// example because the file exists but is not a SQLite database).
    pub async fn open(path: &str) -> Result<Self, StorageError> {
        let url = format!("sqlite:{}?mode=rwc", path);

        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| StorageError::Open(e.to_string()))?
            .pragma("busy_timeout", "5000");
        // The run loop is the store's only client and accesses it strictly
        // sequentially, so one connection is enough.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Open(e.to_string()))?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Create the history schema. Idempotent: `IF NOT EXISTS` throughout,
    /// safe to run on every open.
    async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS history (
                id INTEGER PRIMARY KEY,
                downloaded_at INTEGER NOT NULL,
                feed TEXT NOT NULL,
                url TEXT NOT NULL,
                title TEXT NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Migration(e.to_string()))?;

        // Lookups are always by the exact (feed, title) pair
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_history_feed_title ON history(feed, title)")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Migration(e.to_string()))?;

        Ok(())
    }
}
