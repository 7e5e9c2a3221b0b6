use chrono::{DateTime, Utc};

use super::schema::History;
use super::types::StorageError;

impl History {
    // ========================================================================
    // History operations
    // ========================================================================

    /// Most recent recorded download time for this exact (feed, title) pair,
    /// or `None` if the pair was never recorded.
    ///
    /// Lookup is a case-sensitive string match on both fields, with no
    /// normalization — the raw entry title is the key, not the sanitized one.
    pub async fn has(
        &self,
        feed: &str,
        title: &str,
    ) -> Result<Option<DateTime<Utc>>, StorageError> {
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT downloaded_at FROM history
            WHERE feed = ? AND title = ?
            ORDER BY downloaded_at DESC
            LIMIT 1
        "#,
        )
        .bind(feed)
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(|(ts,)| DateTime::from_timestamp(ts, 0)))
    }

    /// Append a row stamped with the current time.
    ///
    /// The insert autocommits, so the record is durable before this returns:
    /// a crash immediately afterwards cannot re-trigger the download on the
    /// next run.
    pub async fn record(&self, feed: &str, url: &str, title: &str) -> Result<(), StorageError> {
        tracing::debug!(feed = %feed, title = %title, "Adding entry to history");
        sqlx::query("INSERT INTO history (downloaded_at, feed, url, title) VALUES (?, ?, ?, ?)")
            .bind(Utc::now().timestamp())
            .bind(feed)
            .bind(url)
            .bind(title)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Close the underlying pool. Safe to call once per open store.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
