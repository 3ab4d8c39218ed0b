//! SQLite Playlist Store

use async_trait::async_trait;
use chrono::Utc;

use super::DbPool;
use crate::application::ports::{PlaylistStorePort, RepositoryError};

/// 按内容 id 存放播放列表缓存记录
pub struct SqlitePlaylistStore {
    pool: DbPool,
}

impl SqlitePlaylistStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlaylistStorePort for SqlitePlaylistStore {
    async fn load(&self, content_id: &str) -> Result<Option<String>, RepositoryError> {
        let payload: Option<String> =
            sqlx::query_scalar("SELECT payload FROM playlist_cache WHERE content_id = ?")
                .bind(content_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(payload)
    }

    async fn save(&self, content_id: &str, payload: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO playlist_cache (content_id, payload, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(content_id) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(content_id)
        .bind(payload)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        tracing::debug!(content_id = %content_id, bytes = payload.len(), "Playlist record saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::sqlite::{create_pool, run_migrations, DatabaseConfig};

    async fn store() -> SqlitePlaylistStore {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqlitePlaylistStore::new(pool)
    }

    #[tokio::test]
    async fn test_missing_content_is_none() {
        let store = store().await;
        assert_eq!(store.load("nothing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let store = store().await;

        store.save("doc-1", r#"{"version":1}"#).await.unwrap();
        store.save("doc-1", r#"{"version":1,"bucketId":"b"}"#).await.unwrap();
        store.save("doc-2", "{}").await.unwrap();

        assert_eq!(
            store.load("doc-1").await.unwrap().as_deref(),
            Some(r#"{"version":1,"bucketId":"b"}"#)
        );
        assert_eq!(store.load("doc-2").await.unwrap().as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("narrator.db");

        {
            let pool = create_pool(&DatabaseConfig::new(&path, 1)).await.unwrap();
            run_migrations(&pool).await.unwrap();
            SqlitePlaylistStore::new(pool.clone())
                .save("doc-1", "payload")
                .await
                .unwrap();
            pool.close().await;
        }

        let pool = create_pool(&DatabaseConfig::new(&path, 1)).await.unwrap();
        run_migrations(&pool).await.unwrap();
        let store = SqlitePlaylistStore::new(pool);
        assert_eq!(store.load("doc-1").await.unwrap().as_deref(), Some("payload"));
    }
}
