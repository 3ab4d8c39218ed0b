//! Playlist Store Port - 播放列表缓存记录持久化
//!
//! 只存取原始字符串，解析与容错由领域层负责

use async_trait::async_trait;
use thiserror::Error;

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[async_trait]
pub trait PlaylistStorePort: Send + Sync {
    /// 读取内容的原始缓存记录
    async fn load(&self, content_id: &str) -> Result<Option<String>, RepositoryError>;

    /// 覆盖写入内容的缓存记录
    async fn save(&self, content_id: &str, payload: &str) -> Result<(), RepositoryError>;
}
