//! Segment Cache Port - 本地片段缓存
//!
//! 本地路径是片段标识的纯函数；已存在的非空文件不会再次下载

use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use super::TransferError;
use crate::domain::playback::SegmentId;

#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("Transfer failed: {0}")]
    Transfer(#[from] TransferError),

    #[error("IO error: {0}")]
    IoError(String),
}

/// 缓存统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// 文件数量
    pub file_count: u64,
    /// 已使用空间（字节）
    pub used_bytes: u64,
}

#[async_trait]
pub trait SegmentCachePort: Send + Sync {
    /// 片段对应的本地路径（不检查是否存在）
    fn local_path(&self, segment_id: &SegmentId) -> PathBuf;

    /// 是否已有非空缓存文件
    async fn contains(&self, segment_id: &SegmentId) -> bool;

    /// 返回可播放的本地路径，必要时从 `remote_url` 下载
    async fn resolve(
        &self,
        segment_id: &SegmentId,
        remote_url: &str,
    ) -> Result<PathBuf, CacheStoreError>;

    async fn stats(&self) -> Result<CacheStats, CacheStoreError>;
}
