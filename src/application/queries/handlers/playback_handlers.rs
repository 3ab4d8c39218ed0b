//! Playback Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{CacheStats, PlaylistStorePort, SegmentCachePort};
use crate::application::queries::playback_queries::*;
use crate::application::services::{PlaybackSnapshot, Player};
use crate::domain::playlist::PlaylistCacheRecord;

/// 播放状态查询
pub struct GetPlaybackStatusHandler {
    player: Arc<Player>,
}

impl GetPlaybackStatusHandler {
    pub fn new(player: Arc<Player>) -> Self {
        Self { player }
    }

    pub fn handle(&self, _query: GetPlaybackStatusQuery) -> PlaybackSnapshot {
        self.player.snapshot()
    }
}

/// 缓存记录查询，解析失败返回空记录
pub struct GetPlaylistRecordHandler {
    playlist_store: Arc<dyn PlaylistStorePort>,
}

impl GetPlaylistRecordHandler {
    pub fn new(playlist_store: Arc<dyn PlaylistStorePort>) -> Self {
        Self { playlist_store }
    }

    pub async fn handle(&self, query: GetPlaylistRecordQuery) -> Result<PlaylistCacheRecord, ApplicationError> {
        if query.content_id.trim().is_empty() {
            return Err(ApplicationError::validation("content_id is required"));
        }
        let raw = self.playlist_store.load(&query.content_id).await?;
        Ok(PlaylistCacheRecord::parse_lenient(raw.as_deref()))
    }
}

/// 缓存统计查询
pub struct GetCacheStatsHandler {
    cache: Arc<dyn SegmentCachePort>,
}

impl GetCacheStatsHandler {
    pub fn new(cache: Arc<dyn SegmentCachePort>) -> Self {
        Self { cache }
    }

    pub async fn handle(&self, _query: GetCacheStatsQuery) -> Result<CacheStats, ApplicationError> {
        Ok(self.cache.stats().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{MemoryCache, MemoryPlaylistStore};
    use crate::domain::playlist::Variant;

    #[tokio::test]
    async fn test_record_query_is_tolerant() {
        let store = MemoryPlaylistStore::new();
        store.insert("doc-1", "not json at all");
        store.insert("doc-2", r#"{"summaryParts":["s1","s2"]}"#);
        let handler = GetPlaylistRecordHandler::new(store);

        let corrupt = handler
            .handle(GetPlaylistRecordQuery { content_id: "doc-1".to_string() })
            .await
            .unwrap();
        assert!(corrupt.is_empty());

        let legacy = handler
            .handle(GetPlaylistRecordQuery { content_id: "doc-2".to_string() })
            .await
            .unwrap();
        assert_eq!(legacy.segments(&Variant::summary()).map(<[_]>::len), Some(2));

        let missing = handler
            .handle(GetPlaylistRecordQuery { content_id: "doc-3".to_string() })
            .await
            .unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_record_query_requires_content_id() {
        let handler = GetPlaylistRecordHandler::new(MemoryPlaylistStore::new());
        let err = handler
            .handle(GetPlaylistRecordQuery { content_id: " ".to_string() })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_cache_stats_query() {
        let handler = GetCacheStatsHandler::new(MemoryCache::new());
        let stats = handler.handle(GetCacheStatsQuery).await.unwrap();
        assert_eq!(stats, CacheStats::default());
    }
}
