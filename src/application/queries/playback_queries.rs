//! Playback Queries

/// 查询播放器当前状态
#[derive(Debug, Clone, Default)]
pub struct GetPlaybackStatusQuery;

/// 查询内容的播放列表缓存记录
#[derive(Debug, Clone)]
pub struct GetPlaylistRecordQuery {
    pub content_id: String,
}

/// 查询本地片段缓存统计
#[derive(Debug, Clone, Default)]
pub struct GetCacheStatsQuery;
