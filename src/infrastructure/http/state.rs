//! Application State
//!
//! 所有 Command/Query Handlers 与共享的播放器实例

use std::sync::Arc;

use crate::application::{
    // Command handlers
    ClearPlaylistVariantHandler, PausePlaybackHandler, PlayContentHandler, ResumePlaybackHandler,
    StopPlaybackHandler,
    // Query handlers
    GetCacheStatsHandler, GetPlaybackStatusHandler, GetPlaylistRecordHandler,
    // Ports
    PlaylistStorePort, SegmentCachePort,
    // Services
    Player,
};
use crate::infrastructure::events::EventPublisher;

/// 应用状态
///
/// 一个服务进程持有一个播放器（一个设备槽）
pub struct AppState {
    pub player: Arc<Player>,
    pub event_publisher: Arc<EventPublisher>,

    // ========== Command Handlers ==========
    pub play_content_handler: PlayContentHandler,
    pub pause_handler: PausePlaybackHandler,
    pub resume_handler: ResumePlaybackHandler,
    pub stop_handler: StopPlaybackHandler,
    pub clear_variant_handler: ClearPlaylistVariantHandler,

    // ========== Query Handlers ==========
    pub status_handler: GetPlaybackStatusHandler,
    pub playlist_record_handler: GetPlaylistRecordHandler,
    pub cache_stats_handler: GetCacheStatsHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        player: Arc<Player>,
        playlist_store: Arc<dyn PlaylistStorePort>,
        segment_cache: Arc<dyn SegmentCachePort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            player: player.clone(),
            event_publisher: event_publisher.clone(),

            // Command handlers
            play_content_handler: PlayContentHandler::new(
                player.clone(),
                playlist_store.clone(),
                event_publisher.clone(),
            ),
            pause_handler: PausePlaybackHandler::new(player.clone()),
            resume_handler: ResumePlaybackHandler::new(player.clone()),
            stop_handler: StopPlaybackHandler::new(player.clone()),
            clear_variant_handler: ClearPlaylistVariantHandler::new(playlist_store.clone()),

            // Query handlers
            status_handler: GetPlaybackStatusHandler::new(player),
            playlist_record_handler: GetPlaylistRecordHandler::new(playlist_store),
            cache_stats_handler: GetCacheStatsHandler::new(segment_cache),
        }
    }
}
