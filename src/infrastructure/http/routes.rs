//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping              GET   健康检查
//! - /api/playback/play     POST  播放内容（后台执行，通过 WS 推送进度）
//! - /api/playback/pause    POST  暂停
//! - /api/playback/resume   POST  恢复
//! - /api/playback/stop     POST  停止
//! - /api/playback/status   GET   当前状态
//! - /api/playlist/get      POST  读取播放列表缓存记录
//! - /api/playlist/clear    POST  清除某变体的缓存
//! - /api/cache/stats       GET   片段缓存统计
//! - /ws/events             WS    播放事件

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/events", get(handlers::events_websocket_handler))
        .fallback(handlers::not_found)
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/playback", playback_routes())
        .nest("/playlist", playlist_routes())
        .route("/cache/stats", get(handlers::cache_stats))
}

/// Playback 路由
fn playback_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/play", post(handlers::play))
        .route("/pause", post(handlers::pause))
        .route("/resume", post(handlers::resume))
        .route("/stop", post(handlers::stop))
        .route("/status", get(handlers::status))
}

/// Playlist 路由
fn playlist_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/get", post(handlers::get_playlist))
        .route("/clear", post(handlers::clear_playlist))
}
