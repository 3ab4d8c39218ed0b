//! Playlist HTTP Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{
    ClearPlaylistVariantCommand, ClearPlaylistVariantResponse, GetPlaylistRecordQuery,
};
use crate::domain::playlist::PlaylistCacheRecord;
use crate::infrastructure::http::dto::{
    parse_variant, ApiResponse, ClearPlaylistRequest, GetPlaylistRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 读取内容的播放列表缓存记录
pub async fn get_playlist(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GetPlaylistRequest>,
) -> Result<Json<ApiResponse<PlaylistCacheRecord>>, ApiError> {
    let record = state
        .playlist_record_handler
        .handle(GetPlaylistRecordQuery {
            content_id: req.content_id,
        })
        .await?;
    Ok(Json(ApiResponse::success(record)))
}

/// 清除一个变体的缓存片段
pub async fn clear_playlist(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ClearPlaylistRequest>,
) -> Result<Json<ApiResponse<ClearPlaylistVariantResponse>>, ApiError> {
    if req.content_id.trim().is_empty() {
        return Err(ApiError::BadRequest("content_id is required".to_string()));
    }
    let variant = parse_variant(&req.variant)?;

    let response = state
        .clear_variant_handler
        .handle(ClearPlaylistVariantCommand {
            content_id: req.content_id,
            variant,
        })
        .await?;
    Ok(Json(ApiResponse::success(response)))
}
