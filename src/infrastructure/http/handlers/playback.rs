//! Playback HTTP Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{
    GetPlaybackStatusQuery, PausePlaybackCommand, PlayContentCommand, PlaybackSnapshot,
    ResumePlaybackCommand, StopPlaybackCommand,
};
use crate::infrastructure::http::dto::{parse_variant, ApiResponse, PlayAccepted, PlayRequest};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 开始播放
///
/// 计划（重放或合成）同步确定，校验错误直接返回；播放本身在后台任务中进行
pub async fn play(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlayRequest>,
) -> Result<Json<ApiResponse<PlayAccepted>>, ApiError> {
    let variant = parse_variant(&req.variant)?;

    let prepared = state
        .play_content_handler
        .prepare(PlayContentCommand {
            content_id: req.content_id,
            variant,
            text: req.text,
        })
        .await?;

    let accepted = PlayAccepted {
        content_id: prepared.content_id.clone(),
        variant: prepared.variant.clone(),
        replayed: prepared.plan.is_replay(),
    };

    let background = state.clone();
    tokio::spawn(async move {
        let content_id = prepared.content_id.clone();
        match background.play_content_handler.execute(prepared).await {
            Ok(response) => {
                tracing::info!(
                    content_id = %content_id,
                    replayed = response.replayed,
                    segments = response.segment_ids.len(),
                    "Playback finished"
                );
            }
            Err(e) => {
                tracing::warn!(content_id = %content_id, error = %e, "Playback failed");
            }
        }
    });

    Ok(Json(ApiResponse::success(accepted)))
}

/// 暂停
pub async fn pause(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<PlaybackSnapshot>>, ApiError> {
    let snapshot = state.pause_handler.handle(PausePlaybackCommand).await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

/// 恢复
pub async fn resume(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<PlaybackSnapshot>>, ApiError> {
    let snapshot = state.resume_handler.handle(ResumePlaybackCommand).await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

/// 停止，总是成功
pub async fn stop(State(state): State<Arc<AppState>>) -> Json<ApiResponse<PlaybackSnapshot>> {
    let snapshot = state.stop_handler.handle(StopPlaybackCommand).await;
    Json(ApiResponse::success(snapshot))
}

/// 当前播放状态
pub async fn status(State(state): State<Arc<AppState>>) -> Json<ApiResponse<PlaybackSnapshot>> {
    Json(ApiResponse::success(
        state.status_handler.handle(GetPlaybackStatusQuery),
    ))
}
