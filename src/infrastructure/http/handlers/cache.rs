//! Cache HTTP Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{CacheStats, GetCacheStatsQuery};
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 片段缓存目录统计
pub async fn cache_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<CacheStats>>, ApiError> {
    let stats = state.cache_stats_handler.handle(GetCacheStatsQuery).await?;
    Ok(Json(ApiResponse::success(stats)))
}
