//! Data Transfer Objects

use serde::{Deserialize, Serialize};

use crate::domain::playlist::Variant;
use crate::infrastructure::http::error::ApiError;

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// 空数据响应
#[derive(Debug, Serialize)]
pub struct Empty {}

impl ApiResponse<Empty> {
    /// 成功但无数据
    pub fn ok() -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(Empty {}),
        }
    }
}

/// 解析请求中的变体名
pub fn parse_variant(raw: &str) -> Result<Variant, ApiError> {
    Variant::new(raw).map_err(|e| ApiError::BadRequest(format!("invalid variant: {}", e)))
}

// ============================================================================
// Playback DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PlayRequest {
    pub content_id: String,
    pub variant: String,
    #[serde(default)]
    pub text: Option<String>,
}

/// 播放请求已受理，播放在后台进行，进度通过 WebSocket 推送
#[derive(Debug, Serialize)]
pub struct PlayAccepted {
    pub content_id: String,
    pub variant: Variant,
    pub replayed: bool,
}

// ============================================================================
// Playlist DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GetPlaylistRequest {
    pub content_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ClearPlaylistRequest {
    pub content_id: String,
    pub variant: String,
}
