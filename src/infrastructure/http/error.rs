//! HTTP Error Handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::ApplicationError;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errno: i32,
    pub error: String,
    pub data: Option<()>,
}

impl ErrorResponse {
    pub fn new(errno: i32, error: impl Into<String>) -> Self {
        Self {
            errno,
            error: error.into(),
            data: None,
        }
    }
}

/// 错误码定义
pub mod errno {
    pub const BAD_REQUEST: i32 = 400;
    pub const NOT_FOUND: i32 = 404;
    pub const PLAYBACK_FAILED: i32 = 422;
    pub const INTERNAL_ERROR: i32 = 500;
    pub const SERVICE_UNAVAILABLE: i32 = 503;
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    PlaybackFailed(String),
    Internal(String),
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn errno(&self) -> i32 {
        match self {
            ApiError::NotFound(_) => errno::NOT_FOUND,
            ApiError::BadRequest(_) => errno::BAD_REQUEST,
            ApiError::PlaybackFailed(_) => errno::PLAYBACK_FAILED,
            ApiError::Internal(_) => errno::INTERNAL_ERROR,
            ApiError::ServiceUnavailable(_) => errno::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.errno();
        let msg = match self {
            ApiError::NotFound(msg) => {
                tracing::warn!(errno = code, error = %msg, "Resource not found");
                msg
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!(errno = code, error = %msg, "Bad request");
                msg
            }
            ApiError::PlaybackFailed(msg) => {
                tracing::warn!(errno = code, error = %msg, "Playback failed");
                msg
            }
            ApiError::Internal(msg) => {
                tracing::error!(errno = code, error = %msg, "Internal server error");
                msg
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::error!(errno = code, error = %msg, "Service unavailable");
                msg
            }
        };

        // 业务错误统一返回 200，错误码放在 errno
        (StatusCode::OK, Json(ErrorResponse::new(code, msg))).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        match e {
            ApplicationError::ValidationError(msg) => ApiError::BadRequest(msg),
            ApplicationError::PlaybackError(msg) => ApiError::PlaybackFailed(msg),
            ApplicationError::RepositoryError(msg) => ApiError::Internal(msg),
            ApplicationError::ExternalServiceError(msg) => ApiError::ServiceUnavailable(msg),
            ApplicationError::StorageError(msg) => ApiError::Internal(msg),
            ApplicationError::InternalError(msg) => ApiError::Internal(msg),
        }
    }
}
