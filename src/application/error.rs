//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::ports::{CacheStoreError, RepositoryError};
use crate::domain::playback::PlaybackError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 播放失败（设备或状态机）
    #[error("Playback error: {0}")]
    PlaybackError(String),

    /// 仓储错误
    #[error("Repository error: {0}")]
    RepositoryError(String),

    /// 外部服务错误（合成后端、远程存储）
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 存储错误
    #[error("Storage error: {0}")]
    StorageError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<PlaybackError> for ApplicationError {
    fn from(err: PlaybackError) -> Self {
        match err {
            PlaybackError::Input(msg) => Self::ValidationError(msg),
            PlaybackError::Playback(msg) => Self::PlaybackError(msg),
            other => Self::ExternalServiceError(other.to_string()),
        }
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(err: RepositoryError) -> Self {
        Self::RepositoryError(err.to_string())
    }
}

impl From<CacheStoreError> for ApplicationError {
    fn from(err: CacheStoreError) -> Self {
        Self::StorageError(err.to_string())
    }
}
