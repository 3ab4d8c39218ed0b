//! Playback Context - Errors

use thiserror::Error;

/// 播放流程错误分类，均不重试
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("Input error: {0}")]
    Input(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Transfer error: {0}")]
    Transfer(String),

    #[error("Playback error: {0}")]
    Playback(String),
}

impl PlaybackError {
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self::Synthesis(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    pub fn transfer(msg: impl Into<String>) -> Self {
        Self::Transfer(msg.into())
    }

    pub fn playback(msg: impl Into<String>) -> Self {
        Self::Playback(msg.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PlaybackError::Input(_) => "input",
            PlaybackError::Synthesis(_) => "synthesis",
            PlaybackError::Protocol(_) => "protocol",
            PlaybackError::Transfer(_) => "transfer",
            PlaybackError::Playback(_) => "playback",
        }
    }

    /// 不带分类前缀的消息
    pub fn message(&self) -> &str {
        match self {
            PlaybackError::Input(m)
            | PlaybackError::Synthesis(m)
            | PlaybackError::Protocol(m)
            | PlaybackError::Transfer(m)
            | PlaybackError::Playback(m) => m,
        }
    }
}
