//! Playback Context - 播放状态

use serde::{Deserialize, Serialize};

/// 播放器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    /// 空闲
    #[default]
    Idle,
    /// 正在合成当前片段
    Generating,
    /// 正在下载或缓冲当前片段
    Downloading,
    /// 正在播放
    Playing,
    /// 已暂停
    Paused,
    /// 出错（终止态，直到再次开始播放）
    Error,
}

impl PlaybackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackStatus::Idle => "idle",
            PlaybackStatus::Generating => "generating",
            PlaybackStatus::Downloading => "downloading",
            PlaybackStatus::Playing => "playing",
            PlaybackStatus::Paused => "paused",
            PlaybackStatus::Error => "error",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(PlaybackStatus::Idle),
            "generating" => Some(PlaybackStatus::Generating),
            "downloading" => Some(PlaybackStatus::Downloading),
            "playing" => Some(PlaybackStatus::Playing),
            "paused" => Some(PlaybackStatus::Paused),
            "error" => Some(PlaybackStatus::Error),
            _ => None,
        }
    }

    /// 终止态：空闲或出错
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlaybackStatus::Idle | PlaybackStatus::Error)
    }
}

impl std::fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_string_round_trip() {
        for status in [
            PlaybackStatus::Idle,
            PlaybackStatus::Generating,
            PlaybackStatus::Downloading,
            PlaybackStatus::Playing,
            PlaybackStatus::Paused,
            PlaybackStatus::Error,
        ] {
            assert_eq!(PlaybackStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(PlaybackStatus::from_str("buffering"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(PlaybackStatus::Idle.is_terminal());
        assert!(PlaybackStatus::Error.is_terminal());
        assert!(!PlaybackStatus::Paused.is_terminal());
        assert_eq!(
            serde_json::to_string(&PlaybackStatus::Downloading).unwrap(),
            "\"downloading\""
        );
    }
}
