//! Playback Commands - 播放控制命令

use serde::Serialize;

use crate::application::services::PlaybackOutcome;
use crate::domain::playback::{BucketRef, SegmentId};
use crate::domain::playlist::Variant;

/// 播放内容命令
///
/// 缓存记录中有该变体的片段时直接重放，否则合成 `text`（或记录中缓存的原文）
#[derive(Debug, Clone)]
pub struct PlayContentCommand {
    pub content_id: String,
    pub variant: Variant,
    pub text: Option<String>,
}

/// 播放计划，在开始播放前确定
#[derive(Debug, Clone)]
pub enum PlaybackPlan {
    /// 按记录重放，每个片段带各自的存储桶
    Replay {
        segments: Vec<(SegmentId, Option<BucketRef>)>,
    },
    Synthesize {
        text: String,
    },
}

impl PlaybackPlan {
    pub fn is_replay(&self) -> bool {
        matches!(self, PlaybackPlan::Replay { .. })
    }
}

/// 已准备好的播放命令
#[derive(Debug, Clone)]
pub struct PreparedPlayback {
    pub content_id: String,
    pub variant: Variant,
    pub plan: PlaybackPlan,
}

/// 播放内容响应
#[derive(Debug, Clone, Serialize)]
pub struct PlayContentResponse {
    pub outcome: PlaybackOutcome,
    pub replayed: bool,
    pub segment_ids: Vec<SegmentId>,
}

/// 暂停命令
#[derive(Debug, Clone, Default)]
pub struct PausePlaybackCommand;

/// 恢复命令
#[derive(Debug, Clone, Default)]
pub struct ResumePlaybackCommand;

/// 停止命令
#[derive(Debug, Clone, Default)]
pub struct StopPlaybackCommand;

/// 清除变体缓存命令（原文变化时使用）
#[derive(Debug, Clone)]
pub struct ClearPlaylistVariantCommand {
    pub content_id: String,
    pub variant: Variant,
}

/// 清除变体缓存响应
#[derive(Debug, Clone, Serialize)]
pub struct ClearPlaylistVariantResponse {
    pub content_id: String,
    pub variant: Variant,
    pub cleared: bool,
}
