//! Playback Context - 播放限界上下文
//!
//! 职责:
//! - 音频片段标识与存储位置
//! - 播放状态
//! - 播放错误分类

mod errors;
mod status;
mod value_objects;

pub use errors::PlaybackError;
pub use status::PlaybackStatus;
pub use value_objects::{AudioSegment, BucketRef, SegmentId};
