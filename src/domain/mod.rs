//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Playback Context: 片段标识、播放状态、错误分类
//! - Playlist Context: 播放列表缓存记录

pub mod playback;
pub mod playlist;

// 共享的文本分割器
mod text_segmenter;

pub use text_segmenter::{
    normalize_whitespace, reassemble, segment_text, segment_text_default, Joiner, SegmentConfig,
    TextChunk, DEFAULT_MAX_CHUNK_CHARS,
};
