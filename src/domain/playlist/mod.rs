//! Playlist Context - 播放列表缓存
//!
//! 职责:
//! - 内容变体（原文、摘要、详细摘要）
//! - 已完成播放列表的片段标识记录及其容错编解码

mod record;
mod value_objects;

pub use record::{PlaylistCacheRecord, PLAYLIST_RECORD_VERSION};
pub use value_objects::Variant;
