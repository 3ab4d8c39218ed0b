//! 应用层 - 查询（读操作）
//!
//! CQRS 查询侧：播放状态、缓存记录、缓存统计

mod playback_queries;

pub mod handlers;

pub use playback_queries::*;
