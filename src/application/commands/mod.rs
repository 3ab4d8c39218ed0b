//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：播放控制与缓存记录维护

mod playback_commands;

pub mod handlers;

pub use playback_commands::*;
