//! Narrator - 分段文本转语音播放引擎
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Segmenter: 长文本按段落/句子切分为有界长度的片段
//! - Playback: 片段标识、播放状态、错误分类
//! - Playlist: 按内容与变体保存的播放列表缓存记录
//!
//! 应用层 (application/):
//! - Ports: 合成后端、凭证、下载、片段缓存、音频设备、记录存储
//! - Services: SegmentSynthesizer、Player（播放状态机）
//! - Commands / Queries: CQRS 处理器
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: HTTP 合成客户端、HTTP 下载、文件缓存、无声卡设备、静态凭证
//! - Persistence: SQLite 记录存储
//! - Events: 播放事件广播
//! - HTTP: 控制 API + WebSocket

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
