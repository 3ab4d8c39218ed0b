//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 合成后端配置
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// 远程存储与本地缓存配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 播放配置
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5070
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 合成后端配置
#[derive(Debug, Clone, Deserialize)]
pub struct SynthesisConfig {
    /// 合成云函数的执行地址
    #[serde(default = "default_function_url")]
    pub function_url: String,

    /// 项目标识，随请求头发送
    #[serde(default)]
    pub project_id: String,

    /// 调用凭证，未配置时合成请求失败
    #[serde(default)]
    pub credential: Option<String>,

    /// 请求超时（秒），不配置则不限时
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_function_url() -> String {
    "http://localhost:3000".to_string()
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            function_url: default_function_url(),
            project_id: String::new(),
            credential: None,
            timeout_secs: None,
        }
    }
}

/// 远程存储与本地缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 远程存储 API 地址
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// 远程存储项目标识
    #[serde(default)]
    pub project_id: String,

    /// 合成结果未指明桶时使用的默认桶
    #[serde(default = "default_bucket_id")]
    pub bucket_id: String,

    /// 本地片段缓存目录
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// 下载超时（秒），不配置则不限时
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_endpoint() -> String {
    "http://localhost/v1".to_string()
}

fn default_bucket_id() -> String {
    "tts".to_string()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("data/tts")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            project_id: String::new(),
            bucket_id: default_bucket_id(),
            cache_dir: default_cache_dir(),
            timeout_secs: None,
        }
    }
}

/// 播放配置
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    /// 单个片段最大字符数
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// 播放中检查停止的间隔（毫秒）
    #[serde(default = "default_stop_poll_interval_ms")]
    pub stop_poll_interval_ms: u64,

    /// 暂停中检查恢复的间隔（毫秒）
    #[serde(default = "default_pause_poll_interval_ms")]
    pub pause_poll_interval_ms: u64,

    /// 设备进度推送间隔（毫秒）
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
}

fn default_max_chunk_chars() -> usize {
    900
}

fn default_stop_poll_interval_ms() -> u64 {
    150
}

fn default_pause_poll_interval_ms() -> u64 {
    200
}

fn default_progress_interval_ms() -> u64 {
    200
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: default_max_chunk_chars(),
            stop_poll_interval_ms: default_stop_poll_interval_ms(),
            pause_poll_interval_ms: default_pause_poll_interval_ms(),
            progress_interval_ms: default_progress_interval_ms(),
        }
    }
}

impl PlaybackConfig {
    pub fn stop_poll_interval(&self) -> Duration {
        Duration::from_millis(self.stop_poll_interval_ms)
    }

    pub fn pause_poll_interval(&self) -> Duration {
        Duration::from_millis(self.pause_poll_interval_ms)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库文件路径
    #[serde(default = "default_db_path")]
    pub path: String,

    /// 最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/narrator.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别，`RUST_LOG` 优先
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
