//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml / config.local.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// # 环境变量示例
/// - `NARRATOR_SERVER__PORT=8080`
/// - `NARRATOR_SYNTHESIS__FUNCTION_URL=https://cloud.example.com/v1/functions/tts/executions`
/// - `NARRATOR_SYNTHESIS__CREDENTIAL=<jwt>`
/// - `NARRATOR_STORAGE__BUCKET_ID=tts`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// `config_path` 为 None 时搜索工作目录下的默认文件
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5070)?
        .set_default("synthesis.function_url", "http://localhost:3000")?
        .set_default("synthesis.project_id", "")?
        .set_default("storage.endpoint", "http://localhost/v1")?
        .set_default("storage.project_id", "")?
        .set_default("storage.bucket_id", "tts")?
        .set_default("storage.cache_dir", "data/tts")?
        .set_default("playback.max_chunk_chars", 900)?
        .set_default("playback.stop_poll_interval_ms", 150)?
        .set_default("playback.pause_poll_interval_ms", 200)?
        .set_default("playback.progress_interval_ms", 200)?
        .set_default("database.path", "data/narrator.db")?
        .set_default("database.max_connections", 5)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 前缀 NARRATOR_，层级分隔符 __
    builder = builder.add_source(
        Environment::with_prefix("NARRATOR")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("Server port cannot be 0"));
    }

    if config.synthesis.function_url.trim().is_empty() {
        return Err(invalid("Synthesis function URL cannot be empty"));
    }

    if config.storage.endpoint.trim().is_empty() {
        return Err(invalid("Storage endpoint cannot be empty"));
    }

    if config.storage.bucket_id.trim().is_empty() {
        return Err(invalid("Storage bucket cannot be empty"));
    }

    if config.playback.max_chunk_chars == 0 {
        return Err(invalid("max_chunk_chars must be greater than 0"));
    }

    if config.playback.stop_poll_interval_ms == 0
        || config.playback.pause_poll_interval_ms == 0
        || config.playback.progress_interval_ms == 0
    {
        return Err(invalid("Playback poll intervals must be greater than 0"));
    }

    if config.database.path.is_empty() {
        return Err(invalid("Database path cannot be empty"));
    }

    Ok(())
}

fn mask(secret: Option<&str>) -> &'static str {
    match secret {
        Some(s) if !s.is_empty() => "***",
        _ => "<unset>",
    }
}

fn or_unlimited(timeout_secs: Option<u64>) -> String {
    timeout_secs.map_or_else(|| "none".to_string(), |t| format!("{}s", t))
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("Synthesis Function: {}", config.synthesis.function_url);
    tracing::info!("Synthesis Project: {}", config.synthesis.project_id);
    tracing::info!("Synthesis Credential: {}", mask(config.synthesis.credential.as_deref()));
    tracing::info!("Synthesis Timeout: {}", or_unlimited(config.synthesis.timeout_secs));
    tracing::info!("Storage Endpoint: {}", config.storage.endpoint);
    tracing::info!("Storage Bucket: {}", config.storage.bucket_id);
    tracing::info!("Cache Directory: {:?}", config.storage.cache_dir);
    tracing::info!("Download Timeout: {}", or_unlimited(config.storage.timeout_secs));
    tracing::info!("Max Chunk Chars: {}", config.playback.max_chunk_chars);
    tracing::info!(
        "Poll Intervals: stop {}ms, pause {}ms, progress {}ms",
        config.playback.stop_poll_interval_ms,
        config.playback.pause_poll_interval_ms,
        config.playback.progress_interval_ms
    );
    tracing::info!("Database: {}", config.database.path);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validation_passes_for_default_config() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_urls() {
        let mut config = AppConfig::default();
        config.synthesis.function_url = " ".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.storage.endpoint = String::new();
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.storage.bucket_id = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_playback_values() {
        let mut config = AppConfig::default();
        config.playback.max_chunk_chars = 0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.playback.stop_poll_interval_ms = 0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.playback.pause_poll_interval_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("narrator.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[synthesis]
function_url = "https://cloud.test/v1/functions/tts/executions"
project_id = "proj"
credential = "jwt-abc"

[playback]
max_chunk_chars = 500
"#
        )
        .unwrap();

        let config = load_config_from_path(Some(&path)).unwrap();

        assert_eq!(
            config.synthesis.function_url,
            "https://cloud.test/v1/functions/tts/executions"
        );
        assert_eq!(config.synthesis.credential.as_deref(), Some("jwt-abc"));
        assert_eq!(config.playback.max_chunk_chars, 500);
        assert_eq!(config.playback.stop_poll_interval_ms, 150);
        assert_eq!(config.server.port, 5070);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("narrator.toml");
        std::fs::write(&path, "[playback]\nmax_chunk_chars = 0\n").unwrap();

        assert!(matches!(
            load_config_from_path(Some(&path)),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_credential_is_masked() {
        assert_eq!(mask(Some("secret")), "***");
        assert_eq!(mask(None), "<unset>");
    }
}
