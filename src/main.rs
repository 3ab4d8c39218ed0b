//! Narrator - 分段文本转语音播放服务

use std::sync::Arc;

use narrator::application::{Player, SegmentLocator, SegmentSynthesizer, SequencerConfig};
use narrator::config::{load_config, print_config, AppConfig};
use narrator::domain::playback::BucketRef;
use narrator::domain::SegmentConfig;
use narrator::infrastructure::adapters::{
    FileSegmentCache, HeadlessAudioDevice, HttpSegmentTransfer, HttpSynthesisClient,
    HttpSynthesisClientConfig, StaticCredentialProvider,
};
use narrator::infrastructure::events::EventPublisher;
use narrator::infrastructure::http::{AppState, HttpServer, ServerConfig};
use narrator::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqlitePlaylistStore,
};

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},narrator={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("Narrator - segmented TTS playback engine");
    print_config(&config);

    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 播放列表缓存记录
    let pool = create_pool(&DatabaseConfig::new(
        &config.database.path,
        config.database.max_connections,
    ))
    .await?;
    run_migrations(&pool).await?;
    let playlist_store = Arc::new(SqlitePlaylistStore::new(pool));

    // 合成后端与凭证
    let mut synthesis_config = HttpSynthesisClientConfig::new(
        &config.synthesis.function_url,
        &config.synthesis.project_id,
    );
    if let Some(secs) = config.synthesis.timeout_secs {
        synthesis_config = synthesis_config.with_timeout(secs);
    }
    let backend = Arc::new(HttpSynthesisClient::new(synthesis_config)?);
    let credentials = Arc::new(StaticCredentialProvider::new(
        config.synthesis.credential.clone(),
    ));

    // 片段下载与本地缓存
    let transfer = Arc::new(HttpSegmentTransfer::new(config.storage.timeout_secs)?);
    let segment_cache = Arc::new(FileSegmentCache::new(&config.storage.cache_dir, transfer).await?);

    let device = Arc::new(HeadlessAudioDevice::new(config.playback.progress_interval()));

    let default_bucket = BucketRef::new(config.storage.bucket_id.as_str())
        .map_err(|e| anyhow::anyhow!("Invalid storage bucket: {}", e))?;

    let synthesizer = Arc::new(SegmentSynthesizer::new(
        backend,
        credentials,
        segment_cache.clone(),
        device,
        SegmentLocator::new(&config.storage.endpoint, &config.storage.project_id),
        default_bucket,
    ));

    let event_publisher = EventPublisher::new().arc();

    let player = Player::new(
        synthesizer,
        SegmentConfig {
            max_chars: config.playback.max_chunk_chars,
        },
        SequencerConfig {
            stop_poll_interval: config.playback.stop_poll_interval(),
            pause_poll_interval: config.playback.pause_poll_interval(),
        },
        event_publisher.clone(),
    )
    .arc();

    let state = Arc::new(AppState::new(
        player.clone(),
        playlist_store,
        segment_cache,
        event_publisher,
    ));

    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let server = HttpServer::new(server_config, state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    // 释放设备句柄
    player.stop().await;

    tracing::info!("Server shutdown complete");

    Ok(())
}
