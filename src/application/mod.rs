//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（合成后端、凭证、下载、缓存、音频设备、记录存储）
//! - services: 片段合成器与播放状态机
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;
pub mod services;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports
pub use commands::{
    ClearPlaylistVariantCommand,
    ClearPlaylistVariantResponse,
    PausePlaybackCommand,
    PlayContentCommand,
    PlayContentResponse,
    PlaybackPlan,
    PreparedPlayback,
    ResumePlaybackCommand,
    StopPlaybackCommand,
    // Handlers
    handlers::{
        ClearPlaylistVariantHandler, PausePlaybackHandler, PlayContentHandler,
        ResumePlaybackHandler, StopPlaybackHandler,
    },
};

pub use error::ApplicationError;

pub use ports::{
    // Audio device
    AudioDevicePort,
    DeviceError,
    DeviceHandle,
    DeviceStatus,
    // Credential
    Credential,
    CredentialError,
    CredentialProviderPort,
    // Playlist store
    PlaylistStorePort,
    RepositoryError,
    // Segment cache
    CacheStats,
    CacheStoreError,
    SegmentCachePort,
    // Segment transfer
    SegmentLocator,
    SegmentTransferPort,
    TransferError,
    // Synthesis backend
    SynthesisBackendError,
    SynthesisBackendPort,
    SynthesisRequest,
    SynthesisResponse,
};

pub use queries::{
    GetCacheStatsQuery,
    GetPlaybackStatusQuery,
    GetPlaylistRecordQuery,
    // Handlers
    handlers::{GetCacheStatsHandler, GetPlaybackStatusHandler, GetPlaylistRecordHandler},
};

pub use services::{
    LoadedSegment, PlaybackOutcome, PlaybackSnapshot, Player, SegmentProgress,
    SegmentSynthesizer, SequencerConfig,
};
