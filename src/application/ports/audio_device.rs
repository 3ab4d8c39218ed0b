//! Audio Device Port - 音频输出设备
//!
//! 一个句柄对应一个已加载的音频文件，状态通过 watch 通道推送

use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Load failed: {0}")]
    LoadFailed(String),

    #[error("Control failed: {0}")]
    ControlFailed(String),

    #[error("Handle already unloaded")]
    Unloaded,
}

/// 设备句柄状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeviceStatus {
    pub is_loaded: bool,
    pub is_buffering: bool,
    pub is_playing: bool,
    /// 播放到结尾后置位，直到下一次 play
    pub did_just_finish: bool,
    pub position_ms: u64,
    pub duration_ms: u64,
}

#[async_trait]
pub trait DeviceHandle: Send + Sync {
    async fn play(&self) -> Result<(), DeviceError>;

    async fn pause(&self) -> Result<(), DeviceError>;

    /// 停止并回到开头
    async fn stop(&self) -> Result<(), DeviceError>;

    /// 释放底层资源，之后句柄不可再用
    async fn unload(&self) -> Result<(), DeviceError>;

    /// 订阅状态变化
    fn status(&self) -> watch::Receiver<DeviceStatus>;
}

#[async_trait]
pub trait AudioDevicePort: Send + Sync {
    /// 加载本地音频文件，返回未开始播放的句柄
    async fn load(&self, path: &Path) -> Result<Box<dyn DeviceHandle>, DeviceError>;
}
