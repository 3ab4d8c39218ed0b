//! Headless Audio Device - 无声卡的音频设备
//!
//! 用 symphonia 探测文件时长，按墙钟推进播放进度。
//! 服务端部署没有声卡，播放状态机与真实设备一致，客户端通过事件跟随进度。

use async_trait::async_trait;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::application::ports::{AudioDevicePort, DeviceError, DeviceHandle, DeviceStatus};

/// 默认进度推送间隔
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(200);

/// 无声卡设备
pub struct HeadlessAudioDevice {
    progress_interval: Duration,
}

impl HeadlessAudioDevice {
    pub fn new(progress_interval: Duration) -> Self {
        Self { progress_interval }
    }
}

impl Default for HeadlessAudioDevice {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRESS_INTERVAL)
    }
}

#[async_trait]
impl AudioDevicePort for HeadlessAudioDevice {
    async fn load(&self, path: &Path) -> Result<Box<dyn DeviceHandle>, DeviceError> {
        let owned = path.to_path_buf();
        let duration_ms = tokio::task::spawn_blocking(move || probe_duration_ms(&owned))
            .await
            .map_err(|e| DeviceError::LoadFailed(e.to_string()))??;

        tracing::debug!(path = %path.display(), duration_ms, "Audio loaded");

        Ok(Box::new(HeadlessHandle::start(
            path.to_path_buf(),
            duration_ms,
            self.progress_interval,
        )))
    }
}

/// 探测音频时长（毫秒）
///
/// 容器声明了总帧数时直接换算，否则累加所有数据包的时长。
pub fn probe_duration_ms(path: &Path) -> Result<u64, DeviceError> {
    let file = File::open(path)
        .map_err(|e| DeviceError::LoadFailed(format!("{}: {}", path.display(), e)))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| DeviceError::LoadFailed(format!("Probe failed: {}", e)))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| DeviceError::LoadFailed("No audio track found".to_string()))?;

    let track_id = track.id;
    let params = track.codec_params.clone();

    if let (Some(frames), Some(rate)) = (params.n_frames, params.sample_rate) {
        if rate > 0 {
            return Ok(frames * 1000 / rate as u64);
        }
    }

    let time_base = params
        .time_base
        .ok_or_else(|| DeviceError::LoadFailed("Unknown time base".to_string()))?;

    let mut total_ts: u64 = 0;
    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                return Err(DeviceError::LoadFailed(format!("Packet read error: {}", e)));
            }
        };
        if packet.track_id() == track_id {
            total_ts += packet.dur;
        }
    }

    let time = time_base.calc_time(total_ts);
    Ok(time.seconds * 1000 + (time.frac * 1000.0) as u64)
}

/// 播放时钟
struct Clock {
    /// 上次暂停/停止时累计的进度
    base_ms: u64,
    playing_since: Option<Instant>,
    finished: bool,
    unloaded: bool,
}

impl Clock {
    fn position_ms(&self) -> u64 {
        match self.playing_since {
            Some(since) => self.base_ms + since.elapsed().as_millis() as u64,
            None => self.base_ms,
        }
    }
}

struct Shared {
    clock: Mutex<Clock>,
    status: watch::Sender<DeviceStatus>,
    duration_ms: u64,
}

impl Shared {
    fn with_clock<R>(&self, f: impl FnOnce(&mut Clock) -> R) -> Result<R, DeviceError> {
        let mut clock = self
            .clock
            .lock()
            .map_err(|_| DeviceError::ControlFailed("clock lock poisoned".to_string()))?;
        if clock.unloaded {
            return Err(DeviceError::Unloaded);
        }
        let result = f(&mut clock);
        self.advance(&mut clock);
        Ok(result)
    }

    /// 推进时钟并推送状态
    fn advance(&self, clock: &mut Clock) {
        let mut position = clock.position_ms().min(self.duration_ms);
        if clock.playing_since.is_some() && position >= self.duration_ms {
            clock.base_ms = self.duration_ms;
            clock.playing_since = None;
            clock.finished = true;
            position = self.duration_ms;
        }

        let next = DeviceStatus {
            is_loaded: !clock.unloaded,
            is_buffering: false,
            is_playing: clock.playing_since.is_some(),
            did_just_finish: clock.finished,
            position_ms: position,
            duration_ms: self.duration_ms,
        };
        self.status.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    fn tick(&self) {
        if let Ok(mut clock) = self.clock.lock() {
            if !clock.unloaded {
                self.advance(&mut clock);
            }
        }
    }
}

/// 无声卡设备句柄
pub struct HeadlessHandle {
    path: PathBuf,
    shared: Arc<Shared>,
    driver: JoinHandle<()>,
}

impl HeadlessHandle {
    fn start(path: PathBuf, duration_ms: u64, progress_interval: Duration) -> Self {
        let (status, _) = watch::channel(DeviceStatus {
            is_loaded: true,
            duration_ms,
            ..Default::default()
        });
        let shared = Arc::new(Shared {
            clock: Mutex::new(Clock {
                base_ms: 0,
                playing_since: None,
                finished: false,
                unloaded: false,
            }),
            status,
            duration_ms,
        });

        let driver = tokio::spawn({
            let shared = shared.clone();
            async move {
                let mut ticker = tokio::time::interval(progress_interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    shared.tick();
                }
            }
        });

        Self {
            path,
            shared,
            driver,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DeviceHandle for HeadlessHandle {
    async fn play(&self) -> Result<(), DeviceError> {
        self.shared.with_clock(|clock| {
            if clock.playing_since.is_none() && !clock.finished {
                clock.playing_since = Some(Instant::now());
            }
        })
    }

    async fn pause(&self) -> Result<(), DeviceError> {
        self.shared.with_clock(|clock| {
            if clock.playing_since.is_some() {
                clock.base_ms = clock.position_ms();
                clock.playing_since = None;
            }
        })
    }

    async fn stop(&self) -> Result<(), DeviceError> {
        self.shared.with_clock(|clock| {
            clock.base_ms = 0;
            clock.playing_since = None;
            clock.finished = false;
        })
    }

    async fn unload(&self) -> Result<(), DeviceError> {
        self.driver.abort();
        let mut clock = self
            .shared
            .clock
            .lock()
            .map_err(|_| DeviceError::ControlFailed("clock lock poisoned".to_string()))?;
        if clock.unloaded {
            return Ok(());
        }
        clock.playing_since = None;
        clock.unloaded = true;
        self.shared.advance(&mut clock);
        tracing::debug!(path = %self.path.display(), "Audio unloaded");
        Ok(())
    }

    fn status(&self) -> watch::Receiver<DeviceStatus> {
        self.shared.status.subscribe()
    }
}

impl Drop for HeadlessHandle {
    fn drop(&mut self) {
        self.driver.abort();
    }
}
