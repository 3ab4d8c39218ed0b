//! 端口的脚本化替身，供应用层测试使用

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::application::ports::{
    AudioDevicePort, CacheStats, CacheStoreError, Credential, CredentialError,
    CredentialProviderPort, DeviceError, DeviceHandle, DeviceStatus, PlaylistStorePort,
    RepositoryError, SegmentCachePort, SegmentLocator, SynthesisBackendError,
    SynthesisBackendPort, SynthesisRequest, SynthesisResponse, TransferError,
};
use crate::application::services::{SegmentProgress, SegmentSynthesizer};
use crate::domain::playback::{BucketRef, PlaybackStatus, SegmentId};

// ============================================================================
// Synthesis backend
// ============================================================================

/// 按脚本应答的合成后端，脚本用完后自动分配 `seg-<n>`
#[derive(Default)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<SynthesisResponse, SynthesisBackendError>>>,
    texts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, response: Result<SynthesisResponse, SynthesisBackendError>) {
        self.script.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

#[async_trait]
impl SynthesisBackendPort for ScriptedBackend {
    async fn synthesize(
        &self,
        request: SynthesisRequest,
        _credential: &Credential,
    ) -> Result<SynthesisResponse, SynthesisBackendError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.texts.lock().unwrap().push(request.text);
        let scripted = self.script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(SynthesisResponse {
                segment_id: Some(format!("seg-{}", n)),
                bucket_id: None,
            })
        })
    }
}

pub struct StaticCredentials;

#[async_trait]
impl CredentialProviderPort for StaticCredentials {
    async fn issue(&self) -> Result<Credential, CredentialError> {
        Ok(Credential::new("test-jwt"))
    }
}

// ============================================================================
// Segment cache
// ============================================================================

/// 内存缓存：记录每次解析的 URL，每个标识只“下载”一次
#[derive(Default)]
pub struct MemoryCache {
    urls: Mutex<Vec<String>>,
    downloads: Mutex<HashMap<String, usize>>,
    failing: Mutex<HashSet<String>>,
}

impl MemoryCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_on(&self, segment_id: &str) {
        self.failing.lock().unwrap().insert(segment_id.to_string());
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }

    pub fn downloads(&self, segment_id: &str) -> usize {
        self.downloads
            .lock()
            .unwrap()
            .get(segment_id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl SegmentCachePort for MemoryCache {
    fn local_path(&self, segment_id: &SegmentId) -> PathBuf {
        PathBuf::from(format!("/cache/tts_{}.mp3", segment_id))
    }

    async fn contains(&self, segment_id: &SegmentId) -> bool {
        self.downloads(segment_id.as_str()) > 0
    }

    async fn resolve(
        &self,
        segment_id: &SegmentId,
        remote_url: &str,
    ) -> Result<PathBuf, CacheStoreError> {
        self.urls.lock().unwrap().push(remote_url.to_string());
        if self.failing.lock().unwrap().contains(segment_id.as_str()) {
            return Err(TransferError::ServiceError("HTTP 404 Not Found".to_string()).into());
        }
        let mut downloads = self.downloads.lock().unwrap();
        downloads.entry(segment_id.to_string()).or_insert(1);
        Ok(self.local_path(segment_id))
    }

    async fn stats(&self) -> Result<CacheStats, CacheStoreError> {
        let downloads = self.downloads.lock().unwrap();
        Ok(CacheStats {
            file_count: downloads.len() as u64,
            used_bytes: downloads.len() as u64 * 1024,
        })
    }
}

// ============================================================================
// Audio device
// ============================================================================

struct FakeClock {
    generation: u64,
    remaining: Duration,
    started: Option<Instant>,
}

/// 虚拟设备：每个片段播放固定时长，记录所有操作
pub struct FakeDevice {
    segment_duration: Duration,
    load_delay: Duration,
    log: Arc<Mutex<Vec<String>>>,
    live: Arc<AtomicUsize>,
    fail_pause: Arc<AtomicBool>,
}

impl FakeDevice {
    pub fn new() -> Arc<Self> {
        Self::with_duration(Duration::from_secs(1))
    }

    pub fn with_duration(segment_duration: Duration) -> Arc<Self> {
        Self::build(segment_duration, Duration::ZERO)
    }

    /// 每次 load 先等待 `load_delay` 才返回句柄
    pub fn with_load_delay(load_delay: Duration) -> Arc<Self> {
        Self::build(Duration::from_secs(1), load_delay)
    }

    fn build(segment_duration: Duration, load_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            segment_duration,
            load_delay,
            log: Arc::new(Mutex::new(Vec::new())),
            live: Arc::new(AtomicUsize::new(0)),
            fail_pause: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    /// 已加载且尚未卸载的句柄数
    pub fn live_handles(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn fail_pause(&self) {
        self.fail_pause.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl AudioDevicePort for FakeDevice {
    async fn load(&self, path: &Path) -> Result<Box<dyn DeviceHandle>, DeviceError> {
        if !self.load_delay.is_zero() {
            tokio::time::sleep(self.load_delay).await;
        }
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .trim_start_matches("tts_")
            .to_string();
        self.log.lock().unwrap().push(format!("load:{}", name));
        self.live.fetch_add(1, Ordering::SeqCst);

        let (tx, _) = watch::channel(DeviceStatus {
            is_loaded: true,
            duration_ms: self.segment_duration.as_millis() as u64,
            ..Default::default()
        });

        Ok(Box::new(FakeHandle {
            name,
            duration: self.segment_duration,
            clock: Arc::new(Mutex::new(FakeClock {
                generation: 0,
                remaining: self.segment_duration,
                started: None,
            })),
            tx: Arc::new(tx),
            log: self.log.clone(),
            live: self.live.clone(),
            fail_pause: self.fail_pause.clone(),
            unloaded: AtomicBool::new(false),
        }))
    }
}

struct FakeHandle {
    name: String,
    duration: Duration,
    clock: Arc<Mutex<FakeClock>>,
    tx: Arc<watch::Sender<DeviceStatus>>,
    log: Arc<Mutex<Vec<String>>>,
    live: Arc<AtomicUsize>,
    fail_pause: Arc<AtomicBool>,
    unloaded: AtomicBool,
}

impl FakeHandle {
    fn record(&self, op: &str) {
        self.log.lock().unwrap().push(format!("{}:{}", op, self.name));
    }
}

#[async_trait]
impl DeviceHandle for FakeHandle {
    async fn play(&self) -> Result<(), DeviceError> {
        if self.unloaded.load(Ordering::SeqCst) {
            return Err(DeviceError::Unloaded);
        }
        self.record("play");
        if self.tx.borrow().did_just_finish {
            return Ok(());
        }

        let (generation, remaining) = {
            let mut clock = self.clock.lock().unwrap();
            clock.generation += 1;
            clock.started = Some(Instant::now());
            (clock.generation, clock.remaining)
        };
        self.tx.send_modify(|s| s.is_playing = true);

        let clock = self.clock.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            let mut clock = clock.lock().unwrap();
            if clock.generation == generation {
                clock.remaining = Duration::ZERO;
                clock.started = None;
                tx.send_modify(|s| {
                    s.is_playing = false;
                    s.did_just_finish = true;
                    s.position_ms = s.duration_ms;
                });
            }
        });
        Ok(())
    }

    async fn pause(&self) -> Result<(), DeviceError> {
        if self.fail_pause.load(Ordering::SeqCst) {
            return Err(DeviceError::ControlFailed("device went away".to_string()));
        }
        self.record("pause");
        {
            let mut clock = self.clock.lock().unwrap();
            clock.generation += 1;
            if let Some(started) = clock.started.take() {
                clock.remaining = clock.remaining.saturating_sub(started.elapsed());
            }
        }
        self.tx.send_modify(|s| s.is_playing = false);
        Ok(())
    }

    async fn stop(&self) -> Result<(), DeviceError> {
        self.record("stop");
        {
            let mut clock = self.clock.lock().unwrap();
            clock.generation += 1;
            clock.started = None;
            clock.remaining = self.duration;
        }
        self.tx.send_modify(|s| {
            s.is_playing = false;
            s.did_just_finish = false;
            s.position_ms = 0;
        });
        Ok(())
    }

    async fn unload(&self) -> Result<(), DeviceError> {
        self.record("unload");
        if !self.unloaded.swap(true, Ordering::SeqCst) {
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
        self.clock.lock().unwrap().generation += 1;
        self.tx.send_modify(|s| {
            s.is_loaded = false;
            s.is_playing = false;
        });
        Ok(())
    }

    fn status(&self) -> watch::Receiver<DeviceStatus> {
        self.tx.subscribe()
    }
}

// ============================================================================
// Playlist store
// ============================================================================

#[derive(Default)]
pub struct MemoryPlaylistStore {
    records: Mutex<HashMap<String, String>>,
    fail_save: AtomicBool,
}

impl MemoryPlaylistStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, content_id: &str, payload: &str) {
        self.records
            .lock()
            .unwrap()
            .insert(content_id.to_string(), payload.to_string());
    }

    pub fn get(&self, content_id: &str) -> Option<String> {
        self.records.lock().unwrap().get(content_id).cloned()
    }

    pub fn fail_saves(&self) {
        self.fail_save.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl PlaylistStorePort for MemoryPlaylistStore {
    async fn load(&self, content_id: &str) -> Result<Option<String>, RepositoryError> {
        Ok(self.get(content_id))
    }

    async fn save(&self, content_id: &str, payload: &str) -> Result<(), RepositoryError> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(RepositoryError::DatabaseError("disk I/O error".to_string()));
        }
        self.insert(content_id, payload);
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

#[derive(Default)]
pub struct RecordingProgress {
    stages: Mutex<Vec<PlaybackStatus>>,
    cancelled: AtomicBool,
}

impl RecordingProgress {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn stages(&self) -> Vec<PlaybackStatus> {
        self.stages.lock().unwrap().clone()
    }
}

impl SegmentProgress for RecordingProgress {
    fn on_stage(&self, status: PlaybackStatus) {
        self.stages.lock().unwrap().push(status);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

pub fn synthesizer(
    backend: Arc<ScriptedBackend>,
    cache: Arc<MemoryCache>,
    device: Arc<FakeDevice>,
) -> SegmentSynthesizer {
    SegmentSynthesizer::new(
        backend,
        Arc::new(StaticCredentials),
        cache,
        device,
        SegmentLocator::new("https://cloud.test/v1", "proj"),
        BucketRef::new("tts").unwrap(),
    )
}
