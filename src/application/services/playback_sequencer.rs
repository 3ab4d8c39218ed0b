//! Playback Sequencer - 播放状态机
//!
//! 一个 `Player` 对应一个设备槽位，同一时刻最多一个活动会话。
//! 片段严格顺序播放：第 n 个句柄完全释放（stop + unload）后才加载第 n+1 个。
//! 取消是协作式的：片段之间、合成步骤之间、等待播放完成时检查。
//! 所有状态写入都以“写入者仍是活动会话”为条件，与 stop 的重置原子互斥。

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::segment_synthesizer::{LoadedSegment, SegmentProgress, SegmentSynthesizer};
use crate::application::ports::{DeviceError, DeviceHandle, DeviceStatus};
use crate::domain::playback::{AudioSegment, BucketRef, PlaybackError, PlaybackStatus, SegmentId};
use crate::domain::{segment_text, SegmentConfig, TextChunk};
use crate::infrastructure::events::EventPublisher;

/// 状态机时序配置
#[derive(Debug, Clone)]
pub struct SequencerConfig {
    /// 等待片段播放结束时检查取消的间隔
    pub stop_poll_interval: Duration,
    /// 暂停期间检查恢复/停止的间隔
    pub pause_poll_interval: Duration,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            stop_poll_interval: Duration::from_millis(150),
            pause_poll_interval: Duration::from_millis(200),
        }
    }
}

/// 播放器可观察状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlaybackSnapshot {
    pub session_id: Option<Uuid>,
    pub status: PlaybackStatus,
    pub segment_index: Option<usize>,
    pub total_segments: usize,
    pub segment_id: Option<SegmentId>,
    pub error: Option<String>,
}

/// 一次播放的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlaybackOutcome {
    /// 全部片段播放完毕，按顺序返回片段标识及各自所在的存储桶
    Completed {
        segment_ids: Vec<SegmentId>,
        buckets: Vec<BucketRef>,
    },
    /// 被 stop 或新的播放打断
    Stopped,
}

enum PlaylistItem {
    Synthesize(TextChunk),
    Cached {
        segment_id: SegmentId,
        bucket: Option<BucketRef>,
    },
}

enum SegmentEnd {
    Finished,
    Cancelled,
}

/// 独占的设备槽位，最多持有一个句柄
#[derive(Default)]
struct DeviceSlot {
    handle: Mutex<Option<Box<dyn DeviceHandle>>>,
}

impl DeviceSlot {
    /// 放入句柄；会话已取消时直接卸载，返回 false
    ///
    /// stop 不会中断进行中的 `load`：该句柄在 load 返回后才到达这里并被立即卸载，
    /// 所以“stop 后没有已加载句柄”要到这次 load 完成时才成立。
    async fn acquire(&self, handle: Box<dyn DeviceHandle>, cancel: &CancellationToken) -> bool {
        let mut slot = self.handle.lock().await;
        if cancel.is_cancelled() {
            tracing::debug!("Segment loaded after stop, unloading");
            release_handle(handle).await;
            return false;
        }
        if let Some(previous) = slot.take() {
            release_handle(previous).await;
        }
        *slot = Some(handle);
        true
    }

    async fn release(&self) {
        let handle = self.handle.lock().await.take();
        if let Some(handle) = handle {
            release_handle(handle).await;
        }
    }

    /// 槽位为空时返回 Ok(false)
    async fn play(&self) -> Result<bool, DeviceError> {
        let slot = self.handle.lock().await;
        match slot.as_ref() {
            Some(handle) => handle.play().await.map(|_| true),
            None => Ok(false),
        }
    }

    async fn pause(&self) -> Result<bool, DeviceError> {
        let slot = self.handle.lock().await;
        match slot.as_ref() {
            Some(handle) => handle.pause().await.map(|_| true),
            None => Ok(false),
        }
    }
}

async fn release_handle(handle: Box<dyn DeviceHandle>) {
    if let Err(e) = handle.stop().await {
        tracing::debug!(error = %e, "Device stop failed during release");
    }
    if let Err(e) = handle.unload().await {
        tracing::warn!(error = %e, "Device unload failed");
    }
}

/// 播放会话，一次 start 对应一个
struct PlaybackSession {
    id: Uuid,
    cancel: CancellationToken,
    paused: AtomicBool,
    slot: DeviceSlot,
    failure: std::sync::Mutex<Option<PlaybackError>>,
    state: Arc<watch::Sender<PlaybackSnapshot>>,
    events: Arc<EventPublisher>,
}

impl PlaybackSession {
    fn new(state: Arc<watch::Sender<PlaybackSnapshot>>, events: Arc<EventPublisher>) -> Self {
        Self {
            id: Uuid::new_v4(),
            cancel: CancellationToken::new(),
            paused: AtomicBool::new(false),
            slot: DeviceSlot::default(),
            failure: std::sync::Mutex::new(None),
            state,
            events,
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// 仅当本会话仍是活动会话时写入
    fn update(&self, apply: impl FnOnce(&mut PlaybackSnapshot)) -> bool {
        let changed = self.state.send_if_modified(|snapshot| {
            if snapshot.session_id != Some(self.id) {
                return false;
            }
            let before = snapshot.clone();
            apply(snapshot);
            *snapshot != before
        });
        if changed {
            let snapshot = self.state.borrow().clone();
            self.events.publish_status_changed(&snapshot);
        }
        changed
    }

    fn set_status(&self, status: PlaybackStatus) {
        self.update(|s| s.status = status);
    }

    /// 片段开始播放；期间到达的 pause 保持 paused 状态
    fn mark_segment_playing(&self, segment_id: &SegmentId) {
        self.update(|s| {
            if !self.is_paused() {
                s.status = PlaybackStatus::Playing;
            }
            s.segment_id = Some(segment_id.clone());
        });
    }

    fn apply_device_status(&self, device: &DeviceStatus) {
        if !device.is_loaded {
            return;
        }
        let status = if self.is_paused() {
            PlaybackStatus::Paused
        } else if device.is_playing {
            PlaybackStatus::Playing
        } else if device.is_buffering {
            PlaybackStatus::Downloading
        } else {
            return;
        };
        self.set_status(status);
    }

    /// 进入 error 终止态并取消会话
    fn fail(&self, error: PlaybackError) {
        {
            let mut failure = self.failure.lock().unwrap_or_else(|e| e.into_inner());
            failure.get_or_insert_with(|| error.clone());
        }
        self.cancel.cancel();
        self.update(|s| {
            s.status = PlaybackStatus::Error;
            s.error = Some(error.to_string());
            s.session_id = None;
        });
    }

    fn take_failure(&self) -> Option<PlaybackError> {
        self.failure.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

impl SegmentProgress for PlaybackSession {
    fn on_stage(&self, status: PlaybackStatus) {
        self.set_status(status);
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// 播放器
pub struct Player {
    synthesizer: Arc<SegmentSynthesizer>,
    segment_config: SegmentConfig,
    config: SequencerConfig,
    state: Arc<watch::Sender<PlaybackSnapshot>>,
    current: Mutex<Option<Arc<PlaybackSession>>>,
    events: Arc<EventPublisher>,
}

impl Player {
    pub fn new(
        synthesizer: Arc<SegmentSynthesizer>,
        segment_config: SegmentConfig,
        config: SequencerConfig,
        events: Arc<EventPublisher>,
    ) -> Self {
        let (state, _) = watch::channel(PlaybackSnapshot::default());
        Self {
            synthesizer,
            segment_config,
            config,
            state: Arc::new(state),
            current: Mutex::new(None),
            events,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 当前状态
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.state.borrow().clone()
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.state.subscribe()
    }

    /// 分段合成并播放文本
    pub async fn generate_and_play(&self, text: &str) -> Result<PlaybackOutcome, PlaybackError> {
        let chunks = segment_text(text, &self.segment_config);
        if chunks.is_empty() {
            return Err(PlaybackError::input("No text provided for TTS"));
        }

        tracing::info!(
            segments = chunks.len(),
            chars = text.chars().count(),
            "Starting synthesized playback"
        );
        self.run(chunks.into_iter().map(PlaylistItem::Synthesize).collect())
            .await
    }

    /// 按顺序重放已缓存的片段，所有片段位于同一存储桶
    pub async fn play_cached(
        &self,
        segment_ids: Vec<SegmentId>,
        bucket: Option<BucketRef>,
    ) -> Result<PlaybackOutcome, PlaybackError> {
        let segments = segment_ids
            .into_iter()
            .map(|segment_id| (segment_id, bucket.clone()))
            .collect();
        self.play_cached_segments(segments).await
    }

    /// 按顺序重放已缓存的片段，每个片段带各自的存储桶（None 为默认桶）
    pub async fn play_cached_segments(
        &self,
        segments: Vec<(SegmentId, Option<BucketRef>)>,
    ) -> Result<PlaybackOutcome, PlaybackError> {
        if segments.is_empty() {
            return Err(PlaybackError::input("No cached audio parts found"));
        }

        tracing::info!(segments = segments.len(), "Starting cached playback");
        let items = segments
            .into_iter()
            .map(|(segment_id, bucket)| PlaylistItem::Cached { segment_id, bucket })
            .collect();
        self.run(items).await
    }

    /// 暂停当前片段；没有已加载片段时忽略
    pub async fn pause(&self) -> Result<(), PlaybackError> {
        let Some(session) = self.active_session().await else {
            return Ok(());
        };

        session.paused.store(true, Ordering::SeqCst);
        match session.slot.pause().await {
            Ok(true) => {
                session.set_status(PlaybackStatus::Paused);
                tracing::info!(session_id = %session.id, "Playback paused");
                Ok(())
            }
            Ok(false) => {
                session.paused.store(false, Ordering::SeqCst);
                tracing::debug!(session_id = %session.id, "Pause ignored, no segment loaded");
                Ok(())
            }
            Err(e) => {
                let error = PlaybackError::playback(format!("Pause failed: {}", e));
                self.abort(&session, error.clone()).await;
                Err(error)
            }
        }
    }

    /// 恢复播放；没有已加载片段时忽略
    pub async fn resume(&self) -> Result<(), PlaybackError> {
        let Some(session) = self.active_session().await else {
            return Ok(());
        };

        let was_paused = session.paused.swap(false, Ordering::SeqCst);
        match session.slot.play().await {
            Ok(true) => {
                session.set_status(PlaybackStatus::Playing);
                tracing::info!(session_id = %session.id, "Playback resumed");
                Ok(())
            }
            Ok(false) => {
                session.paused.store(was_paused, Ordering::SeqCst);
                Ok(())
            }
            Err(e) => {
                let error = PlaybackError::playback(format!("Resume failed: {}", e));
                self.abort(&session, error.clone()).await;
                Err(error)
            }
        }
    }

    /// 停止播放，总是成功
    pub async fn stop(&self) {
        let mut current = self.current.lock().await;
        match current.take() {
            Some(session) => self.shutdown(&session).await,
            None => self.reset_idle(),
        }
    }

    async fn active_session(&self) -> Option<Arc<PlaybackSession>> {
        self.current.lock().await.clone()
    }

    fn reset_idle(&self) {
        let changed = self.state.send_if_modified(|snapshot| {
            let idle = PlaybackSnapshot {
                total_segments: snapshot.total_segments,
                ..Default::default()
            };
            if *snapshot == idle {
                return false;
            }
            *snapshot = idle;
            true
        });
        if changed {
            self.events.publish_status_changed(&self.snapshot());
        }
    }

    async fn shutdown(&self, session: &PlaybackSession) {
        session.cancel.cancel();
        session.paused.store(false, Ordering::SeqCst);
        self.reset_idle();
        session.slot.release().await;
        tracing::info!(session_id = %session.id, "Playback session stopped");
    }

    async fn abort(&self, session: &PlaybackSession, error: PlaybackError) {
        tracing::error!(session_id = %session.id, error = %error, "Playback session failed");
        session.fail(error);
        session.slot.release().await;
    }

    /// 创建新会话，先完整停止旧会话
    async fn begin_session(&self, total_segments: usize, initial: PlaybackStatus) -> Arc<PlaybackSession> {
        let mut current = self.current.lock().await;
        if let Some(previous) = current.take() {
            tracing::info!(session_id = %previous.id, "Pre-empting active playback session");
            self.shutdown(&previous).await;
        }

        let session = Arc::new(PlaybackSession::new(
            self.state.clone(),
            self.events.clone(),
        ));
        self.state.send_modify(|snapshot| {
            *snapshot = PlaybackSnapshot {
                session_id: Some(session.id),
                status: initial,
                total_segments,
                ..Default::default()
            };
        });
        self.events.publish_status_changed(&self.snapshot());

        *current = Some(session.clone());
        session
    }

    async fn end_session(&self, session: &PlaybackSession) {
        let mut current = self.current.lock().await;
        if current.as_ref().is_some_and(|c| c.id == session.id) {
            *current = None;
        }
    }

    async fn run(&self, items: Vec<PlaylistItem>) -> Result<PlaybackOutcome, PlaybackError> {
        let initial = match items.first() {
            Some(PlaylistItem::Cached { .. }) => PlaybackStatus::Downloading,
            _ => PlaybackStatus::Generating,
        };
        let session = self.begin_session(items.len(), initial).await;
        tracing::info!(session_id = %session.id, segments = items.len(), "Playback session started");

        let result = self.drive(&session, items).await;
        session.slot.release().await;

        let result = match result {
            Ok(PlaybackOutcome::Completed {
                segment_ids,
                buckets,
            }) => {
                session.update(|s| {
                    s.status = PlaybackStatus::Idle;
                    s.session_id = None;
                    s.segment_id = None;
                });
                self.events.publish_playlist_completed(session.id, &segment_ids);
                tracing::info!(
                    session_id = %session.id,
                    segments = segment_ids.len(),
                    "Playlist completed"
                );
                Ok(PlaybackOutcome::Completed {
                    segment_ids,
                    buckets,
                })
            }
            other => match session.take_failure() {
                Some(failure) => Err(failure),
                None => match other {
                    Err(error) if !session.is_cancelled() => {
                        tracing::error!(session_id = %session.id, error = %error, "Playback session failed");
                        session.fail(error.clone());
                        Err(error)
                    }
                    _ => Ok(PlaybackOutcome::Stopped),
                },
            },
        };

        self.end_session(&session).await;
        result
    }

    async fn drive(
        &self,
        session: &PlaybackSession,
        items: Vec<PlaylistItem>,
    ) -> Result<PlaybackOutcome, PlaybackError> {
        let mut produced = Vec::with_capacity(items.len());
        let mut buckets = Vec::with_capacity(items.len());

        for (index, item) in items.into_iter().enumerate() {
            if session.is_cancelled() {
                return Ok(PlaybackOutcome::Stopped);
            }
            session.update(|s| {
                s.segment_index = Some(index);
                s.segment_id = None;
            });

            let loaded = match &item {
                PlaylistItem::Synthesize(chunk) => {
                    self.synthesizer.synthesize_new(chunk, session).await?
                }
                PlaylistItem::Cached { segment_id, bucket } => {
                    self.synthesizer
                        .replay_cached(segment_id, bucket.as_ref(), session)
                        .await?
                }
            };
            let Some(LoadedSegment { segment, handle }) = loaded else {
                return Ok(PlaybackOutcome::Stopped);
            };

            produced.push(segment.segment_id.clone());
            buckets.push(segment.bucket.clone());
            match self.play_segment(session, index, &segment, handle).await? {
                SegmentEnd::Finished => {}
                SegmentEnd::Cancelled => return Ok(PlaybackOutcome::Stopped),
            }
        }

        Ok(PlaybackOutcome::Completed {
            segment_ids: produced,
            buckets,
        })
    }

    async fn play_segment(
        &self,
        session: &PlaybackSession,
        index: usize,
        segment: &AudioSegment,
        handle: Box<dyn DeviceHandle>,
    ) -> Result<SegmentEnd, PlaybackError> {
        let mut device = handle.status();
        if !session.slot.acquire(handle, &session.cancel).await {
            return Ok(SegmentEnd::Cancelled);
        }

        session
            .slot
            .play()
            .await
            .map_err(|e| PlaybackError::playback(format!("Play failed: {}", e)))?;
        session.mark_segment_playing(&segment.segment_id);
        self.events
            .publish_segment_started(session.id, index, &segment.segment_id);
        tracing::info!(
            session_id = %session.id,
            segment_index = index,
            segment_id = %segment.segment_id,
            "Segment playing"
        );

        if let SegmentEnd::Cancelled = self.await_segment_end(session, &mut device).await? {
            return Ok(SegmentEnd::Cancelled);
        }

        // 暂停冻结推进，直到恢复或停止
        while session.is_paused() && !session.is_cancelled() {
            tokio::time::sleep(self.config.pause_poll_interval).await;
        }
        if session.is_cancelled() {
            return Ok(SegmentEnd::Cancelled);
        }

        session.slot.release().await;
        tracing::debug!(session_id = %session.id, segment_index = index, "Segment finished");
        Ok(SegmentEnd::Finished)
    }

    /// 等待设备报告播放结束，同时响应取消
    async fn await_segment_end(
        &self,
        session: &PlaybackSession,
        device: &mut watch::Receiver<DeviceStatus>,
    ) -> Result<SegmentEnd, PlaybackError> {
        if device.borrow_and_update().did_just_finish {
            return Ok(SegmentEnd::Finished);
        }

        let mut ticker = tokio::time::interval(self.config.stop_poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = device.changed() => {
                    if changed.is_err() {
                        if session.is_cancelled() {
                            return Ok(SegmentEnd::Cancelled);
                        }
                        return Err(PlaybackError::playback("Audio device closed before segment finished"));
                    }
                    let status = *device.borrow_and_update();
                    if status.did_just_finish {
                        return Ok(SegmentEnd::Finished);
                    }
                    session.apply_device_status(&status);
                }
                _ = session.cancel.cancelled() => {
                    return Ok(SegmentEnd::Cancelled);
                }
                _ = ticker.tick() => {
                    if session.is_cancelled() {
                        return Ok(SegmentEnd::Cancelled);
                    }
                }
            }
        }
    }
}
