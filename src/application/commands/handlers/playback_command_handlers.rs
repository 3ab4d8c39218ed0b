//! Playback Command Handlers

use std::sync::Arc;

use crate::application::commands::playback_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::PlaylistStorePort;
use crate::application::services::{PlaybackOutcome, PlaybackSnapshot, Player};
use crate::domain::playback::{BucketRef, SegmentId};
use crate::domain::playlist::{PlaylistCacheRecord, Variant};
use crate::infrastructure::events::EventPublisher;

/// 读取并容错解析缓存记录，读取失败按未命中处理
async fn load_record(store: &dyn PlaylistStorePort, content_id: &str) -> PlaylistCacheRecord {
    match store.load(content_id).await {
        Ok(raw) => PlaylistCacheRecord::parse_lenient(raw.as_deref()),
        Err(e) => {
            tracing::warn!(
                content_id = %content_id,
                error = %e,
                "Failed to load playlist cache record, treating as cache miss"
            );
            PlaylistCacheRecord::default()
        }
    }
}

/// Play Content Handler - 重放缓存或合成播放
pub struct PlayContentHandler {
    player: Arc<Player>,
    playlist_store: Arc<dyn PlaylistStorePort>,
    event_publisher: Arc<EventPublisher>,
}

impl PlayContentHandler {
    pub fn new(
        player: Arc<Player>,
        playlist_store: Arc<dyn PlaylistStorePort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            player,
            playlist_store,
            event_publisher,
        }
    }

    /// 确定播放计划（不开始播放）
    pub async fn prepare(&self, cmd: PlayContentCommand) -> Result<PreparedPlayback, ApplicationError> {
        let content_id = cmd.content_id.trim().to_string();
        if content_id.is_empty() {
            return Err(ApplicationError::validation("content_id is required"));
        }

        let record = load_record(self.playlist_store.as_ref(), &content_id).await;

        if let Some(segments) = record.replay_segments(&cmd.variant) {
            tracing::info!(
                content_id = %content_id,
                variant = %cmd.variant,
                segments = segments.len(),
                "Playlist cache hit"
            );
            return Ok(PreparedPlayback {
                content_id,
                variant: cmd.variant.clone(),
                plan: PlaybackPlan::Replay { segments },
            });
        }

        let text = cmd
            .text
            .filter(|t| !t.trim().is_empty())
            .or_else(|| record.cached_text(&cmd.variant).map(str::to_string))
            .ok_or_else(|| ApplicationError::validation("No text provided for TTS"))?;

        tracing::info!(
            content_id = %content_id,
            variant = %cmd.variant,
            chars = text.chars().count(),
            "Playlist cache miss, synthesizing"
        );

        Ok(PreparedPlayback {
            content_id,
            variant: cmd.variant,
            plan: PlaybackPlan::Synthesize { text },
        })
    }

    /// 执行播放计划，合成完整结束后写回缓存记录
    pub async fn execute(&self, prepared: PreparedPlayback) -> Result<PlayContentResponse, ApplicationError> {
        let replayed = prepared.plan.is_replay();

        let outcome = match prepared.plan {
            PlaybackPlan::Replay { segments } => self.player.play_cached_segments(segments).await?,
            PlaybackPlan::Synthesize { text } => {
                let outcome = self.player.generate_and_play(&text).await?;
                if let PlaybackOutcome::Completed {
                    segment_ids,
                    buckets,
                } = &outcome
                {
                    self.persist(&prepared.content_id, &prepared.variant, segment_ids, buckets, text)
                        .await;
                }
                outcome
            }
        };

        let segment_ids = match &outcome {
            PlaybackOutcome::Completed { segment_ids, .. } => segment_ids.clone(),
            PlaybackOutcome::Stopped => Vec::new(),
        };

        Ok(PlayContentResponse {
            outcome,
            replayed,
            segment_ids,
        })
    }

    pub async fn handle(&self, cmd: PlayContentCommand) -> Result<PlayContentResponse, ApplicationError> {
        let prepared = self.prepare(cmd).await?;
        self.execute(prepared).await
    }

    /// 写回缓存记录（片段标识和各自实际所在的存储桶），失败只记录日志
    async fn persist(
        &self,
        content_id: &str,
        variant: &Variant,
        segment_ids: &[SegmentId],
        buckets: &[BucketRef],
        text: String,
    ) {
        let mut record = load_record(self.playlist_store.as_ref(), content_id).await;
        let segments = segment_ids
            .iter()
            .cloned()
            .zip(buckets.iter().cloned())
            .collect();
        record.record_completed(variant, segments, Some(text));

        let payload = match record.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(content_id = %content_id, error = %e, "Failed to encode playlist cache record");
                return;
            }
        };

        match self.playlist_store.save(content_id, &payload).await {
            Ok(()) => {
                tracing::info!(
                    content_id = %content_id,
                    variant = %variant,
                    segments = segment_ids.len(),
                    "Playlist cache record saved"
                );
                self.event_publisher
                    .publish_playlist_cached(content_id, variant, segment_ids.len());
            }
            Err(e) => {
                tracing::warn!(content_id = %content_id, error = %e, "Failed to save playlist cache record");
            }
        }
    }
}

/// Pause Handler
pub struct PausePlaybackHandler {
    player: Arc<Player>,
}

impl PausePlaybackHandler {
    pub fn new(player: Arc<Player>) -> Self {
        Self { player }
    }

    pub async fn handle(&self, _cmd: PausePlaybackCommand) -> Result<PlaybackSnapshot, ApplicationError> {
        self.player.pause().await?;
        Ok(self.player.snapshot())
    }
}

/// Resume Handler
pub struct ResumePlaybackHandler {
    player: Arc<Player>,
}

impl ResumePlaybackHandler {
    pub fn new(player: Arc<Player>) -> Self {
        Self { player }
    }

    pub async fn handle(&self, _cmd: ResumePlaybackCommand) -> Result<PlaybackSnapshot, ApplicationError> {
        self.player.resume().await?;
        Ok(self.player.snapshot())
    }
}

/// Stop Handler
pub struct StopPlaybackHandler {
    player: Arc<Player>,
}

impl StopPlaybackHandler {
    pub fn new(player: Arc<Player>) -> Self {
        Self { player }
    }

    pub async fn handle(&self, _cmd: StopPlaybackCommand) -> PlaybackSnapshot {
        self.player.stop().await;
        self.player.snapshot()
    }
}

/// Clear Playlist Variant Handler - 原文变化时清除某个变体的缓存
pub struct ClearPlaylistVariantHandler {
    playlist_store: Arc<dyn PlaylistStorePort>,
}

impl ClearPlaylistVariantHandler {
    pub fn new(playlist_store: Arc<dyn PlaylistStorePort>) -> Self {
        Self { playlist_store }
    }

    pub async fn handle(
        &self,
        cmd: ClearPlaylistVariantCommand,
    ) -> Result<ClearPlaylistVariantResponse, ApplicationError> {
        let raw = self.playlist_store.load(&cmd.content_id).await?;
        let mut record = PlaylistCacheRecord::parse_lenient(raw.as_deref());

        let cleared = record.clear_variant(&cmd.variant);
        if cleared {
            let payload = record
                .to_json()
                .map_err(|e| ApplicationError::internal(e.to_string()))?;
            self.playlist_store.save(&cmd.content_id, &payload).await?;
            tracing::info!(
                content_id = %cmd.content_id,
                variant = %cmd.variant,
                "Playlist variant cleared"
            );
        }

        Ok(ClearPlaylistVariantResponse {
            content_id: cmd.content_id,
            variant: cmd.variant,
            cleared,
        })
    }
}
