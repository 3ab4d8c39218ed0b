//! Event Publisher Implementation
//!
//! 播放事件广播，WebSocket 连接各自订阅

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::application::services::PlaybackSnapshot;
use crate::domain::playback::{PlaybackStatus, SegmentId};
use crate::domain::playlist::Variant;

/// 播放事件类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum PlaybackEvent {
    /// 播放器状态变更
    StatusChanged {
        #[serde(skip_serializing_if = "Option::is_none")]
        session_id: Option<Uuid>,
        status: PlaybackStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        segment_index: Option<usize>,
        total_segments: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// 片段开始播放
    SegmentStarted {
        session_id: Uuid,
        segment_index: usize,
        segment_id: String,
    },
    /// 播放列表完整播放结束
    PlaylistCompleted {
        session_id: Uuid,
        segment_ids: Vec<String>,
    },
    /// 播放列表缓存记录已写入
    PlaylistCached {
        content_id: String,
        variant: String,
        segment_count: usize,
    },
}

impl PlaybackEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PlaybackEvent::StatusChanged { .. } => "StatusChanged",
            PlaybackEvent::SegmentStarted { .. } => "SegmentStarted",
            PlaybackEvent::PlaylistCompleted { .. } => "PlaylistCompleted",
            PlaybackEvent::PlaylistCached { .. } => "PlaylistCached",
        }
    }
}

/// 事件发布器
pub struct EventPublisher {
    channel: broadcast::Sender<PlaybackEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { channel: tx }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅播放事件
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.channel.subscribe()
    }

    /// 发布状态变更事件
    pub fn publish_status_changed(&self, snapshot: &PlaybackSnapshot) {
        self.publish(PlaybackEvent::StatusChanged {
            session_id: snapshot.session_id,
            status: snapshot.status,
            segment_index: snapshot.segment_index,
            total_segments: snapshot.total_segments,
            error: snapshot.error.clone(),
        });
    }

    /// 发布片段开始播放事件
    pub fn publish_segment_started(
        &self,
        session_id: Uuid,
        segment_index: usize,
        segment_id: &SegmentId,
    ) {
        self.publish(PlaybackEvent::SegmentStarted {
            session_id,
            segment_index,
            segment_id: segment_id.to_string(),
        });
    }

    /// 发布播放列表完成事件
    pub fn publish_playlist_completed(&self, session_id: Uuid, segment_ids: &[SegmentId]) {
        self.publish(PlaybackEvent::PlaylistCompleted {
            session_id,
            segment_ids: segment_ids.iter().map(ToString::to_string).collect(),
        });
    }

    /// 发布缓存记录写入事件
    pub fn publish_playlist_cached(&self, content_id: &str, variant: &Variant, segment_count: usize) {
        self.publish(PlaybackEvent::PlaylistCached {
            content_id: content_id.to_string(),
            variant: variant.to_string(),
            segment_count,
        });
    }

    fn publish(&self, event: PlaybackEvent) {
        let name = event.name();
        if let Err(e) = self.channel.send(event) {
            tracing::debug!(event = name, error = %e, "Failed to publish event (no receivers)");
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ignored() {
        let publisher = EventPublisher::new();
        publisher.publish_playlist_cached("doc-1", &Variant::document(), 3);
    }

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let publisher = EventPublisher::new();
        let mut rx = publisher.subscribe();
        let session_id = Uuid::new_v4();

        publisher.publish_segment_started(session_id, 2, &SegmentId::new("seg-2").unwrap());

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            PlaybackEvent::SegmentStarted {
                session_id,
                segment_index: 2,
                segment_id: "seg-2".to_string(),
            }
        );
    }

    #[test]
    fn test_event_wire_format() {
        let event = PlaybackEvent::PlaylistCached {
            content_id: "doc-1".to_string(),
            variant: "summary".to_string(),
            segment_count: 4,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "PlaylistCached");
        assert_eq!(json["data"]["segment_count"], 4);

        let snapshot = PlaybackSnapshot::default();
        let publisher = EventPublisher::new();
        let mut rx = publisher.subscribe();
        publisher.publish_status_changed(&snapshot);
        let json = serde_json::to_value(rx.try_recv().unwrap()).unwrap();
        assert_eq!(json["data"]["status"], "idle");
        assert!(json["data"].get("session_id").is_none());
    }
}
