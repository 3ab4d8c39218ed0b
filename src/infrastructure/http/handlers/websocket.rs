//! WebSocket Handler - 播放事件推送

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::infrastructure::events::PlaybackEvent;
use crate::infrastructure::http::state::AppState;

/// 事件 WebSocket 连接处理
pub async fn events_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_events_socket(socket, state))
}

fn encode(event: &PlaybackEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Message::Text(json)),
        Err(e) => {
            tracing::error!(event = event.name(), error = %e, "Failed to serialize event");
            None
        }
    }
}

async fn handle_events_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // 先订阅再取快照，连接建立后不会漏掉状态变化
    let mut event_rx = state.event_publisher.subscribe();
    let snapshot = state.player.snapshot();

    tracing::info!("Events WebSocket connected");

    let initial = PlaybackEvent::StatusChanged {
        session_id: snapshot.session_id,
        status: snapshot.status,
        segment_index: snapshot.segment_index,
        total_segments: snapshot.total_segments,
        error: snapshot.error,
    };

    let mut forward_task = tokio::spawn(async move {
        if let Some(msg) = encode(&initial) {
            if sender.send(msg).await.is_err() {
                return;
            }
        }

        loop {
            let event = match event_rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Events WebSocket lagged, events dropped");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let Some(msg) = encode(&event) else {
                continue;
            };

            if let Err(e) = sender.send(msg).await {
                tracing::debug!(error = %e, "Failed to send WebSocket message");
                break;
            }
        }
    });

    // 接收客户端消息（心跳）
    let mut receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::info!("Events WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Events WebSocket error");
                    break;
                }
                // Ping 由 axum 自动回 Pong
                _ => {}
            }
        }
    });

    // 任一方向结束即断开
    tokio::select! {
        _ = &mut forward_task => receive_task.abort(),
        _ = &mut receive_task => forward_task.abort(),
    }

    tracing::info!("Events WebSocket disconnected");
}
