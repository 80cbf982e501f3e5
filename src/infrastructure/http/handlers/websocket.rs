//! WebSocket Handler - 播放器事件流

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::infrastructure::http::state::AppState;

/// 播放器 WebSocket 连接处理（状态、光标、生成结果事件）
pub async fn player_websocket_handler(
    ws: WebSocketUpgrade,
    Path(player_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_player_socket(socket, player_id, state))
}

async fn handle_player_socket(socket: WebSocket, player_id: String, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let mut event_rx = match state.event_publisher.subscribe(&player_id) {
        Some(rx) if state.registry.is_valid(&player_id) => rx,
        _ => {
            tracing::warn!(player_id = %player_id, "WebSocket connection rejected: unknown player");
            let _ = sender.close().await;
            return;
        }
    };

    tracing::info!(player_id = %player_id, "WebSocket connected");

    let player_id_for_forward = player_id.clone();
    let player_id_for_receive = player_id.clone();

    // 事件转发任务；播放器关闭后通道关闭，任务随之结束
    let forward_task = tokio::spawn(async move {
        loop {
            let event = match event_rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(
                        player_id = %player_id_for_forward,
                        skipped = skipped,
                        "WebSocket subscriber lagged"
                    );
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let msg = match serde_json::to_string(&event) {
                Ok(json) => Message::Text(json),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize event");
                    continue;
                }
            };

            if let Err(e) = sender.send(msg).await {
                tracing::debug!(
                    player_id = %player_id_for_forward,
                    error = %e,
                    "Failed to send WebSocket message"
                );
                break;
            }
        }
        let _ = sender.close().await;
    });

    // 接收客户端消息（心跳）
    let registry = state.registry.clone();
    let receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::info!(player_id = %player_id_for_receive, "WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(player_id = %player_id_for_receive, error = %e, "WebSocket error");
                    break;
                }
                _ => registry.touch(&player_id_for_receive),
            }
        }
    });

    tokio::select! {
        _ = forward_task => {}
        _ = receive_task => {}
    }

    tracing::info!(player_id = %player_id, "WebSocket disconnected");
}
