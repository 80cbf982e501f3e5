//! Event Publisher Implementation
//!
//! 播放事件广播实现

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::domain::playback::PlaybackState;

/// 每个播放器通道的默认容量
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// 播放事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum PlaybackEvent {
    /// 生命周期状态变更
    StateChanged {
        player_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        session_id: Option<u64>,
        from: PlaybackState,
        to: PlaybackState,
    },
    /// 高亮光标变更
    CursorChanged {
        player_id: String,
        session_id: u64,
        index: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        word: Option<String>,
        position_ms: f64,
    },
    /// 生成完成，新会话已就绪
    GenerationCompleted {
        player_id: String,
        session_id: u64,
        audio_url: String,
        total_words: usize,
        duration_ms: f64,
    },
    /// 生成失败
    GenerationFailed {
        player_id: String,
        kind: String,
        error: String,
    },
    /// 播放速率变更
    RateChanged {
        player_id: String,
        session_id: u64,
        rate: f64,
    },
    /// 播放器关闭
    PlayerClosed { player_id: String, reason: String },
}

/// 事件发布器
pub struct EventPublisher {
    /// player_id -> broadcast sender
    player_channels: DashMap<String, broadcast::Sender<PlaybackEvent>>,
    capacity: usize,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            player_channels: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 注册播放器的事件通道，已存在时复用
    pub fn register_player(&self, player_id: &str) -> broadcast::Receiver<PlaybackEvent> {
        self.player_channels
            .entry(player_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// 取消注册播放器
    pub fn unregister_player(&self, player_id: &str) {
        self.player_channels.remove(player_id);
    }

    /// 获取播放器的事件接收器
    pub fn subscribe(&self, player_id: &str) -> Option<broadcast::Receiver<PlaybackEvent>> {
        self.player_channels.get(player_id).map(|s| s.subscribe())
    }

    /// 发布状态变更事件
    pub fn publish_state_changed(
        &self,
        player_id: &str,
        session_id: Option<u64>,
        from: PlaybackState,
        to: PlaybackState,
    ) {
        self.publish(
            player_id,
            PlaybackEvent::StateChanged {
                player_id: player_id.to_string(),
                session_id,
                from,
                to,
            },
        );
    }

    /// 发布光标变更事件
    pub fn publish_cursor_changed(
        &self,
        player_id: &str,
        session_id: u64,
        index: Option<usize>,
        word: Option<String>,
        position_ms: f64,
    ) {
        self.publish(
            player_id,
            PlaybackEvent::CursorChanged {
                player_id: player_id.to_string(),
                session_id,
                index,
                word,
                position_ms,
            },
        );
    }

    /// 发布生成完成事件
    pub fn publish_generation_completed(
        &self,
        player_id: &str,
        session_id: u64,
        audio_url: &str,
        total_words: usize,
        duration_ms: f64,
    ) {
        self.publish(
            player_id,
            PlaybackEvent::GenerationCompleted {
                player_id: player_id.to_string(),
                session_id,
                audio_url: audio_url.to_string(),
                total_words,
                duration_ms,
            },
        );
    }

    /// 发布生成失败事件
    pub fn publish_generation_failed(&self, player_id: &str, kind: &str, error: &str) {
        self.publish(
            player_id,
            PlaybackEvent::GenerationFailed {
                player_id: player_id.to_string(),
                kind: kind.to_string(),
                error: error.to_string(),
            },
        );
    }

    /// 发布速率变更事件
    pub fn publish_rate_changed(&self, player_id: &str, session_id: u64, rate: f64) {
        self.publish(
            player_id,
            PlaybackEvent::RateChanged {
                player_id: player_id.to_string(),
                session_id,
                rate,
            },
        );
    }

    /// 发布播放器关闭事件
    pub fn publish_player_closed(&self, player_id: &str, reason: &str) {
        self.publish(
            player_id,
            PlaybackEvent::PlayerClosed {
                player_id: player_id.to_string(),
                reason: reason.to_string(),
            },
        );
    }

    /// 发布事件到指定播放器
    fn publish(&self, player_id: &str, event: PlaybackEvent) {
        if let Some(sender) = self.player_channels.get(player_id) {
            if let Err(e) = sender.send(event) {
                tracing::trace!(
                    player_id = %player_id,
                    error = %e,
                    "Failed to publish event (no receivers)"
                );
            }
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
