//! PlaybackSession - 一次生成结果对应的播放会话

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::application::error::PlaybackError;
use crate::application::ports::AudioResourcePort;
use crate::domain::playback::{Cursor, PlaybackState};
use crate::domain::timing::{TimingTable, WordInterval};
use crate::infrastructure::events::EventPublisher;

/// 播放会话
///
/// 独占音频资源；每次生成成功都会整体替换
pub(crate) struct PlaybackSession {
    pub id: u64,
    pub resource: Arc<dyn AudioResourcePort>,
    pub timings: Arc<TimingTable>,
    pub cursor: Cursor,
    pub rate: f64,
    pub audio_url: String,
    pub created_at: DateTime<Utc>,
    /// 当前高亮循环的取消令牌
    loop_token: Option<CancellationToken>,
}

impl PlaybackSession {
    pub fn new(
        id: u64,
        resource: Arc<dyn AudioResourcePort>,
        timings: Arc<TimingTable>,
        audio_url: String,
    ) -> Self {
        let rate = resource.playback_rate();
        Self {
            id,
            resource,
            timings,
            cursor: None,
            rate,
            audio_url,
            created_at: Utc::now(),
            loop_token: None,
        }
    }

    /// 为新的高亮循环签发令牌，同时取消旧循环
    pub fn start_loop(&mut self) -> CancellationToken {
        self.cancel_loop();
        let token = CancellationToken::new();
        self.loop_token = Some(token.clone());
        token
    }

    pub fn cancel_loop(&mut self) {
        if let Some(token) = self.loop_token.take() {
            token.cancel();
        }
    }

    pub fn current_word(&self) -> Option<&WordInterval> {
        self.cursor.and_then(|i| self.timings.get(i))
    }

    /// 将光标设置为 `index`，返回是否发生变化
    pub fn move_cursor(&mut self, index: Cursor) -> bool {
        if self.cursor == index {
            return false;
        }
        self.cursor = index;
        true
    }

    /// 停止循环并释放音频资源
    pub fn teardown(mut self) {
        self.cancel_loop();
        self.resource.pause();
        self.resource.release();
        tracing::debug!(
            session_id = self.id,
            audio_url = %self.audio_url,
            "Playback session released"
        );
    }
}

/// 同步器共享状态，由 engine 与高亮循环在同一把锁下访问
pub(crate) struct SyncState {
    pub state: PlaybackState,
    pub session: Option<PlaybackSession>,
    pub last_error: Option<PlaybackError>,
    /// 单调递增的会话编号
    pub generation: u64,
}

impl SyncState {
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Idle,
            session: None,
            last_error: None,
            generation: 0,
        }
    }

    /// 状态迁移并发布事件（同状态不发布）
    pub fn transition(&mut self, to: PlaybackState, events: &EventPublisher, player_id: &str) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        let session_id = self.session.as_ref().map(|s| s.id);
        tracing::debug!(
            player_id = %player_id,
            session_id = ?session_id,
            from = %from,
            to = %to,
            "Playback state changed"
        );
        events.publish_state_changed(player_id, session_id, from, to);
    }

    /// 音频已播放完毕：停止循环、清除光标并进入 Ended
    pub fn mark_ended(&mut self, events: &EventPublisher, player_id: &str) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.cancel_loop();
        if session.move_cursor(None) {
            self.publish_cursor(events, player_id);
        }
        self.transition(PlaybackState::Ended, events, player_id);
    }

    /// 光标变更后发布事件
    pub fn publish_cursor(&self, events: &EventPublisher, player_id: &str) {
        if let Some(session) = &self.session {
            events.publish_cursor_changed(
                player_id,
                session.id,
                session.cursor,
                session.current_word().map(|w| w.word.clone()),
                session.resource.position_ms(),
            );
        }
    }
}
