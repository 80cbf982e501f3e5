//! Playback Context - 状态与快照

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 当前高亮词索引，None 表示无高亮
pub type Cursor = Option<usize>;

/// 播放生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// 尚未生成
    Idle,
    /// 等待 TTS 服务返回
    Loading,
    /// 已绑定音频，未开始播放
    Ready,
    /// 播放中（高亮循环运行）
    Playing,
    /// 已暂停，保留光标
    Paused,
    /// 播放到结尾
    Ended,
    /// 生成失败
    Error,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Loading => "loading",
            PlaybackState::Ready => "ready",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Ended => "ended",
            PlaybackState::Error => "error",
        }
    }

    /// 该状态下是否一定绑定了音频资源
    pub fn has_resource(&self) -> bool {
        matches!(
            self,
            PlaybackState::Ready
                | PlaybackState::Playing
                | PlaybackState::Paused
                | PlaybackState::Ended
        )
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 对外只读快照
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub session_id: Option<u64>,
    pub cursor: Cursor,
    pub current_word: Option<String>,
    pub elapsed_ms: f64,
    pub total_duration_ms: f64,
    pub playback_rate: f64,
    pub total_words: usize,
    pub audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
}
