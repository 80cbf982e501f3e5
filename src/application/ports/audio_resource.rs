//! Audio Resource Port - 音频播放资源抽象
//!
//! 位置一律以媒体时间（毫秒）表示，与词时间表同一时间基准。

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::timing::TimingTable;

/// 音频资源错误
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Failed to load audio {url}: {reason}")]
    LoadFailed { url: String, reason: String },

    #[error("Invalid playback rate: {0}")]
    InvalidRate(f64),

    #[error("Audio resource released")]
    Released,
}

/// 单个音频资源
///
/// 由当前 PlaybackSession 独占；`release` 之后不再可用
pub trait AudioResourcePort: Send + Sync {
    /// 音频来源地址
    fn source(&self) -> &str;

    /// 开始或继续播放；已播放到结尾时从头开始
    fn play(&self) -> Result<(), AudioError>;

    fn pause(&self);

    /// 当前媒体位置（毫秒）
    fn position_ms(&self) -> f64;

    /// 直接设置媒体位置（毫秒），超出范围时截断
    fn set_position_ms(&self, position_ms: f64);

    fn playback_rate(&self) -> f64;

    fn set_playback_rate(&self, rate: f64) -> Result<(), AudioError>;

    /// 总时长（毫秒），未知时为 None
    fn duration_ms(&self) -> Option<f64>;

    /// 是否已播放完毕
    fn is_ended(&self) -> bool;

    fn is_paused(&self) -> bool;

    /// 释放底层绑定
    fn release(&self);
}

/// Audio Binder Port
///
/// 按 URL 创建并绑定音频资源
#[async_trait]
pub trait AudioBinderPort: Send + Sync {
    async fn bind(
        &self,
        audio_url: &str,
        timings: &TimingTable,
    ) -> Result<Arc<dyn AudioResourcePort>, AudioError>;
}
