//! 应用层错误定义
//!
//! 播放同步引擎对外暴露的统一错误类型

use thiserror::Error;

use crate::application::ports::{AudioError, SynthesisError};
use crate::domain::timing::TimingError;

/// 播放错误
///
/// 所有错误都会作为 `last_error` 保留在引擎上，不会使进程退出
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    /// TTS 服务或网络失败
    #[error("Speech request failed: {0}")]
    RequestFailure(String),

    /// 时间表违反不变量
    #[error("Malformed timing table: {0}")]
    MalformedTimingTable(#[from] TimingError),

    /// 未绑定音频资源时执行播放操作
    #[error("No audio resource bound; generate speech first")]
    NoBoundResource,

    /// 已有生成请求在进行中
    #[error("Speech generation already in progress")]
    ConcurrentGenerationRejected,

    /// 参数非法
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// 音频资源绑定失败
    #[error("Audio resource error: {0}")]
    AudioResource(String),
}

impl PlaybackError {
    /// 创建参数非法错误
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// 机器可读的错误类别
    pub fn kind(&self) -> &'static str {
        match self {
            PlaybackError::RequestFailure(_) => "request_failure",
            PlaybackError::MalformedTimingTable(_) => "malformed_timing_table",
            PlaybackError::NoBoundResource => "no_bound_resource",
            PlaybackError::ConcurrentGenerationRejected => "concurrent_generation_rejected",
            PlaybackError::InvalidRequest(_) => "invalid_request",
            PlaybackError::AudioResource(_) => "audio_resource",
        }
    }
}

impl From<SynthesisError> for PlaybackError {
    fn from(err: SynthesisError) -> Self {
        match err {
            SynthesisError::MalformedTimings(e) => Self::MalformedTimingTable(e),
            other => Self::RequestFailure(other.to_string()),
        }
    }
}

impl From<AudioError> for PlaybackError {
    fn from(err: AudioError) -> Self {
        match err {
            AudioError::InvalidRate(rate) => {
                Self::InvalidRequest(format!("playback rate must be positive, got {}", rate))
            }
            other => Self::AudioResource(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesis_error_mapping() {
        let err: PlaybackError = SynthesisError::Timeout.into();
        assert_eq!(err, PlaybackError::RequestFailure("Request timeout".to_string()));

        let err: PlaybackError =
            SynthesisError::MalformedTimings(TimingError::MissingEnd { index: 2 }).into();
        assert_eq!(err.kind(), "malformed_timing_table");
    }

    #[test]
    fn test_audio_error_mapping() {
        let err: PlaybackError = AudioError::InvalidRate(-1.0).into();
        assert_eq!(err.kind(), "invalid_request");

        let err: PlaybackError = AudioError::Released.into();
        assert_eq!(err, PlaybackError::AudioResource("Audio resource released".to_string()));
    }
}
