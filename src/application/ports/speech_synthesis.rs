//! Speech Synthesis Port - TTS 合成服务抽象
//!
//! 外部服务负责生成音频与词级时间表，核心只消费结果。

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::timing::{TimingError, TimingTable};

/// 合成错误
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Malformed word timings: {0}")]
    MalformedTimings(#[from] TimingError),
}

/// 合成请求
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    /// 语言代码，如 `en`、`es-MX`、`zh`
    pub language: String,
    /// 语速 (0.5 - 2.0)，由服务端校验
    pub speed: f64,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, language: impl Into<String>, speed: f64) -> Self {
        Self {
            text: text.into(),
            language: language.into(),
            speed,
        }
    }
}

/// 合成结果
///
/// `timings` 已在适配器边界完成校验
#[derive(Debug, Clone)]
pub struct SpeechResponse {
    /// 可直接访问的音频地址
    pub audio_url: String,
    /// 服务端音频 ID（用于日志和追踪）
    pub audio_id: Option<String>,
    pub timings: TimingTable,
}

/// Speech Synthesis Port
#[async_trait]
pub trait SpeechSynthesisPort: Send + Sync {
    /// 合成文本，返回音频地址和词时间表
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechResponse, SynthesisError>;

    /// 检查服务是否可用
    async fn health_check(&self) -> bool {
        true
    }
}
