//! HTTP Speech Client - 调用外部 TTS HTTP 服务
//!
//! 实现 SpeechSynthesisPort trait，通过 HTTP 调用外部 TTS 服务
//!
//! 外部 TTS API:
//! POST http://localhost:8000/api/speech/tts-with-highlight
//! Request: {"text": "...", "language": "en", "speed": 1.0}  (JSON)
//! Response: {"success": true, "audio_url": "/audio/x.mp3", "audio_id": "x",
//!            "word_timings": [{"word", "start_ms", "duration_ms", "end_ms"}]}
//!        或 {"success": false, "error": "..."}

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{
    SpeechRequest, SpeechResponse, SpeechSynthesisPort, SynthesisError,
};
use crate::domain::timing::{TimingError, TimingTable};

/// 合成请求体 (JSON)
#[derive(Debug, Serialize)]
struct TtsHttpRequest<'a> {
    text: &'a str,
    language: &'a str,
    speed: f64,
}

/// 服务端响应信封
///
/// 字段全部可选，逐项校验后才转为 SpeechResponse
#[derive(Debug, Default, Deserialize)]
struct TtsEnvelope {
    #[serde(default)]
    success: bool,
    audio_url: Option<String>,
    audio_id: Option<String>,
    word_timings: Option<serde_json::Value>,
    error: Option<String>,
}

impl TtsEnvelope {
    fn into_response(self, base_url: &str) -> Result<SpeechResponse, SynthesisError> {
        if !self.success {
            return Err(SynthesisError::ServiceError(
                self.error
                    .unwrap_or_else(|| "TTS service reported failure".to_string()),
            ));
        }

        let audio_url = self
            .audio_url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| SynthesisError::InvalidResponse("missing audio_url".to_string()))?;
        let audio_url = resolve_audio_url(base_url, &audio_url)?;

        // 成功标记但时间表缺失或非法，按时间表格式错误处理
        let raw = self.word_timings.ok_or_else(|| {
            TimingError::InvalidPayload("missing word_timings".to_string())
        })?;
        let timings = TimingTable::from_json(raw)?;

        Ok(SpeechResponse {
            audio_url,
            audio_id: self.audio_id,
            timings,
        })
    }
}

/// 将服务返回的相对音频地址解析为绝对地址
fn resolve_audio_url(base_url: &str, audio_url: &str) -> Result<String, SynthesisError> {
    let base = Url::parse(base_url)
        .map_err(|e| SynthesisError::InvalidResponse(format!("invalid base url: {}", e)))?;
    base.join(audio_url)
        .map(|u| u.to_string())
        .map_err(|e| SynthesisError::InvalidResponse(format!("invalid audio_url: {}", e)))
}

/// HTTP Speech 客户端配置
#[derive(Debug, Clone)]
pub struct HttpSpeechClientConfig {
    /// TTS 服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpSpeechClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl HttpSpeechClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP Speech 客户端
pub struct HttpSpeechClient {
    client: Client,
    config: HttpSpeechClientConfig,
}

impl HttpSpeechClient {
    pub fn new(config: HttpSpeechClientConfig) -> Result<Self, SynthesisError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SynthesisError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn synthesize_url(&self) -> String {
        format!(
            "{}/api/speech/tts-with-highlight",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SpeechSynthesisPort for HttpSpeechClient {
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechResponse, SynthesisError> {
        let body = TtsHttpRequest {
            text: &request.text,
            language: &request.language,
            speed: request.speed,
        };

        tracing::debug!(
            url = %self.synthesize_url(),
            text_len = request.text.len(),
            language = %request.language,
            speed = request.speed,
            "Sending TTS request"
        );

        let response = self
            .client
            .post(self.synthesize_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SynthesisError::Timeout
                } else if e.is_connect() {
                    SynthesisError::NetworkError(format!("Cannot connect to TTS service: {}", e))
                } else {
                    SynthesisError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            // 服务端错误体一般为 {"error": "..."} 或 {"detail": "..."}
            let detail = serde_json::from_str::<serde_json::Value>(&error_text)
                .ok()
                .and_then(|v| {
                    v.get("error")
                        .or_else(|| v.get("detail"))
                        .and_then(|e| e.as_str())
                        .map(str::to_string)
                })
                .unwrap_or(error_text);
            return Err(SynthesisError::ServiceError(format!(
                "HTTP {}: {}",
                status, detail
            )));
        }

        let envelope: TtsEnvelope = response.json().await.map_err(|e| {
            if e.is_timeout() {
                SynthesisError::Timeout
            } else {
                SynthesisError::InvalidResponse(format!("Failed to decode response: {}", e))
            }
        })?;

        let result = envelope.into_response(&self.config.base_url)?;

        tracing::info!(
            audio_id = ?result.audio_id,
            audio_url = %result.audio_url,
            total_words = result.timings.len(),
            duration_ms = result.timings.total_duration_ms(),
            "TTS synthesis completed"
        );

        Ok(result)
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
