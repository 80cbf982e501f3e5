//! Fake Speech Client - 离线 TTS 客户端
//!
//! 不实际合成音频，按字符数估算每个词的时长，用于开发和测试

use async_trait::async_trait;
use std::time::Duration;

use crate::application::ports::{
    SpeechRequest, SpeechResponse, SpeechSynthesisPort, SynthesisError,
};
use crate::domain::timing::{RawWordTiming, TimingTable};

/// 1.0 倍速下 5 个字符的词时长（毫秒）
const AVG_WORD_MS: f64 = 400.0;
const WORD_GAP_MS: f64 = 50.0;

/// Fake Speech Client 配置
#[derive(Debug, Clone)]
pub struct FakeSpeechClientConfig {
    /// 生成的音频地址前缀
    pub base_url: String,
    /// 模拟合成延迟
    pub latency: Duration,
    pub min_speed: f64,
    pub max_speed: f64,
}

impl Default for FakeSpeechClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            latency: Duration::from_millis(200),
            min_speed: 0.5,
            max_speed: 2.0,
        }
    }
}

/// Fake Speech Client
pub struct FakeSpeechClient {
    config: FakeSpeechClientConfig,
}

impl FakeSpeechClient {
    pub fn new(config: FakeSpeechClientConfig) -> Self {
        tracing::info!(
            base_url = %config.base_url,
            latency_ms = config.latency.as_millis() as u64,
            "FakeSpeechClient initialized"
        );
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeSpeechClientConfig::default())
    }

    /// 按词长估算时间表
    fn estimate_timings(text: &str, speed: f64) -> Vec<RawWordTiming> {
        let avg_word = AVG_WORD_MS / speed;
        let mut cursor = 0.0;
        text.split_whitespace()
            .map(|word| {
                let duration = avg_word * (word.chars().count() as f64 / 5.0);
                let timing = RawWordTiming::new(word, cursor, cursor + duration);
                cursor += duration + WORD_GAP_MS;
                timing
            })
            .collect()
    }
}

#[async_trait]
impl SpeechSynthesisPort for FakeSpeechClient {
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechResponse, SynthesisError> {
        if request.text.trim().is_empty() {
            return Err(SynthesisError::ServiceError(
                "Please provide text to convert".to_string(),
            ));
        }
        if !(self.config.min_speed..=self.config.max_speed).contains(&request.speed) {
            return Err(SynthesisError::ServiceError(format!(
                "speed must be between {} and {}, got {}",
                self.config.min_speed, self.config.max_speed, request.speed
            )));
        }

        tracing::debug!(
            text_len = request.text.len(),
            language = %request.language,
            speed = request.speed,
            "FakeSpeechClient: estimating timings"
        );

        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }

        let timings = TimingTable::from_raw(Self::estimate_timings(&request.text, request.speed))?;
        let audio_id = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();

        Ok(SpeechResponse {
            audio_url: format!(
                "{}/audio/{}.mp3",
                self.config.base_url.trim_end_matches('/'),
                audio_id
            ),
            audio_id: Some(audio_id),
            timings,
        })
    }
}
