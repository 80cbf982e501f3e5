//! Clock Audio Player - 虚拟播放时钟
//!
//! 服务端没有真实的音频输出，播放位置由单调时钟推算：
//! `position = base + elapsed × rate`，截断到总时长。
//! 语义与 HTML audio 元素一致：播放到结尾后 `play()` 从头开始。

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::application::ports::{AudioBinderPort, AudioError, AudioResourcePort};
use crate::domain::timing::TimingTable;

struct ClockState {
    /// 最近一次开始播放的时刻，暂停时为 None
    anchor: Option<Instant>,
    /// anchor 时刻对应的媒体位置
    base_ms: f64,
    rate: f64,
    released: bool,
}

/// 虚拟时钟音频资源
pub struct ClockAudioResource {
    source: String,
    duration_ms: f64,
    state: Mutex<ClockState>,
}

impl ClockAudioResource {
    pub fn new(source: impl Into<String>, duration_ms: f64) -> Self {
        Self {
            source: source.into(),
            duration_ms: duration_ms.max(0.0),
            state: Mutex::new(ClockState {
                anchor: None,
                base_ms: 0.0,
                rate: 1.0,
                released: false,
            }),
        }
    }

    fn position_locked(&self, state: &ClockState) -> f64 {
        let position = match state.anchor {
            Some(anchor) => {
                state.base_ms + anchor.elapsed().as_nanos() as f64 / 1_000_000.0 * state.rate
            }
            None => state.base_ms,
        };
        position.clamp(0.0, self.duration_ms)
    }
}

impl AudioResourcePort for ClockAudioResource {
    fn source(&self) -> &str {
        &self.source
    }

    fn play(&self) -> Result<(), AudioError> {
        let mut state = self.state.lock();
        if state.released {
            return Err(AudioError::Released);
        }
        if state.anchor.is_some() && self.position_locked(&state) < self.duration_ms {
            return Ok(());
        }
        if self.position_locked(&state) >= self.duration_ms {
            state.base_ms = 0.0;
        }
        state.anchor = Some(Instant::now());
        Ok(())
    }

    fn pause(&self) {
        let mut state = self.state.lock();
        if state.anchor.is_some() {
            state.base_ms = self.position_locked(&state);
            state.anchor = None;
        }
    }

    fn position_ms(&self) -> f64 {
        let state = self.state.lock();
        self.position_locked(&state)
    }

    fn set_position_ms(&self, position_ms: f64) {
        let mut state = self.state.lock();
        state.base_ms = position_ms.clamp(0.0, self.duration_ms);
        if state.anchor.is_some() {
            state.anchor = Some(Instant::now());
        }
    }

    fn playback_rate(&self) -> f64 {
        self.state.lock().rate
    }

    fn set_playback_rate(&self, rate: f64) -> Result<(), AudioError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(AudioError::InvalidRate(rate));
        }
        let mut state = self.state.lock();
        // 以当前位置为新起点，避免已播放部分按新速率重算
        if state.anchor.is_some() {
            state.base_ms = self.position_locked(&state);
            state.anchor = Some(Instant::now());
        }
        state.rate = rate;
        Ok(())
    }

    fn duration_ms(&self) -> Option<f64> {
        Some(self.duration_ms)
    }

    fn is_ended(&self) -> bool {
        let state = self.state.lock();
        state.anchor.is_some() && self.position_locked(&state) >= self.duration_ms
    }

    fn is_paused(&self) -> bool {
        let state = self.state.lock();
        state.anchor.is_none() || self.position_locked(&state) >= self.duration_ms
    }

    fn release(&self) {
        let mut state = self.state.lock();
        state.anchor = None;
        state.released = true;
    }
}

/// 为每次生成绑定一个新的虚拟时钟资源
#[derive(Debug, Clone, Default)]
pub struct ClockAudioBinder {
    /// 末词之后保留的静音时长（毫秒）
    tail_padding_ms: f64,
}

impl ClockAudioBinder {
    pub fn new(tail_padding_ms: f64) -> Self {
        Self {
            tail_padding_ms: tail_padding_ms.max(0.0),
        }
    }
}

#[async_trait]
impl AudioBinderPort for ClockAudioBinder {
    async fn bind(
        &self,
        audio_url: &str,
        timings: &TimingTable,
    ) -> Result<Arc<dyn AudioResourcePort>, AudioError> {
        if audio_url.trim().is_empty() {
            return Err(AudioError::LoadFailed {
                url: audio_url.to_string(),
                reason: "empty audio url".to_string(),
            });
        }

        let duration_ms = timings.total_duration_ms() + self.tail_padding_ms;
        tracing::debug!(
            audio_url = %audio_url,
            duration_ms = duration_ms,
            "Audio resource bound"
        );
        Ok(Arc::new(ClockAudioResource::new(audio_url, duration_ms)))
    }
}
