//! Timing Context - Value Objects

use serde::{Deserialize, Serialize};

/// 单词在音频时间轴上的半开区间 `[start_ms, end_ms)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordInterval {
    pub word: String,
    pub start_ms: f64,
    pub end_ms: f64,
    pub duration_ms: f64,
    /// 在时间表中的位置，表生命周期内不变
    pub index: usize,
}

impl WordInterval {
    pub fn new(word: impl Into<String>, start_ms: f64, end_ms: f64, index: usize) -> Self {
        Self {
            word: word.into(),
            start_ms,
            end_ms,
            duration_ms: end_ms - start_ms,
            index,
        }
    }

    /// 位置是否落在区间内（半开）
    #[inline]
    pub fn contains(&self, position_ms: f64) -> bool {
        position_ms >= self.start_ms && position_ms < self.end_ms
    }
}

/// TTS 服务返回的原始词时间（宽松结构）
///
/// `end_ms` 缺失时由 `start_ms + duration_ms` 推出；`index` 可选，
/// 出现时必须与位置一致。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawWordTiming {
    pub word: String,
    pub start_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl RawWordTiming {
    pub fn new(word: impl Into<String>, start_ms: f64, end_ms: f64) -> Self {
        Self {
            word: word.into(),
            start_ms,
            end_ms: Some(end_ms),
            duration_ms: Some(end_ms - start_ms),
            index: None,
        }
    }
}
