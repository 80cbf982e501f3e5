//! Data Transfer Objects

use serde::{Deserialize, Serialize};

use crate::domain::playback::{PlaybackSnapshot, WordStatus};
use crate::domain::timing::WordInterval;

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// 空数据响应
#[derive(Debug, Serialize)]
pub struct Empty {}

impl ApiResponse<Empty> {
    /// 成功但无数据
    pub fn ok() -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(Empty {}),
        }
    }
}

// ============================================================================
// Player DTOs
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct CreatePlayerRequest {
    /// 客户端指定的 ID，缺省时生成 UUID
    #[serde(default)]
    pub player_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatePlayerResponse {
    pub player_id: String,
    pub state: String,
}

/// 只携带 player_id 的请求（play / pause / stop / state / words / close）
#[derive(Debug, Deserialize)]
pub struct PlayerRequest {
    pub player_id: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub player_id: String,
    pub text: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub speed: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct WordTimingDto {
    pub index: usize,
    pub word: String,
    pub start_ms: f64,
    pub end_ms: f64,
    pub duration_ms: f64,
}

impl From<&WordInterval> for WordTimingDto {
    fn from(w: &WordInterval) -> Self {
        Self {
            index: w.index,
            word: w.word.clone(),
            start_ms: w.start_ms,
            end_ms: w.end_ms,
            duration_ms: w.duration_ms,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub player_id: String,
    pub session_id: Option<u64>,
    pub audio_url: Option<String>,
    pub language: String,
    pub total_words: usize,
    pub duration_ms: f64,
    pub word_timings: Vec<WordTimingDto>,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    pub player_id: String,
    pub time_ms: f64,
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub player_id: String,
    pub rate: f64,
}

#[derive(Debug, Serialize)]
pub struct PlayerStateResponse {
    pub player_id: String,
    #[serde(flatten)]
    pub snapshot: PlaybackSnapshot,
}

#[derive(Debug, Serialize)]
pub struct WordsResponse {
    pub player_id: String,
    pub words: Vec<WordStatus>,
    pub html: String,
}
