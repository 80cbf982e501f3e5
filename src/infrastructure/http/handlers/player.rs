//! Player Handlers
//!
//! 每个请求都携带 player_id，先在注册表中找到对应的同步器再执行操作

use axum::{extract::State, Json};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::PlaybackSynchronizer;
use crate::infrastructure::http::dto::{
    ApiResponse, CreatePlayerRequest, CreatePlayerResponse, Empty, GenerateRequest,
    GenerateResponse, PlayerRequest, PlayerStateResponse, RateRequest, SeekRequest,
    WordTimingDto, WordsResponse,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// 查找播放器并刷新活动时间
fn player(state: &AppState, player_id: &str) -> Result<Arc<PlaybackSynchronizer>, ApiError> {
    let player = state.registry.get(player_id)?;
    state.registry.touch(player_id);
    Ok(player)
}

fn state_response(player: &PlaybackSynchronizer) -> Json<ApiResponse<PlayerStateResponse>> {
    Json(ApiResponse::success(PlayerStateResponse {
        player_id: player.player_id().to_string(),
        snapshot: player.snapshot(),
    }))
}

// ============================================================================
// Lifecycle
// ============================================================================

pub async fn create_player(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePlayerRequest>,
) -> ApiResult<CreatePlayerResponse> {
    let player_id = match req.player_id {
        Some(id) if id.trim().is_empty() => {
            return Err(ApiError::BadRequest("player_id must not be empty".to_string()))
        }
        Some(id) => id,
        None => Uuid::new_v4().to_string(),
    };

    let player = Arc::new(PlaybackSynchronizer::new(player_id, state.deps.clone()));
    let player_id = state.registry.create(player.clone())?;

    Ok(Json(ApiResponse::success(CreatePlayerResponse {
        player_id,
        state: player.state().to_string(),
    })))
}

pub async fn close_player(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlayerRequest>,
) -> ApiResult<Empty> {
    state.registry.close(&req.player_id)?;
    Ok(Json(ApiResponse::ok()))
}

// ============================================================================
// Generate
// ============================================================================

pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> ApiResult<GenerateResponse> {
    let config = &state.playback;
    let language = req
        .language
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| config.default_language.clone());
    let speed = req.speed.unwrap_or(config.default_speed);

    if !(config.min_speed..=config.max_speed).contains(&speed) {
        return Err(ApiError::BadRequest(format!(
            "speed must be between {} and {}, got {}",
            config.min_speed, config.max_speed, speed
        )));
    }
    let text_chars = req.text.chars().count();
    if text_chars > config.max_text_chars {
        return Err(ApiError::BadRequest(format!(
            "text too long: {} chars (max {})",
            text_chars, config.max_text_chars
        )));
    }

    let player = player(&state, &req.player_id)?;
    let timings = player.generate_speech(&req.text, &language, speed).await?;
    let snapshot = player.snapshot();

    Ok(Json(ApiResponse::success(GenerateResponse {
        player_id: req.player_id,
        session_id: snapshot.session_id,
        audio_url: snapshot.audio_url,
        language,
        total_words: timings.len(),
        duration_ms: snapshot.total_duration_ms,
        word_timings: timings.iter().map(WordTimingDto::from).collect(),
    })))
}

// ============================================================================
// Transport controls
// ============================================================================

pub async fn play(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlayerRequest>,
) -> ApiResult<PlayerStateResponse> {
    let player = player(&state, &req.player_id)?;
    player.play()?;
    Ok(state_response(&player))
}

pub async fn pause(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlayerRequest>,
) -> ApiResult<PlayerStateResponse> {
    let player = player(&state, &req.player_id)?;
    player.pause()?;
    Ok(state_response(&player))
}

pub async fn stop(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlayerRequest>,
) -> ApiResult<PlayerStateResponse> {
    let player = player(&state, &req.player_id)?;
    player.stop()?;
    Ok(state_response(&player))
}

pub async fn seek(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SeekRequest>,
) -> ApiResult<PlayerStateResponse> {
    let player = player(&state, &req.player_id)?;
    player.seek(req.time_ms)?;
    Ok(state_response(&player))
}

pub async fn set_rate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RateRequest>,
) -> ApiResult<PlayerStateResponse> {
    let player = player(&state, &req.player_id)?;
    player.set_playback_rate(req.rate)?;
    Ok(state_response(&player))
}

// ============================================================================
// Queries
// ============================================================================

pub async fn get_state(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlayerRequest>,
) -> ApiResult<PlayerStateResponse> {
    let player = player(&state, &req.player_id)?;
    Ok(state_response(&player))
}

pub async fn get_words(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlayerRequest>,
) -> ApiResult<WordsResponse> {
    let player = player(&state, &req.player_id)?;
    Ok(Json(ApiResponse::success(WordsResponse {
        player_id: req.player_id,
        words: player.words_with_status(),
        html: player.highlighted_html(),
    })))
}
