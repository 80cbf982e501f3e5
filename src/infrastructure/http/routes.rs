//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping               GET   健康检查
//! - /api/player/create      POST  创建播放器
//! - /api/player/close       POST  关闭播放器
//! - /api/player/generate    POST  合成语音并载入时间表
//! - /api/player/play        POST  播放
//! - /api/player/pause       POST  暂停
//! - /api/player/stop        POST  停止（回到开头）
//! - /api/player/seek        POST  跳转（毫秒）
//! - /api/player/rate        POST  设置播放速率
//! - /api/player/state       POST  播放状态快照
//! - /api/player/words       POST  带高亮状态的词列表
//! - /ws/player/{id}         WS    播放器事件流

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/player/:player_id", get(handlers::player_websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/player", player_routes())
}

/// Player 路由
fn player_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create", post(handlers::create_player))
        .route("/close", post(handlers::close_player))
        .route("/generate", post(handlers::generate))
        .route("/play", post(handlers::play))
        .route("/pause", post(handlers::pause))
        .route("/stop", post(handlers::stop))
        .route("/seek", post(handlers::seek))
        .route("/rate", post(handlers::set_rate))
        .route("/state", post(handlers::get_state))
        .route("/words", post(handlers::get_words))
}
