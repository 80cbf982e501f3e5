//! Application State

use std::sync::Arc;

use crate::application::{PlaybackDeps, PlayerRegistryPort};
use crate::config::PlaybackConfig;
use crate::infrastructure::events::EventPublisher;

/// 应用状态
///
/// 每个播放器共享同一组端口实现（PlaybackDeps）
pub struct AppState {
    pub registry: Arc<dyn PlayerRegistryPort>,
    pub deps: PlaybackDeps,
    pub event_publisher: Arc<EventPublisher>,
    pub playback: PlaybackConfig,
}

impl AppState {
    pub fn new(
        registry: Arc<dyn PlayerRegistryPort>,
        deps: PlaybackDeps,
        playback: PlaybackConfig,
    ) -> Self {
        Self {
            registry,
            event_publisher: deps.events.clone(),
            deps,
            playback,
        }
    }
}
