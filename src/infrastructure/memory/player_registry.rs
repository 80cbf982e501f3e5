//! In-Memory Player Registry Implementation

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::application::ports::{PlayerRegistryPort, RegistryError};
use crate::application::synchronizer::PlaybackSynchronizer;
use crate::infrastructure::events::EventPublisher;

struct PlayerEntry {
    player: Arc<PlaybackSynchronizer>,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
}

/// 内存播放器注册表
///
/// 注册时同时创建该播放器的事件通道，关闭时释放会话并注销通道
pub struct InMemoryPlayerRegistry {
    players: DashMap<String, PlayerEntry>,
    events: Arc<EventPublisher>,
}

impl InMemoryPlayerRegistry {
    pub fn new(events: Arc<EventPublisher>) -> Self {
        Self {
            players: DashMap::new(),
            events,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn count(&self) -> usize {
        self.players.len()
    }

    /// 播放器创建时间
    pub fn created_at(&self, id: &str) -> Option<DateTime<Utc>> {
        self.players.get(id).map(|e| e.created_at)
    }

    fn close_with_reason(&self, id: &str, reason: &str) -> Result<(), RegistryError> {
        let (_, entry) = self
            .players
            .remove(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        entry.player.shutdown(reason);
        self.events.unregister_player(id);
        tracing::info!(player_id = %id, reason = %reason, "Player closed");
        Ok(())
    }

    /// 关闭所有空闲超时的播放器，返回关闭数量
    pub fn close_idle(&self, idle_timeout_secs: u64) -> usize {
        self.get_idle_players(idle_timeout_secs)
            .iter()
            .filter(|id| self.close_with_reason(id, "idle timeout").is_ok())
            .count()
    }

    /// 启动后台空闲清理任务
    ///
    /// 返回的 Sender 发送 `true` 即停止任务
    pub fn start_cleanup_task(
        self: &Arc<Self>,
        cleanup_interval: Duration,
        idle_timeout_secs: u64,
    ) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let registry = Arc::clone(self);

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(cleanup_interval);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let closed = registry.close_idle(idle_timeout_secs);
                        if closed > 0 {
                            tracing::info!(
                                closed = closed,
                                remaining = registry.count(),
                                "Idle players cleaned up"
                            );
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("Player cleanup task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }
}

impl PlayerRegistryPort for InMemoryPlayerRegistry {
    fn create(&self, player: Arc<PlaybackSynchronizer>) -> Result<String, RegistryError> {
        let player_id = player.player_id().to_string();
        // 查重与插入在同一个分片锁内完成
        match self.players.entry(player_id.clone()) {
            Entry::Occupied(_) => return Err(RegistryError::AlreadyExists(player_id)),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                slot.insert(PlayerEntry {
                    player,
                    created_at: now,
                    last_activity: now,
                });
            }
        }
        self.events.register_player(&player_id);
        tracing::info!(player_id = %player_id, "Player created");
        Ok(player_id)
    }

    fn get(&self, id: &str) -> Result<Arc<PlaybackSynchronizer>, RegistryError> {
        self.players
            .get(id)
            .map(|e| e.player.clone())
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    fn is_valid(&self, id: &str) -> bool {
        self.players.contains_key(id)
    }

    fn close(&self, id: &str) -> Result<(), RegistryError> {
        self.close_with_reason(id, "closed by client")
    }

    fn touch(&self, id: &str) {
        if let Some(mut entry) = self.players.get_mut(id) {
            entry.last_activity = Utc::now();
        }
    }

    fn get_idle_players(&self, idle_timeout_secs: u64) -> Vec<String> {
        let now = Utc::now();
        let timeout = chrono::Duration::seconds(idle_timeout_secs as i64);

        self.players
            .iter()
            .filter_map(|entry| {
                let elapsed = now - entry.last_activity;
                if elapsed > timeout {
                    Some(entry.key().clone())
                } else {
                    None
                }
            })
            .collect()
    }

    fn list_all(&self) -> Vec<String> {
        self.players.iter().map(|e| e.key().clone()).collect()
    }
}
