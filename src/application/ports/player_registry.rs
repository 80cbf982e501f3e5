//! Player Registry Port - 播放器生命周期管理
//!
//! 每个客户端持有一个独立的 PlaybackSynchronizer，具体实现在 infrastructure/memory 层

use std::sync::Arc;

use thiserror::Error;

use crate::application::synchronizer::PlaybackSynchronizer;

/// Player Registry 错误
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Player not found: {0}")]
    NotFound(String),

    #[error("Player already exists: {0}")]
    AlreadyExists(String),
}

/// Player Registry Port
pub trait PlayerRegistryPort: Send + Sync {
    /// 注册播放器，返回其 ID
    fn create(&self, player: Arc<PlaybackSynchronizer>) -> Result<String, RegistryError>;

    /// 获取播放器
    fn get(&self, id: &str) -> Result<Arc<PlaybackSynchronizer>, RegistryError>;

    /// 检查播放器是否存在
    fn is_valid(&self, id: &str) -> bool;

    /// 关闭播放器并释放其音频资源
    fn close(&self, id: &str) -> Result<(), RegistryError>;

    /// 更新最后活动时间
    fn touch(&self, id: &str);

    /// 获取空闲超时的播放器 ID
    fn get_idle_players(&self, idle_timeout_secs: u64) -> Vec<String>;

    /// 获取所有播放器 ID
    fn list_all(&self) -> Vec<String>;
}
