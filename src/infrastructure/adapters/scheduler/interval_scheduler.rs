//! Interval Frame Scheduler - 固定间隔帧调度

use async_trait::async_trait;
use std::time::Duration;

use crate::application::ports::FrameSchedulerPort;

/// 默认帧间隔（约 60fps）
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;

/// 每帧休眠固定间隔
#[derive(Debug, Clone)]
pub struct IntervalFrameScheduler {
    interval: Duration,
}

impl IntervalFrameScheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms.max(1)))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for IntervalFrameScheduler {
    fn default() -> Self {
        Self::from_millis(DEFAULT_FRAME_INTERVAL_MS)
    }
}

#[async_trait]
impl FrameSchedulerPort for IntervalFrameScheduler {
    async fn next_frame(&self) {
        tokio::time::sleep(self.interval).await;
    }
}
