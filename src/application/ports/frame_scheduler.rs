//! Frame Scheduler Port - 宿主帧调度抽象
//!
//! 高亮循环在两次采样之间把控制权交还宿主

use async_trait::async_trait;

#[async_trait]
pub trait FrameSchedulerPort: Send + Sync {
    /// 等待下一帧
    async fn next_frame(&self);
}
