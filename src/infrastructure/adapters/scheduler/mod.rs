//! Scheduler Adapter - 帧调度实现

mod interval_scheduler;

pub use interval_scheduler::{IntervalFrameScheduler, DEFAULT_FRAME_INTERVAL_MS};
