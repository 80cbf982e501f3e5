//! Playback Synchronizer - 播放/高亮同步引擎
//!
//! - engine: 生命周期操作与只读访问
//! - session: PlaybackSession 与共享状态
//! - highlight_loop: 播放中的位置采样循环

mod engine;
mod highlight_loop;
mod session;

pub use engine::{PlaybackDeps, PlaybackSynchronizer};
