//! Playback Context - 播放状态
//!
//! 职责:
//! - 播放生命周期状态机的状态定义
//! - 对外只读快照与高亮视图

mod highlight;
mod state;

pub use highlight::{render_highlighted_html, words_with_status, WordStatus};
pub use state::{Cursor, PlaybackSnapshot, PlaybackState};
