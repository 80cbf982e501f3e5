//! Audio Adapter - 音频资源实现

mod clock_player;

pub use clock_player::{ClockAudioBinder, ClockAudioResource};
