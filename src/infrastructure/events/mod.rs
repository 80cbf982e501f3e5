//! Events - 播放事件推送
//!
//! 每个播放器一个 broadcast 通道，WebSocket 订阅后转发给客户端

mod publisher;

pub use publisher::{EventPublisher, PlaybackEvent};
