//! Readaloud - TTS 朗读与逐词高亮同步服务
//!
//! 架构设计: DDD + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Timing Context: 词时间表与位置查找
//! - Playback Context: 播放状态与高亮视图
//!
//! 应用层 (application/):
//! - Ports: 端口定义（SpeechSynthesis, AudioResource, FrameScheduler, PlayerRegistry）
//! - Synchronizer: 播放状态机与高亮循环
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + WebSocket
//! - Memory: PlayerRegistry 内存实现
//! - Adapters: TTS Client, 虚拟音频时钟, 帧调度
//! - Events: WebSocket 事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
