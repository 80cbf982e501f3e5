//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（SpeechSynthesis、AudioResource、FrameScheduler、PlayerRegistry）
//! - synchronizer: 播放与词高亮同步引擎
//! - error: 应用层错误定义

pub mod error;
pub mod ports;
pub mod synchronizer;

pub use error::PlaybackError;

pub use ports::{
    // Audio
    AudioBinderPort,
    AudioError,
    AudioResourcePort,
    // Scheduling
    FrameSchedulerPort,
    // Registry
    PlayerRegistryPort,
    RegistryError,
    // Speech synthesis
    SpeechRequest,
    SpeechResponse,
    SpeechSynthesisPort,
    SynthesisError,
};

pub use synchronizer::{PlaybackDeps, PlaybackSynchronizer};
