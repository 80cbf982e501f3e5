//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_resource;
mod frame_scheduler;
mod player_registry;
mod speech_synthesis;

pub use audio_resource::{AudioBinderPort, AudioError, AudioResourcePort};
pub use frame_scheduler::FrameSchedulerPort;
pub use player_registry::{PlayerRegistryPort, RegistryError};
pub use speech_synthesis::{SpeechRequest, SpeechResponse, SpeechSynthesisPort, SynthesisError};
