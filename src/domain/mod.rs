//! Domain Layer - 领域层
//!
//! - timing: 词时间表（不可变，构建时校验）
//! - playback: 播放状态、快照与高亮视图

pub mod playback;
pub mod timing;
