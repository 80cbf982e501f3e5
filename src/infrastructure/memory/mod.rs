//! Memory Layer - In-Memory State Management
//!
//! 实现 PlayerRegistry，管理每个客户端播放器的内存状态

mod player_registry;

pub use player_registry::InMemoryPlayerRegistry;
