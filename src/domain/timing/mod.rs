//! Timing Context - 词级时间轴
//!
//! 职责:
//! - WordInterval 值对象与边界载荷（RawWordTiming）
//! - TimingTable 构建校验
//! - 播放位置 → 词索引查找（二分）

mod errors;
mod interval;
mod table;

pub use errors::TimingError;
pub use interval::{RawWordTiming, WordInterval};
pub use table::TimingTable;
