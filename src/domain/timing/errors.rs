//! Timing Context - Errors

use thiserror::Error;

/// 时间表校验错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimingError {
    #[error("word #{index}: timing values must be finite")]
    NonFinite { index: usize },

    #[error("word #{index}: negative start_ms {start_ms}")]
    NegativeStart { index: usize, start_ms: f64 },

    #[error("word #{index}: missing end_ms and duration_ms")]
    MissingEnd { index: usize },

    #[error("word #{index}: zero-width interval at {start_ms}ms")]
    ZeroWidth { index: usize, start_ms: f64 },

    #[error("word #{index}: start_ms {start_ms} is after end_ms {end_ms}")]
    Inverted {
        index: usize,
        start_ms: f64,
        end_ms: f64,
    },

    #[error("word #{index}: start_ms {start_ms} precedes previous start_ms {previous_start_ms}")]
    OutOfOrder {
        index: usize,
        start_ms: f64,
        previous_start_ms: f64,
    },

    #[error("word #{index}: start_ms {start_ms} overlaps previous end_ms {previous_end_ms}")]
    Overlap {
        index: usize,
        start_ms: f64,
        previous_end_ms: f64,
    },

    #[error("word at position {expected} carries index {found}")]
    IndexMismatch { expected: usize, found: usize },

    #[error("invalid timing payload: {0}")]
    InvalidPayload(String),
}
