//! Timing Context - TimingTable
//!
//! 一次合成结果对应的词时间表：构建时整体校验，之后只读。

use serde::Serialize;

use super::{RawWordTiming, TimingError, WordInterval};

/// 词时间表
///
/// 不变量:
/// - 按 `start_ms` 升序，区间互不重叠（允许间隙）
/// - 每个区间 `start_ms < end_ms`，且均为有限非负值
/// - `intervals[i].index == i`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TimingTable {
    intervals: Vec<WordInterval>,
}

impl TimingTable {
    /// 空表，查找始终返回 None
    pub fn empty() -> Self {
        Self::default()
    }

    /// 从已成形的区间构建并校验
    pub fn new(intervals: Vec<WordInterval>) -> Result<Self, TimingError> {
        let mut previous: Option<&WordInterval> = None;
        for (position, interval) in intervals.iter().enumerate() {
            if interval.index != position {
                return Err(TimingError::IndexMismatch {
                    expected: position,
                    found: interval.index,
                });
            }
            check_interval(position, interval.start_ms, interval.end_ms)?;

            if let Some(prev) = previous {
                if interval.start_ms < prev.start_ms {
                    return Err(TimingError::OutOfOrder {
                        index: position,
                        start_ms: interval.start_ms,
                        previous_start_ms: prev.start_ms,
                    });
                }
                if interval.start_ms < prev.end_ms {
                    return Err(TimingError::Overlap {
                        index: position,
                        start_ms: interval.start_ms,
                        previous_end_ms: prev.end_ms,
                    });
                }
            }
            previous = Some(interval);
        }

        let intervals = intervals
            .into_iter()
            .map(|mut w| {
                w.duration_ms = w.end_ms - w.start_ms;
                w
            })
            .collect();

        Ok(Self { intervals })
    }

    /// 从 TTS 服务的原始载荷构建
    pub fn from_raw(raw: Vec<RawWordTiming>) -> Result<Self, TimingError> {
        let mut intervals = Vec::with_capacity(raw.len());
        for (position, timing) in raw.into_iter().enumerate() {
            if let Some(found) = timing.index {
                if found != position {
                    return Err(TimingError::IndexMismatch {
                        expected: position,
                        found,
                    });
                }
            }
            let end_ms = timing
                .end_ms
                .or_else(|| timing.duration_ms.map(|d| timing.start_ms + d))
                .ok_or(TimingError::MissingEnd { index: position })?;
            intervals.push(WordInterval::new(
                timing.word,
                timing.start_ms,
                end_ms,
                position,
            ));
        }
        Self::new(intervals)
    }

    /// 从未经类型检查的 JSON 构建（`word_timings` 字段）
    pub fn from_json(value: serde_json::Value) -> Result<Self, TimingError> {
        let raw: Vec<RawWordTiming> = serde_json::from_value(value)
            .map_err(|e| TimingError::InvalidPayload(e.to_string()))?;
        Self::from_raw(raw)
    }

    /// 查找包含 `position_ms` 的区间索引
    ///
    /// 二分查找最后一个 `start_ms <= position_ms` 的区间，再检查半开右端。
    /// 位于间隙、首词之前、末词结束及之后、负数或 NaN 时返回 None。
    pub fn lookup(&self, position_ms: f64) -> Option<usize> {
        if position_ms.is_nan() {
            return None;
        }
        let after = self
            .intervals
            .partition_point(|w| w.start_ms <= position_ms);
        let candidate = after.checked_sub(1)?;
        self.intervals[candidate]
            .contains(position_ms)
            .then_some(candidate)
    }

    pub fn get(&self, index: usize) -> Option<&WordInterval> {
        self.intervals.get(index)
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WordInterval> {
        self.intervals.iter()
    }

    /// 末词结束时间，空表为 0
    pub fn total_duration_ms(&self) -> f64 {
        self.intervals.last().map(|w| w.end_ms).unwrap_or(0.0)
    }
}

fn check_interval(index: usize, start_ms: f64, end_ms: f64) -> Result<(), TimingError> {
    if !start_ms.is_finite() || !end_ms.is_finite() {
        return Err(TimingError::NonFinite { index });
    }
    if start_ms < 0.0 {
        return Err(TimingError::NegativeStart { index, start_ms });
    }
    if start_ms == end_ms {
        return Err(TimingError::ZeroWidth { index, start_ms });
    }
    if start_ms > end_ms {
        return Err(TimingError::Inverted {
            index,
            start_ms,
            end_ms,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hi_there() -> TimingTable {
        TimingTable::from_raw(vec![
            RawWordTiming::new("Hi", 0.0, 500.0),
            RawWordTiming::new("there", 600.0, 1000.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_lookup_hi_there_example() {
        let table = hi_there();
        assert_eq!(table.lookup(550.0), None);
        assert_eq!(table.lookup(0.0), Some(0));
        assert_eq!(table.lookup(600.0), Some(1));
        assert_eq!(table.lookup(1000.0), None);
    }

    #[test]
    fn test_lookup_half_open_boundaries() {
        let table = TimingTable::from_raw(vec![
            RawWordTiming::new("one", 100.0, 200.0),
            RawWordTiming::new("two", 200.0, 300.0),
            RawWordTiming::new("three", 300.0, 450.5),
        ])
        .unwrap();

        assert_eq!(table.lookup(99.999), None);
        assert_eq!(table.lookup(100.0), Some(0));
        assert_eq!(table.lookup(199.9), Some(0));
        // 右端点归下一个区间
        assert_eq!(table.lookup(200.0), Some(1));
        assert_eq!(table.lookup(300.0), Some(2));
        assert_eq!(table.lookup(450.4), Some(2));
        assert_eq!(table.lookup(450.5), None);
    }

    #[test]
    fn test_lookup_degenerate_positions() {
        let table = hi_there();
        assert_eq!(table.lookup(-1.0), None);
        assert_eq!(table.lookup(f64::NAN), None);
        assert_eq!(table.lookup(f64::INFINITY), None);
        assert_eq!(TimingTable::empty().lookup(0.0), None);
        assert_eq!(TimingTable::empty().lookup(123.0), None);
    }

    #[test]
    fn test_lookup_is_stable_and_monotonic() {
        let words: Vec<RawWordTiming> = (0..500)
            .map(|i| {
                let start = i as f64 * 120.0;
                RawWordTiming::new(format!("w{}", i), start, start + 90.0)
            })
            .collect();
        let table = TimingTable::from_raw(words).unwrap();

        let mut last: Option<usize> = None;
        let mut position = 0.0;
        while position < table.total_duration_ms() + 50.0 {
            let found = table.lookup(position);
            assert_eq!(found, table.lookup(position));
            if let Some(index) = found {
                assert!(table.get(index).unwrap().contains(position));
                if let Some(prev) = last {
                    assert!(prev <= index);
                }
                last = Some(index);
            }
            position += 7.5;
        }
        assert_eq!(last, Some(499));
    }

    #[test]
    fn test_from_raw_derives_end_and_duration() {
        let table = TimingTable::from_raw(vec![RawWordTiming {
            word: "Hola".to_string(),
            start_ms: 50.0,
            end_ms: None,
            duration_ms: Some(325.0),
            index: None,
        }])
        .unwrap();

        let word = table.get(0).unwrap();
        assert_eq!(word.end_ms, 375.0);
        assert_eq!(word.duration_ms, 325.0);
        assert_eq!(word.index, 0);
        assert_eq!(table.total_duration_ms(), 375.0);
    }

    #[test]
    fn test_inverted_interval_rejected() {
        let err = TimingTable::from_raw(vec![
            RawWordTiming::new("ok", 0.0, 100.0),
            RawWordTiming::new("bad", 400.0, 300.0),
        ])
        .unwrap_err();
        assert!(matches!(err, TimingError::Inverted { index: 1, .. }));
    }

    #[test]
    fn test_zero_width_rejected() {
        let err = TimingTable::from_raw(vec![RawWordTiming::new("x", 10.0, 10.0)]).unwrap_err();
        assert!(matches!(err, TimingError::ZeroWidth { index: 0, .. }));
    }

    #[test]
    fn test_overlap_and_order_rejected() {
        let overlap = TimingTable::from_raw(vec![
            RawWordTiming::new("a", 0.0, 300.0),
            RawWordTiming::new("b", 250.0, 400.0),
        ])
        .unwrap_err();
        assert!(matches!(overlap, TimingError::Overlap { index: 1, .. }));

        let unordered = TimingTable::from_raw(vec![
            RawWordTiming::new("a", 500.0, 600.0),
            RawWordTiming::new("b", 100.0, 200.0),
        ])
        .unwrap_err();
        assert!(matches!(unordered, TimingError::OutOfOrder { index: 1, .. }));
    }

    #[test]
    fn test_index_mismatch_and_missing_end_rejected() {
        let mut raw = RawWordTiming::new("a", 0.0, 100.0);
        raw.index = Some(3);
        assert_eq!(
            TimingTable::from_raw(vec![raw]).unwrap_err(),
            TimingError::IndexMismatch {
                expected: 0,
                found: 3
            }
        );

        let missing = RawWordTiming {
            word: "a".to_string(),
            start_ms: 0.0,
            end_ms: None,
            duration_ms: None,
            index: None,
        };
        assert_eq!(
            TimingTable::from_raw(vec![missing]).unwrap_err(),
            TimingError::MissingEnd { index: 0 }
        );
    }

    #[test]
    fn test_negative_start_rejected() {
        let err = TimingTable::from_raw(vec![RawWordTiming::new("a", -5.0, 100.0)]).unwrap_err();
        assert!(matches!(err, TimingError::NegativeStart { index: 0, .. }));
    }

    #[test]
    fn test_from_json_rejects_loose_types() {
        let err = TimingTable::from_json(json!([{ "word": "a", "start_ms": "zero" }])).unwrap_err();
        assert!(matches!(err, TimingError::InvalidPayload(_)));

        let err = TimingTable::from_json(json!({ "word": "a" })).unwrap_err();
        assert!(matches!(err, TimingError::InvalidPayload(_)));

        let table = TimingTable::from_json(json!([
            { "word": "Hi", "start_ms": 0.0, "duration_ms": 500.0, "end_ms": 500.0 },
            { "word": "there", "start_ms": 600, "duration_ms": 400 }
        ]))
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1).unwrap().end_ms, 1000.0);
    }
}
