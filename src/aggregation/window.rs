//! 窗口累加器

use crate::storage::record::BucketKind;
use chrono::{DateTime, Duration, Utc};

/// 单个聚合窗口的累加状态
#[derive(Debug, Clone, PartialEq)]
pub struct WindowAccumulator {
    /// 聚合粒度（hourly / daily）
    pub bucket_kind: BucketKind,

    /// 窗口长度
    pub window_len: Duration,

    /// 窗口开始时刻（进程启动或上次滚动）
    pub window_start: DateTime<Utc>,

    /// 读数累加和
    pub sum: f64,

    /// 读数个数
    pub count: u64,
}

impl WindowAccumulator {
    pub fn new(bucket_kind: BucketKind, window_len: Duration, window_start: DateTime<Utc>) -> Self {
        Self {
            bucket_kind,
            window_len,
            window_start,
            sum: 0.0,
            count: 0,
        }
    }

    /// 累加一条读数
    #[inline]
    pub fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    /// 当前窗口是否已到期（时钟回拨时返回 false）
    #[inline]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now - self.window_start >= self.window_len
    }

    pub fn average(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }

    /// 重置累加器，新窗口从 `now` 开始
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.window_start = now;
        self.sum = 0.0;
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_accumulate_and_average() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut acc = WindowAccumulator::new(BucketKind::Hourly, Duration::hours(1), start);
        assert_eq!(acc.average(), None);

        acc.add(10.0);
        acc.add(20.0);
        acc.add(30.0);
        assert_eq!(acc.count, 3);
        assert!((acc.average().unwrap() - 20.0).abs() < 1e-9);

        acc.reset(start + Duration::hours(1));
        assert_eq!(acc.count, 0);
        assert_eq!(acc.sum, 0.0);
        assert_eq!(acc.window_start, start + Duration::hours(1));
    }

    #[test]
    fn test_is_due_uses_elapsed_time() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 17, 23).unwrap();
        let acc = WindowAccumulator::new(BucketKind::Hourly, Duration::hours(1), start);

        // 不按整点对齐：01:00:00 时尚未到期
        assert!(!acc.is_due(Utc.with_ymd_and_hms(2026, 1, 1, 1, 0, 0).unwrap()));
        assert!(!acc.is_due(start + Duration::minutes(59)));
        assert!(acc.is_due(start + Duration::hours(1)));
        // 时钟回拨
        assert!(!acc.is_due(start - Duration::hours(5)));
    }
}
