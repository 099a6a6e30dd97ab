//! 小时/日聚合器
//!
//! 两个窗口各自独立滚动：
//! - `record()` 每条原始读数同时累加到两个窗口
//! - `tick()` 由墙钟驱动（不依赖读数到达），已到期的窗口产出一条均值并重置
//! - 空窗口不产出记录，但同样重置窗口起点

use crate::aggregation::window::WindowAccumulator;
use crate::storage::record::BucketKind;
use crate::utils::config::AggregationConfig;
use crate::Result;
use chrono::{DateTime, Duration, Utc};

/// 已完成窗口的聚合结果
#[derive(Debug, Clone, PartialEq)]
pub struct WindowAggregate {
    pub bucket_kind: BucketKind,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    /// 窗口内读数均值
    pub average: f64,
    /// 窗口内读数个数
    pub count: u64,
}

/// 聚合器
pub struct Aggregator {
    hourly: WindowAccumulator,
    daily: WindowAccumulator,
}

impl Aggregator {
    /// 默认窗口：1 小时 / 24 小时
    pub fn new(start: DateTime<Utc>) -> Self {
        Self::with_windows(start, Duration::hours(1), Duration::hours(24))
    }

    pub fn with_windows(start: DateTime<Utc>, hourly_len: Duration, daily_len: Duration) -> Self {
        Self {
            hourly: WindowAccumulator::new(BucketKind::Hourly, hourly_len, start),
            daily: WindowAccumulator::new(BucketKind::Daily, daily_len, start),
        }
    }

    /// 窗口长度必须为正（先校验，越界返回 `ConfigError`）
    pub fn from_config(start: DateTime<Utc>, config: &AggregationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_windows(
            start,
            Duration::seconds(config.hourly_window_secs),
            Duration::seconds(config.daily_window_secs),
        ))
    }

    /// 累加一条原始读数
    pub fn record(&mut self, value: f64) {
        self.hourly.add(value);
        self.daily.add(value);
    }

    /// 检查窗口边界，返回本次完成的聚合
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<WindowAggregate> {
        let mut finished = Vec::new();

        for acc in [&mut self.hourly, &mut self.daily] {
            if !acc.is_due(now) {
                continue;
            }

            match acc.average() {
                Some(average) => finished.push(WindowAggregate {
                    bucket_kind: acc.bucket_kind,
                    window_start: acc.window_start,
                    window_end: now,
                    average,
                    count: acc.count,
                }),
                None => {
                    log::debug!(
                        "{} window starting {} closed without readings",
                        acc.bucket_kind,
                        acc.window_start
                    );
                }
            }

            acc.reset(now);
        }

        finished
    }

    /// 当前窗口状态（未完成）
    pub fn window(&self, kind: BucketKind) -> Option<&WindowAccumulator> {
        match kind {
            BucketKind::Hourly => Some(&self.hourly),
            BucketKind::Daily => Some(&self.daily),
            BucketKind::Raw => None,
        }
    }
}
