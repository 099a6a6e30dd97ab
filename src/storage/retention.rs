//! 保留期清理
//!
//! 每个采集周期对 raw / hourly / daily 各执行一次过期删除。
//! 删除失败只记录日志，不会中断采集循环。

use crate::storage::record::BucketKind;
use crate::storage::sqlite::SensorStore;
use crate::utils::config::RetentionConfig;
use crate::Result;
use chrono::Duration;

/// 各桶类型的最大保留时长（启动后只读）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub raw: Duration,
    pub hourly: Duration,
    pub daily: Duration,
}

impl RetentionPolicy {
    /// 先校验取值范围，越界返回 `ConfigError`
    pub fn from_config(config: &RetentionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            raw: Duration::hours(config.raw_max_age_hours),
            hourly: Duration::days(config.hourly_max_age_days),
            daily: Duration::days(config.daily_max_age_days),
        })
    }

    pub fn max_age(&self, kind: BucketKind) -> Duration {
        match kind {
            BucketKind::Raw => self.raw,
            BucketKind::Hourly => self.hourly,
            BucketKind::Daily => self.daily,
        }
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            raw: Duration::hours(24),
            hourly: Duration::days(30),
            daily: Duration::days(365),
        }
    }
}

/// 单次清理结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionReport {
    /// (桶类型, 删除行数)
    pub deleted: Vec<(BucketKind, usize)>,
    /// 失败的桶类型
    pub failed: Vec<BucketKind>,
}

impl RetentionReport {
    pub fn total_deleted(&self) -> usize {
        self.deleted.iter().map(|(_, n)| n).sum()
    }
}

/// 保留期管理器（无状态）
#[derive(Debug, Clone, Default)]
pub struct RetentionManager {
    policy: RetentionPolicy,
}

impl RetentionManager {
    pub fn new(policy: RetentionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    /// 对所有桶类型执行一次过期删除
    pub fn sweep(&self, store: &SensorStore) -> RetentionReport {
        let mut report = RetentionReport::default();

        for kind in BucketKind::ALL {
            match store.delete_expired(kind, self.policy.max_age(kind)) {
                Ok(count) => {
                    if count > 0 {
                        log::debug!("Retention removed {} {} rows", count, kind);
                    }
                    report.deleted.push((kind, count));
                }
                Err(e) => {
                    log::error!("Retention sweep for {} failed: {}", kind, e);
                    report.failed.push(kind);
                }
            }
        }

        report
    }
}
