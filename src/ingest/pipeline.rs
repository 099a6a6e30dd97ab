//! 采集流水线
//!
//! 每个周期：
//! 1. 解析读数（失败跳过，不推进任何累加器）
//! 2. 无条件写入 raw
//! 3. 累加到小时/日窗口，到期窗口写入均值
//! 4. 保留期清理
//!
//! 循环中的任何单次失败都只记录日志，不会终止循环。

use crate::aggregation::Aggregator;
use crate::ingest::transport::{SensorSource, TransportEvent};
use crate::storage::record::{BucketKind, Reading};
use crate::storage::retention::{RetentionManager, RetentionPolicy, RetentionReport};
use crate::storage::sqlite::SensorStore;
use crate::utils::clock::Clock;
use crate::utils::config::TemplogConfig;
use crate::{Result, TemplogError};
use std::sync::Arc;
use std::time::Duration;

/// 采集统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// 成功解析的读数
    pub readings: u64,
    pub parse_failures: u64,
    /// 写入失败（raw + 聚合）
    pub write_failures: u64,
    /// 已写入的聚合记录
    pub aggregates: u64,
    pub retention_deleted: u64,
    pub retention_failures: u64,
}

/// 采集流水线（独占 store）
pub struct IngestPipeline {
    store: SensorStore,
    aggregator: Aggregator,
    retention: RetentionManager,
    clock: Arc<dyn Clock>,
    stats: IngestStats,
}

impl IngestPipeline {
    pub fn new(
        store: SensorStore,
        aggregator: Aggregator,
        retention: RetentionManager,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            aggregator,
            retention,
            clock,
            stats: IngestStats::default(),
        }
    }

    /// 按配置构建，窗口起点为当前时刻
    pub fn from_config(store: SensorStore, config: &TemplogConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let aggregator = Aggregator::from_config(clock.now(), &config.aggregation)?;
        let retention = RetentionManager::new(RetentionPolicy::from_config(&config.retention)?);
        Ok(Self::new(store, aggregator, retention, clock))
    }

    /// 解析一行读数
    pub fn parse_payload(payload: &str) -> Result<f64> {
        let trimmed = payload.trim();
        let value: f64 = trimmed
            .parse()
            .map_err(|e| TemplogError::ParseFailure(format!("invalid reading {:?}: {}", trimmed, e)))?;

        if !value.is_finite() {
            return Err(TemplogError::ParseFailure(format!(
                "non-finite reading {:?}",
                trimmed
            )));
        }
        Ok(value)
    }

    /// 处理一条传感器数据，返回写入的 raw 记录
    pub fn process_payload(&mut self, payload: &str) -> Option<Reading> {
        let value = match Self::parse_payload(payload) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("Skipping reading: {}", e);
                self.stats.parse_failures += 1;
                return None;
            }
        };

        self.stats.readings += 1;
        log::info!("Temperature: {}", value);

        let reading = match self.store.insert(BucketKind::Raw, value) {
            Ok(reading) => Some(reading),
            Err(e) => {
                log::error!("{}", e);
                self.stats.write_failures += 1;
                None
            }
        };

        self.aggregator.record(value);
        self.tick();
        self.sweep();

        reading
    }

    /// 检查聚合窗口并写入到期的均值，返回写入条数
    pub fn tick(&mut self) -> usize {
        let mut written = 0;

        for aggregate in self.aggregator.tick(self.clock.now()) {
            match self.store.insert(aggregate.bucket_kind, aggregate.average) {
                Ok(_) => {
                    log::info!(
                        "📊 {} average {:.3} over {} readings ({} → {})",
                        aggregate.bucket_kind,
                        aggregate.average,
                        aggregate.count,
                        aggregate.window_start,
                        aggregate.window_end
                    );
                    self.stats.aggregates += 1;
                    written += 1;
                }
                Err(e) => {
                    // 窗口已重置，不会重复产出
                    log::error!("{}", e);
                    self.stats.write_failures += 1;
                }
            }
        }

        written
    }

    /// 执行一次保留期清理
    pub fn sweep(&mut self) -> RetentionReport {
        let report = self.retention.sweep(&self.store);
        self.stats.retention_deleted += report.total_deleted() as u64;
        self.stats.retention_failures += report.failed.len() as u64;
        report
    }

    /// 执行一个采集周期，数据流结束时返回 false
    pub fn run_cycle<S: SensorSource + ?Sized>(&mut self, source: &mut S, timeout: Duration) -> bool {
        match source.next_payload(timeout) {
            TransportEvent::Payload(payload) => {
                self.process_payload(&payload);
                true
            }
            TransportEvent::Idle => {
                self.tick();
                true
            }
            TransportEvent::Closed => false,
        }
    }

    /// 主循环：直到数据流结束
    pub fn run<S: SensorSource + ?Sized>(&mut self, source: &mut S, timeout: Duration) -> IngestStats {
        log::info!("Ingestion loop started (store: {})", self.store.location());

        while self.run_cycle(source, timeout) {}

        log::info!(
            "Transport closed: {} readings, {} aggregates, {} parse failures, {} write failures",
            self.stats.readings,
            self.stats.aggregates,
            self.stats.parse_failures,
            self.stats.write_failures
        );
        self.stats.clone()
    }

    pub fn store(&self) -> &SensorStore {
        &self.store
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }
}
