//! SQLite 读数存储
//!
//! 单表 `logs`，WAL 模式：采集进程写入的同时查询进程可以并发读取。
//!
//! 设计要点：
//! - 时间戳由存储时钟写入，不接受客户端提供
//! - 查询按时间戳倒序，时间戳相同时按 id 倒序
//! - 保留期删除必须真正执行（返回删除行数）

use crate::storage::record::{format_storage_time, parse_storage_time, BucketKind, QueryFilter, Reading};
use crate::utils::clock::Clock;
use crate::utils::config::StorageConfig;
use crate::{Result, TemplogError};
use chrono::Duration;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Arc;

const CREATE_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
        log_type TEXT,
        temperature REAL
    );
    CREATE INDEX IF NOT EXISTS idx_logs_type_time ON logs(log_type, timestamp);
    CREATE INDEX IF NOT EXISTS idx_logs_time ON logs(timestamp);
"#;

const INSERT_READING: &str =
    "INSERT INTO logs (timestamp, log_type, temperature) VALUES (?1, ?2, ?3)";

const SELECT_RANGE: &str = r#"
    SELECT id, timestamp, log_type, temperature
    FROM logs
    WHERE (?1 IS NULL OR log_type = ?1)
      AND timestamp BETWEEN ?2 AND ?3
    ORDER BY timestamp DESC, id DESC
    LIMIT ?4 OFFSET ?5
"#;

const SELECT_LATEST: &str = r#"
    SELECT id, timestamp, log_type, temperature
    FROM logs
    ORDER BY timestamp DESC, id DESC
    LIMIT 1
"#;

// 未来时间戳（时钟跳变/脏数据）同样视为过期
const DELETE_EXPIRED: &str =
    "DELETE FROM logs WHERE log_type = ?1 AND (timestamp < ?2 OR timestamp > ?3)";

/// 读数存储
pub struct SensorStore {
    conn: Connection,
    clock: Arc<dyn Clock>,
    location: String,
}

impl SensorStore {
    /// 打开（或创建）数据库文件并初始化表结构
    pub fn open(config: &StorageConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let conn = Connection::open(&config.db_path).map_err(|e| {
            TemplogError::StorageUnavailable(format!(
                "Failed to open database {}: {}",
                config.db_path, e
            ))
        })?;

        conn.busy_timeout(config.busy_timeout())
            .map_err(|e| TemplogError::StorageUnavailable(format!("Failed to set busy timeout: {}", e)))?;

        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .map_err(|e| TemplogError::StorageUnavailable(format!("Failed to set WAL mode: {}", e)))?;
        if !mode.eq_ignore_ascii_case("wal") {
            log::warn!("Database {} is running in {} journal mode", config.db_path, mode);
        }

        let store = Self {
            conn,
            clock,
            location: config.db_path.clone(),
        };
        store.initialize()?;
        Ok(store)
    }

    /// 内存数据库（测试用）
    pub fn open_in_memory(clock: Arc<dyn Clock>) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| TemplogError::StorageUnavailable(format!("Failed to open in-memory database: {}", e)))?;

        let store = Self {
            conn,
            clock,
            location: ":memory:".to_string(),
        };
        store.initialize()?;
        Ok(store)
    }

    /// 建表（幂等）
    pub fn initialize(&self) -> Result<()> {
        self.conn
            .execute_batch(CREATE_SCHEMA)
            .map_err(|e| TemplogError::StorageUnavailable(format!("Failed to create table: {}", e)))
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// 追加一条读数，时间戳取存储时钟
    pub fn insert(&self, bucket_kind: BucketKind, value: f64) -> Result<Reading> {
        let timestamp = self.clock.now();

        self.conn
            .execute(
                INSERT_READING,
                params![format_storage_time(&timestamp), bucket_kind.as_str(), value],
            )
            .map_err(|e| TemplogError::WriteFailed(format!("Failed to insert {} reading: {}", bucket_kind, e)))?;

        Ok(Reading {
            id: self.conn.last_insert_rowid(),
            timestamp,
            log_type: bucket_kind.as_str().to_string(),
            value,
        })
    }

    /// 范围查询（时间戳倒序，先跳过 offset 再取 limit 条）
    pub fn query(&self, filter: &QueryFilter) -> Result<Vec<Reading>> {
        let mut stmt = self
            .conn
            .prepare_cached(SELECT_RANGE)
            .map_err(|e| TemplogError::QueryFailed(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(
                params![
                    filter.bucket_kind.map(|k| k.as_str()),
                    format_storage_time(&filter.start),
                    format_storage_time(&filter.end),
                    i64::from(filter.limit),
                    i64::from(filter.offset),
                ],
                map_reading,
            )
            .map_err(|e| TemplogError::QueryFailed(format!("Failed to execute query: {}", e)))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TemplogError::QueryFailed(format!("Failed to read row: {}", e)))
    }

    /// 最近一条读数（不区分桶类型）
    pub fn query_latest(&self) -> Result<Option<Reading>> {
        self.conn
            .query_row(SELECT_LATEST, [], map_reading)
            .optional()
            .map_err(|e| TemplogError::QueryFailed(format!("Failed to query latest reading: {}", e)))
    }

    /// 删除过期记录：`timestamp < now - max_age` 或 `timestamp > now`
    ///
    /// 恰好等于边界的记录保留。返回删除行数。
    /// `max_age` 为负或超出可表示的时间范围时不删除任何记录。
    pub fn delete_expired(&self, bucket_kind: BucketKind, max_age: Duration) -> Result<usize> {
        if max_age < Duration::zero() {
            return Err(TemplogError::InvalidParameter(format!(
                "{} max age must not be negative: {}",
                bucket_kind, max_age
            )));
        }

        let now = self.clock.now();
        let cutoff = now.checked_sub_signed(max_age).ok_or_else(|| {
            TemplogError::InvalidParameter(format!("{} max age {} out of range", bucket_kind, max_age))
        })?;

        self.conn
            .execute(
                DELETE_EXPIRED,
                params![
                    bucket_kind.as_str(),
                    format_storage_time(&cutoff),
                    format_storage_time(&now),
                ],
            )
            .map_err(|e| TemplogError::WriteFailed(format!("Failed to delete expired {} rows: {}", bucket_kind, e)))
    }

    /// 记录数（None 表示全部）
    pub fn count(&self, bucket_kind: Option<BucketKind>) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM logs WHERE (?1 IS NULL OR log_type = ?1)",
                params![bucket_kind.map(|k| k.as_str())],
                |row| row.get(0),
            )
            .map_err(|e| TemplogError::QueryFailed(format!("Failed to count rows: {}", e)))?;
        Ok(count as u64)
    }
}

fn map_reading(row: &Row<'_>) -> rusqlite::Result<Reading> {
    let timestamp: String = row.get(1)?;
    let timestamp = parse_storage_time(&timestamp)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;

    // NULL 标签按空串处理
    let log_type: Option<String> = row.get(2)?;

    Ok(Reading {
        id: row.get(0)?,
        timestamp,
        log_type: log_type.unwrap_or_default(),
        value: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::clock::MockClock;
    use chrono::{TimeZone, Utc};

    fn setup() -> (Arc<MockClock>, SensorStore) {
        let clock = Arc::new(MockClock::with_time(
            Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap(),
        ));
        let store = SensorStore::open_in_memory(clock.clone()).unwrap();
        (clock, store)
    }

    #[test]
    fn test_initialize_idempotent() {
        let (_clock, store) = setup();
        store.insert(BucketKind::Raw, 20.5).unwrap();

        store.initialize().unwrap();
        store.initialize().unwrap();
        assert_eq!(store.count(None).unwrap(), 1);
    }

    #[test]
    fn test_insert_assigns_id_and_timestamp() {
        let (clock, store) = setup();

        let first = store.insert(BucketKind::Raw, 18.0).unwrap();
        clock.advance(Duration::seconds(1));
        let second = store.insert(BucketKind::Hourly, 18.2).unwrap();

        assert!(second.id > first.id);
        assert_eq!(first.timestamp, Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap());
        assert_eq!(second.timestamp, first.timestamp + Duration::seconds(1));
        assert_eq!(second.bucket_kind(), Some(BucketKind::Hourly));
    }

    #[test]
    fn test_query_filters_kind_and_orders_desc() {
        let (clock, store) = setup();
        for (i, kind) in [BucketKind::Raw, BucketKind::Hourly, BucketKind::Raw, BucketKind::Daily]
            .into_iter()
            .enumerate()
        {
            store.insert(kind, i as f64).unwrap();
            clock.advance(Duration::minutes(1));
        }

        let raw = store
            .query(&QueryFilter::default().with_kind(BucketKind::Raw))
            .unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0].value, 2.0);
        assert_eq!(raw[1].value, 0.0);

        let all = store.query(&QueryFilter::default()).unwrap();
        assert_eq!(all.len(), 4);
        assert!(all.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[test]
    fn test_query_range_inclusive() {
        let (clock, store) = setup();
        let t0 = clock.now();
        store.insert(BucketKind::Raw, 1.0).unwrap();
        clock.advance(Duration::minutes(10));
        store.insert(BucketKind::Raw, 2.0).unwrap();
        clock.advance(Duration::minutes(10));
        store.insert(BucketKind::Raw, 3.0).unwrap();

        let filter = QueryFilter::default().with_range(t0, t0 + Duration::minutes(10));
        let values: Vec<f64> = store.query(&filter).unwrap().iter().map(|r| r.value).collect();
        assert_eq!(values, vec![2.0, 1.0]);
    }

    #[test]
    fn test_query_same_timestamp_tiebreak_by_id() {
        let (_clock, store) = setup();
        store.insert(BucketKind::Raw, 18.0).unwrap();
        store.insert(BucketKind::Raw, 18.2).unwrap();
        store.insert(BucketKind::Raw, 18.4).unwrap();

        let latest = store.query_latest().unwrap().unwrap();
        assert_eq!(latest.value, 18.4);

        let values: Vec<f64> = store
            .query(&QueryFilter::default())
            .unwrap()
            .iter()
            .map(|r| r.value)
            .collect();
        assert_eq!(values, vec![18.4, 18.2, 18.0]);
    }

    #[test]
    fn test_pagination_is_tail_of_larger_page() {
        let (clock, store) = setup();
        for i in 0..30 {
            store.insert(BucketKind::Raw, f64::from(i)).unwrap();
            // 每 3 条同一时刻，覆盖 id 排序
            if i % 3 == 2 {
                clock.advance(Duration::seconds(1));
            }
        }

        for (k, m) in [(0u32, 5u32), (7, 4), (12, 20), (29, 3)] {
            let page = store
                .query(&QueryFilter::default().with_kind(BucketKind::Raw).with_page(k, m))
                .unwrap();
            let wide = store
                .query(&QueryFilter::default().with_kind(BucketKind::Raw).with_page(0, k + m))
                .unwrap();
            let tail: Vec<_> = wide.iter().skip(k as usize).cloned().collect();
            assert_eq!(page, tail, "offset={} limit={}", k, m);
        }
    }

    #[test]
    fn test_query_empty() {
        let (_clock, store) = setup();
        assert!(store.query(&QueryFilter::default()).unwrap().is_empty());
        assert!(store.query_latest().unwrap().is_none());
    }

    #[test]
    fn test_delete_expired_boundaries() {
        let (clock, store) = setup();
        let now = clock.now();
        let max_age = Duration::hours(24);

        // 边界外 1ms → 删除
        clock.set_time(now - max_age - Duration::milliseconds(1));
        store.insert(BucketKind::Raw, 1.0).unwrap();
        // 恰好在边界 → 保留
        clock.set_time(now - max_age);
        store.insert(BucketKind::Raw, 2.0).unwrap();
        // 窗口内 → 保留
        clock.set_time(now - Duration::hours(1));
        store.insert(BucketKind::Raw, 3.0).unwrap();
        // 恰好为当前时刻 → 保留
        clock.set_time(now);
        store.insert(BucketKind::Raw, 4.0).unwrap();
        // 未来时间 → 删除
        clock.set_time(now + Duration::milliseconds(1));
        store.insert(BucketKind::Raw, 5.0).unwrap();
        // 其它桶类型不受影响
        clock.set_time(now - Duration::days(3));
        store.insert(BucketKind::Hourly, 6.0).unwrap();

        clock.set_time(now);
        let deleted = store.delete_expired(BucketKind::Raw, max_age).unwrap();
        assert_eq!(deleted, 2);

        let mut remaining: Vec<f64> = store
            .query(&QueryFilter::default().with_page(0, 100))
            .unwrap()
            .iter()
            .map(|r| r.value)
            .collect();
        remaining.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(remaining, vec![2.0, 3.0, 4.0, 6.0]);
    }

    #[test]
    fn test_delete_expired_nothing_to_do() {
        let (_clock, store) = setup();
        store.insert(BucketKind::Daily, 10.0).unwrap();
        assert_eq!(store.delete_expired(BucketKind::Daily, Duration::days(365)).unwrap(), 0);
        assert_eq!(store.count(Some(BucketKind::Daily)).unwrap(), 1);
    }
}
