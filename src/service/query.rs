//! 查询服务
//!
//! 与传输层无关：输入为原始查询串，输出为 (状态码, Content-Type, 响应体)。
//! 每个请求单独打开一个存储连接，任何返回路径上都会随作用域释放。
//!
//! 支持的接口：
//! - `handle_stats`   ← `GET /stats?logType=&startDate=&endDate=&offset=&limit=`
//! - `handle_current` ← `GET /current-temperature`

use crate::service::models::{ErrorBody, ReadingView};
use crate::storage::record::{BucketKind, QueryFilter, Reading};
use crate::storage::sqlite::SensorStore;
use crate::utils::clock::Clock;
use crate::utils::config::{QueryConfig, StorageConfig, TemplogConfig};
use crate::{Result, TemplogError};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Arc;

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// 没有任何读数时 `/current-temperature` 的错误信息
pub const NO_DATA_MESSAGE: &str = "No temperature data available";

/// 查询参数名
pub const PARAM_LOG_TYPE: &str = "logType";
pub const PARAM_START_DATE: &str = "startDate";
pub const PARAM_END_DATE: &str = "endDate";
pub const PARAM_OFFSET: &str = "offset";
pub const PARAM_LIMIT: &str = "limit";

/// 表示"不按类型过滤"的 logType
pub const LOG_TYPE_ALL: &str = "all";

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// 查询响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl QueryResponse {
    pub fn json(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: CONTENT_TYPE_JSON,
            body,
        }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        let body = serde_json::to_string(&ErrorBody::new(message))
            .unwrap_or_else(|_| r#"{"error":"internal error"}"#.to_string());
        Self::json(status, body)
    }

    /// 错误类型 → HTTP 状态码
    pub fn from_error(err: &TemplogError) -> Self {
        let status = match err {
            TemplogError::InvalidParameter(_) | TemplogError::ParseFailure(_) => 400,
            TemplogError::NotFound(_) => 404,
            TemplogError::StorageUnavailable(_) => 503,
            _ => 500,
        };
        match err {
            // 404 直接返回业务信息，不带错误类别前缀
            TemplogError::NotFound(message) => Self::error(status, message.clone()),
            _ => Self::error(status, err.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 读数序列 → JSON 数组
pub fn render_readings(readings: &[Reading]) -> Result<String> {
    let views: Vec<ReadingView> = readings.iter().map(ReadingView::from).collect();
    serde_json::to_string(&views).map_err(|e| TemplogError::SerializationError(e.to_string()))
}

/// 解析 `application/x-www-form-urlencoded` 查询串
///
/// 未知参数保留在结果中由调用方忽略，重复参数以最后一次为准。
pub fn parse_query_string(raw: &str) -> Result<HashMap<String, String>> {
    let raw = raw.strip_prefix('?').unwrap_or(raw);
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw)
        .map_err(|e| TemplogError::InvalidParameter(format!("malformed query string: {}", e)))?;
    Ok(pairs.into_iter().collect())
}

/// 查询串 → 查询条件
pub fn parse_filter(raw: &str, config: &QueryConfig) -> Result<QueryFilter> {
    let params = parse_query_string(raw)?;

    let mut filter = QueryFilter {
        limit: config.default_limit,
        ..QueryFilter::default()
    };

    if let Some(log_type) = param(&params, PARAM_LOG_TYPE) {
        if log_type != LOG_TYPE_ALL {
            let kind = log_type.parse::<BucketKind>().map_err(|_| {
                TemplogError::InvalidParameter(format!("{} must be one of all/raw/hourly/daily", PARAM_LOG_TYPE))
            })?;
            filter.bucket_kind = Some(kind);
        }
    }

    if let Some(start) = param(&params, PARAM_START_DATE) {
        filter.start = parse_date_param(PARAM_START_DATE, start, false)?;
    }
    if let Some(end) = param(&params, PARAM_END_DATE) {
        filter.end = parse_date_param(PARAM_END_DATE, end, true)?;
    }
    if let Some(offset) = param(&params, PARAM_OFFSET) {
        filter.offset = parse_count_param(PARAM_OFFSET, offset)?;
    }
    if let Some(limit) = param(&params, PARAM_LIMIT) {
        filter.limit = parse_count_param(PARAM_LIMIT, limit)?;
    }
    filter.limit = filter.limit.min(config.max_limit);

    Ok(filter)
}

/// 缺失或空值视为未提供
fn param<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn parse_count_param(name: &str, value: &str) -> Result<u32> {
    value.parse::<u32>().map_err(|_| {
        TemplogError::InvalidParameter(format!("{} must be a non-negative integer, got {:?}", name, value))
    })
}

/// 本地时间文本 → UTC
///
/// 仅日期时：起始取 00:00:00，结束取 23:59:59.999
fn parse_date_param(name: &str, value: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    let naive = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
            if end_of_day {
                date.and_hms_milli_opt(23, 59, 59, 999)
            } else {
                date.and_hms_opt(0, 0, 0)
            }
        })
        .ok_or_else(|| TemplogError::InvalidParameter(format!("{} is not a valid date: {:?}", name, value)))?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| TemplogError::InvalidParameter(format!("{} does not exist in local time: {:?}", name, value)))
}

/// 查询服务
pub struct QueryService {
    storage: StorageConfig,
    query: QueryConfig,
    clock: Arc<dyn Clock>,
}

impl QueryService {
    pub fn new(storage: StorageConfig, query: QueryConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            query,
            clock,
        }
    }

    pub fn from_config(config: &TemplogConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(config.storage.clone(), config.query.clone(), clock)
    }

    /// 本次请求专用的存储连接
    fn open_store(&self) -> Result<SensorStore> {
        SensorStore::open(&self.storage, self.clock.clone())
    }

    /// `GET /stats`
    pub fn handle_stats(&self, raw_query: &str) -> QueryResponse {
        match self.stats(raw_query) {
            Ok(response) => response,
            Err(e) => {
                log::warn!("[Stats API] {}", e);
                QueryResponse::from_error(&e)
            }
        }
    }

    fn stats(&self, raw_query: &str) -> Result<QueryResponse> {
        let filter = parse_filter(raw_query, &self.query)?;
        let store = self.open_store()?;
        let readings = store.query(&filter)?;

        log::info!(
            "📊 [Stats API] kind={} offset={} limit={} -> {} rows",
            filter.bucket_kind.map(|k| k.as_str()).unwrap_or(LOG_TYPE_ALL),
            filter.offset,
            filter.limit,
            readings.len()
        );

        Ok(QueryResponse::json(200, render_readings(&readings)?))
    }

    /// `GET /current-temperature`
    pub fn handle_current(&self) -> QueryResponse {
        match self.current() {
            Ok(response) => response,
            Err(e) => {
                if matches!(e, TemplogError::NotFound(_)) {
                    log::debug!("[Current API] {}", e);
                } else {
                    log::warn!("[Current API] {}", e);
                }
                QueryResponse::from_error(&e)
            }
        }
    }

    fn current(&self) -> Result<QueryResponse> {
        let store = self.open_store()?;
        match store.query_latest()? {
            Some(reading) => Ok(QueryResponse::json(200, render_readings(&[reading])?)),
            None => Err(TemplogError::NotFound(NO_DATA_MESSAGE.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> QueryConfig {
        QueryConfig::default()
    }

    #[test]
    fn test_parse_filter_defaults() {
        let filter = parse_filter("", &config()).unwrap();
        assert_eq!(filter, QueryFilter::default());

        // "all" 与空值均表示不过滤
        let filter = parse_filter("logType=all&offset=&limit=", &config()).unwrap();
        assert_eq!(filter.bucket_kind, None);
        assert_eq!(filter.offset, 0);
        assert_eq!(filter.limit, 20);
    }

    #[test]
    fn test_parse_filter_values() {
        let filter = parse_filter(
            "?logType=hourly&offset=40&limit=10&startDate=2026-01-01+00:00:00&endDate=2026-01-31&unknown=1",
            &config(),
        )
        .unwrap();

        assert_eq!(filter.bucket_kind, Some(BucketKind::Hourly));
        assert_eq!(filter.offset, 40);
        assert_eq!(filter.limit, 10);

        let start = Local
            .from_local_datetime(&NaiveDate::from_ymd_opt(2026, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap())
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(filter.start, start);
        assert!(filter.end > filter.start);
    }

    #[test]
    fn test_parse_filter_percent_encoded_date() {
        let a = parse_filter("startDate=2026-03-01%2012%3A30%3A00", &config()).unwrap();
        let b = parse_filter("startDate=2026-03-01T12:30", &config()).unwrap();
        assert_eq!(a.start, b.start);
    }

    #[test]
    fn test_parse_filter_rejects_malformed() {
        for raw in [
            "offset=abc",
            "offset=-1",
            "limit=1.5",
            "logType=weekly",
            "startDate=yesterday",
            "endDate=2026-13-01",
        ] {
            let err = parse_filter(raw, &config()).unwrap_err();
            assert!(matches!(err, TemplogError::InvalidParameter(_)), "{}", raw);
        }
    }

    #[test]
    fn test_limit_clamped() {
        let filter = parse_filter("limit=100000", &config()).unwrap();
        assert_eq!(filter.limit, 1_000);
    }

    #[test]
    fn test_duplicate_key_last_wins() {
        let filter = parse_filter("limit=5&limit=7", &config()).unwrap();
        assert_eq!(filter.limit, 7);
    }

    #[test]
    fn test_error_status_mapping() {
        let resp = QueryResponse::from_error(&TemplogError::InvalidParameter("x".into()));
        assert_eq!(resp.status, 400);
        assert_eq!(resp.content_type, CONTENT_TYPE_JSON);

        let resp = QueryResponse::from_error(&TemplogError::StorageUnavailable("x".into()));
        assert_eq!(resp.status, 503);

        let resp = QueryResponse::from_error(&TemplogError::NotFound(NO_DATA_MESSAGE.into()));
        assert_eq!(resp.status, 404);
        assert_eq!(resp.body, r#"{"error":"No temperature data available"}"#);

        let resp = QueryResponse::from_error(&TemplogError::QueryFailed("x".into()));
        assert_eq!(resp.status, 500);
        assert!(!resp.is_success());

        let body: serde_json::Value = serde_json::from_str(&resp.body).unwrap();
        assert_eq!(body["error"], "Query failed: x");
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_readings(&[]).unwrap(), "[]");
    }
}
