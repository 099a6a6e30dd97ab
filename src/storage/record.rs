//! 存储记录类型
//!
//! 时间戳以 UTC 文本 `YYYY-MM-DD HH:MM:SS.mmm` 落盘：
//! - 字典序即时间序，范围查询/删除可以直接比较文本
//! - 兼容列默认值 `CURRENT_TIMESTAMP` 写入的无毫秒格式

use crate::{Result, TemplogError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 落盘时间格式
pub const STORAGE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// 解析格式（`%.f` 的小数部分可选）
const STORAGE_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// 聚合粒度标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketKind {
    /// 原始读数
    Raw,
    /// 小时均值
    Hourly,
    /// 日均值
    Daily,
}

impl BucketKind {
    pub const ALL: [BucketKind; 3] = [BucketKind::Raw, BucketKind::Hourly, BucketKind::Daily];

    pub fn as_str(&self) -> &'static str {
        match self {
            BucketKind::Raw => "raw",
            BucketKind::Hourly => "hourly",
            BucketKind::Daily => "daily",
        }
    }
}

impl fmt::Display for BucketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BucketKind {
    type Err = TemplogError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "raw" => Ok(BucketKind::Raw),
            "hourly" => Ok(BucketKind::Hourly),
            "daily" => Ok(BucketKind::Daily),
            other => Err(TemplogError::ParseFailure(format!(
                "unknown bucket kind: {:?}",
                other
            ))),
        }
    }
}

/// 一条已落盘的读数
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// 自增主键
    pub id: i64,

    /// 写入时刻（存储时钟）
    pub timestamp: DateTime<Utc>,

    /// 落盘的 log_type 原文（外部写入的行可能不是 raw/hourly/daily）
    pub log_type: String,

    /// 温度值
    pub value: f64,
}

impl Reading {
    /// 已知的桶类型，未知标签返回 None
    pub fn bucket_kind(&self) -> Option<BucketKind> {
        self.log_type.parse().ok()
    }
}

/// 查询条件（单次请求，不落盘）
#[derive(Debug, Clone, PartialEq)]
pub struct QueryFilter {
    /// None 表示不按 log_type 过滤
    pub bucket_kind: Option<BucketKind>,
    /// 起始时间（含）
    pub start: DateTime<Utc>,
    /// 结束时间（含）
    pub end: DateTime<Utc>,
    pub offset: u32,
    pub limit: u32,
}

impl QueryFilter {
    pub const DEFAULT_LIMIT: u32 = 20;

    /// 默认起始时间
    pub fn default_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// 默认结束时间
    pub fn default_end() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn with_kind(mut self, kind: BucketKind) -> Self {
        self.bucket_kind = Some(kind);
        self
    }

    pub fn with_page(mut self, offset: u32, limit: u32) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    pub fn with_range(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start = start;
        self.end = end;
        self
    }
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self {
            bucket_kind: None,
            start: Self::default_start(),
            end: Self::default_end(),
            offset: 0,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// UTC 时刻 → 落盘文本
pub fn format_storage_time(ts: &DateTime<Utc>) -> String {
    ts.format(STORAGE_TIME_FORMAT).to_string()
}

/// 落盘文本 → UTC 时刻
pub fn parse_storage_time(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, STORAGE_PARSE_FORMAT) {
        return Ok(naive.and_utc());
    }

    // 仅日期（手工写入的历史数据）
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| TemplogError::ParseFailure(format!("invalid stored timestamp: {:?}", s)))
}
