//! 配置管理模块

use crate::{Result, TemplogError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config/templog.toml";

/// 聚合窗口上限（10 年）
pub const MAX_WINDOW_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// 保留期上限（100 年）
pub const MAX_RETENTION_DAYS: i64 = 100 * 365;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplogConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

impl TemplogConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            TemplogError::IOError(format!("Failed to read config file {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// 解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| TemplogError::ConfigError(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_default() -> Result<Self> {
        Self::load_from_file(DEFAULT_CONFIG_PATH)
    }

    /// 加载配置，失败时回退到默认值
    ///
    /// `path` 为 None 时读取 [`DEFAULT_CONFIG_PATH`]
    pub fn load_or_default(path: Option<&str>) -> Self {
        let result = match path {
            Some(p) => Self::load_from_file(p),
            None => Self::load_default(),
        };

        match result {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("Failed to load config file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.ingest.validate()?;
        self.aggregation.validate()?;
        self.retention.validate()?;
        self.query.validate()
    }
}

/// 取值必须落在 `[min, max]`
fn check_range(section: &str, field: &str, value: i64, min: i64, max: i64) -> Result<()> {
    if value < min || value > max {
        return Err(TemplogError::ConfigError(format!(
            "{}.{} must be within [{}, {}], got {}",
            section, field, min, max, value
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_name")]
    pub name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
    /// 仪表盘静态文件目录（`/` 返回其中的 index.html）
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_http_host(),
            port: default_http_port(),
            static_dir: default_static_dir(),
        }
    }
}

impl HttpConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite 数据库文件
    #[serde(default = "default_db_path")]
    pub db_path: String,
    /// 写锁等待时间（毫秒）
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl StorageConfig {
    pub fn with_path(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            ..Self::default()
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// 传感器读超时（毫秒），超时不是错误
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl IngestConfig {
    pub fn validate(&self) -> Result<()> {
        if self.read_timeout_ms == 0 {
            return Err(TemplogError::ConfigError("ingest.read_timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// 聚合窗口长度（秒）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    #[serde(default = "default_hourly_window_secs")]
    pub hourly_window_secs: i64,
    #[serde(default = "default_daily_window_secs")]
    pub daily_window_secs: i64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            hourly_window_secs: default_hourly_window_secs(),
            daily_window_secs: default_daily_window_secs(),
        }
    }
}

impl AggregationConfig {
    /// 窗口长度必须为正，否则每次检查都会产出一条聚合
    pub fn validate(&self) -> Result<()> {
        check_range("aggregation", "hourly_window_secs", self.hourly_window_secs, 1, MAX_WINDOW_SECS)?;
        check_range("aggregation", "daily_window_secs", self.daily_window_secs, 1, MAX_WINDOW_SECS)
    }
}

/// 各桶类型的最大保留时长
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    #[serde(default = "default_raw_max_age_hours")]
    pub raw_max_age_hours: i64,
    #[serde(default = "default_hourly_max_age_days")]
    pub hourly_max_age_days: i64,
    #[serde(default = "default_daily_max_age_days")]
    pub daily_max_age_days: i64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            raw_max_age_hours: default_raw_max_age_hours(),
            hourly_max_age_days: default_hourly_max_age_days(),
            daily_max_age_days: default_daily_max_age_days(),
        }
    }
}

impl RetentionConfig {
    pub fn validate(&self) -> Result<()> {
        check_range("retention", "raw_max_age_hours", self.raw_max_age_hours, 1, MAX_RETENTION_DAYS * 24)?;
        check_range("retention", "hourly_max_age_days", self.hourly_max_age_days, 1, MAX_RETENTION_DAYS)?;
        check_range("retention", "daily_max_age_days", self.daily_max_age_days, 1, MAX_RETENTION_DAYS)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_query_limit")]
    pub default_limit: u32,
    #[serde(default = "default_query_max_limit")]
    pub max_limit: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_query_limit(),
            max_limit: default_query_max_limit(),
        }
    }
}

impl QueryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_limit == 0 {
            return Err(TemplogError::ConfigError("query.max_limit must be positive".to_string()));
        }
        Ok(())
    }
}

// 默认值函数
fn default_server_name() -> String {
    "templog".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_http_host() -> String {
    "127.0.0.1".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_static_dir() -> String {
    "static".to_string()
}
fn default_db_path() -> String {
    "logs.db".to_string()
}
fn default_busy_timeout_ms() -> u64 {
    5_000
}
fn default_read_timeout_ms() -> u64 {
    1_000
}
fn default_hourly_window_secs() -> i64 {
    60 * 60
}
fn default_daily_window_secs() -> i64 {
    24 * 60 * 60
}
fn default_raw_max_age_hours() -> i64 {
    24
}
fn default_hourly_max_age_days() -> i64 {
    30
}
fn default_daily_max_age_days() -> i64 {
    365
}
fn default_query_limit() -> u32 {
    20
}
fn default_query_max_limit() -> u32 {
    1_000
}
