//! # TEMPLOG-RS
//!
//! 温度传感器日志系统 - 原始读数入库 / 小时与日聚合 / 保留期清理 / 查询服务
//!
//! ## 核心能力
//!
//! - **采集**: 从串口/管道/文件逐行读取温度读数 (ingest/)
//! - **聚合**: 按进程启动时刻计算的滚动窗口生成小时/日均值 (aggregation/)
//! - **存储**: SQLite WAL 模式，采集进程写入同时查询进程可读 (storage/)
//! - **保留期**: raw 24h / hourly 30d / daily 365d (storage::retention)
//! - **对外服务**: `/stats` 与 `/current-temperature` 只读查询 (基于 Actix-web)
//!
//! ## 架构设计
//!
//! ```text
//! 传感器 (逐行文本)
//!     ↓
//! IngestPipeline (ingest/)
//!     ├─→ SensorStore.insert("raw")
//!     ├─→ Aggregator (hourly / daily) ─→ SensorStore.insert(aggregate)
//!     └─→ RetentionManager.sweep()
//!
//! HTTP 客户端
//!     ↓
//! QueryService (service/) ─→ SensorStore.query / query_latest ─→ JSON
//! ```

// ============================================================================
// 外部依赖
// ============================================================================

// Web 框架
pub use actix_web;

// 序列化
pub use serde;
pub use serde_json;

// 时间
pub use chrono;

// 日志
pub use log;

// 错误处理
pub use thiserror;

// ============================================================================
// 内部模块
// ============================================================================

/// 持久化存储 (SQLite) 与保留期清理
pub mod storage;

/// 小时/日窗口聚合
pub mod aggregation;

/// 传感器采集流水线
pub mod ingest;

/// 对外服务层 (查询服务 + HTTP)
pub mod service;

/// 工具模块 (配置、时钟)
pub mod utils;

// ============================================================================
// 重导出常用类型
// ============================================================================

pub use aggregation::{Aggregator, WindowAggregate};
pub use ingest::{IngestPipeline, LineTransport, SensorSource, TransportEvent};
pub use service::query::{QueryResponse, QueryService};
pub use storage::{BucketKind, QueryFilter, Reading, RetentionManager, RetentionPolicy, SensorStore};
pub use utils::clock::{Clock, MockClock, SystemClock};
pub use utils::config::TemplogConfig;

// ============================================================================
// 全局错误类型
// ============================================================================

/// 系统错误类型
#[derive(Debug, thiserror::Error)]
pub enum TemplogError {
    /// 存储无法打开或建表失败（启动时致命，运行期仅记录）
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// 单次写入/删除失败（不致命）
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// 传感器通道无法打开（仅启动时致命）
    #[error("Transport unavailable: {0}")]
    TransportUnavailable(String),

    /// 读数或请求字段无法解析
    #[error("Parse failure: {0}")]
    ParseFailure(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, TemplogError>;

// ============================================================================
// 进程退出码
// ============================================================================

/// 进程退出码（每种启动失败原因一个）
pub mod exit_code {
    /// 传感器通道已关闭，正常退出
    pub const OK: i32 = 0;
    /// 缺少必需的命令行参数
    pub const MISSING_ARGUMENT: i32 = 2;
    /// 存储初始化失败
    pub const STORAGE_INIT_FAILED: i32 = 3;
    /// 传感器通道打开失败
    pub const TRANSPORT_OPEN_FAILED: i32 = 4;
    /// HTTP 端口绑定失败
    pub const BIND_FAILED: i32 = 5;
    /// 配置取值非法
    pub const INVALID_CONFIG: i32 = 6;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_distinct() {
        let codes = [
            exit_code::MISSING_ARGUMENT,
            exit_code::STORAGE_INIT_FAILED,
            exit_code::TRANSPORT_OPEN_FAILED,
            exit_code::BIND_FAILED,
            exit_code::INVALID_CONFIG,
        ];
        for (i, a) in codes.iter().enumerate() {
            assert_ne!(*a, exit_code::OK);
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_error_display() {
        let err = TemplogError::WriteFailed("disk full".to_string());
        assert_eq!(err.to_string(), "Write failed: disk full");
    }
}
