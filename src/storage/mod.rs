//! 持久化存储模块

// 记录类型（Reading / BucketKind / QueryFilter）
pub mod record;

// SQLite 存储（WAL 模式）
pub mod sqlite;

// 保留期清理
pub mod retention;

pub use record::{BucketKind, QueryFilter, Reading};
pub use retention::{RetentionManager, RetentionPolicy, RetentionReport};
pub use sqlite::SensorStore;
