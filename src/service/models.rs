//! 查询响应模型

use crate::storage::record::Reading;
use chrono::Local;
use serde::{Deserialize, Serialize};

/// 响应中的时间格式（本地时区）
pub const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 单条读数的 JSON 表示
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingView {
    /// 本地时间 `YYYY-MM-DD HH:MM:SS`
    pub timestamp: String,
    pub log_type: String,
    pub temperature: f64,
}

impl From<&Reading> for ReadingView {
    fn from(reading: &Reading) -> Self {
        Self {
            timestamp: reading
                .timestamp
                .with_timezone(&Local)
                .format(DISPLAY_TIME_FORMAT)
                .to_string(),
            log_type: reading.log_type.clone(),
            temperature: reading.value,
        }
    }
}

/// 错误响应 `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
