//! 对外服务层
//!
//! - `query`: 与传输层无关的查询服务（查询串 → 状态码 + JSON）
//! - `http`: Actix-web 适配层

pub mod http;
pub mod models;
pub mod query;
