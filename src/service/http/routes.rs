//! HTTP API 路由配置

use super::handlers;
use actix_web::web;

/// 配置所有路由
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // 仪表盘页面
        .route("/", web::get().to(handlers::index))
        // 健康检查
        .route("/health", web::get().to(handlers::health_check))
        // 历史读数（分页）
        .route("/stats", web::get().to(handlers::stats))
        // 最新读数
        .route("/current-temperature", web::get().to(handlers::current_temperature));
}
