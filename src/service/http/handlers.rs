//! HTTP 请求处理器

use actix_files::NamedFile;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use std::path::Path;

use crate::service::query::{QueryResponse, QueryService};
use crate::utils::config::HttpConfig;

/// 仪表盘首页文件名
const INDEX_FILE: &str = "index.html";

/// QueryResponse → HttpResponse
fn into_http(response: QueryResponse) -> HttpResponse {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status)
        .content_type(response.content_type)
        .body(response.body)
}

/// 历史读数
///
/// GET /stats?logType=hourly&startDate=2026-01-01+00:00:00&endDate=2026-01-31&offset=0&limit=20
pub async fn stats(req: HttpRequest, service: web::Data<QueryService>) -> HttpResponse {
    into_http(service.handle_stats(req.query_string()))
}

/// 最新读数
///
/// GET /current-temperature
pub async fn current_temperature(service: web::Data<QueryService>) -> HttpResponse {
    into_http(service.handle_current())
}

/// 健康检查
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "templog",
    }))
}

/// 仪表盘页面
pub async fn index(http_config: web::Data<HttpConfig>) -> actix_web::Result<NamedFile> {
    let path = Path::new(&http_config.static_dir).join(INDEX_FILE);
    Ok(NamedFile::open(path)?)
}

/// 其它路径
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound()
        .content_type("text/plain")
        .body("Page not found!")
}
