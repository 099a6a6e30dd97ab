//! TEMPLOG 查询服务
//!
//! 只读 HTTP 接口：
//! 1. GET /stats                 历史读数（分页）
//! 2. GET /current-temperature   最新读数
//! 3. GET /                      仪表盘页面
//!
//! 运行: cargo run --bin templog-server [-- --config config/templog.toml]

use std::sync::Arc;

use templog::service::http::HttpServer;
use templog::utils::clock::{Clock, SystemClock};
use templog::utils::config::TemplogConfig;
use templog::{exit_code, QueryService, SensorStore};

fn parse_config_path(args: &[String]) -> Option<String> {
    let mut config_path = None;
    for i in 0..args.len() {
        if matches!(args[i].as_str(), "--config" | "-c") && i + 1 < args.len() {
            config_path = Some(args[i + 1].clone());
        }
    }
    config_path
}

#[actix_web::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    let config = TemplogConfig::load_or_default(parse_config_path(&args).as_deref());

    // 初始化日志（RUST_LOG 优先）
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.server.log_level.as_str())).init();

    log::info!("Configuration loaded");
    log::info!("  Database: {}", config.storage.db_path);
    log::info!("  Static dir: {}", config.http.static_dir);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // 启动时确认存储可用（建表幂等），之后每个请求独立打开连接
    if let Err(e) = SensorStore::open(&config.storage, clock.clone()) {
        log::error!("{}", e);
        std::process::exit(exit_code::STORAGE_INIT_FAILED);
    }
    log::info!("✅ Storage ready");

    let query_service = QueryService::from_config(&config, clock);
    let server = match HttpServer::new(query_service, config.http.clone()).bind() {
        Ok(server) => server,
        Err(e) => {
            log::error!("Failed to bind {}: {}", config.http.bind_address(), e);
            std::process::exit(exit_code::BIND_FAILED);
        }
    };

    log::info!("Server is running on {}...", config.http.bind_address());
    log::info!("   Stats:   http://{}/stats?logType=all&offset=0&limit=20", config.http.bind_address());
    log::info!("   Current: http://{}/current-temperature", config.http.bind_address());

    if let Err(e) = server.await {
        log::error!("HTTP server stopped with error: {}", e);
    }
}
