//! TEMPLOG 采集进程
//!
//! 从传感器通道逐行读取温度，写入 raw 记录并生成小时/日均值，同时按保留期清理旧数据。
//!
//! 运行: cargo run --bin templog-ingest -- [--config config/templog.toml] /dev/ttyUSB0
//!
//! 退出码：
//! - 2 缺少传感器参数
//! - 3 存储初始化失败
//! - 4 传感器通道打开失败
//! - 6 聚合/保留期配置非法

use std::sync::Arc;

use templog::utils::clock::{Clock, SystemClock};
use templog::utils::config::TemplogConfig;
use templog::{exit_code, IngestPipeline, LineTransport, SensorStore};

/// 命令行参数
#[derive(Debug, Default, PartialEq)]
struct IngestArgs {
    config_path: Option<String>,
    transport: Option<String>,
}

impl IngestArgs {
    fn parse(args: &[String]) -> Self {
        let mut parsed = IngestArgs::default();
        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--config" | "-c" => {
                    if i + 1 < args.len() {
                        parsed.config_path = Some(args[i + 1].clone());
                    }
                    i += 1;
                }
                other => {
                    if parsed.transport.is_none() {
                        parsed.transport = Some(other.to_string());
                    }
                }
            }
            i += 1;
        }
        parsed
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let args = IngestArgs::parse(&args);
    let config = TemplogConfig::load_or_default(args.config_path.as_deref());

    // 初始化日志（RUST_LOG 优先）
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.server.log_level.as_str())).init();

    let Some(transport_path) = args.transport else {
        eprintln!("Usage: templog-ingest [--config <file>] <port>");
        std::process::exit(exit_code::MISSING_ARGUMENT);
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let store = match SensorStore::open(&config.storage, clock.clone()) {
        Ok(store) => store,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(exit_code::STORAGE_INIT_FAILED);
        }
    };
    log::info!("✅ Storage ready at {}", store.location());

    let mut transport = match LineTransport::open(&transport_path) {
        Ok(transport) => transport,
        Err(e) => {
            log::error!("{}! Terminating...", e);
            std::process::exit(exit_code::TRANSPORT_OPEN_FAILED);
        }
    };
    log::info!("✅ Sensor transport opened: {}", transport.name());
    log::info!(
        "   Windows: hourly={}s daily={}s, read timeout {}ms",
        config.aggregation.hourly_window_secs,
        config.aggregation.daily_window_secs,
        config.ingest.read_timeout_ms
    );

    let mut pipeline = match IngestPipeline::from_config(store, &config, clock) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(exit_code::INVALID_CONFIG);
        }
    };
    pipeline.run(&mut transport, config.ingest.read_timeout());

    std::process::exit(exit_code::OK);
}
