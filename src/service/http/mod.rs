//! HTTP API 服务模块
//!
//! 只负责请求/响应转换，业务逻辑在 [`QueryService`](crate::service::query::QueryService)

pub mod handlers;
pub mod routes;

use actix_web::dev::Server;
use actix_web::{middleware, web, App, HttpServer as ActixHttpServer};
use std::io;

use crate::service::query::QueryService;
use crate::utils::config::HttpConfig;

/// HTTP 服务器
pub struct HttpServer {
    /// 查询服务
    query_service: web::Data<QueryService>,

    /// 监听配置（地址 + 静态文件目录）
    http_config: web::Data<HttpConfig>,
}

impl HttpServer {
    pub fn new(query_service: QueryService, http_config: HttpConfig) -> Self {
        Self {
            query_service: web::Data::new(query_service),
            http_config: web::Data::new(http_config),
        }
    }

    pub fn bind_address(&self) -> String {
        self.http_config.bind_address()
    }

    /// 绑定端口并返回待运行的服务器
    ///
    /// 单个 worker：请求逐个处理完毕后再处理下一个
    pub fn bind(self) -> io::Result<Server> {
        let bind_address = self.bind_address();
        let query_service = self.query_service.clone();
        let http_config = self.http_config.clone();

        let server = ActixHttpServer::new(move || {
            App::new()
                .app_data(query_service.clone())
                .app_data(http_config.clone())
                .wrap(middleware::Logger::default())
                .wrap(
                    actix_cors::Cors::default()
                        .allow_any_origin()
                        .allowed_methods(vec!["GET"])
                        .max_age(3600),
                )
                .configure(routes::configure)
                .default_service(web::to(handlers::not_found))
        })
        .workers(1)
        .bind(&bind_address)?
        .run();

        log::info!("✅ HTTP server bound at http://{}", bind_address);
        Ok(server)
    }

    /// 启动 HTTP 服务器（阻塞直到退出）
    pub async fn run(self) -> io::Result<()> {
        self.bind()?.await
    }
}
