//! # HTTP Server
//!
//! Serves the backup API consumed by the application's UI. Route
//! handlers delegate to [`BackupService`]; this module only assembles
//! the router, CORS policy, and listener.

mod backup_routes;
mod config;

pub use backup_routes::{backup_routes, BackupState};
pub use config::HttpServerConfig;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::observability::Logger;

/// HTTP server wrapping the backup routes.
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, state: Arc<BackupState>) -> Self {
        let router = Self::build_router(&config, state);
        Self { config, router }
    }

    fn build_router(config: &HttpServerConfig, state: Arc<BackupState>) -> Router {
        let cors = if config.cors_origins.is_empty() {
            // No configured origins: permissive, for development.
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            use tower_http::cors::AllowOrigin;
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .route("/health", get(|| async { "ok" }))
            .merge(backup_routes(state))
            .layer(cors)
    }

    /// Bind and serve until the process exits.
    pub async fn serve(self) -> std::io::Result<()> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(&addr).await?;
        Logger::info("http_server_listening", &[("addr", &addr)]);
        axum::serve(listener, self.router).await
    }
}
