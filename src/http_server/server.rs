//! # HTTP Server
//!
//! Combines the health, post and blob routers into one axum server.

use std::io;
use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, Router};
use tokio::net::TcpListener;

use super::blob_routes::blob_routes;
use super::config::HttpServerConfig;
use super::health_routes::health_routes;
use super::post_routes::post_routes;
use super::state::AppState;
use crate::blob_store::BlobBackend;
use crate::observability::{Event, Logger};
use crate::record_store::RecordStore;
use crate::service::PostService;

/// Multipart overhead allowed on top of the two file parts
const FORM_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// HTTP server for the post API
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn new<R, B>(config: HttpServerConfig, service: PostService<R, B>) -> Self
    where
        R: RecordStore + 'static,
        B: BlobBackend + 'static,
    {
        let router = build_router(&config, service);
        Self { config, router }
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Bind and serve until ctrl-c, then drain in-flight requests
    pub async fn start(self) -> io::Result<()> {
        let addr = self
            .config
            .bind_addr()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let listener = TcpListener::bind(addr).await?;
        Logger::info(Event::ServerListening, &[("addr", &addr.to_string())]);
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await
    }
}

/// Build the full router around `service`
pub fn build_router<R, B>(config: &HttpServerConfig, service: PostService<R, B>) -> Router
where
    R: RecordStore + 'static,
    B: BlobBackend + 'static,
{
    // An add carries an image and a content file.
    let body_limit = service
        .blobs()
        .max_upload_bytes()
        .saturating_mul(2)
        .saturating_add(FORM_OVERHEAD_BYTES);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    let state = Arc::new(AppState::new(service));
    Router::new()
        .merge(health_routes())
        .merge(post_routes(state.clone()))
        .merge(blob_routes(state))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(config.cors_layer())
}
