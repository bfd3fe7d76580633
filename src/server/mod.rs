//! HTTP gateway boundary — routes requests to the tool registry.

mod error;
mod handlers;

pub use error::{ApiError, ApiErrorBody, ApiErrorResponse};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::tools::ToolRegistry;

/// Shared state handed to every handler.
#[derive(Debug)]
pub struct AppState {
    pub registry: Arc<ToolRegistry>,
    pub started_at: DateTime<Utc>,
}

/// Build the gateway router over `registry`.
pub fn router(registry: Arc<ToolRegistry>) -> Router {
    let state = Arc::new(AppState {
        registry,
        started_at: Utc::now(),
    });

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/mcp/tools", get(handlers::list_tools))
        .route("/api/mcp/tools/prompt", get(handlers::tool_prompt))
        .route("/api/mcp/execute", post(handlers::execute))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// HTTP server wrapping the registry.
#[derive(Debug)]
pub struct GatewayServer {
    registry: Arc<ToolRegistry>,
    cancel: CancellationToken,
}

impl GatewayServer {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            cancel: CancellationToken::new(),
        }
    }

    /// Bind `addr` and serve until [`shutdown`](Self::shutdown) is called.
    pub async fn serve(&self, addr: SocketAddr) -> std::io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        self.serve_listener(listener).await
    }

    /// Serve on an already-bound listener.
    pub async fn serve_listener(&self, listener: TcpListener) -> std::io::Result<()> {
        tracing::info!(
            addr = %listener.local_addr()?,
            tools = self.registry.catalog().len(),
            "gateway listening"
        );

        let cancel = self.cancel.clone();
        axum::serve(listener, router(self.registry.clone()))
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await?;

        tracing::info!("gateway stopped accepting requests");
        self.registry.shutdown().await;
        Ok(())
    }

    /// Request graceful shutdown.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Token that triggers shutdown when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}
