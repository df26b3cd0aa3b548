//! HTTP server hosting the signup request API.
//!
//! Binds an axum server and runs it on a background task with graceful
//! shutdown driven by a cancellation token.

use crate::error::AppError;
use crate::services::http_api::{api_routes, ApiState};
use axum::Router;
use std::net::SocketAddr;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

/// Handle to a running server.
pub struct ServerHandle {
    cancel_token: CancellationToken,
    local_addr: SocketAddr,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the listener actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(self) {
        log::info!("[server] Stopping server on {}", self.local_addr);
        self.cancel_token.cancel();
        if let Err(e) = self.task.await {
            log::error!("[server] Server task failed: {}", e);
        }
    }
}

/// Build the full application router.
pub fn router(state: ApiState) -> Router {
    api_routes()
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Bind `addr` and serve the API in the background.
pub async fn start_server(addr: SocketAddr, state: ApiState) -> Result<ServerHandle, AppError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| AppError::internal(format!("Failed to read bound address: {}", e)))?;

    let cancel_token = CancellationToken::new();
    let cancel_clone = cancel_token.clone();
    let app = router(state);

    log::info!("[server] Listening on http://{}", local_addr);

    let task = tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            cancel_clone.cancelled().await;
        });

        if let Err(e) = server.await {
            log::error!("[server] Server error: {}", e);
        }

        log::info!("[server] Server stopped");
    });

    Ok(ServerHandle {
        cancel_token,
        local_addr,
        task,
    })
}
