//! HTTP server lifecycle.
//!
//! bind → spawn background task → return handle with shutdown channel.
//! [`serve`] is the process entry point and stops on Ctrl-C.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::api::router::api_router;
use crate::core_state::CoreState;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle to a running API server.
pub struct ApiServer {
    pub addr: SocketAddr,
    pub started_at: String,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ApiServer {
    /// Shut down the server gracefully. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!(addr = %self.addr, "API server shutdown signal sent");
        }
    }
}

async fn bind(addr: &str) -> Result<tokio::net::TcpListener, ServerError> {
    tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })
}

/// Start the API on `addr` in a background task.
pub async fn start_server(core: Arc<CoreState>, addr: &str) -> Result<ApiServer, ServerError> {
    let listener = bind(addr).await?;
    let addr = listener.local_addr()?;
    let app = api_router(core);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
        };
        tracing::info!(%addr, "API server started");
        if let Err(e) = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal)
        .await
        {
            tracing::error!("API server error: {e}");
        }
        tracing::info!(%addr, "API server stopped");
    });

    Ok(ApiServer {
        addr,
        started_at: chrono::Utc::now().to_rfc3339(),
        shutdown_tx: Some(shutdown_tx),
    })
}

/// Serve on the configured address until Ctrl-C.
pub async fn serve(core: Arc<CoreState>) -> Result<(), ServerError> {
    let listener = bind(&core.config.bind_addr).await?;
    let addr = listener.local_addr()?;
    let app = api_router(core);

    tracing::info!(%addr, "Listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown requested");
    })
    .await?;
    tracing::info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_state::testing::offline_state;

    #[tokio::test]
    async fn start_serve_and_stop() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = start_server(offline_state(&dir), "127.0.0.1:0")
            .await
            .expect("server should start");
        assert!(server.addr.port() > 0);
        assert!(!server.started_at.is_empty());

        let port = server.addr.port();
        let resp = reqwest::get(format!("http://127.0.0.1:{port}/api/v1/health"))
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        let resp = reqwest::get(format!("http://127.0.0.1:{port}/api/v1/financials"))
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);

        let resp = reqwest::get(format!("http://127.0.0.1:{port}/nonexistent"))
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        server.shutdown();
        server.shutdown();
    }

    #[tokio::test]
    async fn bind_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let result = start_server(offline_state(&dir), "not-an-address").await;
        assert!(matches!(result, Err(ServerError::Bind { .. })));
    }
}
