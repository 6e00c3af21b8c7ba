//! Control API server lifecycle.
//!
//! [`bind`] claims the primary port, or the fallback port if the primary
//! is taken. [`serve`] runs the router on a bound listener until the
//! shutdown future completes.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::router::build_router;
use crate::state::AppState;

/// Where the control API listens.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// The TCP port to try first.
    pub port: u16,
    /// The TCP port to try if `port` cannot be bound.
    pub fallback_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 4444,
            fallback_port: 4445,
        }
    }
}

/// Bind the primary port, retrying once on the fallback port.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    match bind_port(&config.host, config.port).await {
        Ok(listener) => Ok(listener),
        Err(primary) if config.fallback_port != config.port => {
            warn!(
                port = config.port,
                fallback_port = config.fallback_port,
                error = %primary,
                "Primary port unavailable, trying fallback"
            );
            bind_port(&config.host, config.fallback_port).await
        }
        Err(primary) => Err(primary),
    }
}

async fn bind_port(host: &str, port: u16) -> Result<TcpListener, ServerError> {
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| ServerError::Bind(format!("invalid address {host}:{port}: {e}")))?;
    TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))
}

/// Serve the control API on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the server encounters a fatal I/O error.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let router = build_router(state);
    if let Ok(addr) = listener.local_addr() {
        info!(url = %format!("http://{addr}"), "Control API listening");
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))
}

/// Errors that can occur when starting or running the control API.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn falls_back_when_primary_is_taken() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let taken_port = taken.local_addr().unwrap().port();

        let config = ServerConfig {
            host: String::from("127.0.0.1"),
            port: taken_port,
            fallback_port: 0,
        };
        let listener = bind(&config).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), taken_port);
    }

    #[tokio::test]
    async fn fails_when_both_ports_are_taken() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let config = ServerConfig {
            host: String::from("127.0.0.1"),
            port,
            fallback_port: port,
        };
        assert!(matches!(bind(&config).await, Err(ServerError::Bind(_))));
    }

    #[tokio::test]
    async fn invalid_host_is_a_bind_error() {
        let config = ServerConfig {
            host: String::from("not a host"),
            ..ServerConfig::default()
        };
        assert!(matches!(bind(&config).await, Err(ServerError::Bind(_))));
    }
}
