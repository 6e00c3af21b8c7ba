//! Control API startup helper for embedding in the engine binary.
//!
//! [`spawn_api`] binds eagerly, so a port problem is reported to the
//! caller before anything runs, then serves on a background task.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::{ServerConfig, ServerError, bind, serve};
use crate::state::AppState;

/// Errors that can occur when spawning the control API.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// A running control API.
#[derive(Debug)]
pub struct ApiHandle {
    /// The address actually bound, which is the fallback port if the
    /// primary was taken.
    pub addr: SocketAddr,
    /// The serving task.
    pub task: JoinHandle<()>,
}

/// Bind and spawn the control API on a background Tokio task.
///
/// The server stops accepting connections once `shutdown` resolves. The
/// caller may also abort [`ApiHandle::task`] directly.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if neither the primary nor the
/// fallback port can be bound.
pub async fn spawn_api(
    config: &ServerConfig,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<ApiHandle, StartupError> {
    let listener = bind(config).await?;
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("could not read bound address: {e}")))?;

    let task = tokio::spawn(async move {
        if let Err(e) = serve(listener, state, shutdown).await {
            tracing::error!(error = %e, "Control API exited with error");
        }
    });

    tracing::info!(%addr, "Control API spawned on background task");
    Ok(ApiHandle { addr, task })
}
