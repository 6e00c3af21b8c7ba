//! Shared application state for the control API.

use std::sync::Arc;

use warden_core::queue::ActionQueue;
use warden_core::registry::StateRegistry;

use crate::auth::AuthGate;

/// Everything a request handler can reach.
///
/// Reads go straight to the registry from the worker thread. Anything that
/// touches the simulation is submitted to the action queue and runs on the
/// simulation thread at the next tick.
#[derive(Clone)]
pub struct AppState {
    /// The player-state registry.
    pub registry: Arc<StateRegistry>,
    /// Hand-off to the simulation thread.
    pub actions: ActionQueue,
    /// Secret check and bootstrap.
    pub auth: Arc<AuthGate>,
}

impl AppState {
    /// Bundle the registry, queue, and auth gate.
    pub const fn new(registry: Arc<StateRegistry>, actions: ActionQueue, auth: Arc<AuthGate>) -> Self {
        Self {
            registry,
            actions,
            auth,
        }
    }
}
