//! Control API for the Warden player-state registry.
//!
//! An Axum HTTP server exposing:
//!
//! - **Player reads** (`/api/players`, `/api/player/{id}`) served straight
//!   from the [`StateRegistry`] on request workers
//! - **Admin actions** (`/api/action/{name}`) parsed at the boundary and
//!   queued for the simulation thread
//! - **Auth bootstrap** (`/api/auth/status`, `/api/auth/init`) for the
//!   shared secret that gates everything else
//!
//! [`StateRegistry`]: warden_core::registry::StateRegistry

pub mod actions;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;

pub use auth::AuthGate;
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError};
pub use startup::{ApiHandle, StartupError, spawn_api};
pub use state::AppState;
