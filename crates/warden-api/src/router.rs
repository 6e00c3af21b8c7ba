//! Axum router construction for the control API.
//!
//! Auth status and bootstrap are always reachable. Everything else sits
//! behind [`require_auth`], which is a no-op until a secret is set.

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::actions;
use crate::auth::require_auth;
use crate::handlers;
use crate::state::AppState;

/// Build the complete router.
///
/// - `GET /api/auth/status`
/// - `POST /api/auth/init`
/// - `GET /api/players` (gated)
/// - `GET /api/player/{id}` (gated)
/// - `POST /api/action/{name}` (gated)
///
/// CORS allows any origin so a dashboard on another port can call in.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let gated = Router::new()
        .route("/api/players", get(handlers::list_players))
        .route("/api/player/{id}", get(handlers::get_player))
        .route("/api/action/{name}", post(actions::perform_action))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_auth,
        ));

    Router::new()
        .route("/api/auth/status", get(handlers::auth_status))
        .route("/api/auth/init", post(handlers::auth_init))
        .merge(gated)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
