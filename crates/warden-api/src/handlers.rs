//! Read and auth endpoint handlers for the control API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/players` | Online and offline players |
//! | `GET` | `/api/player/{id}` | One player, `{}` if unknown |
//! | `GET` | `/api/auth/status` | Whether the secret is set |
//! | `POST` | `/api/auth/init` | Set the secret once |
//!
//! `POST /api/action/{name}` lives in [`crate::actions`].

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use serde_json::{Value, json};
use warden_types::{PlayerId, PlayerList};

use crate::error::ApiError;
use crate::state::AppState;

/// List every known player, split by presence and sorted by username.
pub async fn list_players(State(state): State<Arc<AppState>>) -> Json<PlayerList> {
    Json(state.registry.list_views())
}

/// Fetch one player. A well-formed but unknown identity yields `{}`.
pub async fn get_player(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let player_id: PlayerId = id
        .parse()
        .map_err(|e| ApiError::InvalidUuid(format!("{id}: {e}")))?;

    match state.registry.record_as_external(player_id) {
        Some(view) => serde_json::to_value(view)
            .map(Json)
            .map_err(|e| ApiError::Internal(format!("JSON error: {e}"))),
        None => Ok(Json(json!({}))),
    }
}

/// Report whether authorization has been bootstrapped.
pub async fn auth_status(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "initialized": state.auth.is_initialized() }))
}

/// Establish the secret. The form body may carry `key=`; otherwise one is
/// generated. Returns the secret so the caller can store it.
pub async fn auth_init(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let params = crate::actions::ActionParams::from_form(&body);
    let key = state.auth.initialize(params.get("key"))?;
    Ok(Json(json!({ "key": key })))
}
