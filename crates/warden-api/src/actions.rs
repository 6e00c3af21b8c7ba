//! `POST /api/action/{name}`: parse a form body into an [`AdminAction`]
//! and queue it for the simulation thread.
//!
//! The response reports whether the action was accepted, not whether it
//! has run. Requests that could never succeed (target offline for an
//! action that needs a live player, unknown effect or game mode) are
//! answered with `{"success": false}` and nothing is queued.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use serde_json::{Value, json};
use tracing::{debug, info, warn};
use warden_core::registry::{DEFAULT_BAN_REASON, DEFAULT_KICK_REASON};
use warden_types::{AdminAction, GameMode, PlayerId, ScheduledAction, StatusEffect};

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_X: f64 = 0.0;
const DEFAULT_Y: f64 = 64.0;
const DEFAULT_Z: f64 = 0.0;
const DEFAULT_EFFECT: &str = "speed";
const DEFAULT_DURATION_SECONDS: i64 = 60;
const DEFAULT_AMPLIFIER: i64 = 0;

/// Decoded form parameters. A repeated key keeps its last value.
#[derive(Debug, Default, Clone)]
pub struct ActionParams(BTreeMap<String, String>);

impl ActionParams {
    /// Decode an `application/x-www-form-urlencoded` body. An undecodable
    /// body yields no parameters.
    pub fn from_form(body: &[u8]) -> Self {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body).unwrap_or_default();
        Self(pairs.into_iter().collect())
    }

    /// Raw value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    fn text(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_owned()
    }

    fn coordinate(&self, key: &str, default: f64) -> f64 {
        self.get(key)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(default)
    }

    fn integer(&self, key: &str, default: i64) -> i64 {
        self.get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// The `uuid` parameter as a player identity.
    pub fn target(&self) -> Result<PlayerId, ApiError> {
        let raw = self.get("uuid").ok_or(ApiError::MissingUuid)?;
        raw.parse()
            .map_err(|e| ApiError::InvalidUuid(format!("{raw}: {e}")))
    }
}

/// Map an action name and its parameters to an [`AdminAction`].
///
/// Returns `Ok(None)` for a known action whose parameters name something
/// outside its vocabulary (an unknown game mode), and
/// [`ApiError::UnknownAction`] for an unknown action name.
pub fn parse_action(name: &str, params: &ActionParams) -> Result<Option<AdminAction>, ApiError> {
    let action = match name {
        "heal" => AdminAction::Heal,
        "feed" => AdminAction::Feed,
        "creative" => AdminAction::SetGameMode {
            mode: GameMode::Creative,
        },
        "survival" => AdminAction::SetGameMode {
            mode: GameMode::Survival,
        },
        "adventure" => AdminAction::SetGameMode {
            mode: GameMode::Adventure,
        },
        "spectator" => AdminAction::SetGameMode {
            mode: GameMode::Spectator,
        },
        "setgamemode" => {
            let requested = params.get("gamemode").unwrap_or(GameMode::Survival.as_str());
            match GameMode::from_name(requested) {
                Some(mode) => AdminAction::SetGameMode { mode },
                None => return Ok(None),
            }
        }
        "kill" => AdminAction::Kill,
        "removehunger" => AdminAction::RemoveHunger,
        "clearinventory" => AdminAction::ClearInventory,
        "teleport" => AdminAction::Teleport {
            x: params.coordinate("x", DEFAULT_X),
            y: params.coordinate("y", DEFAULT_Y),
            z: params.coordinate("z", DEFAULT_Z),
        },
        "kick" => AdminAction::Kick {
            reason: params.text("reason", DEFAULT_KICK_REASON),
        },
        "freeze" => AdminAction::Freeze {
            frozen: params
                .get("freeze")
                .is_none_or(|v| v.trim().eq_ignore_ascii_case("true")),
        },
        "godmode" => AdminAction::ToggleGodMode,
        "fly" => AdminAction::ToggleFly,
        "vanish" => AdminAction::ToggleVanish,
        "setnote" => AdminAction::SetNote {
            note: params.text("note", ""),
        },
        "effect" => AdminAction::ApplyEffect {
            effect: params.text("effect", DEFAULT_EFFECT),
            duration_seconds: params.integer("duration", DEFAULT_DURATION_SECONDS),
            amplifier: params.integer("amplifier", DEFAULT_AMPLIFIER),
        },
        "cleareffects" => AdminAction::ClearEffects,
        "broadcast" => AdminAction::Broadcast {
            message: params.text("message", ""),
        },
        "ban" => AdminAction::Ban {
            reason: params.text("reason", DEFAULT_BAN_REASON),
        },
        "unban" => AdminAction::Unban,
        other => return Err(ApiError::UnknownAction(other.to_owned())),
    };
    Ok(Some(action))
}

/// Handle `POST /api/action/{name}`.
pub async fn perform_action(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let params = ActionParams::from_form(&body);
    let target = params.target()?;
    let action = parse_action(&name, &params)?;
    let success = action.is_some_and(|action| schedule(&state, target, action));
    Ok(Json(json!({ "success": success })))
}

/// Pre-check and queue one action. Returns whether it was accepted.
fn schedule(state: &AppState, target: PlayerId, action: AdminAction) -> bool {
    if action.requires_online() && !state.registry.is_online(target) {
        debug!(player = %target, action = action.name(), "Rejected, target not online");
        return false;
    }
    if let AdminAction::ApplyEffect { effect, .. } = &action
        && StatusEffect::from_key(effect).is_none()
    {
        debug!(player = %target, effect = %effect, "Rejected, unknown effect");
        return false;
    }

    let name = action.name();
    match state.actions.submit(ScheduledAction { target, action }) {
        Ok(()) => {
            info!(player = %target, action = name, "Action queued");
            true
        }
        Err(err) => {
            warn!(player = %target, action = name, error = %err, "Could not queue action");
            false
        }
    }
}
