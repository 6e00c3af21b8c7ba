//! Optional audit hooks for notable player events.

use warden_types::{GameMode, PlayerId};

/// Receives audit-worthy events from the registry.
///
/// Sinks are called on the simulation thread and must not block.
pub trait AuditSink: Send + Sync {
    /// A player died.
    fn on_death(&self, player: PlayerId, username: &str, message: &str);

    /// An admin changed a player's game mode.
    fn on_game_mode_change(
        &self,
        player: PlayerId,
        username: &str,
        previous: GameMode,
        next: GameMode,
    );
}

/// An [`AuditSink`] that writes structured log lines under the `audit` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn on_death(&self, player: PlayerId, username: &str, message: &str) {
        tracing::info!(target: "audit", player = %player, username, message, "Player died");
    }

    fn on_game_mode_change(
        &self,
        player: PlayerId,
        username: &str,
        previous: GameMode,
        next: GameMode,
    ) {
        tracing::info!(
            target: "audit",
            player = %player,
            username,
            previous = %previous,
            next = %next,
            "Game mode changed"
        );
    }
}
