//! Administrative actions and their outcomes.
//!
//! An [`AdminAction`] is what the control API schedules onto the
//! simulation thread; the registry executes it there and reports an
//! [`ActionOutcome`].

use serde::{Deserialize, Serialize};

use crate::enums::GameMode;
use crate::ids::PlayerId;

/// A moderation action against one player (or, for broadcasts, everyone).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AdminAction {
    /// Restore full health.
    Heal,
    /// Fill food and saturation.
    Feed,
    /// Switch game mode.
    SetGameMode {
        /// The mode to switch to.
        mode: GameMode,
    },
    /// Kill the player.
    Kill,
    /// Empty food and saturation.
    RemoveHunger,
    /// Remove every item.
    ClearInventory,
    /// Move within the player's current world.
    Teleport {
        /// Target X.
        x: f64,
        /// Target Y.
        y: f64,
        /// Target Z.
        z: f64,
    },
    /// Disconnect with a message.
    Kick {
        /// Message shown to the player.
        reason: String,
    },
    /// Freeze in place or release.
    Freeze {
        /// `true` to freeze, `false` to release.
        frozen: bool,
    },
    /// Flip invulnerability.
    ToggleGodMode,
    /// Flip flight permission.
    ToggleFly,
    /// Flip visibility to other players.
    ToggleVanish,
    /// Replace or delete the admin note.
    SetNote {
        /// The note; blank deletes it.
        note: String,
    },
    /// Apply a status effect.
    ApplyEffect {
        /// Effect key from the closed vocabulary.
        effect: String,
        /// Duration in seconds, clamped to at least 1.
        duration_seconds: i64,
        /// Amplifier, clamped to at least 0.
        amplifier: i64,
    },
    /// Remove every status effect.
    ClearEffects,
    /// Send an announcement to every online player.
    Broadcast {
        /// Announcement text.
        message: String,
    },
    /// Ban through the server's moderation command.
    Ban {
        /// Ban reason.
        reason: String,
    },
    /// Lift a ban through the server's moderation command.
    Unban,
}

impl AdminAction {
    /// Short name used in logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Heal => "heal",
            Self::Feed => "feed",
            Self::SetGameMode { .. } => "setgamemode",
            Self::Kill => "kill",
            Self::RemoveHunger => "removehunger",
            Self::ClearInventory => "clearinventory",
            Self::Teleport { .. } => "teleport",
            Self::Kick { .. } => "kick",
            Self::Freeze { .. } => "freeze",
            Self::ToggleGodMode => "godmode",
            Self::ToggleFly => "fly",
            Self::ToggleVanish => "vanish",
            Self::SetNote { .. } => "setnote",
            Self::ApplyEffect { .. } => "effect",
            Self::ClearEffects => "cleareffects",
            Self::Broadcast { .. } => "broadcast",
            Self::Ban { .. } => "ban",
            Self::Unban => "unban",
        }
    }

    /// Whether the target must be online for the action to do anything.
    ///
    /// Notes, broadcasts, and ban commands work regardless of presence.
    pub const fn requires_online(&self) -> bool {
        !matches!(
            self,
            Self::SetNote { .. } | Self::Broadcast { .. } | Self::Ban { .. } | Self::Unban
        )
    }
}

/// An action queued for execution on the simulation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledAction {
    /// The player the action targets.
    pub target: PlayerId,
    /// The action itself.
    pub action: AdminAction,
}

/// What happened when an action ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The simulation accepted the change.
    Applied,
    /// The target has no live handle; nothing was done.
    NotOnline,
    /// The effect key is outside the closed vocabulary; nothing was done.
    UnknownEffect {
        /// The rejected key.
        key: String,
    },
    /// The simulation refused or failed the change.
    Failed {
        /// Description of the failure.
        reason: String,
    },
}

impl ActionOutcome {
    /// Whether the action took effect.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Applied)
    }
}
