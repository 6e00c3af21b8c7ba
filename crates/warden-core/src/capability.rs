//! The narrow interface the control plane uses to reach the simulation.
//!
//! Everything Warden does to a player goes through [`Simulation`]. The
//! registry never touches simulation objects directly; it holds a
//! [`LiveHandle`] per online player and passes it back to the trait.
//!
//! A handle is only valid for the connection it was issued for. Once the
//! player disconnects (or reconnects) calls made with the old handle fail
//! with [`CapabilityError::Detached`].

use warden_types::{GameMode, LiveSnapshot, Location, PlayerId, StatusEffect};

/// Errors returned by simulation capability calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapabilityError {
    /// The handle no longer refers to a connected player.
    #[error("player {player} is not attached to the simulation")]
    Detached {
        /// The player the handle was issued for.
        player: PlayerId,
    },

    /// The simulation refused the operation.
    #[error("{operation} rejected: {reason}")]
    Rejected {
        /// Name of the refused operation.
        operation: &'static str,
        /// Why it was refused.
        reason: String,
    },
}

/// Shorthand for capability call results.
pub type CapabilityResult<T = ()> = Result<T, CapabilityError>;

/// A reference to one connected player inside the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LiveHandle {
    /// Player identity.
    pub id: PlayerId,
    /// Username at connection time.
    pub name: String,
    /// Connection counter; a reconnect yields a new value.
    pub session: u64,
}

/// Capabilities the authoritative simulation exposes to the control plane.
///
/// Implementations must be callable from the simulation thread. Reads
/// (`snapshot`, `location`) may also be called from request workers.
pub trait Simulation: Send + Sync {
    /// Find the live handle for a connected player.
    fn lookup(&self, id: PlayerId) -> Option<LiveHandle>;

    /// Handles for every connected player.
    fn online_handles(&self) -> Vec<LiveHandle>;

    /// Read the player's full live state.
    fn snapshot(&self, handle: &LiveHandle) -> CapabilityResult<LiveSnapshot>;

    /// Read the player's position, world, and orientation.
    fn location(&self, handle: &LiveHandle) -> CapabilityResult<Location>;

    /// Set current health, clamped by the simulation to its maximum.
    fn set_health(&self, handle: &LiveHandle, health: f32) -> CapabilityResult;

    /// Set absorption (temporary extra health).
    fn set_absorption(&self, handle: &LiveHandle, amount: f32) -> CapabilityResult;

    /// Set food level and saturation.
    fn set_food(&self, handle: &LiveHandle, food_level: u32, saturation: f32)
    -> CapabilityResult;

    /// Switch game mode.
    fn set_game_mode(&self, handle: &LiveHandle, mode: GameMode) -> CapabilityResult;

    /// Make the player immune to damage or not.
    fn set_invulnerable(&self, handle: &LiveHandle, invulnerable: bool) -> CapabilityResult;

    /// Allow or forbid flight. Forbidding also ends any active flight.
    fn set_flight(&self, handle: &LiveHandle, allowed: bool) -> CapabilityResult;

    /// Show or hide the player from other players.
    fn set_visible(&self, handle: &LiveHandle, visible: bool) -> CapabilityResult;

    /// Move the player to a location, possibly in another world.
    fn teleport(&self, handle: &LiveHandle, to: &Location) -> CapabilityResult;

    /// Write the position directly, without movement side effects.
    fn set_position(&self, handle: &LiveHandle, x: f64, y: f64, z: f64) -> CapabilityResult;

    /// Set velocity.
    fn set_velocity(&self, handle: &LiveHandle, x: f64, y: f64, z: f64) -> CapabilityResult;

    /// Reset accumulated fall distance.
    fn clear_fall_distance(&self, handle: &LiveHandle) -> CapabilityResult;

    /// Kill the player.
    fn deal_lethal_damage(&self, handle: &LiveHandle) -> CapabilityResult;

    /// Disconnect the player with a message.
    fn disconnect(&self, handle: &LiveHandle, message: &str) -> CapabilityResult;

    /// Send a chat message to the player.
    fn send_message(&self, handle: &LiveHandle, message: &str) -> CapabilityResult;

    /// Apply a status effect for `ticks` simulation ticks.
    fn apply_effect(
        &self,
        handle: &LiveHandle,
        effect: StatusEffect,
        ticks: u32,
        amplifier: u8,
    ) -> CapabilityResult;

    /// Remove every status effect.
    fn clear_effects(&self, handle: &LiveHandle) -> CapabilityResult;

    /// Remove every item.
    fn clear_inventory(&self, handle: &LiveHandle) -> CapabilityResult;

    /// Run a privileged server command.
    fn execute_command(&self, command: &str) -> CapabilityResult;
}
