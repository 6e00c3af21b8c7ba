//! Shared type definitions for the Warden control plane.
//!
//! This crate is the single source of truth for the types that flow
//! between the registry, the control API, and the admin dashboard.
//! Externally visible types are exported to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrapper for player identities
//! - [`enums`] -- Game modes and the closed status effect vocabulary
//! - [`structs`] -- Player records, snapshots, sessions, and the API view
//! - [`actions`] -- Administrative actions and their outcomes

pub mod actions;
pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use actions::{ActionOutcome, AdminAction, ScheduledAction};
pub use enums::{GameMode, StatusEffect};
pub use ids::{IdParseError, PlayerId};
pub use structs::{
    ARMOR_SLOTS, EpochMillis, HOTBAR_SLOTS, Inventory, InventorySlot, LiveSnapshot, Location,
    MAIN_SLOTS, OFFHAND_SLOT, PlayerList, PlayerRecord, PlayerView, RECENT_SESSIONS,
    SessionRecord, format_play_time,
};
