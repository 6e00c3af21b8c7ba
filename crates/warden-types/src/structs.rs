//! Core entity structs for the Warden control plane.
//!
//! [`PlayerRecord`] is the registry's unit of tracked state. Its
//! [`LiveSnapshot`] mirrors the simulation's player object while the
//! player is online and keeps its last value once they leave.
//! [`PlayerView`] is the external JSON shape served by the API.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::GameMode;
use crate::ids::PlayerId;

/// Milliseconds since the Unix epoch.
pub type EpochMillis = i64;

/// Number of main inventory slots (slots 9 through 35).
pub const MAIN_SLOTS: u8 = 27;
/// Number of hotbar slots (slots 0 through 8).
pub const HOTBAR_SLOTS: u8 = 9;
/// Number of armor slots (slots 36 through 39).
pub const ARMOR_SLOTS: u8 = 4;
/// Slot index of the offhand.
pub const OFFHAND_SLOT: u8 = 40;

/// Maximum number of session entries included in a [`PlayerView`].
pub const RECENT_SESSIONS: usize = 10;

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// A position and orientation inside a named world.
///
/// Also used as the freeze anchor a frozen player is held at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Location {
    /// World (dimension) identifier, e.g. `minecraft:overworld`.
    pub world: String,
    /// X coordinate.
    pub x: f64,
    /// Y coordinate (height).
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
    /// Horizontal look angle in degrees.
    pub yaw: f32,
    /// Vertical look angle in degrees.
    pub pitch: f32,
}

impl Location {
    /// Create a location facing the default direction.
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    /// Squared straight-line distance to another location's coordinates.
    ///
    /// Worlds are not compared.
    pub fn distance_squared(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx.mul_add(dx, dy.mul_add(dy, dz * dz))
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new("minecraft:overworld", 0.0, 64.0, 0.0)
    }
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

/// One inventory slot as seen by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct InventorySlot {
    /// Slot index in the player's inventory.
    pub slot: u8,
    /// Item identifier, `air` when empty.
    pub item_id: String,
    /// Human-readable item name, `Empty` when empty.
    pub display_name: String,
    /// Stack size, 0 when empty.
    pub count: u32,
    /// Whether the slot holds nothing.
    pub is_empty: bool,
}

impl InventorySlot {
    /// An empty slot at the given index.
    pub fn empty(slot: u8) -> Self {
        Self {
            slot,
            item_id: String::from("air"),
            display_name: String::from("Empty"),
            count: 0,
            is_empty: true,
        }
    }

    /// A slot holding `count` of an item. A zero count yields an empty slot.
    pub fn holding(
        slot: u8,
        item_id: impl Into<String>,
        display_name: impl Into<String>,
        count: u32,
    ) -> Self {
        if count == 0 {
            return Self::empty(slot);
        }
        Self {
            slot,
            item_id: item_id.into(),
            display_name: display_name.into(),
            count,
            is_empty: false,
        }
    }
}

/// A player's inventory split into its display sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    /// Main storage, slots 9 through 35.
    pub main: Vec<InventorySlot>,
    /// Hotbar, slots 0 through 8.
    pub hotbar: Vec<InventorySlot>,
    /// Armor, slots 36 through 39.
    pub armor: Vec<InventorySlot>,
    /// Offhand, slot 40.
    pub offhand: InventorySlot,
}

impl Inventory {
    /// An inventory with every slot empty.
    pub fn empty() -> Self {
        Self {
            main: (HOTBAR_SLOTS..HOTBAR_SLOTS.saturating_add(MAIN_SLOTS))
                .map(InventorySlot::empty)
                .collect(),
            hotbar: (0..HOTBAR_SLOTS).map(InventorySlot::empty).collect(),
            armor: (OFFHAND_SLOT.saturating_sub(ARMOR_SLOTS)..OFFHAND_SLOT)
                .map(InventorySlot::empty)
                .collect(),
            offhand: InventorySlot::empty(OFFHAND_SLOT),
        }
    }

    /// Place a slot into whichever section its index belongs to.
    ///
    /// Indices outside 0..=40 are ignored.
    pub fn put(&mut self, item: InventorySlot) {
        let section = match item.slot {
            s if s < HOTBAR_SLOTS => &mut self.hotbar,
            s if s < HOTBAR_SLOTS.saturating_add(MAIN_SLOTS) => &mut self.main,
            s if s < OFFHAND_SLOT => &mut self.armor,
            OFFHAND_SLOT => {
                self.offhand = item;
                return;
            }
            _ => return,
        };
        if let Some(existing) = section.iter_mut().find(|s| s.slot == item.slot) {
            *existing = item;
        }
    }

    /// Replace every slot with an empty one.
    pub fn clear(&mut self) {
        *self = Self::empty();
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::empty()
    }
}

// ---------------------------------------------------------------------------
// Live snapshot
// ---------------------------------------------------------------------------

/// A point-in-time copy of a player's simulated state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveSnapshot {
    /// Current health points.
    pub health: f32,
    /// Maximum health points.
    pub max_health: f32,
    /// Food level, 0 through 20.
    pub food_level: u32,
    /// Hidden saturation buffer.
    pub saturation: f32,
    /// Experience level.
    pub experience_level: u32,
    /// Progress toward the next level, 0.0 through 1.0.
    pub experience_progress: f32,
    /// Position, world, and orientation.
    pub location: Location,
    /// Current game mode.
    pub game_mode: GameMode,
    /// Inventory contents.
    pub inventory: Inventory,
    /// Whether the player is allowed to fly.
    pub can_fly: bool,
    /// Whether the player is currently flying.
    pub is_flying: bool,
}

impl Default for LiveSnapshot {
    fn default() -> Self {
        Self {
            health: 20.0,
            max_health: 20.0,
            food_level: 20,
            saturation: 5.0,
            experience_level: 0,
            experience_progress: 0.0,
            location: Location::default(),
            game_mode: GameMode::Survival,
            inventory: Inventory::empty(),
            can_fly: false,
            is_flying: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// One play session: when it began, when it ended, and where from.
///
/// `end` is `None` while the session is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SessionRecord {
    /// Join time.
    #[ts(type = "number")]
    pub start: EpochMillis,
    /// Leave time, absent while the player is still connected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional, type = "number")]
    pub end: Option<EpochMillis>,
    /// Address the player connected from.
    #[serde(rename = "ip", default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub origin_address: Option<String>,
}

impl SessionRecord {
    /// A newly opened session.
    pub const fn open(start: EpochMillis, origin_address: Option<String>) -> Self {
        Self {
            start,
            end: None,
            origin_address,
        }
    }

    /// Whether this session has not been closed yet.
    pub const fn is_open(&self) -> bool {
        self.end.is_none()
    }
}

// ---------------------------------------------------------------------------
// Player record
// ---------------------------------------------------------------------------

/// Everything the registry tracks about one player identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Stable identity.
    pub id: PlayerId,
    /// Last observed username.
    pub username: String,
    /// Whether the player is connected.
    pub online: bool,
    /// First time the player was seen by this process.
    pub first_seen: EpochMillis,
    /// Last time the snapshot was refreshed.
    pub last_seen: EpochMillis,
    /// Accumulated play time across closed sessions.
    pub total_play_time_ms: u64,
    /// Last captured simulation state.
    pub snapshot: LiveSnapshot,
}

impl PlayerRecord {
    /// A record for a player seen for the first time at `now`.
    pub fn new(id: PlayerId, username: impl Into<String>, now: EpochMillis) -> Self {
        Self {
            id,
            username: username.into(),
            online: false,
            first_seen: now,
            last_seen: now,
            total_play_time_ms: 0,
            snapshot: LiveSnapshot::default(),
        }
    }

    /// Health as a percentage of maximum health, 0 when maximum is not positive.
    pub fn health_percentage(&self) -> f64 {
        let max = f64::from(self.snapshot.max_health);
        if max > 0.0 {
            f64::from(self.snapshot.health) / max * 100.0
        } else {
            0.0
        }
    }
}

/// Render a play time in milliseconds the way the dashboard shows it.
///
/// `1d 2h 3m`, `2h 3m`, `3m 4s`, or `4s`.
pub fn format_play_time(millis: u64) -> String {
    let seconds = millis / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{days}d {}h {}m", hours % 24, minutes % 60)
    } else if hours > 0 {
        format!("{hours}h {}m", minutes % 60)
    } else if minutes > 0 {
        format!("{minutes}m {}s", seconds % 60)
    } else {
        format!("{seconds}s")
    }
}

// ---------------------------------------------------------------------------
// External view
// ---------------------------------------------------------------------------

/// The full external representation of a player served by the API.
///
/// Always computed fresh from registry state; never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PlayerView {
    /// Player identity.
    pub uuid: PlayerId,
    /// Last observed username.
    pub username: String,
    /// Whether the player is connected.
    pub online: bool,
    /// Last refresh time.
    #[ts(type = "number")]
    pub last_seen: EpochMillis,
    /// First time seen.
    #[ts(type = "number")]
    pub first_joined: EpochMillis,
    /// Current health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Food level.
    pub food_level: u32,
    /// Saturation buffer.
    pub saturation_level: f32,
    /// Game mode name.
    pub game_mode: GameMode,
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
    /// World identifier.
    pub dimension: String,
    /// Experience level.
    pub experience_level: u32,
    /// Progress toward the next level.
    pub experience_progress: f32,
    /// Accumulated play time in milliseconds.
    #[ts(type = "number")]
    pub total_play_time: u64,
    /// Accumulated play time, human readable.
    pub total_play_time_formatted: String,
    /// Health as a percentage of maximum.
    pub health_percentage: f64,
    /// Main inventory slots.
    pub inventory: Vec<InventorySlot>,
    /// Hotbar slots.
    pub hotbar: Vec<InventorySlot>,
    /// Armor slots.
    pub armor: Vec<InventorySlot>,
    /// Offhand slot.
    pub offhand: InventorySlot,
    /// Admin note, empty when none.
    pub note: String,
    /// Whether the player is frozen in place.
    pub frozen: bool,
    /// Whether god mode (invulnerability) is on.
    pub god_mode: bool,
    /// Whether the player is hidden from others.
    pub vanished: bool,
    /// Whether flight is allowed. Only present while online.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub can_fly: Option<bool>,
    /// Whether the player is flying. Only present while online.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub is_flying: Option<bool>,
    /// The most recent sessions, oldest first.
    pub sessions: Vec<SessionRecord>,
}

/// The body of `GET /api/players`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlayerList {
    /// Connected players.
    pub online: Vec<PlayerView>,
    /// Players seen earlier in this process.
    pub offline: Vec<PlayerView>,
}
