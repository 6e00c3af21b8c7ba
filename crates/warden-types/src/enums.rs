//! Enumeration types for the Warden control plane.
//!
//! Both vocabularies here are closed: the API rejects any game mode or
//! status effect name that does not appear in these lists.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Game modes
// ---------------------------------------------------------------------------

/// The interaction mode a player is in.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum GameMode {
    /// Normal play with health, hunger, and block breaking.
    #[default]
    Survival,
    /// Unlimited resources, flight, and invulnerability.
    Creative,
    /// Survival without free block breaking or placing.
    Adventure,
    /// Invisible, non-interacting observer.
    Spectator,
}

impl GameMode {
    /// Every game mode, in display order.
    pub const ALL: [Self; 4] = [
        Self::Survival,
        Self::Creative,
        Self::Adventure,
        Self::Spectator,
    ];

    /// The lowercase wire name of this game mode.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Survival => "survival",
            Self::Creative => "creative",
            Self::Adventure => "adventure",
            Self::Spectator => "spectator",
        }
    }

    /// Resolve a game mode from its name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(name))
    }
}

impl core::fmt::Display for GameMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Status effects
// ---------------------------------------------------------------------------

/// Generates the closed status effect vocabulary with key lookup.
macro_rules! define_effects {
    ( $( $(#[$meta:meta])* $variant:ident => $key:literal, )* ) => {
        /// A status effect that can be applied to a player.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[serde(rename_all = "snake_case")]
        #[ts(export, export_to = "bindings/")]
        pub enum StatusEffect {
            $( $(#[$meta])* $variant, )*
        }

        impl StatusEffect {
            /// Every status effect the control plane can apply.
            pub const ALL: &'static [Self] = &[ $( Self::$variant, )* ];

            /// The snake-case key used by the API for this effect.
            pub const fn key(self) -> &'static str {
                match self {
                    $( Self::$variant => $key, )*
                }
            }
        }
    };
}

define_effects! {
    /// Faster movement.
    Speed => "speed",
    /// Slower movement.
    Slowness => "slowness",
    /// Faster mining and attacking.
    Haste => "haste",
    /// Slower mining and attacking.
    MiningFatigue => "mining_fatigue",
    /// Increased melee damage.
    Strength => "strength",
    /// Immediate healing.
    InstantHealth => "instant_health",
    /// Immediate damage.
    InstantDamage => "instant_damage",
    /// Higher jumps.
    JumpBoost => "jump_boost",
    /// Wobbling vision.
    Nausea => "nausea",
    /// Health regenerates over time.
    Regeneration => "regeneration",
    /// Reduced incoming damage.
    Resistance => "resistance",
    /// Immunity to fire and lava.
    FireResistance => "fire_resistance",
    /// Breathing underwater.
    WaterBreathing => "water_breathing",
    /// Invisible to others.
    Invisibility => "invisibility",
    /// Heavily reduced vision.
    Blindness => "blindness",
    /// See in the dark.
    NightVision => "night_vision",
    /// Food drains faster.
    Hunger => "hunger",
    /// Reduced melee damage.
    Weakness => "weakness",
    /// Damage over time, never lethal.
    Poison => "poison",
    /// Damage over time, can be lethal.
    Wither => "wither",
    /// Increased maximum health.
    HealthBoost => "health_boost",
    /// Temporary extra health.
    Absorption => "absorption",
    /// Restores food and saturation.
    Saturation => "saturation",
    /// Outline visible through walls.
    Glowing => "glowing",
    /// Floats upward.
    Levitation => "levitation",
    /// Better loot.
    Luck => "luck",
    /// Worse loot.
    Unluck => "unluck",
    /// Falls slowly, no fall damage.
    SlowFalling => "slow_falling",
    /// Underwater vision, mining, and breathing.
    ConduitPower => "conduit_power",
    /// Faster swimming.
    DolphinsGrace => "dolphins_grace",
    /// Triggers a raid on entering a village.
    BadOmen => "bad_omen",
    /// Village discounts after a raid.
    HeroOfTheVillage => "hero_of_the_village",
}

impl StatusEffect {
    /// Resolve an effect from its API key, ignoring ASCII case.
    ///
    /// Returns `None` for anything outside the closed vocabulary.
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|effect| effect.key().eq_ignore_ascii_case(key))
    }
}

impl core::fmt::Display for StatusEffect {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.key())
    }
}
