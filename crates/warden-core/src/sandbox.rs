//! An in-memory [`Simulation`] with just enough physics to exercise the
//! control plane.
//!
//! [`SandboxWorld`] keeps a flat world with solid ground at y = 64, gravity,
//! fall distance, fall damage, and ticking status effects. Every mutating
//! capability call is recorded as a [`CapabilityCall`] so tests can assert
//! exactly what the registry asked for, and any operation can be made to
//! fail with [`SandboxWorld::fail_operation`].
//!
//! Disconnects and deaths are not applied to the registry directly; they
//! are queued and picked up by the host loop through
//! [`take_disconnects`](SandboxWorld::take_disconnects) and
//! [`take_deaths`](SandboxWorld::take_deaths), the same way a real server
//! delivers those events on its own thread.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use warden_types::{
    GameMode, Inventory, InventorySlot, LiveSnapshot, Location, PlayerId, StatusEffect,
};

use crate::capability::{CapabilityError, CapabilityResult, LiveHandle, Simulation};

/// Height of the ground plane.
pub const GROUND_LEVEL: f64 = 64.0;
/// Downward acceleration in blocks per second squared.
pub const GRAVITY: f64 = 32.0;
/// Falls up to this many blocks do no damage.
pub const SAFE_FALL_DISTANCE: f64 = 3.0;
/// Default world identifier.
pub const OVERWORLD: &str = "minecraft:overworld";

const GROUND_FRICTION: f64 = 0.6;
/// Recorded capability calls kept; older entries are dropped.
pub const CALL_LOG_CAPACITY: usize = 1024;
/// Chat messages kept per player; older entries are dropped.
pub const MESSAGE_LOG_CAPACITY: usize = 64;
const DEFAULT_MAX_HEALTH: f32 = 20.0;

/// One recorded capability call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityCall {
    /// Trait method name, e.g. `teleport`.
    pub operation: &'static str,
    /// The player addressed, if any.
    pub target: Option<PlayerId>,
    /// Human-readable arguments.
    pub detail: String,
}

/// Full simulated state of one sandbox player.
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxPlayer {
    /// Username.
    pub name: String,
    /// Connection counter matching the issued [`LiveHandle`].
    pub session: u64,
    /// Position and orientation.
    pub location: Location,
    /// Velocity in blocks per second.
    pub velocity: [f64; 3],
    /// Blocks fallen since last touching the ground.
    pub fall_distance: f64,
    /// Current health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Extra health on top of `health`.
    pub absorption: f32,
    /// Food level, 0 through 20.
    pub food_level: u32,
    /// Saturation buffer.
    pub saturation: f32,
    /// Experience level.
    pub experience_level: u32,
    /// Progress toward the next level.
    pub experience_progress: f32,
    /// Game mode.
    pub game_mode: GameMode,
    /// Immune to damage.
    pub invulnerable: bool,
    /// Allowed to fly.
    pub can_fly: bool,
    /// Currently flying.
    pub is_flying: bool,
    /// Visible to other players.
    pub visible: bool,
    /// Active effects with remaining ticks and amplifier.
    pub effects: BTreeMap<StatusEffect, (u32, u8)>,
    /// Inventory contents.
    pub inventory: Inventory,
    /// The most recent chat messages received, oldest first.
    pub messages: VecDeque<String>,
    /// Whether a death has been reported and not yet respawned.
    pub dead: bool,
}

impl SandboxPlayer {
    fn spawned(name: &str, session: u64, location: Location) -> Self {
        Self {
            name: name.to_owned(),
            session,
            location,
            velocity: [0.0; 3],
            fall_distance: 0.0,
            health: DEFAULT_MAX_HEALTH,
            max_health: DEFAULT_MAX_HEALTH,
            absorption: 0.0,
            food_level: 20,
            saturation: 5.0,
            experience_level: 0,
            experience_progress: 0.0,
            game_mode: GameMode::Survival,
            invulnerable: false,
            can_fly: false,
            is_flying: false,
            visible: true,
            effects: BTreeMap::new(),
            inventory: Inventory::empty(),
            messages: VecDeque::new(),
            dead: false,
        }
    }

    fn snapshot(&self) -> LiveSnapshot {
        LiveSnapshot {
            health: self.health,
            max_health: self.max_health,
            food_level: self.food_level,
            saturation: self.saturation,
            experience_level: self.experience_level,
            experience_progress: self.experience_progress,
            location: self.location.clone(),
            game_mode: self.game_mode,
            inventory: self.inventory.clone(),
            can_fly: self.can_fly,
            is_flying: self.is_flying,
        }
    }

    const fn takes_damage(&self) -> bool {
        !self.invulnerable && matches!(self.game_mode, GameMode::Survival | GameMode::Adventure)
    }

    /// Advance one tick of `dt` seconds. Returns a death message if the
    /// player died during this tick.
    fn integrate(&mut self, dt: f64) -> Option<String> {
        if self.dead {
            return None;
        }
        let [vx, mut vy, vz] = self.velocity;
        if !self.is_flying {
            vy -= GRAVITY * dt;
        }
        let previous_y = self.location.y;
        self.location.x += vx * dt;
        self.location.y += vy * dt;
        self.location.z += vz * dt;

        let mut landing_damage = 0.0_f64;
        if self.location.y <= GROUND_LEVEL {
            self.location.y = GROUND_LEVEL;
            if self.fall_distance > SAFE_FALL_DISTANCE && self.takes_damage() {
                landing_damage = self.fall_distance - SAFE_FALL_DISTANCE;
            }
            self.fall_distance = 0.0;
            self.velocity = [vx * GROUND_FRICTION, 0.0, vz * GROUND_FRICTION];
        } else {
            if self.location.y < previous_y && !self.is_flying {
                self.fall_distance += previous_y - self.location.y;
            }
            self.velocity = [vx, vy, vz];
        }

        self.effects.retain(|_, (ticks, _)| {
            *ticks = ticks.saturating_sub(1);
            *ticks > 0
        });

        if landing_damage > 0.0 {
            #[allow(clippy::cast_possible_truncation)]
            let damage = landing_damage as f32;
            self.health = (self.health - damage).max(0.0);
            if self.health <= 0.0 {
                self.dead = true;
                return Some(format!("{} fell from a high place", self.name));
            }
        }
        None
    }
}

fn push_capped<T>(log: &mut VecDeque<T>, capacity: usize, entry: T) {
    while log.len() >= capacity {
        log.pop_front();
    }
    log.push_back(entry);
}

#[derive(Debug)]
struct SandboxState {
    players: BTreeMap<PlayerId, SandboxPlayer>,
    next_session: u64,
    tick_seconds: f64,
    calls: VecDeque<CapabilityCall>,
    failing: HashSet<&'static str>,
    disconnects: Vec<(PlayerId, String)>,
    deaths: Vec<(PlayerId, String)>,
    banned: BTreeSet<String>,
}

/// A flat in-memory world implementing [`Simulation`].
#[derive(Debug)]
pub struct SandboxWorld {
    state: Mutex<SandboxState>,
}

impl Default for SandboxWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SandboxWorld {
    /// An empty world ticking at 20 ticks per second.
    pub fn new() -> Self {
        Self::with_ticks_per_second(20)
    }

    /// An empty world ticking at the given rate.
    pub fn with_ticks_per_second(ticks_per_second: u32) -> Self {
        Self {
            state: Mutex::new(SandboxState {
                players: BTreeMap::new(),
                next_session: 1,
                tick_seconds: 1.0 / f64::from(ticks_per_second.max(1)),
                calls: VecDeque::new(),
                failing: HashSet::new(),
                disconnects: Vec::new(),
                deaths: Vec::new(),
                banned: BTreeSet::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SandboxState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // World control
    // -----------------------------------------------------------------------

    /// Connect a player at the world spawn.
    pub fn spawn(&self, id: PlayerId, name: &str) -> LiveHandle {
        self.spawn_at(id, name, Location::new(OVERWORLD, 0.0, GROUND_LEVEL, 0.0))
    }

    /// Connect a player at a given location. A player already connected
    /// under the same identity is replaced and receives a new session.
    pub fn spawn_at(&self, id: PlayerId, name: &str, location: Location) -> LiveHandle {
        let mut state = self.lock();
        let session = state.next_session;
        state.next_session = session.saturating_add(1);
        state
            .players
            .insert(id, SandboxPlayer::spawned(name, session, location));
        LiveHandle {
            id,
            name: name.to_owned(),
            session,
        }
    }

    /// Remove a player from the world. Returns `false` if absent.
    pub fn despawn(&self, id: PlayerId) -> bool {
        self.lock().players.remove(&id).is_some()
    }

    /// Bring a dead player back at spawn with full vitals.
    pub fn respawn(&self, id: PlayerId) -> bool {
        let mut state = self.lock();
        let Some(player) = state.players.get_mut(&id) else {
            return false;
        };
        player.location = Location::new(OVERWORLD, 0.0, GROUND_LEVEL, 0.0);
        player.velocity = [0.0; 3];
        player.fall_distance = 0.0;
        player.health = player.max_health;
        player.food_level = 20;
        player.saturation = 5.0;
        player.effects.clear();
        player.dead = false;
        true
    }

    /// Advance every player by one tick.
    pub fn step(&self) {
        let mut state = self.lock();
        let dt = state.tick_seconds;
        let mut died = Vec::new();
        for (id, player) in &mut state.players {
            if let Some(message) = player.integrate(dt) {
                died.push((*id, message));
            }
        }
        state.deaths.extend(died);
    }

    /// Add to a player's velocity, as movement input would.
    pub fn impulse(&self, id: PlayerId, vx: f64, vy: f64, vz: f64) -> bool {
        self.with_state(id, |player| {
            let [x, y, z] = player.velocity;
            player.velocity = [x + vx, y + vy, z + vz];
        })
    }

    /// Displace a player directly.
    pub fn nudge(&self, id: PlayerId, dx: f64, dy: f64, dz: f64) -> bool {
        self.with_state(id, |player| {
            player.location.x += dx;
            player.location.y += dy;
            player.location.z += dz;
        })
    }

    /// Move a player into another world at the same coordinates.
    pub fn change_world(&self, id: PlayerId, world: &str) -> bool {
        self.with_state(id, |player| world.clone_into(&mut player.location.world))
    }

    /// Set a player's look direction.
    pub fn look(&self, id: PlayerId, yaw: f32, pitch: f32) -> bool {
        self.with_state(id, |player| {
            player.location.yaw = yaw;
            player.location.pitch = pitch;
        })
    }

    /// Reduce health, ignoring invulnerability.
    pub fn damage(&self, id: PlayerId, amount: f32) -> bool {
        self.with_state(id, |player| {
            player.health = (player.health - amount).max(0.0);
        })
    }

    /// Start flying if allowed. Returns `false` if absent or not allowed.
    pub fn start_flying(&self, id: PlayerId) -> bool {
        let mut started = false;
        self.with_state(id, |player| {
            if player.can_fly {
                player.is_flying = true;
                started = true;
            }
        });
        started
    }

    /// Place an item stack into an inventory slot.
    pub fn give(&self, id: PlayerId, item: InventorySlot) -> bool {
        self.with_state(id, |player| player.inventory.put(item))
    }

    fn with_state(&self, id: PlayerId, f: impl FnOnce(&mut SandboxPlayer)) -> bool {
        self.lock().players.get_mut(&id).map(f).is_some()
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    /// A copy of a player's state.
    pub fn player_state(&self, id: PlayerId) -> Option<SandboxPlayer> {
        self.lock().players.get(&id).cloned()
    }

    /// Identities of every connected player.
    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.lock().players.keys().copied().collect()
    }

    /// Whether a name or identity string has been banned by command.
    pub fn is_banned(&self, target: &str) -> bool {
        self.lock().banned.contains(target)
    }

    /// The most recent mutating calls, oldest first. At most
    /// [`CALL_LOG_CAPACITY`] are kept.
    pub fn calls(&self) -> Vec<CapabilityCall> {
        self.lock().calls.iter().cloned().collect()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Make every later call to `operation` fail with
    /// [`CapabilityError::Rejected`].
    pub fn fail_operation(&self, operation: &'static str) {
        self.lock().failing.insert(operation);
    }

    /// Undo every [`fail_operation`](Self::fail_operation).
    pub fn clear_failures(&self) {
        self.lock().failing.clear();
    }

    /// Drain queued disconnects: `(player, message)`.
    pub fn take_disconnects(&self) -> Vec<(PlayerId, String)> {
        std::mem::take(&mut self.lock().disconnects)
    }

    /// Drain queued deaths: `(player, death message)`.
    pub fn take_deaths(&self) -> Vec<(PlayerId, String)> {
        std::mem::take(&mut self.lock().deaths)
    }

    // -----------------------------------------------------------------------
    // Capability plumbing
    // -----------------------------------------------------------------------

    fn check(
        state: &SandboxState,
        operation: &'static str,
        handle: &LiveHandle,
    ) -> CapabilityResult {
        if state.failing.contains(operation) {
            return Err(CapabilityError::Rejected {
                operation,
                reason: "injected failure".to_owned(),
            });
        }
        match state.players.get(&handle.id) {
            Some(player) if player.session == handle.session => Ok(()),
            _ => Err(CapabilityError::Detached { player: handle.id }),
        }
    }

    /// Run a read against a live player without recording it.
    fn read<R>(
        &self,
        operation: &'static str,
        handle: &LiveHandle,
        f: impl FnOnce(&SandboxPlayer) -> R,
    ) -> CapabilityResult<R> {
        let state = self.lock();
        Self::check(&state, operation, handle)?;
        state
            .players
            .get(&handle.id)
            .map(f)
            .ok_or(CapabilityError::Detached { player: handle.id })
    }

    /// Record and run a mutation against a live player.
    fn mutate(
        &self,
        operation: &'static str,
        handle: &LiveHandle,
        detail: String,
        f: impl FnOnce(&mut SandboxPlayer),
    ) -> CapabilityResult {
        let mut state = self.lock();
        push_capped(
            &mut state.calls,
            CALL_LOG_CAPACITY,
            CapabilityCall {
                operation,
                target: Some(handle.id),
                detail,
            },
        );
        Self::check(&state, operation, handle)?;
        state
            .players
            .get_mut(&handle.id)
            .map(f)
            .ok_or(CapabilityError::Detached { player: handle.id })
    }
}

impl Simulation for SandboxWorld {
    fn lookup(&self, id: PlayerId) -> Option<LiveHandle> {
        self.lock().players.get(&id).map(|player| LiveHandle {
            id,
            name: player.name.clone(),
            session: player.session,
        })
    }

    fn online_handles(&self) -> Vec<LiveHandle> {
        self.lock()
            .players
            .iter()
            .map(|(id, player)| LiveHandle {
                id: *id,
                name: player.name.clone(),
                session: player.session,
            })
            .collect()
    }

    fn snapshot(&self, handle: &LiveHandle) -> CapabilityResult<LiveSnapshot> {
        self.read("snapshot", handle, SandboxPlayer::snapshot)
    }

    fn location(&self, handle: &LiveHandle) -> CapabilityResult<Location> {
        self.read("location", handle, |player| player.location.clone())
    }

    fn set_health(&self, handle: &LiveHandle, health: f32) -> CapabilityResult {
        self.mutate("set_health", handle, format!("{health}"), |player| {
            player.health = health.clamp(0.0, player.max_health);
        })
    }

    fn set_absorption(&self, handle: &LiveHandle, amount: f32) -> CapabilityResult {
        self.mutate("set_absorption", handle, format!("{amount}"), |player| {
            player.absorption = amount.max(0.0);
        })
    }

    fn set_food(
        &self,
        handle: &LiveHandle,
        food_level: u32,
        saturation: f32,
    ) -> CapabilityResult {
        self.mutate(
            "set_food",
            handle,
            format!("{food_level} {saturation}"),
            |player| {
                player.food_level = food_level.min(20);
                player.saturation = saturation;
            },
        )
    }

    fn set_game_mode(&self, handle: &LiveHandle, mode: GameMode) -> CapabilityResult {
        self.mutate("set_game_mode", handle, mode.to_string(), |player| {
            player.game_mode = mode;
            match mode {
                GameMode::Creative | GameMode::Spectator => player.can_fly = true,
                GameMode::Survival | GameMode::Adventure => {
                    player.can_fly = false;
                    player.is_flying = false;
                }
            }
        })
    }

    fn set_invulnerable(&self, handle: &LiveHandle, invulnerable: bool) -> CapabilityResult {
        self.mutate(
            "set_invulnerable",
            handle,
            invulnerable.to_string(),
            |player| player.invulnerable = invulnerable,
        )
    }

    fn set_flight(&self, handle: &LiveHandle, allowed: bool) -> CapabilityResult {
        self.mutate("set_flight", handle, allowed.to_string(), |player| {
            player.can_fly = allowed;
            if !allowed {
                player.is_flying = false;
            }
        })
    }

    fn set_visible(&self, handle: &LiveHandle, visible: bool) -> CapabilityResult {
        self.mutate("set_visible", handle, visible.to_string(), |player| {
            player.visible = visible;
        })
    }

    fn teleport(&self, handle: &LiveHandle, to: &Location) -> CapabilityResult {
        let detail = format!("{} {} {} {}", to.world, to.x, to.y, to.z);
        self.mutate("teleport", handle, detail, |player| {
            player.location = to.clone();
            player.velocity = [0.0; 3];
            player.fall_distance = 0.0;
        })
    }

    fn set_position(&self, handle: &LiveHandle, x: f64, y: f64, z: f64) -> CapabilityResult {
        self.mutate("set_position", handle, format!("{x} {y} {z}"), |player| {
            player.location.x = x;
            player.location.y = y;
            player.location.z = z;
        })
    }

    fn set_velocity(&self, handle: &LiveHandle, x: f64, y: f64, z: f64) -> CapabilityResult {
        self.mutate("set_velocity", handle, format!("{x} {y} {z}"), |player| {
            player.velocity = [x, y, z];
        })
    }

    fn clear_fall_distance(&self, handle: &LiveHandle) -> CapabilityResult {
        self.mutate("clear_fall_distance", handle, String::new(), |player| {
            player.fall_distance = 0.0;
        })
    }

    fn deal_lethal_damage(&self, handle: &LiveHandle) -> CapabilityResult {
        let mut died = None;
        self.mutate("deal_lethal_damage", handle, String::new(), |player| {
            player.health = 0.0;
            if !player.dead {
                player.dead = true;
                died = Some(format!("{} was killed", player.name));
            }
        })?;
        if let Some(message) = died {
            self.lock().deaths.push((handle.id, message));
        }
        Ok(())
    }

    fn disconnect(&self, handle: &LiveHandle, message: &str) -> CapabilityResult {
        self.mutate("disconnect", handle, message.to_owned(), |_| {})?;
        self.lock().disconnects.push((handle.id, message.to_owned()));
        Ok(())
    }

    fn send_message(&self, handle: &LiveHandle, message: &str) -> CapabilityResult {
        self.mutate("send_message", handle, message.to_owned(), |player| {
            push_capped(&mut player.messages, MESSAGE_LOG_CAPACITY, message.to_owned());
        })
    }

    fn apply_effect(
        &self,
        handle: &LiveHandle,
        effect: StatusEffect,
        ticks: u32,
        amplifier: u8,
    ) -> CapabilityResult {
        let detail = format!("{effect} {ticks} {amplifier}");
        self.mutate("apply_effect", handle, detail, |player| {
            player.effects.insert(effect, (ticks.max(1), amplifier));
        })
    }

    fn clear_effects(&self, handle: &LiveHandle) -> CapabilityResult {
        self.mutate("clear_effects", handle, String::new(), |player| {
            player.effects.clear();
        })
    }

    fn clear_inventory(&self, handle: &LiveHandle) -> CapabilityResult {
        self.mutate("clear_inventory", handle, String::new(), |player| {
            player.inventory.clear();
        })
    }

    fn execute_command(&self, command: &str) -> CapabilityResult {
        let mut state = self.lock();
        push_capped(
            &mut state.calls,
            CALL_LOG_CAPACITY,
            CapabilityCall {
                operation: "execute_command",
                target: None,
                detail: command.to_owned(),
            },
        );
        if state.failing.contains("execute_command") {
            return Err(CapabilityError::Rejected {
                operation: "execute_command",
                reason: "injected failure".to_owned(),
            });
        }

        let mut words = command.split_whitespace();
        let verb = words.next().unwrap_or_default();
        let Some(target) = words.next() else {
            return Err(CapabilityError::Rejected {
                operation: "execute_command",
                reason: format!("missing target: {command}"),
            });
        };
        match verb {
            "ban" => {
                state.banned.insert(target.to_owned());
                let kicked: Vec<PlayerId> = state
                    .players
                    .iter()
                    .filter(|(id, player)| player.name == target || id.to_string() == target)
                    .map(|(id, _)| *id)
                    .collect();
                for id in kicked {
                    state
                        .disconnects
                        .push((id, "You are banned from this server.".to_owned()));
                }
                Ok(())
            }
            "pardon" => {
                state.banned.remove(target);
                Ok(())
            }
            _ => Err(CapabilityError::Rejected {
                operation: "execute_command",
                reason: format!("unknown command: {verb}"),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn stale_handle_is_detached() {
        let world = SandboxWorld::new();
        let id = PlayerId::from_name("Steve");
        let old = world.spawn(id, "Steve");
        let new = world.spawn(id, "Steve");
        assert_ne!(old.session, new.session);
        assert_eq!(
            world.set_health(&old, 1.0),
            Err(CapabilityError::Detached { player: id })
        );
        assert!(world.set_health(&new, 1.0).is_ok());

        world.despawn(id);
        assert!(world.location(&new).is_err());
    }

    #[test]
    fn gravity_pulls_to_ground() {
        let world = SandboxWorld::new();
        let id = PlayerId::from_name("Steve");
        world.spawn_at(id, "Steve", Location::new(OVERWORLD, 0.0, 66.0, 0.0));
        for _ in 0..40 {
            world.step();
        }
        let state = world.player_state(id).unwrap();
        assert!((state.location.y - GROUND_LEVEL).abs() < 1e-9);
        assert!(state.fall_distance.abs() < 1e-9);
        assert!((state.health - 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn long_fall_hurts_and_can_kill() {
        let world = SandboxWorld::new();
        let id = PlayerId::from_name("Steve");
        world.spawn_at(id, "Steve", Location::new(OVERWORLD, 0.0, 200.0, 0.0));
        for _ in 0..200 {
            world.step();
        }
        let state = world.player_state(id).unwrap();
        assert!(state.dead);
        let deaths = world.take_deaths();
        assert_eq!(deaths.len(), 1);
        assert!(deaths.first().unwrap().1.contains("fell"));

        assert!(world.respawn(id));
        assert!(!world.player_state(id).unwrap().dead);
    }

    #[test]
    fn effects_expire() {
        let world = SandboxWorld::new();
        let id = PlayerId::from_name("Steve");
        let handle = world.spawn(id, "Steve");
        world.apply_effect(&handle, StatusEffect::Speed, 2, 0).unwrap();
        world.step();
        assert!(world.player_state(id).unwrap().effects.contains_key(&StatusEffect::Speed));
        world.step();
        assert!(world.player_state(id).unwrap().effects.is_empty());
    }

    #[test]
    fn mutations_are_recorded_and_reads_are_not() {
        let world = SandboxWorld::new();
        let id = PlayerId::from_name("Steve");
        let handle = world.spawn(id, "Steve");
        world.snapshot(&handle).unwrap();
        world.set_velocity(&handle, 0.0, 0.0, 0.0).unwrap();
        let calls = world.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls.first().unwrap().operation, "set_velocity");
        assert_eq!(calls.first().unwrap().target, Some(id));
    }

    #[test]
    fn logs_stay_bounded() {
        const SENT: usize = CALL_LOG_CAPACITY * 3;
        let world = SandboxWorld::new();
        let id = PlayerId::from_name("Steve");
        let handle = world.spawn(id, "Steve");
        let mut last = String::new();
        for i in 0..SENT {
            last = format!("hello {i}");
            world.send_message(&handle, &last).unwrap();
        }
        let calls = world.calls();
        assert_eq!(calls.len(), CALL_LOG_CAPACITY);
        assert_eq!(calls.last().unwrap().detail, last);

        let messages = world.player_state(id).unwrap().messages;
        assert_eq!(messages.len(), MESSAGE_LOG_CAPACITY);
        assert_eq!(messages.back(), Some(&last));
    }

    #[test]
    fn injected_failures_apply() {
        let world = SandboxWorld::new();
        let id = PlayerId::from_name("Steve");
        let handle = world.spawn(id, "Steve");
        world.fail_operation("teleport");
        assert!(matches!(
            world.teleport(&handle, &Location::default()),
            Err(CapabilityError::Rejected { .. })
        ));
        world.clear_failures();
        assert!(world.teleport(&handle, &Location::default()).is_ok());
    }

    #[test]
    fn ban_command_disconnects_and_pardon_lifts() {
        let world = SandboxWorld::new();
        let id = PlayerId::from_name("Steve");
        world.spawn(id, "Steve");
        world.execute_command("ban Steve griefing").unwrap();
        assert!(world.is_banned("Steve"));
        assert_eq!(world.take_disconnects().len(), 1);

        world.execute_command("pardon Steve").unwrap();
        assert!(!world.is_banned("Steve"));
        assert!(world.execute_command("op Steve").is_err());
    }

    #[test]
    fn disconnect_is_queued() {
        let world = SandboxWorld::new();
        let id = PlayerId::from_name("Steve");
        let handle = world.spawn(id, "Steve");
        world.disconnect(&handle, "bye").unwrap();
        assert_eq!(world.take_disconnects(), vec![(id, "bye".to_owned())]);
        assert!(world.take_disconnects().is_empty());
    }
}
