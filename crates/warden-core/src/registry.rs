//! The concurrent player-state registry.
//!
//! [`StateRegistry`] owns every [`PlayerRecord`] together with the
//! admin-applied flags (frozen, god mode, vanish), notes, and session
//! history. It is shared as an `Arc` between the simulation thread, which
//! delivers lifecycle events and runs queued actions, and the HTTP workers,
//! which read it.
//!
//! # Locking
//!
//! All maps live behind a single [`RwLock`] so a compound mutation (join,
//! leave, freeze toggle) is atomic to readers. Simulation capability calls
//! are made either outside the lock or while holding it, never the other
//! way round: the simulation never calls back into the registry.
//!
//! Persistence runs after the lock is released, serialized by a separate
//! writer mutex so two snapshots never interleave on disk.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};
use warden_types::{
    ActionOutcome, AdminAction, GameMode, Location, PlayerId, PlayerList, PlayerRecord,
    PlayerView, RECENT_SESSIONS, ScheduledAction, SessionRecord, StatusEffect,
    format_play_time,
};

use crate::audit::AuditSink;
use crate::capability::{CapabilityResult, LiveHandle, Simulation};
use crate::clock::{Clock, SystemClock};
use crate::persistence::{DataStore, PersistedData};
use crate::session::SessionTracker;

/// Default simulation tick rate.
pub const DEFAULT_TICKS_PER_SECOND: u32 = 20;
/// Reason used when a kick request carries none.
pub const DEFAULT_KICK_REASON: &str = "Kicked by admin";
/// Reason used when a ban request carries none.
pub const DEFAULT_BAN_REASON: &str = "Banned by admin";

const HEAL_REGEN_TICKS: u32 = 100;
const HEAL_REGEN_AMPLIFIER: u8 = 1;
const FULL_FOOD: u32 = 20;
const FULL_SATURATION: f32 = 20.0;

/// An online player: the record plus the handle to reach them.
#[derive(Debug, Clone)]
struct TrackedPlayer {
    record: PlayerRecord,
    handle: LiveHandle,
}

#[derive(Debug, Default)]
struct RegistryInner {
    online: HashMap<PlayerId, TrackedPlayer>,
    offline: HashMap<PlayerId, PlayerRecord>,
    /// Frozen players and their anchor. `None` until an anchor is captured.
    frozen: HashMap<PlayerId, Option<Location>>,
    invulnerable: HashSet<PlayerId>,
    hidden: HashSet<PlayerId>,
    notes: BTreeMap<PlayerId, String>,
    sessions: SessionTracker,
}

impl RegistryInner {
    fn record(&self, id: PlayerId) -> Option<&PlayerRecord> {
        self.online
            .get(&id)
            .map(|tracked| &tracked.record)
            .or_else(|| self.offline.get(&id))
    }

    fn view(&self, record: &PlayerRecord) -> PlayerView {
        let id = record.id;
        let snapshot = &record.snapshot;
        let online = record.online;
        PlayerView {
            uuid: id,
            username: record.username.clone(),
            online,
            last_seen: record.last_seen,
            first_joined: record.first_seen,
            health: snapshot.health,
            max_health: snapshot.max_health,
            food_level: snapshot.food_level,
            saturation_level: snapshot.saturation,
            game_mode: snapshot.game_mode,
            x: snapshot.location.x,
            y: snapshot.location.y,
            z: snapshot.location.z,
            dimension: snapshot.location.world.clone(),
            experience_level: snapshot.experience_level,
            experience_progress: snapshot.experience_progress,
            total_play_time: record.total_play_time_ms,
            total_play_time_formatted: format_play_time(record.total_play_time_ms),
            health_percentage: record.health_percentage(),
            inventory: snapshot.inventory.main.clone(),
            hotbar: snapshot.inventory.hotbar.clone(),
            armor: snapshot.inventory.armor.clone(),
            offhand: snapshot.inventory.offhand.clone(),
            note: self.notes.get(&id).cloned().unwrap_or_default(),
            frozen: self.frozen.contains_key(&id),
            god_mode: self.invulnerable.contains(&id),
            vanished: self.hidden.contains(&id),
            can_fly: online.then_some(snapshot.can_fly),
            is_flying: online.then_some(snapshot.is_flying),
            sessions: self.sessions.recent(id, RECENT_SESSIONS),
        }
    }
}

/// Single source of truth for player state.
pub struct StateRegistry {
    inner: RwLock<RegistryInner>,
    sim: Arc<dyn Simulation>,
    clock: Arc<dyn Clock>,
    store: Option<DataStore>,
    writer: Mutex<()>,
    audit: Option<Arc<dyn AuditSink>>,
    ticks_per_second: u32,
}

impl StateRegistry {
    /// An empty registry over the given simulation, using the system clock
    /// and no persistence.
    pub fn new(sim: Arc<dyn Simulation>) -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
            sim,
            clock: Arc::new(SystemClock),
            store: None,
            writer: Mutex::new(()),
            audit: None,
            ticks_per_second: DEFAULT_TICKS_PER_SECOND,
        }
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Load notes and session history from `store` and write through to it
    /// from now on.
    ///
    /// An unreadable file is logged and the registry starts empty.
    #[must_use]
    pub fn with_store(mut self, store: DataStore) -> Self {
        match store.load() {
            Ok(data) => {
                info!(
                    path = %store.path().display(),
                    notes = data.notes.len(),
                    players_with_sessions = data.sessions.len(),
                    "Loaded player data"
                );
                let inner = self.inner.get_mut().unwrap_or_else(PoisonError::into_inner);
                inner.notes = data.notes;
                inner.sessions = SessionTracker::from_history(data.sessions);
            }
            Err(err) => {
                warn!(path = %store.path().display(), %err, "Failed to load player data, starting empty");
            }
        }
        self.store = Some(store);
        self
    }

    /// Install an audit sink.
    #[must_use]
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    /// Set the tick rate used to convert effect durations. Zero is raised to 1.
    #[must_use]
    pub fn with_ticks_per_second(mut self, ticks_per_second: u32) -> Self {
        self.ticks_per_second = ticks_per_second.max(1);
        self
    }

    /// The simulation this registry drives.
    pub const fn simulation(&self) -> &Arc<dyn Simulation> {
        &self.sim
    }

    /// Configured tick rate.
    pub const fn ticks_per_second(&self) -> u32 {
        self.ticks_per_second
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle_for(&self, id: PlayerId) -> Option<LiveHandle> {
        self.read().online.get(&id).map(|tracked| tracked.handle.clone())
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// A player connected.
    ///
    /// Creates or reuses the record, captures the live snapshot, opens a
    /// session, and moves the player into the online set.
    pub fn on_join(&self, handle: LiveHandle, origin_address: Option<String>) {
        let id = handle.id;
        let username = handle.name.clone();
        let now = self.clock.now_millis();
        let snapshot = self.sim.snapshot(&handle);
        if let Err(err) = &snapshot {
            warn!(player = %id, %err, "Could not capture snapshot on join");
        }

        {
            let mut inner = self.write();
            let previous = inner.online.remove(&id);
            let mut record = match previous {
                Some(tracked) => {
                    // Reconnect without a leave: account for the old session.
                    let mut record = tracked.record;
                    if let Some(elapsed) = inner.sessions.close(id, now) {
                        record.total_play_time_ms =
                            record.total_play_time_ms.saturating_add(elapsed);
                    }
                    record
                }
                None => inner
                    .offline
                    .remove(&id)
                    .unwrap_or_else(|| PlayerRecord::new(id, username.clone(), now)),
            };
            record.username.clone_from(&username);
            record.online = true;
            record.last_seen = now;
            if let Ok(snapshot) = snapshot {
                record.snapshot = snapshot;
            }
            inner.sessions.open(id, now, origin_address);
            inner.online.insert(id, TrackedPlayer { record, handle });
        }

        info!(player = %id, username = %username, "Player joined");
        self.persist();
    }

    /// A player disconnected.
    ///
    /// Closes the open session, adds its duration to the play time, keeps
    /// the last snapshot, moves the record offline, and clears the frozen,
    /// god mode, and vanish flags. Returns `false` if the player was not
    /// online.
    pub fn on_leave(&self, id: PlayerId) -> bool {
        let Some(handle) = self.handle_for(id) else {
            return false;
        };
        let last_snapshot = self.sim.snapshot(&handle).ok();
        let now = self.clock.now_millis();

        let username = {
            let mut inner = self.write();
            let Some(tracked) = inner.online.remove(&id) else {
                return false;
            };
            let mut record = tracked.record;
            if let Some(elapsed) = inner.sessions.close(id, now) {
                record.total_play_time_ms = record.total_play_time_ms.saturating_add(elapsed);
            }
            if let Some(snapshot) = last_snapshot {
                record.snapshot = snapshot;
            }
            record.online = false;
            record.last_seen = now;
            let username = record.username.clone();
            inner.offline.insert(id, record);
            inner.frozen.remove(&id);
            inner.invulnerable.remove(&id);
            inner.hidden.remove(&id);
            username
        };

        info!(player = %id, %username, "Player left");
        self.persist();
        true
    }

    /// A player died. Forwarded to the audit sink, if any.
    pub fn on_death(&self, id: PlayerId, message: &str) {
        let Some(sink) = &self.audit else {
            return;
        };
        let username = self
            .read()
            .record(id)
            .map(|record| record.username.clone())
            .unwrap_or_default();
        sink.on_death(id, &username, message);
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// The record for a player, online set first.
    pub fn get(&self, id: PlayerId) -> Option<PlayerRecord> {
        self.read().record(id).cloned()
    }

    /// Whether the player is connected.
    pub fn is_online(&self, id: PlayerId) -> bool {
        self.read().online.contains_key(&id)
    }

    /// Copies of every online record, sorted by username.
    pub fn list_online(&self) -> Vec<PlayerRecord> {
        let mut list: Vec<PlayerRecord> = self
            .read()
            .online
            .values()
            .map(|tracked| tracked.record.clone())
            .collect();
        sort_records(&mut list);
        list
    }

    /// Copies of every offline record, sorted by username.
    pub fn list_offline(&self) -> Vec<PlayerRecord> {
        let mut list: Vec<PlayerRecord> = self.read().offline.values().cloned().collect();
        sort_records(&mut list);
        list
    }

    /// Copies of every record, online and offline, sorted by username.
    pub fn list_all(&self) -> Vec<PlayerRecord> {
        let mut list = {
            let inner = self.read();
            inner
                .online
                .values()
                .map(|tracked| tracked.record.clone())
                .chain(inner.offline.values().cloned())
                .collect::<Vec<_>>()
        };
        sort_records(&mut list);
        list
    }

    /// The admin note for a player.
    pub fn get_note(&self, id: PlayerId) -> Option<String> {
        self.read().notes.get(&id).cloned()
    }

    /// Full session history for a player.
    pub fn sessions(&self, id: PlayerId) -> Vec<SessionRecord> {
        self.read().sessions.history(id).to_vec()
    }

    /// Whether the player is frozen.
    pub fn is_frozen(&self, id: PlayerId) -> bool {
        self.read().frozen.contains_key(&id)
    }

    /// The stored freeze anchor, if frozen and captured.
    pub fn frozen_anchor(&self, id: PlayerId) -> Option<Location> {
        self.read().frozen.get(&id).cloned().flatten()
    }

    /// Whether god mode is on.
    pub fn is_invulnerable(&self, id: PlayerId) -> bool {
        self.read().invulnerable.contains(&id)
    }

    /// Whether the player is vanished.
    pub fn is_hidden(&self, id: PlayerId) -> bool {
        self.read().hidden.contains(&id)
    }

    /// The external view of one player, refreshed from the simulation if
    /// they are online.
    pub fn record_as_external(&self, id: PlayerId) -> Option<PlayerView> {
        if let Some(handle) = self.handle_for(id) {
            self.refresh(&handle);
        }
        let inner = self.read();
        inner.record(id).map(|record| inner.view(record))
    }

    /// External views of every player, split by presence.
    pub fn list_views(&self) -> PlayerList {
        self.sync_live_snapshots();
        let inner = self.read();
        let mut online: Vec<PlayerView> = inner
            .online
            .values()
            .map(|tracked| inner.view(&tracked.record))
            .collect();
        let mut offline: Vec<PlayerView> =
            inner.offline.values().map(|record| inner.view(record)).collect();
        drop(inner);
        online.sort_by(|a, b| a.username.cmp(&b.username));
        offline.sort_by(|a, b| a.username.cmp(&b.username));
        PlayerList { online, offline }
    }

    /// Re-read every online player's live snapshot.
    pub fn sync_live_snapshots(&self) {
        let handles: Vec<LiveHandle> = self
            .read()
            .online
            .values()
            .map(|tracked| tracked.handle.clone())
            .collect();
        for handle in &handles {
            self.refresh(handle);
        }
    }

    fn refresh(&self, handle: &LiveHandle) {
        let snapshot = match self.sim.snapshot(handle) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                debug!(player = %handle.id, %err, "Snapshot refresh failed");
                return;
            }
        };
        let now = self.clock.now_millis();
        let mut inner = self.write();
        if let Some(tracked) = inner.online.get_mut(&handle.id) {
            // A reconnect may have replaced the handle meanwhile.
            if tracked.handle.session == handle.session {
                tracked.record.snapshot = snapshot;
                tracked.record.last_seen = now;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    /// Execute a queued action.
    pub fn perform(&self, scheduled: &ScheduledAction) -> ActionOutcome {
        let id = scheduled.target;
        match &scheduled.action {
            AdminAction::Heal => self.heal(id),
            AdminAction::Feed => self.feed(id),
            AdminAction::SetGameMode { mode } => self.set_game_mode(id, *mode),
            AdminAction::Kill => self.kill(id),
            AdminAction::RemoveHunger => self.remove_hunger(id),
            AdminAction::ClearInventory => self.clear_inventory(id),
            AdminAction::Teleport { x, y, z } => self.teleport(id, *x, *y, *z),
            AdminAction::Kick { reason } => self.kick(id, reason),
            AdminAction::Freeze { frozen } => self.set_frozen(id, *frozen),
            AdminAction::ToggleGodMode => self.toggle_god_mode(id),
            AdminAction::ToggleFly => self.toggle_fly(id),
            AdminAction::ToggleVanish => self.toggle_vanish(id),
            AdminAction::SetNote { note } => self.set_note(id, note),
            AdminAction::ApplyEffect {
                effect,
                duration_seconds,
                amplifier,
            } => self.apply_effect(id, effect, *duration_seconds, *amplifier),
            AdminAction::ClearEffects => self.clear_effects(id),
            AdminAction::Broadcast { message } => self.broadcast(message),
            AdminAction::Ban { reason } => self.ban(id, reason),
            AdminAction::Unban => self.unban(id),
        }
    }

    fn run_capability(
        &self,
        id: PlayerId,
        action: &'static str,
        call: impl FnOnce(&LiveHandle) -> CapabilityResult,
    ) -> ActionOutcome {
        let Some(handle) = self.handle_for(id) else {
            debug!(player = %id, action, "Target not online");
            return ActionOutcome::NotOnline;
        };
        match call(&handle) {
            Ok(()) => {
                info!(player = %id, username = %handle.name, action, "Admin action applied");
                ActionOutcome::Applied
            }
            Err(err) => {
                warn!(player = %id, action, %err, "Admin action failed");
                ActionOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Restore full health, add a short regeneration, and reset absorption.
    pub fn heal(&self, id: PlayerId) -> ActionOutcome {
        self.run_capability(id, "heal", |handle| {
            let max_health = self.sim.snapshot(handle)?.max_health;
            self.sim.set_health(handle, max_health)?;
            self.sim.apply_effect(
                handle,
                StatusEffect::Regeneration,
                HEAL_REGEN_TICKS,
                HEAL_REGEN_AMPLIFIER,
            )?;
            if let Err(err) = self.sim.set_absorption(handle, 0.0) {
                debug!(player = %handle.id, %err, "Could not reset absorption");
            }
            Ok(())
        })
    }

    /// Fill food and saturation.
    pub fn feed(&self, id: PlayerId) -> ActionOutcome {
        self.run_capability(id, "feed", |handle| {
            self.sim.set_food(handle, FULL_FOOD, FULL_SATURATION)
        })
    }

    /// Empty food and saturation.
    pub fn remove_hunger(&self, id: PlayerId) -> ActionOutcome {
        self.run_capability(id, "removehunger", |handle| {
            self.sim.set_food(handle, 0, 0.0)
        })
    }

    /// Disconnect with `reason`, or the default reason when blank.
    pub fn kick(&self, id: PlayerId, reason: &str) -> ActionOutcome {
        let reason = non_blank(reason).unwrap_or(DEFAULT_KICK_REASON);
        self.run_capability(id, "kick", |handle| self.sim.disconnect(handle, reason))
    }

    /// Kill the player.
    pub fn kill(&self, id: PlayerId) -> ActionOutcome {
        self.run_capability(id, "kill", |handle| self.sim.deal_lethal_damage(handle))
    }

    /// Remove every item.
    pub fn clear_inventory(&self, id: PlayerId) -> ActionOutcome {
        self.run_capability(id, "clearinventory", |handle| {
            self.sim.clear_inventory(handle)
        })
    }

    /// Move within the player's current world, keeping their orientation.
    pub fn teleport(&self, id: PlayerId, x: f64, y: f64, z: f64) -> ActionOutcome {
        self.run_capability(id, "teleport", |handle| {
            let current = self.sim.location(handle)?;
            let target = Location {
                x,
                y,
                z,
                ..current
            };
            self.sim.teleport(handle, &target)
        })
    }

    /// Apply a status effect by key.
    ///
    /// The duration is clamped to at least one second and the amplifier to
    /// 0..=255 before conversion to ticks.
    pub fn apply_effect(
        &self,
        id: PlayerId,
        effect_key: &str,
        duration_seconds: i64,
        amplifier: i64,
    ) -> ActionOutcome {
        let Some(effect) = StatusEffect::from_key(effect_key) else {
            debug!(player = %id, effect = effect_key, "Unknown effect");
            return ActionOutcome::UnknownEffect {
                key: effect_key.to_owned(),
            };
        };
        let seconds = u32::try_from(duration_seconds.max(1)).unwrap_or(u32::MAX);
        let ticks = seconds.saturating_mul(self.ticks_per_second);
        let amplifier = u8::try_from(amplifier.clamp(0, i64::from(u8::MAX))).unwrap_or(u8::MAX);
        self.run_capability(id, "effect", |handle| {
            self.sim.apply_effect(handle, effect, ticks, amplifier)
        })
    }

    /// Remove every status effect.
    pub fn clear_effects(&self, id: PlayerId) -> ActionOutcome {
        self.run_capability(id, "cleareffects", |handle| self.sim.clear_effects(handle))
    }

    /// Switch game mode and report the change to the audit sink.
    pub fn set_game_mode(&self, id: PlayerId, mode: GameMode) -> ActionOutcome {
        self.run_capability(id, "setgamemode", |handle| {
            let previous = self.sim.snapshot(handle)?.game_mode;
            self.sim.set_game_mode(handle, mode)?;
            if let Some(sink) = &self.audit {
                sink.on_game_mode_change(id, &handle.name, previous, mode);
            }
            Ok(())
        })
    }

    /// Flip invulnerability.
    pub fn toggle_god_mode(&self, id: PlayerId) -> ActionOutcome {
        let mut inner = self.write();
        let Some(handle) = inner.online.get(&id).map(|tracked| tracked.handle.clone()) else {
            return ActionOutcome::NotOnline;
        };
        let enable = !inner.invulnerable.contains(&id);
        if let Err(err) = self.sim.set_invulnerable(&handle, enable) {
            warn!(player = %id, %err, "Failed to toggle god mode");
            return ActionOutcome::Failed {
                reason: err.to_string(),
            };
        }
        if enable {
            inner.invulnerable.insert(id);
        } else {
            inner.invulnerable.remove(&id);
        }
        drop(inner);

        info!(player = %id, enabled = enable, "Toggled god mode");
        self.notify(
            &handle,
            if enable {
                "God mode enabled!"
            } else {
                "God mode disabled!"
            },
        );
        ActionOutcome::Applied
    }

    /// Flip flight permission. Disabling also ends active flight.
    pub fn toggle_fly(&self, id: PlayerId) -> ActionOutcome {
        let Some(handle) = self.handle_for(id) else {
            return ActionOutcome::NotOnline;
        };
        let result = self.sim.snapshot(&handle).and_then(|snapshot| {
            let enable = !snapshot.can_fly;
            self.sim.set_flight(&handle, enable).map(|()| enable)
        });
        match result {
            Ok(enable) => {
                info!(player = %id, enabled = enable, "Toggled flight");
                self.notify(
                    &handle,
                    if enable {
                        "Flight enabled!"
                    } else {
                        "Flight disabled!"
                    },
                );
                ActionOutcome::Applied
            }
            Err(err) => {
                warn!(player = %id, %err, "Failed to toggle flight");
                ActionOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Flip visibility to other players.
    pub fn toggle_vanish(&self, id: PlayerId) -> ActionOutcome {
        let mut inner = self.write();
        let Some(handle) = inner.online.get(&id).map(|tracked| tracked.handle.clone()) else {
            return ActionOutcome::NotOnline;
        };
        let hide = !inner.hidden.contains(&id);
        if let Err(err) = self.sim.set_visible(&handle, !hide) {
            warn!(player = %id, %err, "Failed to toggle vanish");
            return ActionOutcome::Failed {
                reason: err.to_string(),
            };
        }
        if hide {
            inner.hidden.insert(id);
        } else {
            inner.hidden.remove(&id);
        }
        drop(inner);

        info!(player = %id, vanished = hide, "Toggled vanish");
        self.notify(
            &handle,
            if hide {
                "You are now invisible to other players!"
            } else {
                "You are now visible to other players!"
            },
        );
        ActionOutcome::Applied
    }

    /// Freeze or release a player.
    ///
    /// Freezing captures the current location as the anchor. Freezing an
    /// already frozen player keeps the original anchor. If the location
    /// cannot be read the anchor stays empty and the enforcer captures it
    /// on its next tick.
    pub fn set_frozen(&self, id: PlayerId, frozen: bool) -> ActionOutcome {
        let mut inner = self.write();
        let Some(handle) = inner.online.get(&id).map(|tracked| tracked.handle.clone()) else {
            return ActionOutcome::NotOnline;
        };
        if frozen {
            if !inner.frozen.contains_key(&id) {
                let anchor = match self.sim.location(&handle) {
                    Ok(location) => Some(location),
                    Err(err) => {
                        warn!(player = %id, %err, "Could not capture freeze anchor");
                        None
                    }
                };
                inner.frozen.insert(id, anchor);
            }
        } else {
            inner.frozen.remove(&id);
        }
        drop(inner);

        info!(player = %id, frozen, "Updated freeze");
        self.notify(
            &handle,
            if frozen {
                "You have been frozen by an administrator!"
            } else {
                "You have been unfrozen!"
            },
        );
        ActionOutcome::Applied
    }

    /// Replace the note. A blank note deletes it.
    pub fn set_note(&self, id: PlayerId, note: &str) -> ActionOutcome {
        {
            let mut inner = self.write();
            match non_blank(note) {
                Some(note) => {
                    inner.notes.insert(id, note.to_owned());
                }
                None => {
                    inner.notes.remove(&id);
                }
            }
        }
        info!(player = %id, "Updated note");
        self.persist();
        ActionOutcome::Applied
    }

    /// Send `[Announcement] <message>` to every online player.
    ///
    /// A blank message does nothing.
    pub fn broadcast(&self, message: &str) -> ActionOutcome {
        let Some(message) = non_blank(message) else {
            return ActionOutcome::Applied;
        };
        let text = format!("[Announcement] {message}");
        let handles: Vec<LiveHandle> = self
            .read()
            .online
            .values()
            .map(|tracked| tracked.handle.clone())
            .collect();
        for handle in &handles {
            if let Err(err) = self.sim.send_message(handle, &text) {
                warn!(player = %handle.id, %err, "Broadcast delivery failed");
            }
        }
        info!(recipients = handles.len(), "Broadcast sent");
        ActionOutcome::Applied
    }

    /// Ban through the server's moderation command.
    pub fn ban(&self, id: PlayerId, reason: &str) -> ActionOutcome {
        let reason = non_blank(reason).unwrap_or(DEFAULT_BAN_REASON);
        let command = format!("ban {} {reason}", self.command_target(id));
        self.run_command(id, "ban", &command)
    }

    /// Lift a ban through the server's moderation command.
    pub fn unban(&self, id: PlayerId) -> ActionOutcome {
        let command = format!("pardon {}", self.command_target(id));
        self.run_command(id, "unban", &command)
    }

    /// Username if online, otherwise the identity string.
    fn command_target(&self, id: PlayerId) -> String {
        self.read()
            .online
            .get(&id)
            .map_or_else(|| id.to_string(), |tracked| tracked.record.username.clone())
    }

    fn run_command(&self, id: PlayerId, action: &'static str, command: &str) -> ActionOutcome {
        match self.sim.execute_command(command) {
            Ok(()) => {
                info!(player = %id, action, command, "Moderation command executed");
                ActionOutcome::Applied
            }
            Err(err) => {
                warn!(player = %id, action, %err, "Moderation command failed");
                ActionOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }

    fn notify(&self, handle: &LiveHandle, message: &str) {
        if let Err(err) = self.sim.send_message(handle, message) {
            debug!(player = %handle.id, %err, "Could not message player");
        }
    }

    // -----------------------------------------------------------------------
    // Freeze support for the tick enforcer
    // -----------------------------------------------------------------------

    /// Online frozen players with their stored anchor.
    pub fn frozen_targets(&self) -> Vec<(LiveHandle, Option<Location>)> {
        let inner = self.read();
        inner
            .frozen
            .iter()
            .filter_map(|(id, anchor)| {
                inner
                    .online
                    .get(id)
                    .map(|tracked| (tracked.handle.clone(), anchor.clone()))
            })
            .collect()
    }

    /// Store `candidate` as the anchor if the player is frozen without one.
    ///
    /// Returns the anchor now in effect, or `None` if the player is no
    /// longer frozen.
    pub fn ensure_anchor(&self, id: PlayerId, candidate: Location) -> Option<Location> {
        let mut inner = self.write();
        let slot = inner.frozen.get_mut(&id)?;
        Some(slot.get_or_insert(candidate).clone())
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Write notes and session history now.
    pub fn flush(&self) {
        if self.store.is_some() {
            self.persist();
            info!("Player data flushed");
        }
    }

    fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let data = {
            let inner = self.read();
            PersistedData {
                notes: inner.notes.clone(),
                sessions: inner.sessions.export(),
            }
        };
        if let Err(err) = store.save(&data) {
            warn!(path = %store.path().display(), %err, "Failed to persist player data");
        }
    }
}

fn sort_records(list: &mut [PlayerRecord]) {
    list.sort_by(|a, b| a.username.cmp(&b.username).then(a.id.cmp(&b.id)));
}

fn non_blank(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
