//! The sandbox host: owns the in-memory world and plays the role of the
//! game server's main thread.
//!
//! Each tick it nudges the scripted players, runs the control plane's
//! [`TickDriver`], then delivers the lifecycle events the world produced
//! (deaths and disconnects) back to the registry.

use std::sync::Arc;

use rand::Rng;
use rand::rngs::StdRng;
use tracing::{debug, info};
use warden_core::registry::StateRegistry;
use warden_core::runner::{TickDriver, TickSummary};
use warden_core::sandbox::SandboxWorld;
use warden_types::PlayerId;

/// Chance per tick that a bot changes direction.
const TURN_CHANCE: f64 = 0.05;
/// Chance per tick that a bot jumps.
const JUMP_CHANCE: f64 = 0.01;
/// Horizontal walking speed, blocks per second.
const WALK_SPEED: f64 = 4.3;
/// Initial upward speed of a jump, blocks per second.
const JUMP_SPEED: f64 = 8.4;

/// Drives the sandbox world and the control plane from one thread.
pub struct SandboxHost {
    world: Arc<SandboxWorld>,
    registry: Arc<StateRegistry>,
    driver: TickDriver,
    bots: Vec<PlayerId>,
    rng: StdRng,
}

impl SandboxHost {
    /// Assemble a host around an existing world, registry, and driver.
    pub const fn new(
        world: Arc<SandboxWorld>,
        registry: Arc<StateRegistry>,
        driver: TickDriver,
        rng: StdRng,
    ) -> Self {
        Self {
            world,
            registry,
            driver,
            bots: Vec::new(),
            rng,
        }
    }

    /// Connect scripted players. Each name maps to a stable identity, so a
    /// bot keeps its notes and history across restarts.
    pub fn join_bots(&mut self, names: &[String]) {
        for name in names {
            let id = PlayerId::from_name(name);
            if self.world.is_banned(name) {
                info!(bot = %name, "Skipping banned bot");
                continue;
            }
            let handle = self.world.spawn(id, name);
            self.registry.on_join(handle, None);
            if !self.bots.contains(&id) {
                self.bots.push(id);
            }
        }
        info!(count = self.bots.len(), "Bots joined");
    }

    /// Run one tick of the whole host.
    pub fn tick(&mut self) -> TickSummary {
        self.wander();
        let world = Arc::clone(&self.world);
        let summary = self.driver.run_tick(|| world.step());
        self.deliver_events();

        if summary.enforcement.corrected > 0 || summary.actions_applied > 0 {
            debug!(
                tick = summary.tick,
                actions = summary.actions_applied,
                corrected = summary.enforcement.corrected,
                "Tick"
            );
        }
        summary
    }

    /// Disconnect everyone still online and write the final snapshot.
    pub fn shutdown(&self) {
        let online = self.registry.list_online();
        for record in &online {
            self.registry.on_leave(record.id);
            self.world.despawn(record.id);
        }
        self.registry.flush();
        info!(players = online.len(), "Sandbox host stopped");
    }

    fn wander(&mut self) {
        for id in &self.bots {
            if !self.registry.is_online(*id) {
                continue;
            }
            if self.rng.random_bool(TURN_CHANCE) {
                let heading = self.rng.random_range(0.0..std::f64::consts::TAU);
                let speed = self.rng.random_range(0.0..=WALK_SPEED);
                self.world
                    .impulse(*id, heading.cos() * speed, 0.0, heading.sin() * speed);
            }
            if self.rng.random_bool(JUMP_CHANCE) {
                self.world.impulse(*id, 0.0, JUMP_SPEED, 0.0);
            }
        }
    }

    fn deliver_events(&self) {
        for (id, message) in self.world.take_deaths() {
            self.registry.on_death(id, &message);
            self.world.respawn(id);
        }
        for (id, reason) in self.world.take_disconnects() {
            if self.registry.on_leave(id) {
                info!(player = %id, %reason, "Disconnected");
            }
            self.world.despawn(id);
        }
    }
}
