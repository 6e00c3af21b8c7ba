//! Per-tick freeze enforcement.
//!
//! The simulation integrates movement every tick, so a frozen player
//! drifts unless pulled back every tick. [`TickEnforcer::on_tick`] runs
//! after the simulation's own movement step and restores each frozen
//! player to their anchor.
//!
//! Correction always targets the stored anchor, never the previous
//! position, so error cannot accumulate across ticks.

use std::sync::Arc;

use tracing::{debug, warn};

use warden_types::Location;

use crate::capability::LiveHandle;
use crate::registry::StateRegistry;

/// Default squared-distance tolerance before a correction is issued.
pub const DEFAULT_EPSILON: f64 = 0.001;

/// What one enforcement pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnforcementReport {
    /// Frozen online players examined.
    pub checked: usize,
    /// Players that had drifted and were moved back.
    pub corrected: usize,
    /// Corrections that needed the direct position write.
    pub fallbacks: usize,
    /// Players that could not be examined or corrected this tick.
    pub failures: usize,
}

/// Holds frozen players at their anchors.
pub struct TickEnforcer {
    registry: Arc<StateRegistry>,
    epsilon: f64,
}

impl TickEnforcer {
    /// An enforcer over `registry` with the given squared-distance tolerance.
    /// A negative or non-finite epsilon falls back to [`DEFAULT_EPSILON`].
    pub fn new(registry: Arc<StateRegistry>, epsilon: f64) -> Self {
        let epsilon = if epsilon.is_finite() && epsilon >= 0.0 {
            epsilon
        } else {
            DEFAULT_EPSILON
        };
        Self { registry, epsilon }
    }

    /// Run one enforcement pass. Never fails; problems with one player are
    /// logged and counted without affecting the others.
    pub fn on_tick(&self) -> EnforcementReport {
        let mut report = EnforcementReport::default();
        for (handle, anchor) in self.registry.frozen_targets() {
            report.checked = report.checked.saturating_add(1);
            match self.hold(&handle, anchor) {
                Hold::AtRest | Hold::Released => {}
                Hold::Corrected => {
                    report.corrected = report.corrected.saturating_add(1);
                }
                Hold::FellBack => {
                    report.corrected = report.corrected.saturating_add(1);
                    report.fallbacks = report.fallbacks.saturating_add(1);
                }
                Hold::Failed => report.failures = report.failures.saturating_add(1),
            }
        }
        report
    }

    fn hold(&self, handle: &LiveHandle, anchor: Option<Location>) -> Hold {
        let outcome = self.restore(handle, anchor);
        if !matches!(outcome, Hold::Released) {
            self.settle(handle);
        }
        outcome
    }

    /// Move the player back to the anchor if they drifted.
    fn restore(&self, handle: &LiveHandle, anchor: Option<Location>) -> Hold {
        let sim = self.registry.simulation();
        let current = match sim.location(handle) {
            Ok(location) => location,
            Err(err) => {
                debug!(player = %handle.id, %err, "Could not read frozen player location");
                return Hold::Failed;
            }
        };

        let anchor = match anchor {
            Some(anchor) => anchor,
            None => match self.registry.ensure_anchor(handle.id, current.clone()) {
                Some(anchor) => anchor,
                None => return Hold::Released,
            },
        };

        let drifted = current.world != anchor.world
            || current.distance_squared(&anchor) > self.epsilon;
        if !drifted {
            return Hold::AtRest;
        }
        let Err(err) = sim.teleport(handle, &anchor) else {
            return Hold::Corrected;
        };
        debug!(player = %handle.id, %err, "Freeze teleport failed, writing position");
        match sim.set_position(handle, anchor.x, anchor.y, anchor.z) {
            Ok(()) => Hold::FellBack,
            Err(err) => {
                warn!(player = %handle.id, %err, "Could not hold frozen player");
                Hold::Failed
            }
        }
    }

    /// Zero velocity and fall distance. Runs every tick for every frozen
    /// player, whether or not a correction was issued or succeeded.
    fn settle(&self, handle: &LiveHandle) {
        let sim = self.registry.simulation();
        if let Err(err) = sim.set_velocity(handle, 0.0, 0.0, 0.0) {
            debug!(player = %handle.id, %err, "Could not zero velocity");
        }
        if let Err(err) = sim.clear_fall_distance(handle) {
            debug!(player = %handle.id, %err, "Could not clear fall distance");
        }
    }
}

/// Result of holding one player for one tick.
enum Hold {
    AtRest,
    Corrected,
    FellBack,
    /// Unfrozen between listing and correction.
    Released,
    Failed,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::sandbox::SandboxWorld;
    use warden_types::PlayerId;

    fn setup() -> (Arc<SandboxWorld>, Arc<StateRegistry>, TickEnforcer, PlayerId) {
        let world = Arc::new(SandboxWorld::new());
        let registry = Arc::new(StateRegistry::new(world.clone()));
        let enforcer = TickEnforcer::new(Arc::clone(&registry), DEFAULT_EPSILON);
        let id = PlayerId::from_name("Steve");
        registry.on_join(world.spawn(id, "Steve"), None);
        (world, registry, enforcer, id)
    }

    #[test]
    fn drift_is_corrected_in_one_tick() {
        let (world, registry, enforcer, id) = setup();
        registry.set_frozen(id, true);
        let anchor = registry.frozen_anchor(id).unwrap();

        world.impulse(id, 4.0, 6.0, -3.0);
        world.step();
        world.step();
        assert!(world.player_state(id).unwrap().location.distance_squared(&anchor) > DEFAULT_EPSILON);

        let report = enforcer.on_tick();
        assert_eq!(report.checked, 1);
        assert_eq!(report.corrected, 1);

        let state = world.player_state(id).unwrap();
        assert!(state.location.distance_squared(&anchor) <= DEFAULT_EPSILON);
        assert!(state.velocity.iter().all(|v| v.abs() < 1e-12));
        assert!(state.fall_distance.abs() < 1e-12);
    }

    #[test]
    fn at_rest_issues_no_teleport() {
        let (world, registry, enforcer, id) = setup();
        registry.set_frozen(id, true);
        world.clear_calls();

        let report = enforcer.on_tick();
        assert_eq!(report.corrected, 0);
        let ops: Vec<&str> = world.calls().iter().map(|c| c.operation).collect();
        assert_eq!(ops, vec!["set_velocity", "clear_fall_distance"]);
    }

    #[test]
    fn world_change_is_reverted() {
        let (world, registry, enforcer, id) = setup();
        registry.set_frozen(id, true);
        world.change_world(id, "minecraft:the_nether");

        enforcer.on_tick();
        let state = world.player_state(id).unwrap();
        assert_eq!(state.location.world, "minecraft:overworld");
    }

    #[test]
    fn failed_teleport_falls_back_to_position_write() {
        let (world, registry, enforcer, id) = setup();
        registry.set_frozen(id, true);
        let anchor = registry.frozen_anchor(id).unwrap();
        world.nudge(id, 3.0, 0.0, 0.0);
        world.fail_operation("teleport");

        let report = enforcer.on_tick();
        assert_eq!(report.fallbacks, 1);
        let state = world.player_state(id).unwrap();
        assert!(state.location.distance_squared(&anchor) <= DEFAULT_EPSILON);
    }

    #[test]
    fn momentum_is_cleared_when_every_correction_fails() {
        let (world, registry, enforcer, id) = setup();
        registry.set_frozen(id, true);
        world.nudge(id, 3.0, 0.0, 0.0);
        world.impulse(id, 5.0, 5.0, 5.0);
        world.fail_operation("teleport");
        world.fail_operation("set_position");

        let report = enforcer.on_tick();
        assert_eq!(report.failures, 1);
        let state = world.player_state(id).unwrap();
        assert!(state.velocity.iter().all(|v| v.abs() < 1e-12));
        assert!(state.fall_distance.abs() < 1e-12);
    }

    #[test]
    fn momentum_is_cleared_when_location_is_unreadable() {
        let (world, registry, enforcer, id) = setup();
        registry.set_frozen(id, true);
        world.impulse(id, 0.0, 7.0, 0.0);
        world.fail_operation("location");

        assert_eq!(enforcer.on_tick().failures, 1);
        let state = world.player_state(id).unwrap();
        assert!(state.velocity.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn missing_anchor_is_captured_lazily() {
        let (world, registry, enforcer, id) = setup();
        world.fail_operation("location");
        registry.set_frozen(id, true);
        assert!(registry.frozen_anchor(id).is_none());

        let report = enforcer.on_tick();
        assert_eq!(report.failures, 1);

        world.clear_failures();
        enforcer.on_tick();
        let anchor = registry.frozen_anchor(id).unwrap();
        assert_eq!(anchor, world.player_state(id).unwrap().location);
    }

    #[test]
    fn holds_indefinitely_without_accumulating_error() {
        let (world, registry, enforcer, id) = setup();
        registry.set_frozen(id, true);
        let anchor = registry.frozen_anchor(id).unwrap();
        for _ in 0..500 {
            world.impulse(id, 0.3, 0.5, 0.2);
            world.step();
            enforcer.on_tick();
        }
        let state = world.player_state(id).unwrap();
        assert!(state.location.distance_squared(&anchor) <= DEFAULT_EPSILON);
    }

    #[test]
    fn unfrozen_and_offline_players_are_ignored() {
        let (world, registry, enforcer, id) = setup();
        registry.set_frozen(id, true);
        registry.set_frozen(id, false);
        assert_eq!(enforcer.on_tick().checked, 0);

        registry.set_frozen(id, true);
        registry.on_leave(id);
        world.clear_calls();
        assert_eq!(enforcer.on_tick().checked, 0);
        assert!(world.calls().is_empty());
    }

    #[test]
    fn bad_epsilon_uses_default() {
        let world = Arc::new(SandboxWorld::new());
        let registry = Arc::new(StateRegistry::new(world));
        let enforcer = TickEnforcer::new(registry, f64::NAN);
        assert!((enforcer.epsilon - DEFAULT_EPSILON).abs() < f64::EPSILON);
    }
}
