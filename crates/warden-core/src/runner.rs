//! The per-tick work the simulation thread performs for the control plane.
//!
//! [`TickDriver::run_tick`] is called once per simulation tick, on the
//! simulation thread, and does three things in order:
//!
//! 1. Runs queued admin actions against the registry.
//! 2. Lets the simulation integrate movement (the `integrate` closure).
//! 3. Runs the freeze enforcer, so frozen players end the tick at their
//!    anchor regardless of what the movement step did.
//!
//! Once per second of ticks it also refreshes every online snapshot.

use std::sync::Arc;

use tracing::{debug, info};
use warden_types::ActionOutcome;

use crate::enforcer::{EnforcementReport, TickEnforcer};
use crate::queue::ActionReceiver;
use crate::registry::StateRegistry;

/// Upper bound on actions executed in a single tick.
pub const DEFAULT_MAX_ACTIONS_PER_TICK: usize = 256;

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Queued actions that took effect.
    pub actions_applied: usize,
    /// Queued actions that did not (target offline, unknown effect, failure).
    pub actions_rejected: usize,
    /// Freeze enforcement result.
    pub enforcement: EnforcementReport,
}

/// Drives the registry and enforcer from the simulation loop.
pub struct TickDriver {
    registry: Arc<StateRegistry>,
    enforcer: TickEnforcer,
    actions: ActionReceiver,
    tick: u64,
    sync_every: u64,
    max_actions_per_tick: usize,
}

impl TickDriver {
    /// Create a driver. `epsilon` is the freeze tolerance.
    pub fn new(registry: Arc<StateRegistry>, actions: ActionReceiver, epsilon: f64) -> Self {
        let enforcer = TickEnforcer::new(Arc::clone(&registry), epsilon);
        let sync_every = u64::from(registry.ticks_per_second());
        Self {
            registry,
            enforcer,
            actions,
            tick: 0,
            sync_every,
            max_actions_per_tick: DEFAULT_MAX_ACTIONS_PER_TICK,
        }
    }

    /// Cap how many queued actions one tick executes. Zero is raised to 1.
    #[must_use]
    pub fn with_max_actions_per_tick(mut self, max: usize) -> Self {
        self.max_actions_per_tick = max.max(1);
        self
    }

    /// Ticks completed so far.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Run one tick. `integrate` advances the simulation's own movement.
    pub fn run_tick(&mut self, integrate: impl FnOnce()) -> TickSummary {
        self.tick = self.tick.saturating_add(1);
        let mut summary = TickSummary {
            tick: self.tick,
            ..TickSummary::default()
        };

        for scheduled in self.actions.drain(self.max_actions_per_tick) {
            let outcome = self.registry.perform(&scheduled);
            if outcome.is_success() {
                summary.actions_applied = summary.actions_applied.saturating_add(1);
            } else {
                summary.actions_rejected = summary.actions_rejected.saturating_add(1);
                match &outcome {
                    ActionOutcome::NotOnline => debug!(
                        tick = self.tick,
                        player = %scheduled.target,
                        action = scheduled.action.name(),
                        "Queued action skipped, target left"
                    ),
                    other => info!(
                        tick = self.tick,
                        player = %scheduled.target,
                        action = scheduled.action.name(),
                        outcome = ?other,
                        "Queued action not applied"
                    ),
                }
            }
        }

        integrate();
        summary.enforcement = self.enforcer.on_tick();

        if self.tick.checked_rem(self.sync_every) == Some(0) {
            self.registry.sync_live_snapshots();
        }
        summary
    }
}
