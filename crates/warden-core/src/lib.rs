//! Player-state registry, freeze enforcement, and simulation plumbing for
//! the Warden control plane.
//!
//! This crate owns everything that runs on or next to the simulation
//! thread. The HTTP surface lives in `warden-api` and only talks to the
//! [`StateRegistry`] and the [`ActionQueue`].
//!
//! # Modules
//!
//! - [`audit`] -- Optional [`AuditSink`] hooks for deaths and mode changes.
//! - [`capability`] -- The [`Simulation`] trait the registry acts through.
//! - [`clock`] -- Wall-clock abstraction with a manual clock for tests.
//! - [`config`] -- Loading `warden-config.yaml` into typed structs.
//! - [`enforcer`] -- Per-tick freeze enforcement.
//! - [`persistence`] -- Best-effort JSON snapshot of notes and sessions.
//! - [`queue`] -- Bounded action hand-off to the simulation thread.
//! - [`registry`] -- The concurrent [`StateRegistry`].
//! - [`runner`] -- [`TickDriver`], the per-tick entry point.
//! - [`sandbox`] -- [`SandboxWorld`], an in-memory simulation.
//! - [`session`] -- Session open/close bookkeeping.
//!
//! [`AuditSink`]: audit::AuditSink
//! [`Simulation`]: capability::Simulation
//! [`StateRegistry`]: registry::StateRegistry
//! [`ActionQueue`]: queue::ActionQueue
//! [`TickDriver`]: runner::TickDriver
//! [`SandboxWorld`]: sandbox::SandboxWorld

pub mod audit;
pub mod capability;
pub mod clock;
pub mod config;
pub mod enforcer;
pub mod persistence;
pub mod queue;
pub mod registry;
pub mod runner;
pub mod sandbox;
pub mod session;
