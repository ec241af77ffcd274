//! `helm-runtime` – the autopilot's decision engine.
//!
//! Every tick flows up from the snapshot and back down to the command sink:
//! the dispatcher picks a mode, the mode's strategy sets goals, the goal
//! store turns goals into power desires, and the allocator turns desires
//! into the handful of commands needed to move the ship's real power
//! distribution toward the desired one.
//!
//! # Modules
//!
//! - [`context`] – [`TickContext`] and the [`PolicyUnit`] trait every
//!   scheduling layer implements.  Readiness, lock and clamp queries live
//!   here so all layers agree on them.
//! - [`desire`] – [`Priority`] tiers, [`PowerDesire`] and the ordered
//!   [`DesireLedger`].
//! - [`allocator`] – [`PowerAllocator`]: greedy, priority-preemptive
//!   distribution of reactor power with battery escalation and lock holds.
//! - [`goal`] – the [`Goal`] sum type, its [`GoalKind`] key and the
//!   mutual-exclusion table.
//! - [`goal_store`] – [`GoalStore`]: active goals plus the per-domain logic
//!   (shields, oxygen, FTL, weapons, medbay) that files desires.
//! - [`strategy`] – [`IdleStrategy`] and [`BattleStrategy`] behind the
//!   [`ModeStrategy`] trait.
//! - [`dispatcher`] – [`ModeDispatcher`], the top-level unit.
//! - [`config`] – [`AutopilotConfig`] strategy thresholds.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: env-filtered
//!   console logging plus optional OTLP span export.
//!
//! # Errors
//!
//! Scheduling never fails.  Absent systems count as zero capacity, oversized
//! requests are clamped, and a command the sink rejects is logged and
//! recomputed next tick.

pub mod allocator;
pub mod config;
pub mod context;
pub mod desire;
pub mod dispatcher;
pub mod goal;
pub mod goal_store;
pub mod strategy;
pub mod telemetry;

pub use allocator::{POWER_PRIORITY_ORDER, PowerAllocator};
pub use config::AutopilotConfig;
pub use context::{PolicyUnit, TickContext};
pub use desire::{DesireLedger, PowerDesire, Priority};
pub use dispatcher::{Mode, ModeDispatcher};
pub use goal::{FractionRange, Goal, GoalKind, LevelRange};
pub use goal_store::GoalStore;
pub use strategy::{BattleStrategy, IdleStrategy, ModeStrategy};
pub use telemetry::{TracerProviderGuard, init_tracing};
