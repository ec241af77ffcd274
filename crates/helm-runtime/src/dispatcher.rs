//! [`ModeDispatcher`] – the top-level policy unit.
//!
//! Each tick the dispatcher classifies the situation (live target or not),
//! runs exactly one [`ModeStrategy`] to update the goals, then runs the
//! [`GoalStore`], which in turn runs the allocator.

use helm_hal::CommandSink;
use helm_types::ShipSnapshot;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::AutopilotConfig;
use crate::context::{PolicyUnit, TickContext};
use crate::goal_store::GoalStore;
use crate::strategy::{BattleStrategy, IdleStrategy, ModeStrategy};

/// Top-level behavioural context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Idle,
    Battle,
}

pub struct ModeDispatcher {
    mode: Mode,
    idle: Box<dyn ModeStrategy>,
    battle: Box<dyn ModeStrategy>,
    goals: GoalStore,
}

impl ModeDispatcher {
    /// A dispatcher running the stock strategies with `config`.
    pub fn new(config: AutopilotConfig) -> Self {
        Self::with_strategies(
            Box::new(IdleStrategy::new(config.clone())),
            Box::new(BattleStrategy::new(config)),
        )
    }

    /// A dispatcher running caller-supplied strategies.  Starts in
    /// [`Mode::Idle`].
    pub fn with_strategies(idle: Box<dyn ModeStrategy>, battle: Box<dyn ModeStrategy>) -> Self {
        Self {
            mode: Mode::Idle,
            idle,
            battle,
            goals: GoalStore::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn goals(&self) -> &GoalStore {
        &self.goals
    }

    /// Run one full tick against `ship`, sending commands to `sink`.
    pub fn tick(&mut self, ship: &ShipSnapshot, sink: &mut dyn CommandSink) {
        let mut ctx = TickContext::new(ship, sink);
        self.think(&mut ctx);
    }

    fn update_mode(&mut self, ctx: &TickContext<'_>) {
        let next = if ctx.target_alive() {
            Mode::Battle
        } else {
            Mode::Idle
        };
        if next != self.mode {
            info!(from = ?self.mode, to = ?next, "mode transition");
            self.mode = next;
        }
    }
}

impl PolicyUnit for ModeDispatcher {
    #[instrument(skip_all, fields(tick = ctx.ship().tick))]
    fn think(&mut self, ctx: &mut TickContext<'_>) {
        self.update_mode(ctx);
        let strategy = match self.mode {
            Mode::Idle => &mut self.idle,
            Mode::Battle => &mut self.battle,
        };
        strategy.think(ctx, &mut self.goals);
        self.goals.think(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal::GoalKind;
    use helm_hal::{RecordingSink, SimShip};
    use helm_types::{Command, SystemId, SystemView};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ship() -> ShipSnapshot {
        ShipSnapshot::new(8)
            .with_oxygen(0.95)
            .with_system(SystemView::new(SystemId::Shields, 4))
            .with_system(SystemView::new(SystemId::Engines, 2))
            .with_system(SystemView::new(SystemId::Oxygen, 1))
            .with_system(SystemView::new(SystemId::Weapons, 3))
    }

    /// Strategy that only counts how often it ran.
    struct Probe(Arc<AtomicUsize>);

    impl ModeStrategy for Probe {
        fn think(&mut self, _ctx: &TickContext<'_>, _goals: &mut GoalStore) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn live_target_switches_to_battle_and_drops_jump_goals() {
        let mut dispatcher = ModeDispatcher::new(AutopilotConfig::default());
        let mut sink = RecordingSink::new();

        let calm = ship();
        dispatcher.tick(&calm, &mut sink);
        assert_eq!(dispatcher.mode(), Mode::Idle);
        assert!(dispatcher.goals().is_active(GoalKind::JumpWhenReady));

        let hostile = ship().with_target(20);
        dispatcher.tick(&hostile, &mut sink);
        assert_eq!(dispatcher.mode(), Mode::Battle);
        assert!(!dispatcher.goals().is_active(GoalKind::JumpWhenReady));
        assert!(!dispatcher.goals().is_active(GoalKind::JumpNow));
        assert!(dispatcher.goals().is_active(GoalKind::WeaponsArm));
    }

    #[test]
    fn dead_target_returns_to_idle() {
        let mut dispatcher = ModeDispatcher::new(AutopilotConfig::default());
        let mut sink = RecordingSink::new();
        dispatcher.tick(&ship().with_target(5), &mut sink);
        assert_eq!(dispatcher.mode(), Mode::Battle);
        dispatcher.tick(&ship().with_target(0), &mut sink);
        assert_eq!(dispatcher.mode(), Mode::Idle);
    }

    #[test]
    fn only_the_current_mode_strategy_runs() {
        let idle_runs = Arc::new(AtomicUsize::new(0));
        let battle_runs = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = ModeDispatcher::with_strategies(
            Box::new(Probe(idle_runs.clone())),
            Box::new(Probe(battle_runs.clone())),
        );
        let mut sink = RecordingSink::new();
        dispatcher.tick(&ship(), &mut sink);
        dispatcher.tick(&ship(), &mut sink);
        dispatcher.tick(&ship().with_target(3), &mut sink);

        assert_eq!(idle_runs.load(Ordering::SeqCst), 2);
        assert_eq!(battle_runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn steady_state_ticks_are_quiet() {
        let mut dispatcher = ModeDispatcher::new(AutopilotConfig::default());
        let mut sim = SimShip::new(ship().with_oxygen(0.7));
        for _ in 0..3 {
            let snapshot = sim.snapshot().clone();
            dispatcher.tick(&snapshot, &mut sim);
        }
        let snapshot = sim.snapshot().clone();
        let mut sink = RecordingSink::new();
        dispatcher.tick(&snapshot, &mut sink);
        assert!(
            sink.commands()
                .iter()
                .all(|c| !matches!(c, Command::ChangePower { .. })),
            "{:?}",
            sink.commands()
        );
    }
}
