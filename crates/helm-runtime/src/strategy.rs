//! Mode strategies: the goal-producing policies the dispatcher switches
//! between.
//!
//! A strategy never touches the allocator's ledger directly.  It only sets
//! and unsets goals; the [`GoalStore`] turns them into desires afterwards.

use helm_types::{Affiliation, SpecialState, SystemId};

use crate::config::AutopilotConfig;
use crate::context::TickContext;
use crate::goal::{FractionRange, Goal, GoalKind, LevelRange};
use crate::goal_store::GoalStore;

/// A goal-producing policy for one dispatcher mode.
pub trait ModeStrategy: Send {
    /// Update `goals` for the current tick.
    fn think(&mut self, ctx: &TickContext<'_>, goals: &mut GoalStore);
}

/// Travel posture: modest shields, passive oxygen, jump when safe.
#[derive(Debug, Clone, Default)]
pub struct IdleStrategy {
    config: AutopilotConfig,
}

impl IdleStrategy {
    pub fn new(config: AutopilotConfig) -> Self {
        Self { config }
    }
}

impl ModeStrategy for IdleStrategy {
    fn think(&mut self, ctx: &TickContext<'_>, goals: &mut GoalStore) {
        goals.unset(GoalKind::JumpWhenReady);
        goals.unset(GoalKind::JumpNow);
        goals.unset(GoalKind::FocusSystem);

        // Lower bound leaves a reserve for everything else; upper bound may
        // take the whole pool.
        let usable = goals.allocator().usable(ctx);
        match ctx.system(SystemId::Shields) {
            Some(view) => {
                let reserved = usable.saturating_sub(self.config.idle_reactor_reserve);
                let min = ctx.clamp_level(view, reserved) / 2;
                let max = ctx.clamp_level(view, usable) / 2;
                goals.set(
                    Goal::ShieldsActive {
                        bubbles: LevelRange::new(min, max),
                    },
                    "idle shield coverage with reserve",
                    true,
                );
            }
            None => {
                goals.set(Goal::ShieldsOff, "no shield system", false);
            }
        }

        let ship = ctx.ship();
        let has_oxygen = ctx.system(SystemId::Oxygen).is_some();
        set_oxygen(
            ctx,
            goals,
            self.config.oxygen_low_water,
            Goal::OxygenIdle {
                band: self.config.idle_oxygen_band,
            },
            self.config.idle_oxygen_band,
        );

        if !has_oxygen {
            goals.set(Goal::JumpNow, "no oxygen system; nothing to wait for", false);
        } else if ship.oxygen > self.config.jump_oxygen_high_water {
            goals.set(Goal::JumpWhenReady, "oxygen topped up", false);
        }

        goals.set(Goal::EnginesMinimize, "no threat; keep evasion low", false);
        goals.set(Goal::WeaponsOff, "no threat", false);
        goals.set(Goal::DronesOff, "no threat", false);
        set_medbay(ctx, goals);
    }
}

/// Combat posture: every bubble, weapons armed, oxygen kept low but safe.
#[derive(Debug, Clone, Default)]
pub struct BattleStrategy {
    config: AutopilotConfig,
}

impl BattleStrategy {
    pub fn new(config: AutopilotConfig) -> Self {
        Self { config }
    }
}

impl ModeStrategy for BattleStrategy {
    fn think(&mut self, ctx: &TickContext<'_>, goals: &mut GoalStore) {
        goals.unset(GoalKind::JumpWhenReady);
        goals.unset(GoalKind::JumpNow);

        let bubbles = ctx.max_power(SystemId::Shields) / 2;
        goals.set(
            Goal::ShieldsActive {
                bubbles: LevelRange::exactly(bubbles),
            },
            "battle: all shield bubbles",
            true,
        );

        set_oxygen(
            ctx,
            goals,
            self.config.oxygen_low_water,
            Goal::OxygenMaintain {
                band: self.config.battle_oxygen_band,
            },
            self.config.battle_oxygen_band,
        );

        goals.set(Goal::EnginesMaximize, "battle: maximise evasion", false);
        goals.set(
            Goal::WeaponsArm {
                bars: LevelRange::exactly(ctx.max_power(SystemId::Weapons)),
            },
            "battle: arm every weapon",
            true,
        );

        let has_slots = ctx.system(SystemId::Weapons).is_some_and(|view| {
            matches!(&view.special, SpecialState::Weapons { slot_power } if !slot_power.is_empty())
        });
        if has_slots {
            goals.set(
                Goal::FocusSystem {
                    system: SystemId::Weapons,
                    sub_index: Some(0),
                },
                "battle: first weapon before anything else",
                true,
            );
        } else {
            goals.unset(GoalKind::FocusSystem);
        }

        if ctx.system(SystemId::Drones).is_some() {
            goals.set(Goal::DronesArm, "battle: launch drones", false);
        } else {
            goals.set(Goal::DronesOff, "no drone system", false);
        }
        set_medbay(ctx, goals);
    }
}

/// Emergency below the low-water mark, otherwise the mode's own goal.
fn set_oxygen(
    ctx: &TickContext<'_>,
    goals: &mut GoalStore,
    low_water: f32,
    normal: Goal,
    band: FractionRange,
) {
    if ctx.system(SystemId::Oxygen).is_none() {
        goals.set(Goal::OxygenOff, "no oxygen system", false);
        return;
    }
    if ctx.ship().oxygen < low_water {
        goals.set(
            Goal::OxygenEmergency { band },
            "oxygen under the low-water mark",
            true,
        );
    } else {
        goals.set(normal, "oxygen within limits", true);
    }
}

fn set_medbay(ctx: &TickContext<'_>, goals: &mut GoalStore) {
    let injured = ctx.ship().crew.iter().any(|c| {
        c.owner == Affiliation::Player && c.location == Affiliation::Player && c.is_injured()
    });
    if injured {
        goals.set(Goal::MedbayHeal, "crew injured", false);
    } else {
        goals.set(Goal::MedbayStandby, "crew healthy", false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helm_hal::RecordingSink;
    use helm_types::{CrewMember, ShipSnapshot, Species, SystemView};

    fn run(strategy: &mut dyn ModeStrategy, goals: &mut GoalStore, ship: &ShipSnapshot) {
        let mut sink = RecordingSink::new();
        let ctx = TickContext::new(ship, &mut sink);
        strategy.think(&ctx, goals);
    }

    fn ship() -> ShipSnapshot {
        ShipSnapshot::new(8)
            .with_system(SystemView::new(SystemId::Shields, 6))
            .with_system(SystemView::new(SystemId::Engines, 4))
            .with_system(SystemView::new(SystemId::Oxygen, 2))
            .with_system(SystemView::new(SystemId::Weapons, 4))
    }

    #[test]
    fn idle_shield_range_keeps_a_reserve() {
        let ship = ship().with_reactor_limit(5);
        let mut goals = GoalStore::new();
        run(&mut IdleStrategy::default(), &mut goals, &ship);
        // usable 5: lower bound from 3 bars, upper bound from 5.
        assert_eq!(
            goals.get(GoalKind::ShieldsActive),
            Some(&Goal::ShieldsActive {
                bubbles: LevelRange::new(1, 2)
            })
        );
    }

    #[test]
    fn idle_low_oxygen_declares_emergency_over_idle_goal() {
        let mut ship = ship();
        let mut goals = GoalStore::new();
        let mut idle = IdleStrategy::default();
        run(&mut idle, &mut goals, &ship);
        assert!(goals.is_active(GoalKind::OxygenIdle));

        ship.oxygen = 0.15;
        run(&mut idle, &mut goals, &ship);
        assert!(goals.is_active(GoalKind::OxygenEmergency));
        assert!(!goals.is_active(GoalKind::OxygenIdle));
    }

    #[test]
    fn idle_jumps_when_topped_up_or_without_oxygen_system() {
        let mut goals = GoalStore::new();
        let mut idle = IdleStrategy::default();

        run(&mut idle, &mut goals, &ship().with_oxygen(0.5));
        assert!(goals.get(GoalKind::JumpWhenReady).is_none());

        run(&mut idle, &mut goals, &ship().with_oxygen(0.95));
        assert!(goals.is_active(GoalKind::JumpWhenReady));

        let airless = ShipSnapshot::new(8).with_system(SystemView::new(SystemId::Engines, 4));
        run(&mut idle, &mut goals, &airless);
        assert!(goals.is_active(GoalKind::JumpNow));
        assert!(!goals.is_active(GoalKind::JumpWhenReady));
        assert!(goals.is_active(GoalKind::OxygenOff));
    }

    #[test]
    fn idle_stands_weapons_down_and_heals_injured_crew() {
        let ship = ship().with_crew(CrewMember {
            species: Species::Human,
            owner: Affiliation::Player,
            location: Affiliation::Player,
            health: 40.0,
            max_health: 100.0,
        });
        let mut goals = GoalStore::new();
        run(&mut IdleStrategy::default(), &mut goals, &ship);
        assert!(goals.is_active(GoalKind::WeaponsOff));
        assert!(goals.is_active(GoalKind::DronesOff));
        assert!(goals.is_active(GoalKind::EnginesMinimize));
        assert!(goals.is_active(GoalKind::MedbayHeal));
    }

    #[test]
    fn battle_clears_jumps_and_arms_everything() {
        let ship = ship()
            .with_target(10)
            .with_system(SystemView::new(SystemId::Drones, 2))
            .with_system(SystemView::new(SystemId::Weapons, 4).with_special(
                SpecialState::Weapons {
                    slot_power: vec![1, 3],
                },
            ));
        let mut goals = GoalStore::new();
        goals.set(Goal::JumpNow, "was leaving", false);
        goals.set(Goal::EnginesMinimize, "was idle", false);

        run(&mut BattleStrategy::default(), &mut goals, &ship);

        assert!(!goals.is_active(GoalKind::JumpNow));
        assert!(goals.is_active(GoalKind::EnginesMaximize));
        assert!(!goals.is_active(GoalKind::EnginesMinimize));
        assert_eq!(
            goals.get(GoalKind::ShieldsActive),
            Some(&Goal::ShieldsActive {
                bubbles: LevelRange::exactly(3)
            })
        );
        assert_eq!(
            goals.get(GoalKind::WeaponsArm),
            Some(&Goal::WeaponsArm {
                bars: LevelRange::exactly(4)
            })
        );
        assert!(goals.is_active(GoalKind::FocusSystem));
        assert!(goals.is_active(GoalKind::DronesArm));
        assert!(goals.is_active(GoalKind::MedbayStandby));
    }

    #[test]
    fn battle_maintains_oxygen_in_a_lower_band() {
        let mut goals = GoalStore::new();
        let config = AutopilotConfig::default();
        run(
            &mut BattleStrategy::new(config.clone()),
            &mut goals,
            &ship().with_target(5).with_oxygen(0.5),
        );
        assert_eq!(
            goals.get(GoalKind::OxygenMaintain),
            Some(&Goal::OxygenMaintain {
                band: config.battle_oxygen_band
            })
        );
    }
}
