//! [`GoalStore`] – active goals and the domain logic that turns them into
//! power desires.
//!
//! The store holds at most one goal per [`GoalKind`] and never lets two
//! kinds of the same exclusion group coexist.  Each tick,
//! [`think`][GoalStore::think] clears the allocator's ledger, lets every
//! resource domain read its goals and file desires, then runs the
//! allocator.
//!
//! # Domain order
//!
//! | Step | Domain  | Goals read |
//! |------|---------|------------|
//! | 1 | shields | `ShieldsOff`, `ShieldsActive` |
//! | 2 | oxygen  | `OxygenOff`, `OxygenIdle`, `OxygenMaintain`, `OxygenEmergency` |
//! | 3 | FTL     | `Engines*`, `JumpWhenReady`, `JumpNow` |
//! | 4 | weapons | `Weapons*`, `Drones*`, `FocusSystem` |
//! | 5 | medbay  | `MedbayStandby`, `MedbayHeal` |
//!
//! Later domains see the ledger as earlier ones left it; nothing is
//! rebalanced across domains within a tick.

use std::collections::BTreeMap;

use helm_types::{Command, SpecialState, SystemId};
use tracing::{debug, info};

use crate::allocator::PowerAllocator;
use crate::context::{PolicyUnit, TickContext};
use crate::desire::Priority;
use crate::goal::{FractionRange, Goal, GoalKind};

/// Active goals plus the allocator they feed.
#[derive(Debug, Clone, Default)]
pub struct GoalStore {
    goals: BTreeMap<GoalKind, Goal>,
    allocator: PowerAllocator,
    /// Oxygen hysteresis latch: on at the band minimum, off at the maximum.
    filling_oxygen: bool,
    /// Jump menu already requested for the current charge.
    jump_requested: bool,
}

impl GoalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocator(&self) -> &PowerAllocator {
        &self.allocator
    }

    /// Record `goal`, logging `reason`.
    ///
    /// When a goal of the same kind is already active and `overwrite` is
    /// `false`, nothing changes and `false` is returned.  Otherwise every
    /// other goal in the same exclusion group is evicted and `goal` is
    /// stored.
    pub fn set(&mut self, goal: Goal, reason: &str, overwrite: bool) -> bool {
        let kind = goal.kind();
        let previous = self.goals.get(&kind).copied();
        if !overwrite && previous.is_some() {
            debug!(?goal, reason, "goal already active; kept");
            return false;
        }
        for other in kind.exclusion_group() {
            if kind.conflicts_with(*other) && self.goals.remove(other).is_some() {
                info!(evicted = ?other, by = ?kind, "goal evicted by exclusion");
            }
        }
        if previous == Some(goal) {
            debug!(?goal, reason, "goal refreshed");
        } else {
            info!(?goal, reason, "goal set");
        }
        self.goals.insert(kind, goal);
        true
    }

    /// Remove the goal of `kind` if present.
    pub fn unset(&mut self, kind: GoalKind) {
        if self.goals.remove(&kind).is_some() {
            debug!(?kind, "goal unset");
        }
    }

    pub fn get(&self, kind: GoalKind) -> Option<&Goal> {
        self.goals.get(&kind)
    }

    pub fn is_active(&self, kind: GoalKind) -> bool {
        self.goals.contains_key(&kind)
    }

    /// Active goals in kind order.
    pub fn goals(&self) -> impl Iterator<Item = &Goal> {
        self.goals.values()
    }

    /// `true` while the oxygen hysteresis latch is on.
    pub fn is_filling_oxygen(&self) -> bool {
        self.filling_oxygen
    }

    fn active(&self, kind: GoalKind) -> Option<Goal> {
        self.goals.get(&kind).copied()
    }

    fn think_shields(&mut self, ctx: &mut TickContext<'_>) {
        let system = SystemId::Shields;
        if self.is_active(GoalKind::ShieldsOff) {
            self.allocator.remove_group(system, u32::MAX, Priority::any());
        }
        if let Some(Goal::ShieldsActive { bubbles }) = self.active(GoalKind::ShieldsActive) {
            self.allocator.set(ctx, system, bubbles.min * 2, Priority::High);
            self.allocator
                .set(ctx, system, bubbles.max.saturating_sub(bubbles.min) * 2, Priority::Medium);
        }
    }

    fn think_oxygen(&mut self, ctx: &mut TickContext<'_>) {
        let system = SystemId::Oxygen;
        let level = ctx.ship().oxygen;

        if self.is_active(GoalKind::OxygenOff) {
            self.filling_oxygen = false;
            self.allocator.remove_group(system, u32::MAX, Priority::any());
            return;
        }

        if self.is_active(GoalKind::OxygenEmergency) {
            // Keep filling after the emergency until the normal band's maximum.
            if !self.filling_oxygen {
                self.filling_oxygen = true;
                debug!(level, "oxygen emergency; filling");
            }
            let full = ctx.max_power(system);
            self.allocator
                .set_group(ctx, system, full, Priority::Critical, Priority::any());
            return;
        }

        let (band, priority) = match (
            self.active(GoalKind::OxygenIdle),
            self.active(GoalKind::OxygenMaintain),
        ) {
            (Some(Goal::OxygenIdle { band }), _) => (band, Priority::Low),
            (_, Some(Goal::OxygenMaintain { band })) => (band, Priority::Medium),
            _ => return,
        };
        self.latch_oxygen(level, band);
        if self.filling_oxygen {
            self.allocator
                .set_group(ctx, system, 1, priority, Priority::any());
        } else {
            self.allocator.remove_group(system, u32::MAX, Priority::any());
        }
    }

    fn latch_oxygen(&mut self, level: f32, band: FractionRange) {
        if !self.filling_oxygen && level <= band.min {
            self.filling_oxygen = true;
            debug!(level, "oxygen below band; filling");
        } else if self.filling_oxygen && level >= band.max {
            self.filling_oxygen = false;
            debug!(level, "oxygen band reached; stopped filling");
        }
    }

    fn think_ftl(&mut self, ctx: &mut TickContext<'_>) {
        let system = SystemId::Engines;
        let full = ctx.max_power(system);

        if self.is_active(GoalKind::EnginesOff) {
            self.allocator.remove_group(system, u32::MAX, Priority::any());
        } else if self.is_active(GoalKind::EnginesMinimize) {
            self.allocator.set(ctx, system, 1, Priority::Low);
        } else if self.is_active(GoalKind::EnginesMaximize) {
            self.allocator.set(ctx, system, full, Priority::Medium);
        }

        let jump_priority = if self.is_active(GoalKind::JumpNow) {
            Priority::Critical
        } else if self.is_active(GoalKind::JumpWhenReady) {
            Priority::Medium
        } else {
            self.jump_requested = false;
            return;
        };
        self.allocator.set(ctx, system, full, jump_priority);

        let ftl = ctx.ship().ftl;
        if ftl.charge < 1.0 {
            self.jump_requested = false;
        } else if !ftl.menu_open && !self.jump_requested {
            let urgent = jump_priority == Priority::Critical;
            info!(urgent, "FTL charged; opening jump menu");
            self.jump_requested = ctx.send(Command::OpenJumpMenu);
        }
    }

    fn think_weapons(&mut self, ctx: &mut TickContext<'_>) {
        if self.is_active(GoalKind::WeaponsOff) {
            self.allocator
                .remove_group(SystemId::Weapons, u32::MAX, Priority::any());
        }
        if let Some(Goal::WeaponsArm { bars }) = self.active(GoalKind::WeaponsArm) {
            self.allocator
                .set(ctx, SystemId::Weapons, bars.min, Priority::High);
            self.allocator
                .set(ctx, SystemId::Weapons, bars.max.saturating_sub(bars.min), Priority::Medium);
        }

        if self.is_active(GoalKind::DronesOff) {
            self.allocator
                .remove_group(SystemId::Drones, u32::MAX, Priority::any());
        } else if self.is_active(GoalKind::DronesArm) {
            let full = ctx.max_power(SystemId::Drones);
            self.allocator
                .set(ctx, SystemId::Drones, full, Priority::Medium);
        }

        if let Some(Goal::FocusSystem { system, sub_index }) = self.active(GoalKind::FocusSystem) {
            let amount = focus_power(ctx, system, sub_index);
            self.allocator.set(ctx, system, amount, Priority::Critical);
        }
    }

    fn think_medbay(&mut self, ctx: &mut TickContext<'_>) {
        let system = SystemId::Medbay;
        if self.is_active(GoalKind::MedbayStandby) {
            self.allocator.remove_group(system, u32::MAX, Priority::any());
        } else if self.is_active(GoalKind::MedbayHeal) {
            let full = ctx.max_power(system);
            self.allocator.set(ctx, system, full, Priority::High);
        }
    }
}

/// Power a focused system needs.  For weapons with a slot index this is
/// the power of every slot up to and including it.
fn focus_power(ctx: &TickContext<'_>, system: SystemId, sub_index: Option<u32>) -> u32 {
    let Some(view) = ctx.system(system) else {
        return 0;
    };
    let wanted = match (&view.special, sub_index) {
        (SpecialState::Weapons { slot_power }, Some(slot)) => slot_power
            .iter()
            .take(slot as usize + 1)
            .sum(),
        _ => view.level,
    };
    ctx.clamp_level(view, wanted)
}

impl PolicyUnit for GoalStore {
    fn think(&mut self, ctx: &mut TickContext<'_>) {
        self.allocator.clear_desires();
        self.think_shields(ctx);
        self.think_oxygen(ctx);
        self.think_ftl(ctx);
        self.think_weapons(ctx);
        self.think_medbay(ctx);
        self.allocator.maintain_power(ctx);
    }
}
