//! [`PowerAllocator`] – priority-preemptive distribution of reactor power.
//!
//! Domain logic files [`PowerDesire`]s through [`add`][PowerAllocator::add],
//! [`remove`][PowerAllocator::remove] and the `set*` helpers.  Once per tick
//! [`maintain_power`][PowerAllocator::maintain_power] turns the ledger into
//! a feasible allocation and sends a `ChangePower` command for each system
//! whose allocation actually moved.
//!
//! # Algorithm
//!
//! 1. Every reactor system starts the pass at zero.
//! 2. Desires are visited in ledger order.  When the remaining capacity
//!    cannot cover a desire and the backup battery is ready, the battery is
//!    requested once and its doubled level joins the pool.
//! 3. Each desire is granted `clamp(current + min(amount, remaining)) -
//!    current` more bars.
//! 4. A post pass walks [`POWER_PRIORITY_ORDER`]: shields round down to an
//!    even number, locked systems keep exactly what they have, and no
//!    system drops below its Zoltan-supplied power.
//!
//! Commands that reduce power go out before commands that raise it so the
//! game never sees the reactor overdrawn mid-tick.

use std::ops::RangeInclusive;

use helm_types::{Command, SpecialState, SystemId};
use tracing::debug;

use crate::context::{PolicyUnit, TickContext};
use crate::desire::{DesireLedger, PowerDesire, Priority};

/// Reactor-powered systems in the order capacity is pinned and the post
/// pass is applied.  Subsystems never appear here.
pub const POWER_PRIORITY_ORDER: [SystemId; 12] = [
    SystemId::Shields,
    SystemId::Engines,
    SystemId::Oxygen,
    SystemId::Weapons,
    SystemId::Drones,
    SystemId::Medbay,
    SystemId::Teleporter,
    SystemId::Cloaking,
    SystemId::Artillery,
    SystemId::Clonebay,
    SystemId::MindControl,
    SystemId::Hacking,
];

/// Marks a system with no realized allocation (absent or never seen).
const UNALLOCATED: i32 = -1;

/// Owns the desire ledger and the realized allocation.
#[derive(Debug, Clone)]
pub struct PowerAllocator {
    ledger: DesireLedger,
    allocation: [i32; SystemId::COUNT],
}

impl Default for PowerAllocator {
    fn default() -> Self {
        Self {
            ledger: DesireLedger::new(),
            allocation: [UNALLOCATED; SystemId::COUNT],
        }
    }
}

impl PowerAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ledger(&self) -> &DesireLedger {
        &self.ledger
    }

    /// Realized allocation for `system`, or `None` when it holds none.
    pub fn allocation(&self, system: SystemId) -> Option<u32> {
        u32::try_from(self.allocation[system.index()]).ok()
    }

    /// Drop every desire.  The goal store calls this at the start of each
    /// tick before rebuilding the ledger.
    pub fn clear_desires(&mut self) {
        self.ledger.clear();
    }

    /// File a desire for `amount` bars on `system` at `priority`.
    ///
    /// The grant is limited to what the system can take.  Desire already
    /// held at this priority or above is never displaced; if the new desire
    /// still overcommits the system, lower-priority desire is evicted to
    /// make room.  Returns the amount actually filed.
    pub fn add(
        &mut self,
        ctx: &TickContext<'_>,
        system: SystemId,
        amount: u32,
        priority: Priority,
    ) -> u32 {
        let max = ctx.max_power(system);
        let above = self.ledger.total(system, &priority.at_least());
        let granted = amount.min(max.saturating_sub(above));
        if granted == 0 {
            debug!(system = ?system, amount, ?priority, "desire rejected: no capacity");
            return 0;
        }

        let below = priority
            .below()
            .map_or(0, |range| self.ledger.total(system, &range));
        let excess = (above + below + granted).saturating_sub(max);
        if excess > 0 {
            if let Some(range) = priority.below() {
                let evicted = self.ledger.remove(system, excess, &range);
                debug!(system = ?system, evicted, ?priority, "preempted lower-priority desire");
            }
        }

        self.ledger.insert(PowerDesire {
            system,
            amount: granted,
            priority,
        });
        granted
    }

    /// Remove up to `amount` bars of desire at exactly `priority`.
    pub fn remove(&mut self, system: SystemId, amount: u32, priority: Priority) -> u32 {
        self.remove_group(system, amount, priority..=priority)
    }

    /// Remove up to `amount` bars of desire within `range`, least important
    /// first.  Returns the amount removed.
    pub fn remove_group(
        &mut self,
        system: SystemId,
        amount: u32,
        range: RangeInclusive<Priority>,
    ) -> u32 {
        self.ledger.remove(system, amount, &range)
    }

    /// Replace the desire held at `priority` with `amount` bars.
    pub fn set(
        &mut self,
        ctx: &TickContext<'_>,
        system: SystemId,
        amount: u32,
        priority: Priority,
    ) -> u32 {
        self.set_group(ctx, system, amount, priority, priority..=priority)
    }

    /// Clear every desire for `system` within `removal`, then file `amount`
    /// bars at `priority`.  Returns the amount filed.
    pub fn set_group(
        &mut self,
        ctx: &TickContext<'_>,
        system: SystemId,
        amount: u32,
        priority: Priority,
        removal: RangeInclusive<Priority>,
    ) -> u32 {
        self.ledger.remove(system, u32::MAX, &removal);
        if amount == 0 {
            return 0;
        }
        self.add(ctx, system, amount, priority)
    }

    /// Total desire for `system` within `range`.
    pub fn system_desire(&self, system: SystemId, range: RangeInclusive<Priority>) -> u32 {
        self.ledger.total(system, &range)
    }

    /// Capacity the allocator may hand out this tick: the reactor (capped by
    /// the sector limit), plus Zoltan crew and an engaged battery, minus
    /// whatever locked systems are pinning.
    pub fn usable(&self, ctx: &TickContext<'_>) -> u32 {
        let ship = ctx.ship();
        let base = ship.reactor.capacity.min(ship.reactor.limit);
        let pool = base + ship.zoltan_bonus() + engaged_battery_bonus(ctx);
        pool.saturating_sub(pinned(ctx))
    }

    /// Usable capacity not currently drawn by unlocked systems.
    pub fn available(&self, ctx: &TickContext<'_>) -> u32 {
        let drawn: u32 = POWER_PRIORITY_ORDER
            .iter()
            .filter(|id| !ctx.system_locked(**id))
            .filter_map(|id| ctx.system(*id))
            .map(|view| view.power.total())
            .sum();
        self.usable(ctx).saturating_sub(drawn)
    }

    /// Turn the ledger into an allocation and emit the delta.
    pub fn maintain_power(&mut self, ctx: &mut TickContext<'_>) {
        let ship = ctx.ship();

        let before = self.ledger.len();
        self.ledger.retain(|d| ship.installed(d.system).is_some());
        if self.ledger.len() != before {
            debug!(dropped = before - self.ledger.len(), "dropped desires for missing systems");
        }

        // Seed systems seen for the first time from what they really draw.
        let mut previous = self.allocation;
        for id in SystemId::ALL {
            previous[id.index()] = match ctx.system(id) {
                Some(view) if !id.is_subsystem() => {
                    if previous[id.index()] == UNALLOCATED {
                        view.power.total() as i32
                    } else {
                        previous[id.index()]
                    }
                }
                _ => UNALLOCATED,
            };
        }

        let mut next = [UNALLOCATED; SystemId::COUNT];
        for id in POWER_PRIORITY_ORDER {
            if ctx.system(id).is_some() {
                next[id.index()] = 0;
            }
        }

        let mut remaining = self.usable(ctx);
        let mut boosted = false;
        let desires: Vec<PowerDesire> = self.ledger.iter().copied().collect();
        for desire in desires {
            let Some(view) = ctx.system(desire.system) else {
                continue;
            };
            // Locked systems are already counted as pinned capacity.
            if ctx.system_locked(desire.system) {
                continue;
            }
            if remaining < desire.amount && !boosted {
                if let Some(bonus) = self.battery_boost(ctx) {
                    boosted = true;
                    remaining += bonus;
                }
            }
            let current = next[desire.system.index()].max(0) as u32;
            let wanted = current + desire.amount.min(remaining);
            let grant = ctx.clamp_level(view, wanted).saturating_sub(current);
            next[desire.system.index()] = (current + grant) as i32;
            remaining -= grant;
        }

        for id in POWER_PRIORITY_ORDER {
            let Some(view) = ctx.system(id) else {
                continue;
            };
            let mut amount = next[id.index()].max(0) as u32;
            if id == SystemId::Shields {
                amount -= amount % 2;
            }
            if ctx.system_locked(id) {
                amount = view.power.total();
            }
            amount = amount.max(view.power.zoltan);
            next[id.index()] = amount as i32;
        }

        self.emit(ctx, &previous, &next);
    }

    /// Request the battery when it is ready and not yet engaged.  Returns
    /// the capacity it adds for this pass only; a request the game drops is
    /// sent again on the next short tick.
    fn battery_boost(&self, ctx: &mut TickContext<'_>) -> Option<u32> {
        let view = ctx.system(SystemId::Battery)?;
        if !matches!(view.special, SpecialState::Battery { engaged: false })
            || !ctx.system_ready(view)
        {
            return None;
        }
        let bonus = view.level * 2;
        ctx.send(Command::RequestBatteryBoost).then_some(bonus)
    }

    fn emit(
        &mut self,
        ctx: &mut TickContext<'_>,
        previous: &[i32; SystemId::COUNT],
        next: &[i32; SystemId::COUNT],
    ) {
        self.allocation = *previous;

        let mut changed: Vec<SystemId> = SystemId::ALL
            .into_iter()
            .filter(|id| next[id.index()] != previous[id.index()])
            .collect();
        // Decreases first so the reactor is never overdrawn in between.
        changed.sort_by_key(|id| next[id.index()] > previous[id.index()]);

        for id in changed {
            let amount = next[id.index()];
            if amount == UNALLOCATED || ctx.system_locked(id) {
                // Nothing to deliver: the system is gone, or it is locked
                // and already holds exactly this much.
                self.allocation[id.index()] = amount;
                continue;
            }
            let delivered = ctx.send(Command::ChangePower {
                system: id,
                amount: amount as u32,
            });
            if delivered {
                self.allocation[id.index()] = amount;
            }
        }
    }
}

impl PolicyUnit for PowerAllocator {
    fn think(&mut self, ctx: &mut TickContext<'_>) {
        self.maintain_power(ctx);
    }
}

fn engaged_battery_bonus(ctx: &TickContext<'_>) -> u32 {
    match ctx.system(SystemId::Battery) {
        Some(view) if matches!(view.special, SpecialState::Battery { engaged: true }) => {
            view.level * 2
        }
        _ => 0,
    }
}

/// Non-Zoltan power held by locked systems.
fn pinned(ctx: &TickContext<'_>) -> u32 {
    POWER_PRIORITY_ORDER
        .iter()
        .filter(|id| ctx.system_locked(**id))
        .filter_map(|id| ctx.system(*id))
        .map(|view| view.power.total() - view.power.zoltan)
        .sum()
}
