//! Power desires and the ordered ledger that holds them.
//!
//! The ledger is kept sorted by priority (highest first) and then by amount
//! (largest first).  That order is the allocator's only tie-break, so every
//! mutation goes through [`DesireLedger::insert`] to keep it exact.  Removal
//! takes from the least important desires first and re-inserts whatever is
//! left of a partially consumed desire.

use std::ops::RangeInclusive;

use helm_types::SystemId;
use serde::{Deserialize, Serialize};

/// Priority tiers for power desires.  Higher tiers preempt lower ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Passive = 1,
    Low = 2,
    Medium = 3,
    High = 4,
    Critical = 5,
}

impl Priority {
    pub const LOWEST: Priority = Priority::Passive;
    pub const HIGHEST: Priority = Priority::Critical;

    /// Numeric weight of the tier.
    pub fn value(self) -> i32 {
        self as i32
    }

    /// Every tier.
    pub fn any() -> RangeInclusive<Priority> {
        Self::LOWEST..=Self::HIGHEST
    }

    /// This tier and everything above it.
    pub fn at_least(self) -> RangeInclusive<Priority> {
        self..=Self::HIGHEST
    }

    /// Every tier strictly below this one, or `None` for the lowest tier.
    pub fn below(self) -> Option<RangeInclusive<Priority>> {
        let lower = match self {
            Priority::Passive => return None,
            Priority::Low => Priority::Passive,
            Priority::Medium => Priority::Low,
            Priority::High => Priority::Medium,
            Priority::Critical => Priority::High,
        };
        Some(Self::LOWEST..=lower)
    }
}

/// A standing request for `amount` bars on `system` at `priority`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerDesire {
    pub system: SystemId,
    pub amount: u32,
    pub priority: Priority,
}

impl PowerDesire {
    fn rank(&self) -> (Priority, u32) {
        (self.priority, self.amount)
    }
}

/// Sorted multiset of [`PowerDesire`]s.
#[derive(Debug, Clone, Default)]
pub struct DesireLedger {
    desires: Vec<PowerDesire>,
}

impl DesireLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `desire` at its ordered position, after any equal-ranked
    /// desires already present.  Zero-amount desires are ignored.
    pub fn insert(&mut self, desire: PowerDesire) {
        if desire.amount == 0 {
            return;
        }
        let at = self.desires.partition_point(|d| d.rank() >= desire.rank());
        self.desires.insert(at, desire);
    }

    /// Desires in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = &PowerDesire> {
        self.desires.iter()
    }

    pub fn len(&self) -> usize {
        self.desires.len()
    }

    pub fn is_empty(&self) -> bool {
        self.desires.is_empty()
    }

    pub fn clear(&mut self) {
        self.desires.clear();
    }

    /// Keep only the desires for which `keep` returns `true`.
    pub fn retain(&mut self, keep: impl FnMut(&PowerDesire) -> bool) {
        self.desires.retain(keep);
    }

    /// Sum of desire for `system` within `range`.
    pub fn total(&self, system: SystemId, range: &RangeInclusive<Priority>) -> u32 {
        self.desires
            .iter()
            .filter(|d| d.system == system && range.contains(&d.priority))
            .map(|d| d.amount)
            .sum()
    }

    /// Remove up to `amount` bars of desire for `system` within `range`,
    /// lowest priority and smallest amount first.  Returns the amount
    /// removed.
    pub fn remove(
        &mut self,
        system: SystemId,
        amount: u32,
        range: &RangeInclusive<Priority>,
    ) -> u32 {
        let mut removed = 0;
        let mut remainders = Vec::new();
        let mut i = self.desires.len();
        while i > 0 && removed < amount {
            i -= 1;
            let desire = self.desires[i];
            if desire.system != system || !range.contains(&desire.priority) {
                continue;
            }
            let take = desire.amount.min(amount - removed);
            removed += take;
            self.desires.remove(i);
            if take < desire.amount {
                remainders.push(PowerDesire {
                    amount: desire.amount - take,
                    ..desire
                });
            }
        }
        for remainder in remainders {
            self.insert(remainder);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desire(system: SystemId, amount: u32, priority: Priority) -> PowerDesire {
        PowerDesire {
            system,
            amount,
            priority,
        }
    }

    #[test]
    fn ledger_orders_by_priority_then_amount() {
        let mut ledger = DesireLedger::new();
        ledger.insert(desire(SystemId::Oxygen, 1, Priority::Low));
        ledger.insert(desire(SystemId::Shields, 2, Priority::High));
        ledger.insert(desire(SystemId::Weapons, 3, Priority::Low));
        ledger.insert(desire(SystemId::Engines, 4, Priority::High));

        let order: Vec<SystemId> = ledger.iter().map(|d| d.system).collect();
        assert_eq!(
            order,
            vec![
                SystemId::Engines,
                SystemId::Shields,
                SystemId::Weapons,
                SystemId::Oxygen
            ]
        );
    }

    #[test]
    fn equal_rank_keeps_insertion_order() {
        let mut ledger = DesireLedger::new();
        ledger.insert(desire(SystemId::Shields, 2, Priority::Medium));
        ledger.insert(desire(SystemId::Engines, 2, Priority::Medium));
        let order: Vec<SystemId> = ledger.iter().map(|d| d.system).collect();
        assert_eq!(order, vec![SystemId::Shields, SystemId::Engines]);
    }

    #[test]
    fn zero_amount_is_not_stored() {
        let mut ledger = DesireLedger::new();
        ledger.insert(desire(SystemId::Shields, 0, Priority::High));
        assert!(ledger.is_empty());
    }

    #[test]
    fn remove_takes_lowest_priority_first_and_splits() {
        let mut ledger = DesireLedger::new();
        ledger.insert(desire(SystemId::Shields, 2, Priority::High));
        ledger.insert(desire(SystemId::Shields, 2, Priority::Medium));
        ledger.insert(desire(SystemId::Shields, 1, Priority::Low));

        let removed = ledger.remove(SystemId::Shields, 2, &Priority::any());
        assert_eq!(removed, 2);
        // Low (1) gone entirely, Medium split to 1.
        assert_eq!(ledger.total(SystemId::Shields, &(Priority::Low..=Priority::Low)), 0);
        assert_eq!(
            ledger.total(SystemId::Shields, &(Priority::Medium..=Priority::Medium)),
            1
        );
        assert_eq!(ledger.total(SystemId::Shields, &Priority::any()), 3);
    }

    #[test]
    fn remove_prefers_smallest_amount_within_a_tier() {
        let mut ledger = DesireLedger::new();
        ledger.insert(desire(SystemId::Weapons, 3, Priority::Medium));
        ledger.insert(desire(SystemId::Weapons, 1, Priority::Medium));

        ledger.remove(SystemId::Weapons, 1, &Priority::any());
        let amounts: Vec<u32> = ledger.iter().map(|d| d.amount).collect();
        assert_eq!(amounts, vec![3]);
    }

    #[test]
    fn remove_respects_range_and_system() {
        let mut ledger = DesireLedger::new();
        ledger.insert(desire(SystemId::Shields, 2, Priority::High));
        ledger.insert(desire(SystemId::Engines, 2, Priority::Low));

        assert_eq!(
            ledger.remove(SystemId::Shields, 5, &(Priority::Passive..=Priority::Medium)),
            0
        );
        assert_eq!(ledger.remove(SystemId::Shields, 5, &Priority::any()), 2);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn priority_ranges() {
        assert!(Priority::High.at_least().contains(&Priority::Critical));
        assert!(!Priority::High.at_least().contains(&Priority::Medium));
        assert_eq!(Priority::Passive.below(), None);
        let below = Priority::Medium.below().unwrap();
        assert!(below.contains(&Priority::Low) && !below.contains(&Priority::Medium));
        assert!(Priority::Critical.value() > Priority::Passive.value());
    }
}
