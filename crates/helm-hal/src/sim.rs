//! In-process simulated ship for headless runs and CI.
//!
//! [`SimShip`] owns a [`ShipSnapshot`] and plays the part of the observed
//! game: it accepts commands through [`CommandSink`], refusing the ones the
//! game would refuse, and [`advance`][SimShip::advance] steps the slow
//! quantities (oxygen, FTL charge, ion and effect timers) forward.  It makes
//! no decisions of its own.
//!
//! # Example
//!
//! ```rust
//! use helm_hal::{CommandSink, SimShip};
//! use helm_types::{Command, ShipSnapshot, SystemId, SystemView};
//!
//! let mut ship = SimShip::new(
//!     ShipSnapshot::new(8).with_system(SystemView::new(SystemId::Engines, 4)),
//! );
//! ship.send(Command::ChangePower { system: SystemId::Engines, amount: 3 })
//!     .expect("engines accept power");
//! assert_eq!(ship.snapshot().system(SystemId::Engines).unwrap().power.total(), 3);
//! ```

use helm_types::{Command, HelmError, ShipSnapshot, SpecialState, SystemId};
use tracing::debug;

use crate::sink::CommandSink;

/// Oxygen gained per powered oxygen bar per second.
const OXYGEN_PER_BAR: f32 = 0.012;
/// Oxygen lost per second to the void regardless of power.
const OXYGEN_LEAK: f32 = 0.004;
/// FTL charge gained per powered engine bar per second.
const FTL_PER_BAR: f32 = 0.01;

/// A simulated ship that applies commands to its own snapshot.
#[derive(Debug, Clone)]
pub struct SimShip {
    ship: ShipSnapshot,
}

impl SimShip {
    pub fn new(ship: ShipSnapshot) -> Self {
        Self { ship }
    }

    /// The current state, as the acquisition layer would report it.
    pub fn snapshot(&self) -> &ShipSnapshot {
        &self.ship
    }

    pub fn snapshot_mut(&mut self) -> &mut ShipSnapshot {
        &mut self.ship
    }

    pub fn into_snapshot(self) -> ShipSnapshot {
        self.ship
    }

    /// Step the simulation forward by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        self.ship.tick += 1;

        let powered = |ship: &ShipSnapshot, id| {
            ship.installed(id)
                .map(|s| s.power.total() as f32)
                .unwrap_or(0.0)
        };

        let oxygen_bars = powered(&self.ship, SystemId::Oxygen);
        self.ship.oxygen =
            (self.ship.oxygen + (oxygen_bars * OXYGEN_PER_BAR - OXYGEN_LEAK) * dt).clamp(0.0, 1.0);

        if !self.ship.ftl.menu_open {
            let engine_bars = powered(&self.ship, SystemId::Engines);
            self.ship.ftl.charge = (self.ship.ftl.charge + engine_bars * FTL_PER_BAR * dt).min(1.0);
        }

        for system in &mut self.ship.systems {
            if system.ion.level > 0 {
                system.ion.timer += dt;
                if system.ion.timer >= system.ion.timer_goal {
                    system.ion.level -= 1;
                    system.ion.timer = 0.0;
                }
            }
            match &mut system.special {
                SpecialState::Hacking { effect } | SpecialState::MindControl { effect } => {
                    if effect.current > 0.0 {
                        effect.current += dt;
                        if effect.current >= effect.goal {
                            effect.current = 0.0;
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn reactor_budget(&self) -> u32 {
        let battery = match self.ship.installed(SystemId::Battery) {
            Some(view) if matches!(view.special, SpecialState::Battery { engaged: true }) => {
                view.level * 2
            }
            _ => 0,
        };
        self.ship.reactor.capacity.min(self.ship.reactor.limit) + battery
    }

    fn change_power(&mut self, system: SystemId, amount: u32) -> Result<(), String> {
        if system.is_subsystem() {
            return Err(format!("{system:?} is not reactor powered"));
        }
        let budget = self.reactor_budget();
        let used_elsewhere: u32 = self
            .ship
            .systems
            .iter()
            .filter(|s| s.installed && s.id != system)
            .map(|s| s.power.normal + s.power.battery)
            .sum();

        let view = self
            .ship
            .installed(system)
            .ok_or_else(|| format!("{system:?} is not installed"))?;
        if view.ion.lock_remaining() > 0.0 {
            return Err(format!("{system:?} is ionised"));
        }
        let total = amount.min(view.level).min(view.health);
        let normal = total.saturating_sub(view.power.zoltan);
        if used_elsewhere + normal > budget {
            return Err(format!(
                "reactor exhausted: {used_elsewhere} in use, {normal} requested, {budget} available"
            ));
        }

        if let Some(view) = self.ship.system_mut(system) {
            view.power.normal = normal;
            view.power.battery = 0;
        }
        debug!(system = ?system, amount = total, "sim: power changed");
        Ok(())
    }

    fn engage_battery(&mut self) -> Result<(), String> {
        let view = self
            .ship
            .system_mut(SystemId::Battery)
            .filter(|s| s.installed)
            .ok_or_else(|| "no battery installed".to_string())?;
        if let SpecialState::Battery { engaged } = &mut view.special {
            if *engaged {
                return Err("battery already engaged".to_string());
            }
            *engaged = true;
        } else {
            view.special = SpecialState::Battery { engaged: true };
        }
        Ok(())
    }

    fn open_jump_menu(&mut self) -> Result<(), String> {
        if self.ship.ftl.charge < 1.0 {
            return Err("FTL drive not charged".to_string());
        }
        self.ship.ftl.menu_open = true;
        Ok(())
    }
}

impl CommandSink for SimShip {
    fn send(&mut self, command: Command) -> Result<(), HelmError> {
        let result = match &command {
            Command::ChangePower { system, amount } => self.change_power(*system, *amount),
            Command::RequestBatteryBoost => self.engage_battery(),
            Command::OpenJumpMenu => self.open_jump_menu(),
        };
        result.map_err(|details| HelmError::Delivery { command, details })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helm_types::{Countdown, SystemView};

    fn ship() -> SimShip {
        SimShip::new(
            ShipSnapshot::new(6)
                .with_system(SystemView::new(SystemId::Shields, 4))
                .with_system(SystemView::new(SystemId::Engines, 4))
                .with_system(SystemView::new(SystemId::Oxygen, 1))
                .with_system(
                    SystemView::new(SystemId::Battery, 2)
                        .with_special(SpecialState::Battery { engaged: false }),
                ),
        )
    }

    #[test]
    fn change_power_clamps_to_health() {
        let mut sim = ship();
        sim.snapshot_mut().system_mut(SystemId::Shields).unwrap().health = 3;
        sim.send(Command::ChangePower {
            system: SystemId::Shields,
            amount: 4,
        })
        .unwrap();
        assert_eq!(sim.snapshot().system(SystemId::Shields).unwrap().power.normal, 3);
    }

    #[test]
    fn change_power_rejects_reactor_overdraw() {
        let mut sim = ship();
        sim.send(Command::ChangePower {
            system: SystemId::Shields,
            amount: 4,
        })
        .unwrap();
        let err = sim
            .send(Command::ChangePower {
                system: SystemId::Engines,
                amount: 4,
            })
            .unwrap_err();
        assert!(matches!(err, HelmError::Delivery { .. }));
    }

    #[test]
    fn battery_extends_budget() {
        let mut sim = ship();
        sim.send(Command::RequestBatteryBoost).unwrap();
        sim.send(Command::ChangePower {
            system: SystemId::Shields,
            amount: 4,
        })
        .unwrap();
        sim.send(Command::ChangePower {
            system: SystemId::Engines,
            amount: 4,
        })
        .unwrap();
        assert!(sim.send(Command::RequestBatteryBoost).is_err());
    }

    #[test]
    fn ionised_system_refuses_power() {
        let mut sim = ship();
        sim.snapshot_mut().system_mut(SystemId::Engines).unwrap().ion.level = 1;
        sim.snapshot_mut().system_mut(SystemId::Engines).unwrap().ion.timer_goal = 5.0;
        assert!(
            sim.send(Command::ChangePower {
                system: SystemId::Engines,
                amount: 1
            })
            .is_err()
        );
    }

    #[test]
    fn subsystems_and_missing_systems_refuse_power() {
        let mut sim = ship();
        assert!(
            sim.send(Command::ChangePower {
                system: SystemId::Piloting,
                amount: 1
            })
            .is_err()
        );
        assert!(
            sim.send(Command::ChangePower {
                system: SystemId::Cloaking,
                amount: 1
            })
            .is_err()
        );
    }

    #[test]
    fn jump_menu_requires_charge() {
        let mut sim = ship();
        assert!(sim.send(Command::OpenJumpMenu).is_err());
        sim.snapshot_mut().ftl.charge = 1.0;
        sim.send(Command::OpenJumpMenu).unwrap();
        assert!(sim.snapshot().ftl.menu_open);
    }

    #[test]
    fn advance_fills_oxygen_and_charges_ftl() {
        let mut sim = ship();
        sim.snapshot_mut().oxygen = 0.5;
        sim.send(Command::ChangePower {
            system: SystemId::Oxygen,
            amount: 1,
        })
        .unwrap();
        sim.send(Command::ChangePower {
            system: SystemId::Engines,
            amount: 2,
        })
        .unwrap();
        sim.advance(1.0);

        assert!(sim.snapshot().oxygen > 0.5);
        assert!(sim.snapshot().ftl.charge > 0.0);
        assert_eq!(sim.snapshot().tick, 1);
    }

    #[test]
    fn advance_wears_off_ion_and_effects() {
        let mut sim = SimShip::new(
            ShipSnapshot::new(8)
                .with_system(SystemView::new(SystemId::Shields, 2).with_ion(1, 4.5, 5.0))
                .with_system(SystemView::new(SystemId::Hacking, 2).with_special(
                    SpecialState::Hacking {
                        effect: Countdown {
                            current: 3.5,
                            goal: 4.0,
                        },
                    },
                )),
        );
        sim.advance(1.0);

        let shields = sim.snapshot().system(SystemId::Shields).unwrap();
        assert_eq!(shields.ion.level, 0);
        let hacking = sim.snapshot().system(SystemId::Hacking).unwrap();
        assert!(matches!(
            hacking.special,
            SpecialState::Hacking { effect } if !effect.is_mid_countdown()
        ));
    }
}
