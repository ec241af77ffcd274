//! [`TickContext`] – the per-tick view every policy unit works against.
//!
//! A context pairs the tick's immutable [`ShipSnapshot`] with the outbound
//! [`CommandSink`] and answers the questions every unit keeps asking: is
//! there a live target, is this system usable, is it locked, how much power
//! can it actually take.  It is rebuilt every tick and carries no state of
//! its own, so two units asking the same question in the same tick always
//! get the same answer.

use helm_hal::CommandSink;
use helm_types::{Command, ShipSnapshot, SpecialState, SystemId, SystemView};
use tracing::{info, warn};

/// A unit of decision logic driven once per tick.
pub trait PolicyUnit {
    /// Run one scheduling pass against `ctx`.
    fn think(&mut self, ctx: &mut TickContext<'_>);
}

/// Read-only snapshot plus outbound command handle for one tick.
pub struct TickContext<'a> {
    ship: &'a ShipSnapshot,
    sink: &'a mut dyn CommandSink,
}

impl<'a> TickContext<'a> {
    pub fn new(ship: &'a ShipSnapshot, sink: &'a mut dyn CommandSink) -> Self {
        Self { ship, sink }
    }

    pub fn ship(&self) -> &'a ShipSnapshot {
        self.ship
    }

    /// `true` when a hostile ship is being tracked.
    pub fn target_present(&self) -> bool {
        self.ship.target.is_some()
    }

    /// `true` when a hostile ship is tracked and still has hull left.
    pub fn target_alive(&self) -> bool {
        self.ship.target.is_some_and(|t| t.hull > 0)
    }

    /// The view for `id` when the system is installed.
    pub fn system(&self, id: SystemId) -> Option<&'a SystemView> {
        self.ship.installed(id)
    }

    /// Seconds of ion lock left on `view`.
    pub fn ion_lock_remaining(&self, view: &SystemView) -> f32 {
        view.ion.lock_remaining()
    }

    /// Installed, able to take power, not hacked and not ionised.
    pub fn system_ready(&self, view: &SystemView) -> bool {
        view.installed
            && self.clamp_level(view, view.level) > 0
            && view.hack_level == 0
            && self.ion_lock_remaining(view) <= 0.0
    }

    /// `true` when the power of `id` must not be reassigned this tick.
    ///
    /// A system is locked while ionised or while it holds a committed
    /// special state: an engaged cloak, or a hack or mind-control effect
    /// part-way through its countdown.  Each condition applies only to its
    /// own system.
    pub fn system_locked(&self, id: SystemId) -> bool {
        let Some(view) = self.system(id) else {
            return false;
        };
        if self.ion_lock_remaining(view) > 0.0 {
            return true;
        }
        match (&view.special, id) {
            (SpecialState::Cloak { engaged }, SystemId::Cloaking) => *engaged,
            (SpecialState::Hacking { effect }, SystemId::Hacking) => effect.is_mid_countdown(),
            (SpecialState::MindControl { effect }, SystemId::MindControl) => {
                effect.is_mid_countdown()
            }
            _ => false,
        }
    }

    /// Cap `desired` to what `view` can actually be given:
    /// `min(level, health, reactor limit, desired)`.
    pub fn clamp_level(&self, view: &SystemView, desired: u32) -> u32 {
        desired
            .min(view.level)
            .min(view.health)
            .min(self.ship.reactor.limit)
    }

    /// The most power `id` can take this tick; zero for subsystems and
    /// systems that are not installed.
    pub fn max_power(&self, id: SystemId) -> u32 {
        if id.is_subsystem() {
            return 0;
        }
        self.system(id)
            .map_or(0, |view| self.clamp_level(view, view.level))
    }

    /// Hand `command` to the sink.  Returns `false` when delivery failed;
    /// the failure is logged and left for the next tick to correct.
    pub fn send(&mut self, command: Command) -> bool {
        info!(?command, "issuing command");
        match self.sink.send(command) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "command delivery failed; next tick will recompute");
                false
            }
        }
    }
}
