//! `helm-types` – the read-only ship schema and the outbound command set.
//!
//! Everything the autopilot knows about the observed game arrives as a
//! [`ShipSnapshot`], refreshed once per tick by whatever acquisition layer
//! sits in front of the process.  Everything it asks of the game leaves as a
//! [`Command`].  Both are plain serde data so snapshots can be replayed from
//! JSON and the schema can be published with `schemars`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ship system identifiers, numbered the way the game numbers them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum SystemId {
    Shields,
    Engines,
    Oxygen,
    Weapons,
    Drones,
    Medbay,
    Piloting,
    Sensors,
    Doors,
    Teleporter,
    Cloaking,
    Artillery,
    Battery,
    Clonebay,
    MindControl,
    Hacking,
}

impl SystemId {
    /// Number of system identifiers.
    pub const COUNT: usize = 16;

    /// Every identifier in game numbering order.
    pub const ALL: [SystemId; Self::COUNT] = [
        SystemId::Shields,
        SystemId::Engines,
        SystemId::Oxygen,
        SystemId::Weapons,
        SystemId::Drones,
        SystemId::Medbay,
        SystemId::Piloting,
        SystemId::Sensors,
        SystemId::Doors,
        SystemId::Teleporter,
        SystemId::Cloaking,
        SystemId::Artillery,
        SystemId::Battery,
        SystemId::Clonebay,
        SystemId::MindControl,
        SystemId::Hacking,
    ];

    /// Dense index into per-system tables.
    pub fn index(self) -> usize {
        self as usize
    }

    /// `true` for subsystems, which are never powered from the reactor.
    pub fn is_subsystem(self) -> bool {
        matches!(
            self,
            SystemId::Piloting | SystemId::Sensors | SystemId::Doors | SystemId::Battery
        )
    }
}

/// Power currently drawn by a system, split by where it comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PowerDraw {
    /// Bars fed from the reactor.
    pub normal: u32,
    /// Bars supplied by Zoltan crew standing in the room.
    pub zoltan: u32,
    /// Bars fed from an engaged backup battery.
    pub battery: u32,
}

impl PowerDraw {
    pub fn total(&self) -> u32 {
        self.normal + self.zoltan + self.battery
    }
}

/// Ion damage on a system: `level` stacked charges, each lasting
/// `timer_goal` seconds, with `timer` seconds elapsed on the current one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IonState {
    pub level: u32,
    pub timer: f32,
    pub timer_goal: f32,
}

impl IonState {
    /// Seconds until every ion charge has worn off.
    pub fn lock_remaining(&self) -> f32 {
        if self.level == 0 {
            return 0.0;
        }
        let current = (self.timer_goal - self.timer).max(0.0);
        (self.level - 1) as f32 * self.timer_goal + current
    }
}

/// A running effect timer (hack pulse, mind-control duration, …).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Countdown {
    pub current: f32,
    pub goal: f32,
}

impl Countdown {
    /// `true` while the effect has started but not yet run out.
    pub fn is_mid_countdown(&self) -> bool {
        self.current > 0.0 && self.current < self.goal
    }
}

/// System-specific state that some systems carry on top of the common view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpecialState {
    #[default]
    None,
    Cloak {
        engaged: bool,
    },
    Hacking {
        effect: Countdown,
    },
    MindControl {
        effect: Countdown,
    },
    Battery {
        engaged: bool,
    },
    /// Power required by each weapon slot, in slot order.
    Weapons {
        slot_power: Vec<u32>,
    },
}

/// Read-only view of a single ship system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SystemView {
    pub id: SystemId,
    pub installed: bool,
    /// Upgrade level, i.e. the most power the system can ever take.
    pub level: u32,
    /// Undamaged bars.
    pub health: u32,
    #[serde(default)]
    pub power: PowerDraw,
    #[serde(default)]
    pub ion: IonState,
    /// Non-zero while an enemy hacking drone is attached.
    #[serde(default)]
    pub hack_level: u32,
    #[serde(default)]
    pub special: SpecialState,
}

impl SystemView {
    /// An installed, undamaged, unpowered system at `level`.
    pub fn new(id: SystemId, level: u32) -> Self {
        Self {
            id,
            installed: true,
            level,
            health: level,
            power: PowerDraw::default(),
            ion: IonState::default(),
            hack_level: 0,
            special: SpecialState::None,
        }
    }

    pub fn with_health(mut self, health: u32) -> Self {
        self.health = health;
        self
    }

    pub fn with_power(mut self, normal: u32) -> Self {
        self.power.normal = normal;
        self
    }

    pub fn with_zoltan(mut self, zoltan: u32) -> Self {
        self.power.zoltan = zoltan;
        self
    }

    pub fn with_ion(mut self, level: u32, timer: f32, timer_goal: f32) -> Self {
        self.ion = IonState {
            level,
            timer,
            timer_goal,
        };
        self
    }

    pub fn with_special(mut self, special: SpecialState) -> Self {
        self.special = special;
        self
    }
}

/// Which side a crew member belongs to, or which ship they stand on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Affiliation {
    Player,
    Enemy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Human,
    Engi,
    Mantis,
    Rockman,
    Slug,
    Zoltan,
    Crystal,
    Lanius,
    Drone,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CrewMember {
    pub species: Species,
    /// The ship the crew member serves.
    pub owner: Affiliation,
    /// The ship the crew member currently stands on.
    pub location: Affiliation,
    pub health: f32,
    pub max_health: f32,
}

impl CrewMember {
    /// A Zoltan serving the player aboard the player ship adds a bar of power.
    pub fn is_player_zoltan(&self) -> bool {
        self.species == Species::Zoltan
            && self.owner == Affiliation::Player
            && self.location == Affiliation::Player
            && self.health > 0.0
    }

    pub fn is_injured(&self) -> bool {
        self.health > 0.0 && self.health < self.max_health
    }
}

/// Reactor scalars: bars built into the reactor and the sector-imposed cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Reactor {
    pub capacity: u32,
    pub limit: u32,
}

/// Faster-than-light drive state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FtlDrive {
    /// Charge fraction, `1.0` when a jump is possible.
    pub charge: f32,
    pub menu_open: bool,
}

/// The hostile ship currently tracked, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TargetShip {
    pub hull: i32,
}

/// One tick's read-only picture of the player ship and its surroundings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ShipSnapshot {
    #[serde(default)]
    pub tick: u64,
    pub systems: Vec<SystemView>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
    pub reactor: Reactor,
    /// Ship-wide oxygen fraction in `0.0..=1.0`.
    pub oxygen: f32,
    #[serde(default)]
    pub ftl: FtlDrive,
    pub hull: i32,
    #[serde(default)]
    pub target: Option<TargetShip>,
}

impl ShipSnapshot {
    /// An empty ship with a reactor of `capacity` bars and no sector cap.
    pub fn new(capacity: u32) -> Self {
        Self {
            tick: 0,
            systems: Vec::new(),
            crew: Vec::new(),
            reactor: Reactor {
                capacity,
                limit: capacity,
            },
            oxygen: 1.0,
            ftl: FtlDrive::default(),
            hull: 30,
            target: None,
        }
    }

    /// Add or replace a system view.
    pub fn with_system(mut self, view: SystemView) -> Self {
        self.systems.retain(|s| s.id != view.id);
        self.systems.push(view);
        self
    }

    pub fn with_reactor_limit(mut self, limit: u32) -> Self {
        self.reactor.limit = limit;
        self
    }

    pub fn with_oxygen(mut self, oxygen: f32) -> Self {
        self.oxygen = oxygen;
        self
    }

    pub fn with_crew(mut self, crew: CrewMember) -> Self {
        self.crew.push(crew);
        self
    }

    pub fn with_target(mut self, hull: i32) -> Self {
        self.target = Some(TargetShip { hull });
        self
    }

    /// The view for `id`, whether or not it is installed.
    pub fn system(&self, id: SystemId) -> Option<&SystemView> {
        self.systems.iter().find(|s| s.id == id)
    }

    pub fn system_mut(&mut self, id: SystemId) -> Option<&mut SystemView> {
        self.systems.iter_mut().find(|s| s.id == id)
    }

    /// The view for `id` only when the system is installed.
    pub fn installed(&self, id: SystemId) -> Option<&SystemView> {
        self.system(id).filter(|s| s.installed)
    }

    /// Bonus bars contributed by Zoltan crew serving aboard.
    pub fn zoltan_bonus(&self) -> u32 {
        self.crew.iter().filter(|c| c.is_player_zoltan()).count() as u32
    }

    /// Validate invariants a hand-written or replayed snapshot must hold.
    ///
    /// # Errors
    ///
    /// Returns [`HelmError::Snapshot`] on duplicate systems or an oxygen
    /// fraction outside `0.0..=1.0`.
    pub fn validate(&self) -> Result<(), HelmError> {
        for (i, a) in self.systems.iter().enumerate() {
            if self.systems[i + 1..].iter().any(|b| b.id == a.id) {
                return Err(HelmError::Snapshot(format!(
                    "system {:?} listed more than once",
                    a.id
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.oxygen) {
            return Err(HelmError::Snapshot(format!(
                "oxygen fraction {} outside 0.0..=1.0",
                self.oxygen
            )));
        }
        Ok(())
    }
}

/// Commands the autopilot may issue to the observed game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "command", content = "payload", rename_all = "snake_case")]
pub enum Command {
    /// Set the total power of `system` to `amount` bars.
    ChangePower { system: SystemId, amount: u32 },
    /// Engage the backup battery.
    RequestBatteryBoost,
    /// Open the jump (star map) menu.
    OpenJumpMenu,
}

/// Error type spanning command delivery, snapshot validation and
/// configuration.
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum HelmError {
    #[error("Command delivery failed for {command:?}: {details}")]
    Delivery { command: Command, details: String },

    #[error("Invalid snapshot: {0}")]
    Snapshot(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
