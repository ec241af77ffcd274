//! Goals: named, parameterised intents about how the ship should behave.
//!
//! A [`Goal`] is a sum type; each variant carries only the parameters that
//! make sense for it.  [`GoalKind`] is the payload-free key the
//! [`GoalStore`][crate::goal_store::GoalStore] indexes by, and
//! [`GoalKind::exclusion_group`] is the explicit table of kinds that may not
//! be active together.

use helm_types::SystemId;
use serde::{Deserialize, Serialize};

/// An inclusive range of whole units (shield bubbles, power bars).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRange {
    pub min: u32,
    pub max: u32,
}

impl LevelRange {
    /// A range with `min` capped at `max`.
    pub fn new(min: u32, max: u32) -> Self {
        Self {
            min: min.min(max),
            max,
        }
    }

    pub fn exactly(value: u32) -> Self {
        Self {
            min: value,
            max: value,
        }
    }
}

/// An inclusive range of fractions in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FractionRange {
    pub min: f32,
    pub max: f32,
}

impl FractionRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }
}

/// Payload-free goal identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GoalKind {
    ShieldsOff,
    ShieldsActive,
    OxygenOff,
    OxygenIdle,
    OxygenMaintain,
    OxygenEmergency,
    EnginesOff,
    EnginesMinimize,
    EnginesMaximize,
    JumpWhenReady,
    JumpNow,
    WeaponsOff,
    WeaponsArm,
    DronesOff,
    DronesArm,
    MedbayStandby,
    MedbayHeal,
    FocusSystem,
}

use GoalKind::*;

const SHIELDS: &[GoalKind] = &[ShieldsOff, ShieldsActive];
const OXYGEN: &[GoalKind] = &[OxygenOff, OxygenIdle, OxygenMaintain, OxygenEmergency];
const ENGINES: &[GoalKind] = &[EnginesOff, EnginesMinimize, EnginesMaximize];
const JUMP: &[GoalKind] = &[JumpWhenReady, JumpNow];
const WEAPONS: &[GoalKind] = &[WeaponsOff, WeaponsArm];
const DRONES: &[GoalKind] = &[DronesOff, DronesArm];
const MEDBAY: &[GoalKind] = &[MedbayStandby, MedbayHeal];

impl GoalKind {
    /// Kinds that may not be active alongside `self`, including `self`.
    /// Ungrouped kinds return an empty slice.
    pub fn exclusion_group(self) -> &'static [GoalKind] {
        match self {
            ShieldsOff | ShieldsActive => SHIELDS,
            OxygenOff | OxygenIdle | OxygenMaintain | OxygenEmergency => OXYGEN,
            EnginesOff | EnginesMinimize | EnginesMaximize => ENGINES,
            JumpWhenReady | JumpNow => JUMP,
            WeaponsOff | WeaponsArm => WEAPONS,
            DronesOff | DronesArm => DRONES,
            MedbayStandby | MedbayHeal => MEDBAY,
            FocusSystem => &[],
        }
    }

    /// `true` when `self` and `other` are distinct kinds of the same group.
    pub fn conflicts_with(self, other: GoalKind) -> bool {
        self != other && self.exclusion_group().contains(&other)
    }
}

/// A declarative intent with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "goal", rename_all = "snake_case")]
pub enum Goal {
    ShieldsOff,
    /// Keep between `min` and `max` shield bubbles up.
    ShieldsActive { bubbles: LevelRange },
    OxygenOff,
    /// Passively top oxygen up inside `band`.
    OxygenIdle { band: FractionRange },
    /// Hold oxygen inside `band` without starving combat systems.
    OxygenMaintain { band: FractionRange },
    /// Oxygen is dangerously low; refill until `band.max`.
    OxygenEmergency { band: FractionRange },
    EnginesOff,
    EnginesMinimize,
    EnginesMaximize,
    JumpWhenReady,
    JumpNow,
    WeaponsOff,
    WeaponsArm { bars: LevelRange },
    DronesOff,
    DronesArm,
    MedbayStandby,
    MedbayHeal,
    /// Put `system` first in line.  For weapons, `sub_index` names the last
    /// weapon slot that must be powered.
    FocusSystem {
        system: SystemId,
        sub_index: Option<u32>,
    },
}

impl Goal {
    pub fn kind(&self) -> GoalKind {
        match self {
            Goal::ShieldsOff => ShieldsOff,
            Goal::ShieldsActive { .. } => ShieldsActive,
            Goal::OxygenOff => OxygenOff,
            Goal::OxygenIdle { .. } => OxygenIdle,
            Goal::OxygenMaintain { .. } => OxygenMaintain,
            Goal::OxygenEmergency { .. } => OxygenEmergency,
            Goal::EnginesOff => EnginesOff,
            Goal::EnginesMinimize => EnginesMinimize,
            Goal::EnginesMaximize => EnginesMaximize,
            Goal::JumpWhenReady => JumpWhenReady,
            Goal::JumpNow => JumpNow,
            Goal::WeaponsOff => WeaponsOff,
            Goal::WeaponsArm { .. } => WeaponsArm,
            Goal::DronesOff => DronesOff,
            Goal::DronesArm => DronesArm,
            Goal::MedbayStandby => MedbayStandby,
            Goal::MedbayHeal => MedbayHeal,
            Goal::FocusSystem { .. } => FocusSystem,
        }
    }
}
