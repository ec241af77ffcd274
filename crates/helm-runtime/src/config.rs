//! Strategy thresholds, loaded from the `[autopilot]` table of the CLI
//! config or left at their defaults.

use serde::{Deserialize, Serialize};

use crate::goal::FractionRange;

/// Thresholds the mode strategies steer by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutopilotConfig {
    /// Oxygen fraction below which an emergency fill is ordered.
    #[serde(default = "default_oxygen_low_water")]
    pub oxygen_low_water: f32,

    /// Oxygen fraction above which the idle strategy is willing to jump.
    #[serde(default = "default_jump_oxygen_high_water")]
    pub jump_oxygen_high_water: f32,

    /// Power units held back when computing the idle shield lower bound.
    #[serde(default = "default_idle_reactor_reserve")]
    pub idle_reactor_reserve: u32,

    /// Band the idle strategy keeps oxygen in.
    #[serde(default = "default_idle_oxygen_band")]
    pub idle_oxygen_band: FractionRange,

    /// Narrower, lower band used in battle so shields and weapons come first.
    #[serde(default = "default_battle_oxygen_band")]
    pub battle_oxygen_band: FractionRange,
}

fn default_oxygen_low_water() -> f32 {
    0.20
}
fn default_idle_oxygen_band() -> FractionRange {
    FractionRange::new(0.60, 0.95)
}
fn default_battle_oxygen_band() -> FractionRange {
    FractionRange::new(0.30, 0.45)
}
fn default_jump_oxygen_high_water() -> f32 {
    0.90
}
fn default_idle_reactor_reserve() -> u32 {
    2
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            oxygen_low_water: default_oxygen_low_water(),
            idle_oxygen_band: default_idle_oxygen_band(),
            battle_oxygen_band: default_battle_oxygen_band(),
            jump_oxygen_high_water: default_jump_oxygen_high_water(),
            idle_reactor_reserve: default_idle_reactor_reserve(),
        }
    }
}
