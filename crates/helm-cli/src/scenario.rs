//! Starting snapshots: a JSON scenario file or the built-in demo ship.

use helm_types::{
    Affiliation, CrewMember, HelmError, ShipSnapshot, SpecialState, Species, SystemId, SystemView,
};
use std::fs;
use std::path::Path;

/// Read, parse and validate a scenario snapshot.
pub fn load(path: &Path) -> Result<ShipSnapshot, HelmError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| HelmError::Snapshot(format!("failed to read {}: {e}", path.display())))?;
    let ship: ShipSnapshot = serde_json::from_str(&raw)
        .map_err(|e| HelmError::Snapshot(format!("failed to parse {}: {e}", path.display())))?;
    ship.validate()?;
    Ok(ship)
}

/// A small cruiser with a wounded crew member, half-empty air and an
/// uncharged drive, so every strategy branch has something to do.
pub fn demo_ship() -> ShipSnapshot {
    let crew = |species, health| CrewMember {
        species,
        owner: Affiliation::Player,
        location: Affiliation::Player,
        health,
        max_health: 100.0,
    };
    ShipSnapshot::new(8)
        .with_oxygen(0.55)
        .with_system(SystemView::new(SystemId::Shields, 4))
        .with_system(SystemView::new(SystemId::Engines, 3))
        .with_system(SystemView::new(SystemId::Oxygen, 1))
        .with_system(SystemView::new(SystemId::Weapons, 4).with_special(
            SpecialState::Weapons {
                slot_power: vec![2, 1],
            },
        ))
        .with_system(SystemView::new(SystemId::Medbay, 1))
        .with_system(SystemView::new(SystemId::Piloting, 1))
        .with_system(SystemView::new(SystemId::Sensors, 1))
        .with_system(SystemView::new(SystemId::Doors, 1))
        .with_crew(crew(Species::Human, 60.0))
        .with_crew(crew(Species::Engi, 100.0))
}
