#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative battlefield state for the tactics grid engine.

mod aggression;
mod grid;
pub mod grid_math;
mod terrain;

pub use aggression::AggressionMatrix;
pub use grid::OccupancyGrid;
pub use terrain::CenterRegion;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tactics_grid_core::{Command, Event, GridConfig, GridSettings};

const DEFAULT_TERRAIN_SEED: u64 = 0x5eed_7ac7_1c5a_0001;
const DEFAULT_CELL_SIZE: f32 = 64.0;

/// Battle session owning the occupancy grid and its world-space layout.
#[derive(Clone, Debug)]
pub struct Battle {
    grid: OccupancyGrid,
    settings: GridSettings,
}

impl Battle {
    /// Creates a battle on the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(&GridConfig::default(), DEFAULT_TERRAIN_SEED)
    }

    /// Creates a battle whose terrain is drawn from `terrain_seed`.
    ///
    /// The configuration is expected to be validated by the caller.
    #[must_use]
    pub fn from_config(config: &GridConfig, terrain_seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(terrain_seed);
        Self::from_grid(OccupancyGrid::new(config, &mut rng))
    }

    /// Wraps an existing grid.
    #[must_use]
    pub fn from_grid(grid: OccupancyGrid) -> Self {
        let settings = settings_for(grid.size());
        Self { grid, settings }
    }
}

impl Default for Battle {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the battle, mutating state deterministically.
pub fn apply(battle: &mut Battle, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureGrid {
            config,
            terrain_seed,
        } => match config.validate() {
            Ok(()) => {
                *battle = Battle::from_config(&config, terrain_seed);
                out_events.push(Event::GridConfigured {
                    size: battle.grid.size(),
                    terrain: battle.grid.terrain(),
                });
            }
            Err(reason) => out_events.push(Event::ConfigurationRejected { reason }),
        },
        Command::OccupyCell {
            unit,
            team,
            cell,
            attack_range,
        } => match battle.grid.try_occupy_cell(cell, unit, team, attack_range) {
            Ok(()) => out_events.push(Event::UnitPlaced {
                unit,
                team,
                footprint: vec![cell],
            }),
            Err(reason) => out_events.push(Event::PlacementRejected { unit, reason }),
        },
        Command::OccupyCells {
            unit,
            team,
            cells,
            attack_range,
        } => match battle
            .grid
            .try_occupy_cells(&cells, unit, team, attack_range)
        {
            Ok(()) => out_events.push(Event::UnitPlaced {
                unit,
                team,
                footprint: battle.grid.footprint(unit).unwrap_or_default().to_vec(),
            }),
            Err(reason) => out_events.push(Event::PlacementRejected { unit, reason }),
        },
        Command::Release {
            unit,
            attack_range,
            size,
        } => {
            if battle.grid.cleanup_all(unit, attack_range, size) {
                out_events.push(Event::UnitReleased { unit });
            }
        }
        Command::ClaimTarget {
            unit,
            team,
            current,
            target,
        } => {
            let contests = battle.grid.target_to_cell(unit, team, current, target);
            if let (Some(_), Some(cell)) = (current, target) {
                if battle.grid.target_label(cell).and_then(|label| label.unit()) == Some(unit) {
                    out_events.push(Event::TargetClaimed { unit, cell });
                }
            }
            for contest in contests {
                out_events.push(Event::TargetContested { unit, contest });
            }
        }
        Command::ReleaseTargetClaims { unit } => {
            let _ = battle.grid.release_target_claims(unit);
        }
        Command::PlaceHole { cell } => {
            let settings = battle.settings;
            if battle.grid.occupy_by_hole(&settings, cell) {
                out_events.push(Event::HolePlaced { cell });
            }
        }
        Command::NarrowBoard { ring } => {
            let settings = battle.settings;
            let cells = battle.grid.narrow(ring, &settings);
            if !cells.is_empty() {
                out_events.push(Event::BoardNarrowed { ring, cells });
            }
        }
    }
}

/// Query functions that provide read-only access to the battle state.
pub mod query {
    use tactics_grid_core::{
        CellCoord, GridSettings, Team, TerrainKind, UnitId, UnitSize, WorldPoint,
    };

    use super::{AggressionMatrix, Battle, OccupancyGrid};

    /// Provides read-only access to the occupancy grid.
    #[must_use]
    pub fn grid(battle: &Battle) -> &OccupancyGrid {
        &battle.grid
    }

    /// World-space layout of the grid.
    #[must_use]
    pub fn settings(battle: &Battle) -> &GridSettings {
        &battle.settings
    }

    /// Terrain drawn for the battle.
    #[must_use]
    pub fn terrain(battle: &Battle) -> TerrainKind {
        battle.grid.terrain()
    }

    /// Unit occupying the cell, if any.
    #[must_use]
    pub fn occupant(battle: &Battle, cell: CellCoord) -> Option<UnitId> {
        battle.grid.occupant(cell)
    }

    /// Numeric snapshot of the board consumed by pathing and rendering.
    #[must_use]
    pub fn matrix(battle: &Battle) -> Vec<Vec<i32>> {
        battle.grid.matrix()
    }

    /// Reports whether no unit has claimed the cell as its destination.
    #[must_use]
    pub fn can_move_there(battle: &Battle, cell: CellCoord) -> bool {
        battle.grid.can_move_there(cell)
    }

    /// Threat projected by the team's armed occupants.
    #[must_use]
    pub fn aggression_for_team(battle: &Battle, team: Team) -> &AggressionMatrix {
        battle.grid.aggression_for_team(team)
    }

    /// Threat projected onto the unit by the opposing team.
    #[must_use]
    pub fn enemy_aggression_for_unit(battle: &Battle, unit: UnitId) -> Option<&AggressionMatrix> {
        battle.grid.enemy_aggression_for_unit(unit)
    }

    /// Reports whether a unit standing at `position` is inside enemy melee
    /// threat, using the battle's own layout.
    #[must_use]
    pub fn can_be_attacked_by_melee(
        battle: &Battle,
        position: WorldPoint,
        unit: UnitId,
        size: UnitSize,
    ) -> bool {
        battle
            .grid
            .can_be_attacked_by_melee(position, unit, size, &battle.settings)
    }
}

fn settings_for(size: u32) -> GridSettings {
    let half_extent = size as f32 * DEFAULT_CELL_SIZE / 2.0;
    GridSettings::new(size, DEFAULT_CELL_SIZE, -half_extent, 0.0)
}
