#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the tactics grid engine.
//!
//! This crate defines the vocabulary that connects adapters, the authoritative
//! battle state, and pure systems. Adapters submit [`Command`] values
//! describing desired grid mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values that systems
//! react to deterministically.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Baseline value stored in every aggression matrix cell.
///
/// Threat contributions are deltas on top of this floor, so a cell holding
/// exactly the baseline is not threatened by anyone.
pub const AGGRESSION_BASELINE: i32 = 1;

/// Distance, in cells, over which an occupant projects melee threat.
pub const MELEE_REACH: u32 = 1;

/// Smallest grid edge that can host the terrain bands.
pub const MIN_GRID_SIZE: u32 = 4;

/// Largest grid edge accepted by [`GridConfig`].
pub const MAX_GRID_SIZE: u32 = 256;

/// Numeric code reported by matrix snapshots for an empty cell.
pub const EMPTY_CELL_CODE: i32 = 0;

/// Location of a single grid cell.
///
/// `x` grows to the right and `y` grows upward, so "down" means decreasing
/// `y` and "left" means decreasing `x`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: u32,
    y: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column of the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row of the cell.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Chebyshev distance between two cells; adjacent cells (diagonals
    /// included) are at distance one.
    #[must_use]
    pub fn chebyshev_distance(self, other: CellCoord) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

/// Opaque handle identifying a combat unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

/// Side of the battle a unit fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Team {
    /// Team deployed along the lower edge of the board.
    Lower,
    /// Team deployed along the upper edge of the board.
    Upper,
}

impl Team {
    /// Both teams in index order.
    pub const ALL: [Team; 2] = [Team::Lower, Team::Upper];

    /// Numeric team code reported by matrix snapshots.
    #[must_use]
    pub const fn number(self) -> i32 {
        match self {
            Self::Lower => 1,
            Self::Upper => 2,
        }
    }

    /// The opposing team.
    #[must_use]
    pub const fn opponent(self) -> Team {
        match self {
            Self::Lower => Self::Upper,
            Self::Upper => Self::Lower,
        }
    }

    /// Zero-based index suitable for per-team storage.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Lower => 0,
            Self::Upper => 1,
        }
    }
}

/// Terrain that permanently blocks a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleType {
    /// Impassable block.
    Block,
    /// Lava pool.
    Lava,
    /// Water pool.
    Water,
    /// Hole punched into the board, typically while the battlefield narrows.
    Hole,
}

impl ObstacleType {
    /// Single-character code used in debug dumps.
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Block => 'B',
            Self::Lava => 'L',
            Self::Water => 'W',
            Self::Hole => 'H',
        }
    }

    /// Parses a single-character obstacle code.
    #[must_use]
    pub const fn from_code(code: char) -> Option<Self> {
        match code {
            'B' => Some(Self::Block),
            'L' => Some(Self::Lava),
            'W' => Some(Self::Water),
            'H' => Some(Self::Hole),
            _ => None,
        }
    }

    /// Numeric code reported by matrix snapshots.
    ///
    /// Values start above the team numbers so the two never collide.
    #[must_use]
    pub const fn numeric(self) -> i32 {
        match self {
            Self::Block => 3,
            Self::Lava => 4,
            Self::Water => 5,
            Self::Hole => 6,
        }
    }
}

/// Terrain layout chosen once per battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainKind {
    /// Open board without central obstacles.
    Normal,
    /// Central band flooded with water.
    WaterCenter,
    /// Central band filled with lava.
    LavaCenter,
    /// Central band filled with blocks.
    BlockCenter,
}

impl TerrainKind {
    /// Obstacle seeded into the center region, if any.
    #[must_use]
    pub const fn obstacle(self) -> Option<ObstacleType> {
        match self {
            Self::Normal => None,
            Self::WaterCenter => Some(ObstacleType::Water),
            Self::LavaCenter => Some(ObstacleType::Lava),
            Self::BlockCenter => Some(ObstacleType::Block),
        }
    }
}

/// Contents of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum CellLabel {
    /// Nothing occupies or claims the cell.
    #[default]
    Empty,
    /// The cell belongs to the provided unit.
    Unit(UnitId),
    /// The cell is blocked by terrain.
    Obstacle(ObstacleType),
}

impl CellLabel {
    /// Reports whether the label is [`CellLabel::Empty`].
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Unit stored in the label, if any.
    #[must_use]
    pub const fn unit(self) -> Option<UnitId> {
        match self {
            Self::Unit(unit) => Some(unit),
            _ => None,
        }
    }
}

/// Footprint shape of a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitSize {
    /// Unit covering a single cell.
    Small,
    /// Unit covering a 2×2 block of cells.
    Large,
}

impl UnitSize {
    /// Number of cells covered by the footprint.
    #[must_use]
    pub const fn cell_count(self) -> usize {
        match self {
            Self::Small => 1,
            Self::Large => 4,
        }
    }
}

/// Diagonal directions used to mask aggression propagation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Diagonal {
    /// Toward decreasing `x` and decreasing `y`.
    DownLeft,
    /// Toward decreasing `x` and increasing `y`.
    UpLeft,
    /// Toward increasing `x` and decreasing `y`.
    DownRight,
    /// Toward increasing `x` and increasing `y`.
    UpRight,
}

impl Diagonal {
    /// All diagonals in a fixed order.
    pub const ALL: [Diagonal; 4] = [
        Diagonal::DownLeft,
        Diagonal::UpLeft,
        Diagonal::DownRight,
        Diagonal::UpRight,
    ];

    const fn bit(self) -> u8 {
        match self {
            Self::DownLeft => 0b0001,
            Self::UpLeft => 0b0010,
            Self::DownRight => 0b0100,
            Self::UpRight => 0b1000,
        }
    }

    /// Horizontal component of the diagonal.
    #[must_use]
    pub const fn horizontal(self) -> AxisDirection {
        match self {
            Self::DownLeft | Self::UpLeft => AxisDirection::NegativeX,
            Self::DownRight | Self::UpRight => AxisDirection::PositiveX,
        }
    }

    /// Vertical component of the diagonal.
    #[must_use]
    pub const fn vertical(self) -> AxisDirection {
        match self {
            Self::DownLeft | Self::DownRight => AxisDirection::NegativeY,
            Self::UpLeft | Self::UpRight => AxisDirection::PositiveY,
        }
    }
}

/// Axis-aligned propagation directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AxisDirection {
    /// Toward increasing `x`.
    PositiveX,
    /// Toward increasing `y`.
    PositiveY,
    /// Toward decreasing `x`.
    NegativeX,
    /// Toward decreasing `y`.
    NegativeY,
}

impl AxisDirection {
    /// All axis directions in a fixed order.
    pub const ALL: [AxisDirection; 4] = [
        AxisDirection::PositiveX,
        AxisDirection::PositiveY,
        AxisDirection::NegativeX,
        AxisDirection::NegativeY,
    ];
}

/// Set of [`Diagonal`] values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct DiagonalSet {
    bits: u8,
}

impl DiagonalSet {
    /// Set containing no diagonals.
    pub const EMPTY: DiagonalSet = DiagonalSet { bits: 0 };

    /// Set containing every diagonal.
    pub const FULL: DiagonalSet = DiagonalSet { bits: 0b1111 };

    /// Set containing only the provided diagonal.
    #[must_use]
    pub const fn only(diagonal: Diagonal) -> Self {
        Self {
            bits: diagonal.bit(),
        }
    }

    /// Returns a copy of the set extended with `diagonal`.
    #[must_use]
    pub const fn with(self, diagonal: Diagonal) -> Self {
        Self {
            bits: self.bits | diagonal.bit(),
        }
    }

    /// Reports whether the set includes `diagonal`.
    #[must_use]
    pub const fn contains(self, diagonal: Diagonal) -> bool {
        self.bits & diagonal.bit() != 0
    }

    /// Reports whether any diagonal in the set has `axis` as a component.
    #[must_use]
    pub fn touches(self, axis: AxisDirection) -> bool {
        self.iter()
            .any(|diagonal| diagonal.horizontal() == axis || diagonal.vertical() == axis)
    }

    /// Iterator over the diagonals in the set.
    pub fn iter(self) -> impl Iterator<Item = Diagonal> {
        Diagonal::ALL
            .into_iter()
            .filter(move |diagonal| self.contains(*diagonal))
    }
}

impl FromIterator<Diagonal> for DiagonalSet {
    fn from_iter<I: IntoIterator<Item = Diagonal>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

/// Position expressed in continuous world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl WorldPoint {
    /// Creates a new world-space point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Layout constants used to convert between world positions and cells.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSettings {
    grid_size: u32,
    cell_size: f32,
    min_x: f32,
    min_y: f32,
}

impl GridSettings {
    /// Creates new settings for a square grid whose lower-left corner sits
    /// at `(min_x, min_y)`.
    #[must_use]
    pub const fn new(grid_size: u32, cell_size: f32, min_x: f32, min_y: f32) -> Self {
        Self {
            grid_size,
            cell_size,
            min_x,
            min_y,
        }
    }

    /// Number of cells along each edge.
    #[must_use]
    pub const fn grid_size(&self) -> u32 {
        self.grid_size
    }

    /// Edge length of a single cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Smallest world `x` covered by the grid.
    #[must_use]
    pub const fn min_x(&self) -> f32 {
        self.min_x
    }

    /// Smallest world `y` covered by the grid.
    #[must_use]
    pub const fn min_y(&self) -> f32 {
        self.min_y
    }

    /// Largest world `x` covered by the grid.
    #[must_use]
    pub fn max_x(&self) -> f32 {
        self.min_x + self.grid_size as f32 * self.cell_size
    }

    /// Largest world `y` covered by the grid.
    #[must_use]
    pub fn max_y(&self) -> f32 {
        self.min_y + self.grid_size as f32 * self.cell_size
    }
}

/// Reasons a grid configuration may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum ConfigError {
    /// The grid is too small to host the terrain bands.
    #[error("grid size {size} is below the minimum of {}", MIN_GRID_SIZE)]
    TooSmall {
        /// Requested edge length.
        size: u32,
    },
    /// The grid exceeds the supported edge length.
    #[error("grid size {size} exceeds the maximum of {}", MAX_GRID_SIZE)]
    TooLarge {
        /// Requested edge length.
        size: u32,
    },
}

/// Per-battle grid configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridConfig {
    size: u32,
    laps_until_narrow_block_terrain: u32,
    laps_until_narrow_normal_terrain: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: 16,
            laps_until_narrow_block_terrain: 5,
            laps_until_narrow_normal_terrain: 7,
        }
    }
}

impl GridConfig {
    /// Creates a validated configuration.
    pub fn new(
        size: u32,
        laps_until_narrow_block_terrain: u32,
        laps_until_narrow_normal_terrain: u32,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            size,
            laps_until_narrow_block_terrain,
            laps_until_narrow_normal_terrain,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants a configuration must satisfy.
    ///
    /// Deserialized configurations bypass [`GridConfig::new`], so consumers
    /// call this before building a grid from one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size < MIN_GRID_SIZE {
            return Err(ConfigError::TooSmall { size: self.size });
        }
        if self.size > MAX_GRID_SIZE {
            return Err(ConfigError::TooLarge { size: self.size });
        }
        Ok(())
    }

    /// Number of cells along each edge.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Laps before the board starts narrowing when the center holds terrain.
    #[must_use]
    pub const fn laps_until_narrow_block_terrain(&self) -> u32 {
        self.laps_until_narrow_block_terrain
    }

    /// Laps before the board starts narrowing on open terrain.
    #[must_use]
    pub const fn laps_until_narrow_normal_terrain(&self) -> u32 {
        self.laps_until_narrow_normal_terrain
    }
}

/// Neighbouring target claim held by a unit of a different team.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetContest {
    /// Neighbouring cell whose claim conflicts with the new one.
    pub cell: CellCoord,
    /// Unit holding the conflicting claim.
    pub claimant: UnitId,
    /// Team of the conflicting claimant.
    pub team: Team,
}

/// Reasons an occupancy request may be rejected by the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OccupancyRejection {
    /// A requested cell lies outside the grid.
    OutOfBounds,
    /// A requested cell holds another unit or an obstacle.
    Occupied,
    /// Every requested cell is already taken.
    AllCellsTaken,
    /// The request does not describe a valid footprint.
    InvalidFootprint,
    /// The unit currently holds a footprint of a different shape.
    FootprintMismatch,
}

/// Commands that express all permissible grid mutations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Rebuilds the grid from the provided configuration.
    ConfigureGrid {
        /// Grid dimensions and narrowing schedule.
        config: GridConfig,
        /// Seed used to draw the terrain kind.
        terrain_seed: u64,
    },
    /// Places a small unit onto a single cell.
    OccupyCell {
        /// Unit being placed.
        unit: UnitId,
        /// Team the unit fights for.
        team: Team,
        /// Destination cell.
        cell: CellCoord,
        /// Attack range of the unit; zero means it projects no threat.
        attack_range: u32,
    },
    /// Places a large unit onto a 2×2 block of cells.
    OccupyCells {
        /// Unit being placed.
        unit: UnitId,
        /// Team the unit fights for.
        team: Team,
        /// Destination footprint.
        cells: Vec<CellCoord>,
        /// Attack range of the unit; zero means it projects no threat.
        attack_range: u32,
    },
    /// Removes a unit from the grid.
    Release {
        /// Unit being removed.
        unit: UnitId,
        /// Attack range the unit was placed with.
        attack_range: u32,
        /// Footprint shape the unit was placed with.
        size: UnitSize,
    },
    /// Records a unit's intent to move into a cell.
    ClaimTarget {
        /// Unit declaring its destination.
        unit: UnitId,
        /// Team the unit fights for.
        team: Team,
        /// Cell the unit currently stands on.
        current: Option<CellCoord>,
        /// Cell the unit intends to enter.
        target: Option<CellCoord>,
    },
    /// Drops every target claim held by a unit.
    ReleaseTargetClaims {
        /// Unit whose claims are dropped.
        unit: UnitId,
    },
    /// Punches a permanent hole into a cell.
    PlaceHole {
        /// Cell turned into a hole.
        cell: CellCoord,
    },
    /// Turns the free cells of an outer ring into holes.
    NarrowBoard {
        /// Ring index counted inward from the border.
        ring: u32,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Confirms that the grid was rebuilt.
    GridConfigured {
        /// Edge length of the new grid.
        size: u32,
        /// Terrain drawn for the battle.
        terrain: TerrainKind,
    },
    /// Reports that a configuration was rejected.
    ConfigurationRejected {
        /// Specific reason the configuration failed validation.
        reason: ConfigError,
    },
    /// Confirms that a unit now occupies the provided cells.
    UnitPlaced {
        /// Unit that was placed.
        unit: UnitId,
        /// Team the unit fights for.
        team: Team,
        /// Cells occupied after placement.
        footprint: Vec<CellCoord>,
    },
    /// Reports that a placement request was rejected.
    PlacementRejected {
        /// Unit whose placement failed.
        unit: UnitId,
        /// Specific reason the placement failed.
        reason: OccupancyRejection,
    },
    /// Confirms that a unit left the grid.
    UnitReleased {
        /// Unit that was removed.
        unit: UnitId,
    },
    /// Confirms that a unit claimed a destination cell.
    TargetClaimed {
        /// Unit holding the claim.
        unit: UnitId,
        /// Claimed cell.
        cell: CellCoord,
    },
    /// Reports a neighbouring claim from another team.
    TargetContested {
        /// Unit whose claim triggered the check.
        unit: UnitId,
        /// Conflicting neighbouring claim.
        contest: TargetContest,
    },
    /// Confirms that a cell was turned into a hole.
    HolePlaced {
        /// Cell that became a hole.
        cell: CellCoord,
    },
    /// Confirms that an outer ring was narrowed.
    BoardNarrowed {
        /// Ring index counted inward from the border.
        ring: u32,
        /// Cells that became holes.
        cells: Vec<CellCoord>,
    },
}
