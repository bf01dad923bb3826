//! Occupancy grid tracking unit footprints, target claims, and threat.

use std::{collections::BTreeMap, fmt};

use log::{debug, info, trace};
use rand::Rng;
use tactics_grid_core::{
    CellCoord, CellLabel, GridConfig, GridSettings, ObstacleType, OccupancyRejection,
    TargetContest, Team, TerrainKind, UnitId, UnitSize, WorldPoint, EMPTY_CELL_CODE,
    MELEE_REACH,
};

use crate::{
    aggression::{propagate, propagate_footprint, AggressionMatrix},
    grid_math,
    terrain::{draw_terrain, CenterRegion},
};

const NEIGHBOUR_OFFSETS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Authoritative record of which unit stands where on the battlefield.
///
/// Cells hold a [`CellLabel`]; a parallel target layer records the cells
/// units intend to move into. Each team owns an [`AggressionMatrix`] that
/// counts the melee threat its armed occupants project onto neighbouring
/// cells.
///
/// Mutating operations report failure through their return value and never
/// panic. Coordinates outside the board are absorbed: reads treat them as
/// no-ops and writes reject them, because positions derived from continuous
/// movement may legitimately stray past the edge.
#[derive(Clone, Debug)]
pub struct OccupancyGrid {
    size: u32,
    terrain: TerrainKind,
    center: CenterRegion,
    laps_until_narrowing: u32,
    labels: Vec<CellLabel>,
    targets: Vec<CellLabel>,
    footprints: BTreeMap<UnitId, Vec<CellCoord>>,
    ranges: BTreeMap<UnitId, u32>,
    teams: BTreeMap<UnitId, Team>,
    aggression: [AggressionMatrix; 2],
}

impl OccupancyGrid {
    /// Creates a grid whose terrain is drawn from `rng`.
    pub fn new<R: Rng + ?Sized>(config: &GridConfig, rng: &mut R) -> Self {
        let terrain = draw_terrain(rng);
        info!("battle grid {0}x{0} drew {terrain:?} terrain", config.size());
        Self::with_terrain(config, terrain)
    }

    /// Creates a grid with an explicit terrain kind.
    #[must_use]
    pub fn with_terrain(config: &GridConfig, terrain: TerrainKind) -> Self {
        let size = config.size();
        let center = CenterRegion::for_terrain(size, terrain);
        let laps_until_narrowing = match terrain {
            TerrainKind::Normal => config.laps_until_narrow_normal_terrain(),
            TerrainKind::WaterCenter | TerrainKind::LavaCenter | TerrainKind::BlockCenter => {
                config.laps_until_narrow_block_terrain()
            }
        };

        let capacity_u64 = u64::from(size) * u64::from(size);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        let mut grid = Self {
            size,
            terrain,
            center,
            laps_until_narrowing,
            labels: vec![CellLabel::Empty; capacity],
            targets: vec![CellLabel::Empty; capacity],
            footprints: BTreeMap::new(),
            ranges: BTreeMap::new(),
            teams: BTreeMap::new(),
            aggression: [AggressionMatrix::new(size), AggressionMatrix::new(size)],
        };

        if let Some(obstacle) = terrain.obstacle() {
            for cell in center.cells() {
                if let Some(index) = grid.index(cell) {
                    grid.labels[index] = CellLabel::Obstacle(obstacle);
                }
            }
        }

        grid
    }

    /// Number of cells along each edge.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Terrain drawn for the battle.
    #[must_use]
    pub fn terrain(&self) -> TerrainKind {
        self.terrain
    }

    /// Band of rows and columns eligible for terrain obstacles.
    #[must_use]
    pub fn center_region(&self) -> CenterRegion {
        self.center
    }

    /// Laps the battle runs before the board starts narrowing.
    #[must_use]
    pub fn laps_until_narrowing(&self) -> u32 {
        self.laps_until_narrowing
    }

    /// Reports whether the cell lies on the board.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.x() < self.size && cell.y() < self.size
    }

    /// Label stored for the cell, if it lies on the board.
    #[must_use]
    pub fn label(&self, cell: CellCoord) -> Option<CellLabel> {
        self.index(cell)
            .and_then(|index| self.labels.get(index).copied())
    }

    /// Target claim stored for the cell, if it lies on the board.
    #[must_use]
    pub fn target_label(&self, cell: CellCoord) -> Option<CellLabel> {
        self.index(cell)
            .and_then(|index| self.targets.get(index).copied())
    }

    /// Unit occupying the cell, if any.
    #[must_use]
    pub fn occupant(&self, cell: CellCoord) -> Option<UnitId> {
        self.label(cell).and_then(CellLabel::unit)
    }

    /// Last known team of the unit.
    #[must_use]
    pub fn team_of(&self, unit: UnitId) -> Option<Team> {
        self.teams.get(&unit).copied()
    }

    /// Cells currently occupied by the unit.
    #[must_use]
    pub fn footprint(&self, unit: UnitId) -> Option<&[CellCoord]> {
        self.footprints.get(&unit).map(Vec::as_slice)
    }

    /// Iterator over every placed unit and its footprint, ordered by identifier.
    pub fn placements(&self) -> impl Iterator<Item = (UnitId, &[CellCoord])> {
        self.footprints
            .iter()
            .map(|(unit, cells)| (*unit, cells.as_slice()))
    }

    /// Places a small unit onto a single cell.
    ///
    /// Returns `false` when the cell is off the board, held by anything other
    /// than this unit, or when the unit currently covers several cells.
    pub fn occupy_cell(
        &mut self,
        cell: CellCoord,
        unit: UnitId,
        team: Team,
        attack_range: u32,
    ) -> bool {
        self.try_occupy_cell(cell, unit, team, attack_range).is_ok()
    }

    /// Same as [`OccupancyGrid::occupy_cell`], reporting why a placement failed.
    pub fn try_occupy_cell(
        &mut self,
        cell: CellCoord,
        unit: UnitId,
        team: Team,
        attack_range: u32,
    ) -> Result<(), OccupancyRejection> {
        let index = self.index(cell).ok_or(OccupancyRejection::OutOfBounds)?;
        match self.labels[index] {
            CellLabel::Empty => {}
            CellLabel::Unit(occupant) if occupant == unit => {}
            CellLabel::Unit(_) | CellLabel::Obstacle(_) => {
                return Err(OccupancyRejection::Occupied)
            }
        }

        if let Some(previous) = self.footprints.get(&unit) {
            if previous.len() > UnitSize::Small.cell_count() {
                return Err(OccupancyRejection::FootprintMismatch);
            }
        }

        let _ = self.withdraw(unit);

        self.labels[index] = CellLabel::Unit(unit);
        let _ = self.footprints.insert(unit, vec![cell]);
        let _ = self.ranges.insert(unit, attack_range);
        let _ = self.teams.insert(unit, team);
        if attack_range > 0 {
            self.spread_threat(team, &[cell], UnitSize::Small, 1);
        }

        trace!("{unit} occupies {cell:?} for {team:?}");
        Ok(())
    }

    /// Places a large unit onto four cells.
    ///
    /// Returns `false` unless the cells name four distinct on-board cells of
    /// which at least one is currently empty and none belongs to another unit
    /// or an obstacle. A unit currently covering a single cell is rejected.
    pub fn occupy_cells(
        &mut self,
        cells: &[CellCoord],
        unit: UnitId,
        team: Team,
        attack_range: u32,
    ) -> bool {
        self.try_occupy_cells(cells, unit, team, attack_range)
            .is_ok()
    }

    /// Same as [`OccupancyGrid::occupy_cells`], reporting why a placement failed.
    pub fn try_occupy_cells(
        &mut self,
        cells: &[CellCoord],
        unit: UnitId,
        team: Team,
        attack_range: u32,
    ) -> Result<(), OccupancyRejection> {
        let mut footprint = cells.to_vec();
        footprint.sort_unstable();
        footprint.dedup();
        if footprint.len() != UnitSize::Large.cell_count() {
            return Err(OccupancyRejection::InvalidFootprint);
        }

        let mut labels = Vec::with_capacity(footprint.len());
        for cell in &footprint {
            labels.push(self.label(*cell).ok_or(OccupancyRejection::OutOfBounds)?);
        }
        if labels.iter().all(|label| !label.is_empty()) {
            return Err(OccupancyRejection::AllCellsTaken);
        }
        let foreign = labels.iter().any(|label| match label {
            CellLabel::Empty => false,
            CellLabel::Unit(occupant) => *occupant != unit,
            CellLabel::Obstacle(_) => true,
        });
        if foreign {
            return Err(OccupancyRejection::Occupied);
        }

        if let Some(previous) = self.footprints.get(&unit) {
            if previous.len() != UnitSize::Large.cell_count() {
                return Err(OccupancyRejection::FootprintMismatch);
            }
        }

        let _ = self.withdraw(unit);

        for cell in &footprint {
            if let Some(index) = self.index(*cell) {
                self.labels[index] = CellLabel::Unit(unit);
            }
        }
        if attack_range > 0 {
            self.spread_threat(team, &footprint, UnitSize::Large, 1);
        }
        trace!("{unit} occupies {footprint:?} for {team:?}");
        let _ = self.footprints.insert(unit, footprint);
        let _ = self.ranges.insert(unit, attack_range);
        let _ = self.teams.insert(unit, team);
        Ok(())
    }

    /// Removes a unit from the grid.
    ///
    /// Clears the unit's cells, withdraws the threat it projected, drops its
    /// target claims, and forgets its team. Threat is withdrawn with the
    /// range and footprint recorded at placement; `attack_range` and `size`
    /// are the caller's view of the unit and are only checked against that
    /// record. Returns whether the unit occupied any cells.
    pub fn cleanup_all(&mut self, unit: UnitId, attack_range: u32, size: UnitSize) -> bool {
        if let (Some(footprint), Some(recorded)) =
            (self.footprints.get(&unit), self.ranges.get(&unit))
        {
            if footprint.len() != size.cell_count() || *recorded != attack_range {
                debug!(
                    "{unit} released as {size:?} with range {attack_range} but was placed \
                     on {} cells with range {recorded}",
                    footprint.len()
                );
            }
        }

        let released = self.withdraw(unit);

        let _ = self.release_target_claims(unit);
        let _ = self.teams.remove(&unit);
        released
    }

    /// Records that `unit` intends to move from `current` into `target`.
    ///
    /// Returns the neighbouring claims held by units of another team. The
    /// grid does not settle such contests; that is left to the caller.
    pub fn target_to_cell(
        &mut self,
        unit: UnitId,
        team: Team,
        current: Option<CellCoord>,
        target: Option<CellCoord>,
    ) -> Vec<TargetContest> {
        let (Some(_), Some(target)) = (current, target) else {
            return Vec::new();
        };
        let Some(index) = self.index(target) else {
            return Vec::new();
        };
        if let CellLabel::Obstacle(_) = self.targets[index] {
            return Vec::new();
        }

        self.targets[index] = CellLabel::Unit(unit);
        let _ = self.teams.insert(unit, team);

        let contests: Vec<TargetContest> = neighbours(target, self.size)
            .filter_map(|cell| {
                let claimant = self.target_label(cell)?.unit()?;
                let claimant_team = self.team_of(claimant)?;
                (claimant_team != team).then_some(TargetContest {
                    cell,
                    claimant,
                    team: claimant_team,
                })
            })
            .collect();

        for contest in &contests {
            debug!(
                "{unit} targeting {target:?} is contested by {} at {:?}",
                contest.claimant, contest.cell
            );
        }

        contests
    }

    /// Drops every target claim held by the unit, returning how many were held.
    pub fn release_target_claims(&mut self, unit: UnitId) -> usize {
        let mut released = 0;
        for claim in &mut self.targets {
            if *claim == CellLabel::Unit(unit) {
                *claim = CellLabel::Empty;
                released += 1;
            }
        }
        released
    }

    /// Reports whether every cell is free of obstacles and of units other
    /// than `exclude`. Off-board cells are ignored.
    #[must_use]
    pub fn are_all_cells_empty(&self, cells: &[CellCoord], exclude: Option<UnitId>) -> bool {
        cells.iter().all(|cell| match self.label(*cell) {
            None | Some(CellLabel::Empty) => true,
            Some(CellLabel::Unit(occupant)) => Some(occupant) == exclude,
            Some(CellLabel::Obstacle(_)) => false,
        })
    }

    /// Reports whether a unit standing at `position` is inside enemy melee
    /// threat.
    ///
    /// Small units are checked on the cell containing `position`; large units
    /// on the cells around it. Units without a known team are never
    /// threatened.
    #[must_use]
    pub fn can_be_attacked_by_melee(
        &self,
        position: WorldPoint,
        unit: UnitId,
        size: UnitSize,
        settings: &GridSettings,
    ) -> bool {
        let Some(enemy) = self.enemy_aggression_for_unit(unit) else {
            return false;
        };

        let cells = match size {
            UnitSize::Small => grid_math::cell_for_position(settings, position)
                .into_iter()
                .collect(),
            UnitSize::Large => grid_math::cells_around_point(settings, position),
        };

        cells.into_iter().any(|cell| enemy.is_threatened(cell))
    }

    /// Reports whether no unit has claimed the cell as its destination.
    ///
    /// Occupancy is deliberately not consulted; movement validity against
    /// occupants and obstacles is checked by the caller.
    #[must_use]
    pub fn can_move_there(&self, cell: CellCoord) -> bool {
        self.target_label(cell)
            .map_or(false, CellLabel::is_empty)
    }

    /// Builds a numeric snapshot of the board indexed as `[y][x]`.
    ///
    /// Occupied cells report the occupant's team number, claimed cells the
    /// claimant's team number, obstacles their numeric code, and everything
    /// else zero.
    #[must_use]
    pub fn matrix(&self) -> Vec<Vec<i32>> {
        (0..self.size)
            .map(|y| {
                (0..self.size)
                    .map(|x| self.cell_code(CellCoord::new(x, y)))
                    .collect()
            })
            .collect()
    }

    /// Turns the cell into a permanent hole.
    ///
    /// Returns `false` when the cell lies outside either the grid or the
    /// provided settings, or when a unit stands on it.
    pub fn occupy_by_hole(&mut self, settings: &GridSettings, cell: CellCoord) -> bool {
        if cell.x() >= settings.grid_size() || cell.y() >= settings.grid_size() {
            return false;
        }
        let Some(index) = self.index(cell) else {
            return false;
        };
        if let CellLabel::Unit(_) = self.labels[index] {
            return false;
        }

        self.labels[index] = CellLabel::Obstacle(ObstacleType::Hole);
        self.targets[index] = CellLabel::Obstacle(ObstacleType::Hole);
        true
    }

    /// Turns every empty, unclaimed cell of ring `ring` into a hole.
    ///
    /// Ring zero is the border; each following ring sits one cell further
    /// inward. Returns the cells that became holes.
    pub fn narrow(&mut self, ring: u32, settings: &GridSettings) -> Vec<CellCoord> {
        let mut holed = Vec::new();
        if ring.saturating_mul(2) >= self.size {
            return holed;
        }

        let last = self.size - 1 - ring;
        for y in ring..=last {
            for x in ring..=last {
                if x != ring && x != last && y != ring && y != last {
                    continue;
                }

                let cell = CellCoord::new(x, y);
                let free = self.label(cell) == Some(CellLabel::Empty)
                    && self.target_label(cell) == Some(CellLabel::Empty);
                if free && self.occupy_by_hole(settings, cell) {
                    holed.push(cell);
                }
            }
        }

        info!("narrowed ring {ring}: {} cells became holes", holed.len());
        holed
    }

    /// Threat projected by the team's armed occupants.
    #[must_use]
    pub fn aggression_for_team(&self, team: Team) -> &AggressionMatrix {
        &self.aggression[team.index()]
    }

    /// Threat projected onto the unit by the opposing team.
    #[must_use]
    pub fn enemy_aggression_for_unit(&self, unit: UnitId) -> Option<&AggressionMatrix> {
        self.team_of(unit)
            .map(|team| self.aggression_for_team(team.opponent()))
    }

    fn cell_code(&self, cell: CellCoord) -> i32 {
        let label = self.label(cell).unwrap_or_default();
        let target = self.target_label(cell).unwrap_or_default();

        let claimant_team = label
            .unit()
            .or_else(|| target.unit())
            .and_then(|unit| self.team_of(unit));
        if let Some(team) = claimant_team {
            return team.number();
        }

        match (label, target) {
            (CellLabel::Obstacle(obstacle), _) | (_, CellLabel::Obstacle(obstacle)) => {
                obstacle.numeric()
            }
            _ => EMPTY_CELL_CODE,
        }
    }

    /// Lifts the unit's current placement, undoing exactly what its
    /// occupy call recorded. Returns whether the unit was placed.
    fn withdraw(&mut self, unit: UnitId) -> bool {
        let Some(cells) = self.footprints.remove(&unit) else {
            return false;
        };
        let attack_range = self.ranges.remove(&unit).unwrap_or(0);

        for cell in &cells {
            if let Some(index) = self.index(*cell) {
                if self.labels[index] == CellLabel::Unit(unit) {
                    self.labels[index] = CellLabel::Empty;
                }
            }
        }

        if attack_range > 0 {
            if let Some(team) = self.team_of(unit) {
                let size = if cells.len() == UnitSize::Large.cell_count() {
                    UnitSize::Large
                } else {
                    UnitSize::Small
                };
                self.spread_threat(team, &cells, size, -1);
            }
        }

        trace!("{unit} lifted from {cells:?}");
        true
    }

    fn spread_threat(&mut self, team: Team, cells: &[CellCoord], size: UnitSize, delta: i32) {
        let matrix = &mut self.aggression[team.index()];
        match size {
            UnitSize::Small => {
                for cell in cells {
                    propagate(matrix, *cell, MELEE_REACH, delta, None);
                }
            }
            UnitSize::Large => propagate_footprint(matrix, cells, MELEE_REACH, delta),
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if self.contains(cell) {
            let row = usize::try_from(cell.y()).ok()?;
            let column = usize::try_from(cell.x()).ok()?;
            let width = usize::try_from(self.size).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

impl fmt::Display for OccupancyGrid {
    /// Renders the board top row first: `.` for free cells, the team number
    /// for occupants, and the obstacle code for terrain.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in (0..self.size).rev() {
            for x in 0..self.size {
                let symbol = match self.label(CellCoord::new(x, y)).unwrap_or_default() {
                    CellLabel::Empty => '.',
                    CellLabel::Unit(unit) => match self.team_of(unit) {
                        Some(Team::Lower) => '1',
                        Some(Team::Upper) => '2',
                        None => '?',
                    },
                    CellLabel::Obstacle(obstacle) => obstacle.code(),
                };
                write!(f, "{symbol}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn neighbours(cell: CellCoord, size: u32) -> impl Iterator<Item = CellCoord> {
    let size = i64::from(size);
    NEIGHBOUR_OFFSETS.into_iter().filter_map(move |(dx, dy)| {
        let x = i64::from(cell.x()) + dx;
        let y = i64::from(cell.y()) + dy;
        if !(0..size).contains(&x) || !(0..size).contains(&y) {
            return None;
        }
        Some(CellCoord::new(u32::try_from(x).ok()?, u32::try_from(y).ok()?))
    })
}
