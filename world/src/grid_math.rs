//! Conversions between continuous world positions and grid cells.

use tactics_grid_core::{CellCoord, GridSettings, WorldPoint};

/// Cell containing the provided world position, if it lies on the board.
#[must_use]
pub fn cell_for_position(settings: &GridSettings, point: WorldPoint) -> Option<CellCoord> {
    let cell_size = settings.cell_size();
    if !cell_size.is_finite() || cell_size <= 0.0 || !point.x.is_finite() || !point.y.is_finite() {
        return None;
    }

    let column = ((point.x - settings.min_x()) / cell_size).floor();
    let row = ((point.y - settings.min_y()) / cell_size).floor();
    if column < 0.0 || row < 0.0 {
        return None;
    }

    let limit = settings.grid_size() as f32;
    if column >= limit || row >= limit {
        return None;
    }

    Some(CellCoord::new(column as u32, row as u32))
}

/// Cells sharing the grid vertex nearest to the provided point.
///
/// A large unit stands on the vertex between its four cells, so this yields
/// its footprint. Cells falling off the board are omitted.
#[must_use]
pub fn cells_around_point(settings: &GridSettings, point: WorldPoint) -> Vec<CellCoord> {
    let half = settings.cell_size() / 2.0;
    let mut cells: Vec<CellCoord> = [(-half, -half), (-half, half), (half, -half), (half, half)]
        .into_iter()
        .filter_map(|(dx, dy)| {
            cell_for_position(settings, WorldPoint::new(point.x + dx, point.y + dy))
        })
        .collect();
    cells.sort_unstable();
    cells.dedup();
    cells
}

/// World position at the center of the provided cell.
#[must_use]
pub fn cell_center(settings: &GridSettings, cell: CellCoord) -> WorldPoint {
    let cell_size = settings.cell_size();
    WorldPoint::new(
        settings.min_x() + (cell.x() as f32 + 0.5) * cell_size,
        settings.min_y() + (cell.y() as f32 + 0.5) * cell_size,
    )
}

/// World position at the center of a footprint's bounding box.
#[must_use]
pub fn footprint_center(settings: &GridSettings, footprint: &[CellCoord]) -> Option<WorldPoint> {
    let first = footprint.first()?;
    let bounds = footprint.iter().fold((*first, *first), |(low, high), cell| {
        (
            CellCoord::new(low.x().min(cell.x()), low.y().min(cell.y())),
            CellCoord::new(high.x().max(cell.x()), high.y().max(cell.y())),
        )
    });
    let low = cell_center(settings, bounds.0);
    let high = cell_center(settings, bounds.1);
    Some(WorldPoint::new((low.x + high.x) / 2.0, (low.y + high.y) / 2.0))
}
