//! Per-team aggression matrices and the propagation rules that maintain them.

use tactics_grid_core::{
    AxisDirection, CellCoord, Diagonal, DiagonalSet, AGGRESSION_BASELINE,
};

/// Dense grid of threat counts projected by one team's occupants.
///
/// Every cell starts at [`AGGRESSION_BASELINE`]; a value above the baseline
/// means at least one occupant with a nonzero attack range stands next to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggressionMatrix {
    size: u32,
    values: Vec<i32>,
}

impl AggressionMatrix {
    pub(crate) fn new(size: u32) -> Self {
        let capacity_u64 = u64::from(size) * u64::from(size);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            size,
            values: vec![AGGRESSION_BASELINE; capacity],
        }
    }

    /// Number of cells along each edge.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Threat count stored for the cell, if it lies within the matrix.
    #[must_use]
    pub fn get(&self, cell: CellCoord) -> Option<i32> {
        self.index(cell)
            .and_then(|index| self.values.get(index).copied())
    }

    /// Reports whether the cell carries threat above the baseline.
    #[must_use]
    pub fn is_threatened(&self, cell: CellCoord) -> bool {
        self.get(cell)
            .map_or(false, |value| value > AGGRESSION_BASELINE)
    }

    /// Copies the matrix into rows indexed as `[y][x]`.
    #[must_use]
    pub fn rows(&self) -> Vec<Vec<i32>> {
        let width = usize::try_from(self.size).unwrap_or(0);
        if width == 0 {
            return Vec::new();
        }
        self.values.chunks(width).map(<[i32]>::to_vec).collect()
    }

    /// Iterator over all threat counts in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.values.iter().copied()
    }

    fn add(&mut self, cell: CellCoord, delta: i32) {
        if let Some(index) = self.index(cell) {
            if let Some(value) = self.values.get_mut(index) {
                *value += delta;
            }
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.x() < self.size && cell.y() < self.size {
            let row = usize::try_from(cell.y()).ok()?;
            let column = usize::try_from(cell.x()).ok()?;
            let width = usize::try_from(self.size).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Applies `delta` to the cells `reach` steps away from `anchor`.
///
/// An axis direction is permitted when the cell in that direction lies on the
/// board and, if a mask is given, one of the masked diagonals leans that way.
/// Diagonal cells additionally require both of their axes to be permitted and
/// the diagonal itself to be part of the mask. Calling this twice with
/// opposite deltas and the same anchor and mask leaves the matrix unchanged.
pub(crate) fn propagate(
    matrix: &mut AggressionMatrix,
    anchor: CellCoord,
    reach: u32,
    delta: i32,
    mask: Option<DiagonalSet>,
) {
    let size = matrix.size();
    let permitted = |axis: AxisDirection| {
        step(anchor, axis, reach, size).is_some()
            && mask.map_or(true, |mask| mask.touches(axis))
    };

    for axis in AxisDirection::ALL {
        if !permitted(axis) {
            continue;
        }
        if let Some(cell) = step(anchor, axis, reach, size) {
            matrix.add(cell, delta);
        }
    }

    for diagonal in Diagonal::ALL {
        if !mask.map_or(true, |mask| mask.contains(diagonal)) {
            continue;
        }

        let horizontal = diagonal.horizontal();
        let vertical = diagonal.vertical();
        if !permitted(horizontal) || !permitted(vertical) {
            continue;
        }

        let cell = step(anchor, horizontal, reach, size)
            .and_then(|cell| step(cell, vertical, reach, size));
        if let Some(cell) = cell {
            matrix.add(cell, delta);
        }
    }
}

/// Applies `delta` around a multi-cell footprint.
///
/// Only the four corners of the footprint's bounding box project threat, each
/// restricted to its outward-facing diagonal, so every neighbouring cell of a
/// 2×2 block is touched exactly once.
pub(crate) fn propagate_footprint(
    matrix: &mut AggressionMatrix,
    footprint: &[CellCoord],
    reach: u32,
    delta: i32,
) {
    let Some(corners) = footprint_corners(footprint) else {
        return;
    };

    for (corner, diagonal) in corners {
        propagate(matrix, corner, reach, delta, Some(DiagonalSet::only(diagonal)));
    }
}

/// Corners of the footprint's bounding box paired with their outward diagonal.
pub(crate) fn footprint_corners(footprint: &[CellCoord]) -> Option<[(CellCoord, Diagonal); 4]> {
    let min_x = footprint.iter().map(CellCoord::x).min()?;
    let max_x = footprint.iter().map(CellCoord::x).max()?;
    let min_y = footprint.iter().map(CellCoord::y).min()?;
    let max_y = footprint.iter().map(CellCoord::y).max()?;

    Some([
        (CellCoord::new(min_x, min_y), Diagonal::DownLeft),
        (CellCoord::new(min_x, max_y), Diagonal::UpLeft),
        (CellCoord::new(max_x, min_y), Diagonal::DownRight),
        (CellCoord::new(max_x, max_y), Diagonal::UpRight),
    ])
}

fn step(cell: CellCoord, axis: AxisDirection, reach: u32, size: u32) -> Option<CellCoord> {
    let (x, y) = match axis {
        AxisDirection::PositiveX => (cell.x().checked_add(reach)?, cell.y()),
        AxisDirection::NegativeX => (cell.x().checked_sub(reach)?, cell.y()),
        AxisDirection::PositiveY => (cell.x(), cell.y().checked_add(reach)?),
        AxisDirection::NegativeY => (cell.x(), cell.y().checked_sub(reach)?),
    };

    (x < size && y < size).then(|| CellCoord::new(x, y))
}
