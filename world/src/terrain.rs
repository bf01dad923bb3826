//! Terrain selection and the center region eligible for obstacles.

use rand::Rng;
use tactics_grid_core::{CellCoord, TerrainKind};

/// Draws the terrain kind for a new battle.
///
/// Two of six buckets yield open terrain, two yield a block center, and the
/// remaining two are split between water and lava.
pub(crate) fn draw_terrain<R: Rng + ?Sized>(rng: &mut R) -> TerrainKind {
    match rng.gen_range(0..6) {
        0 | 1 => TerrainKind::Normal,
        2 | 3 => TerrainKind::BlockCenter,
        4 => TerrainKind::WaterCenter,
        _ => TerrainKind::LavaCenter,
    }
}

/// Half-open `[start, end)` band of rows and columns at the board center.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CenterRegion {
    start: u32,
    end: u32,
}

impl CenterRegion {
    /// Computes the center region for a board of `size` cells.
    ///
    /// Open terrain keeps a narrow two-cell band; obstacle terrain spans half
    /// of the board, offset by a quarter of its size from each edge.
    #[must_use]
    pub fn for_terrain(size: u32, terrain: TerrainKind) -> Self {
        match terrain {
            TerrainKind::Normal => {
                let half = size / 2;
                Self {
                    start: half.saturating_sub(1),
                    end: (half + 1).min(size),
                }
            }
            TerrainKind::WaterCenter | TerrainKind::LavaCenter | TerrainKind::BlockCenter => {
                let quarter = size / 4;
                Self {
                    start: quarter,
                    end: size - quarter,
                }
            }
        }
    }

    /// First row and column inside the region.
    #[must_use]
    pub const fn start(&self) -> u32 {
        self.start
    }

    /// First row and column past the region.
    #[must_use]
    pub const fn end(&self) -> u32 {
        self.end
    }

    /// Reports whether the cell lies inside the square spanned by the band.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        (self.start..self.end).contains(&cell.x()) && (self.start..self.end).contains(&cell.y())
    }

    /// Iterator over every cell of the square spanned by the band.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let range = self.start..self.end;
        range
            .clone()
            .flat_map(move |y| range.clone().map(move |x| CellCoord::new(x, y)))
    }
}
