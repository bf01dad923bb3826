#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that reports which placed units stand inside enemy melee threat.

use std::collections::BTreeMap;

use tactics_grid_core::{CellCoord, Event, GridSettings, UnitId, UnitSize, WorldPoint};

/// Engagement system that mirrors unit placements from the event stream.
#[derive(Debug, Default)]
pub struct Engagement {
    placements: BTreeMap<UnitId, Placement>,
}

impl Engagement {
    /// Creates a new engagement system with no known placements.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of units currently tracked as placed.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.placements.len()
    }

    /// Consumes world events and reports every tracked unit that `threatened`
    /// accepts at its current world position.
    ///
    /// The output buffer is cleared first and filled in ascending unit order.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        settings: &GridSettings,
        mut threatened: F,
        out: &mut Vec<UnitId>,
    ) where
        F: FnMut(WorldPoint, UnitId, UnitSize) -> bool,
    {
        out.clear();

        for event in events {
            match event {
                Event::GridConfigured { .. } => self.placements.clear(),
                Event::UnitPlaced {
                    unit, footprint, ..
                } => {
                    if let Some(placement) = Placement::from_footprint(footprint) {
                        let _ = self.placements.insert(*unit, placement);
                    }
                }
                Event::UnitReleased { unit } => {
                    let _ = self.placements.remove(unit);
                }
                _ => {}
            }
        }

        for (unit, placement) in &self.placements {
            if threatened(placement.position(settings), *unit, placement.size) {
                out.push(*unit);
            }
        }
    }
}

/// Bounding box of a footprint measured in half cells.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Placement {
    size: UnitSize,
    center: HalfCellPoint,
}

impl Placement {
    fn from_footprint(footprint: &[CellCoord]) -> Option<Self> {
        let size = match footprint.len() {
            1 => UnitSize::Small,
            4 => UnitSize::Large,
            _ => return None,
        };

        let low_x = footprint.iter().map(|cell| cell.x()).min()?;
        let low_y = footprint.iter().map(|cell| cell.y()).min()?;
        let high_x = footprint.iter().map(|cell| cell.x()).max()?;
        let high_y = footprint.iter().map(|cell| cell.y()).max()?;

        Some(Self {
            size,
            center: HalfCellPoint {
                column: i64::from(low_x) + i64::from(high_x) + 1,
                row: i64::from(low_y) + i64::from(high_y) + 1,
            },
        })
    }

    fn position(&self, settings: &GridSettings) -> WorldPoint {
        let half = settings.cell_size() / 2.0;
        WorldPoint::new(
            settings.min_x() + self.center.column as f32 * half,
            settings.min_y() + self.center.row as f32 * half,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct HalfCellPoint {
    column: i64,
    row: i64,
}
