#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative exploration grid for one area.
//!
//! The grid owns every [`Cell`] of the current area and keeps them partitioned
//! by [`Classification`]. Systems never mutate cells directly: they submit
//! [`Command`] values that [`apply`] executes, and each effective change is
//! reported back as an [`Event`].

use std::time::Instant;

use grid_explorer_core::{
    CellCoord, CellGeometry, Classification, Command, Event, GridPoint, Resolution,
};
use tracing::{debug, debug_span};

mod partition;

use partition::Partition;

/// One square unit of the exploration grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    geometry: CellGeometry,
    navigable_point: GridPoint,
    classification: Classification,
}

impl Cell {
    fn new(geometry: CellGeometry) -> Self {
        Self {
            navigable_point: geometry.center(),
            geometry,
            classification: Classification::Unknown,
        }
    }

    /// Immutable geometry derived from the cell's index.
    #[must_use]
    pub const fn geometry(&self) -> &CellGeometry {
        &self.geometry
    }

    /// Grid index of the cell.
    #[must_use]
    pub const fn index(&self) -> CellCoord {
        self.geometry.index()
    }

    /// Point inside the cell that the agent can travel to.
    #[must_use]
    pub const fn navigable_point(&self) -> GridPoint {
        self.navigable_point
    }

    /// Current coverage state of the cell.
    #[must_use]
    pub const fn classification(&self) -> Classification {
        self.classification
    }
}

/// Dense cell grid partitioned into classification sets.
#[derive(Clone, Debug)]
pub struct Grid {
    columns: u32,
    rows: u32,
    cells: Vec<Cell>,
    partition: Partition,
}

impl Grid {
    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }

    fn reclassify(&mut self, index: usize, to: Classification) -> Classification {
        let cell = &mut self.cells[index];
        let from = cell.classification;
        cell.classification = to;
        self.partition.relocate(index, from, to);
        from
    }
}

/// Segments an area into cells and classifies them in one bulk pass.
///
/// `resolve` receives each freshly created cell together with its initial
/// navigable point (the cell center) and must answer without validating
/// reachability. Cells whose resolution fails start out
/// [`Classification::Disconnected`]; all others start
/// [`Classification::Unknown`].
pub fn build<F>(columns: u32, rows: u32, mut resolve: F) -> Grid
where
    F: FnMut(&CellGeometry, GridPoint) -> Resolution,
{
    let _span = debug_span!("grid_explorer.rebuild", columns, rows).entered();
    let started = Instant::now();

    let capacity_u64 = u64::from(columns) * u64::from(rows);
    let capacity = usize::try_from(capacity_u64).unwrap_or(0);
    let mut cells = Vec::with_capacity(capacity);
    let mut partition = Partition::with_capacity(capacity);

    debug!("segmenting the current area");
    for row in 0..rows {
        for column in 0..columns {
            let mut cell = Cell::new(CellGeometry::at(CellCoord::new(column, row)));
            let resolution = resolve(&cell.geometry, cell.navigable_point);
            cell.navigable_point = resolution.point;
            if !resolution.reachable {
                cell.classification = Classification::Disconnected;
            }
            partition.push(cells.len(), cell.classification);
            cells.push(cell);
        }
    }
    debug!(elapsed = ?started.elapsed(), "area segmentation complete");

    Grid {
        columns,
        rows,
        cells,
        partition,
    }
}

/// Applies the provided command to the grid.
///
/// Commands addressing cells outside the grid are dropped. An event is
/// emitted only when the classification actually changes.
pub fn apply(grid: &mut Grid, command: Command, out_events: &mut Vec<Event>) {
    let (cell, classification) = match command {
        Command::ClassifyCell {
            cell,
            classification,
            navigable_point,
        } => {
            let Some(index) = grid.index(cell) else {
                return;
            };
            grid.cells[index].navigable_point = navigable_point;
            (cell, classification)
        }
        Command::ForceClassification {
            cell,
            classification,
        } => (cell, classification),
    };

    let Some(index) = grid.index(cell) else {
        return;
    };
    let from = grid.reclassify(index, classification);
    if from != classification {
        out_events.push(Event::CellClassified {
            cell,
            from,
            to: classification,
        });
    }
}

/// Query functions that provide read-only access to the grid.
pub mod query {
    use grid_explorer_core::{
        CellCoord, CellIndex, Classification, ClassificationCounts, GridPoint,
    };

    use super::{Cell, Grid};

    /// Number of columns and rows in the grid.
    #[must_use]
    pub fn dimensions(grid: &Grid) -> (u32, u32) {
        (grid.columns, grid.rows)
    }

    /// Cell stored at the provided index, if it lies inside the grid.
    #[must_use]
    pub fn cell(grid: &Grid, coord: CellCoord) -> Option<&Cell> {
        grid.index(coord).and_then(|index| grid.cells.get(index))
    }

    /// Cell containing the provided world point, if any.
    #[must_use]
    pub fn cell_at(grid: &Grid, location: GridPoint) -> Option<&Cell> {
        let coord = location.cell_index().clip(grid.columns, grid.rows)?;
        cell(grid, coord)
    }

    /// Classification of the cell at the provided index.
    #[must_use]
    pub fn classification(grid: &Grid, coord: CellCoord) -> Option<Classification> {
        cell(grid, coord).map(Cell::classification)
    }

    /// Cells currently holding the provided classification.
    pub fn cells_with(
        grid: &Grid,
        classification: Classification,
    ) -> impl Iterator<Item = &Cell> + '_ {
        grid.partition
            .members(classification)
            .iter()
            .map(move |&index| &grid.cells[index])
    }

    /// All cells in row-major order.
    pub fn cells(grid: &Grid) -> impl Iterator<Item = &Cell> + '_ {
        grid.cells.iter()
    }

    /// Cells inside the 3×3 block centred on `coord`, the centre included.
    pub fn neighborhood(grid: &Grid, coord: CellCoord) -> impl Iterator<Item = &Cell> + '_ {
        let center = CellIndex::from(coord);
        (-1..=1).flat_map(move |dr| {
            (-1..=1).filter_map(move |dc| {
                center
                    .offset(dc, dr)
                    .clip(grid.columns, grid.rows)
                    .and_then(|neighbor| cell(grid, neighbor))
            })
        })
    }

    /// Number of cells in each classification set.
    #[must_use]
    pub fn counts(grid: &Grid) -> ClassificationCounts {
        grid.partition.counts()
    }

    /// Share of explorable cells that have been seen, in percent.
    #[must_use]
    pub fn completion_percentage(grid: &Grid) -> f32 {
        counts(grid).completion_percentage()
    }
}
