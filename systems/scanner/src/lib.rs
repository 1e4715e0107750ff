#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that classifies the neighborhood around the agent.
//!
//! The scan covers the square of cells within the known radius of the agent's
//! cell. Cells inside the inner square bounded by the seen radius are marked
//! seen; cells in the surrounding ring are marked known once a bounded path
//! to them is confirmed. Both bounds are Chebyshev distances evaluated per
//! offset, so the regions are squares rather than discs.

use std::ops::RangeInclusive;

use grid_explorer_core::{
    CellIndex, Classification, Command, ExplorerConfig, GridPoint, TerrainProbe, MIN_RADIUS,
};
use grid_explorer_system_resolver::{NavigablePointResolver, Validation};
use grid_explorer_world::{query, Grid};
use tracing::debug_span;

/// Inner and outer scan bounds measured in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanRadii {
    known: i32,
    seen: i32,
}

impl ScanRadii {
    /// Creates scan bounds, clamping each radius to at least [`MIN_RADIUS`].
    ///
    /// The seen radius is not limited by the known radius. When it is equal
    /// or larger, the outer ring is empty and every scanned cell is marked
    /// seen.
    #[must_use]
    pub fn new(known: i32, seen: i32) -> Self {
        Self {
            known: known.max(MIN_RADIUS),
            seen: seen.max(MIN_RADIUS),
        }
    }

    /// Outer radius.
    #[must_use]
    pub const fn known(&self) -> i32 {
        self.known
    }

    /// Inner radius.
    #[must_use]
    pub const fn seen(&self) -> i32 {
        self.seen
    }

    fn within_seen(&self, column_offset: i32, row_offset: i32) -> bool {
        column_offset.abs() <= self.seen && row_offset.abs() <= self.seen
    }
}

impl From<&ExplorerConfig> for ScanRadii {
    fn from(config: &ExplorerConfig) -> Self {
        Self::new(config.known_radius(), config.seen_radius())
    }
}

/// Incremental scanner that promotes cells around the agent.
#[derive(Debug, Default)]
pub struct Scanner;

impl Scanner {
    /// Creates a new scanner.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Emits classification commands for the neighborhood of `agent_cell`.
    ///
    /// Unknown and known cells in the inner square become seen after a cheap
    /// resolve. Unknown cells in the outer ring become known after a resolve
    /// validated by a path from `agent_position`. Any failed resolve marks the
    /// cell disconnected. Seen, ignored and disconnected cells are left alone,
    /// and nothing is ever demoted to unknown.
    pub fn handle(
        &self,
        grid: &Grid,
        agent_cell: CellIndex,
        agent_position: GridPoint,
        radii: ScanRadii,
        resolver: &mut NavigablePointResolver,
        probe: &TerrainProbe<'_>,
        out: &mut Vec<Command>,
    ) {
        let _span = debug_span!(
            "grid_explorer.scan",
            column = agent_cell.column(),
            row = agent_cell.row()
        )
        .entered();

        let (columns, rows) = query::dimensions(grid);
        let reach = radii.known();
        let column_offsets = offsets_within(agent_cell.column(), columns, reach);
        let row_offsets = offsets_within(agent_cell.row(), rows, reach);

        for column_offset in column_offsets {
            for row_offset in row_offsets.clone() {
                let Some(coord) = agent_cell
                    .offset(column_offset, row_offset)
                    .clip(columns, rows)
                else {
                    continue;
                };
                let Some(cell) = query::cell(grid, coord) else {
                    continue;
                };

                let (promoted, validation) = if radii.within_seen(column_offset, row_offset) {
                    match cell.classification() {
                        Classification::Unknown | Classification::Known => {
                            (Classification::Seen, Validation::WalkableOnly)
                        }
                        _ => continue,
                    }
                } else {
                    match cell.classification() {
                        Classification::Unknown => (
                            Classification::Known,
                            Validation::RoutableFrom(agent_position),
                        ),
                        _ => continue,
                    }
                };

                let resolution = resolver.resolve(
                    cell.geometry(),
                    Some(cell.navigable_point()),
                    validation,
                    probe,
                );
                let classification = if resolution.reachable {
                    promoted
                } else {
                    Classification::Disconnected
                };

                out.push(Command::ClassifyCell {
                    cell: coord,
                    classification,
                    navigable_point: resolution.point,
                });
            }
        }
    }
}

/// Offsets in `[-reach, reach]` that land `origin` inside `0..extent`.
fn offsets_within(origin: i32, extent: u32, reach: i32) -> RangeInclusive<i32> {
    let origin = i64::from(origin);
    let reach = i64::from(reach);
    let low = (-reach).max(-origin);
    let high = reach.min(i64::from(extent) - 1 - origin);
    match (i32::try_from(low), i32::try_from(high)) {
        (Ok(low), Ok(high)) if low <= high => low..=high,
        _ => 0..=-1,
    }
}
