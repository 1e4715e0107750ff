#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that resolves a concrete navigable point inside a cell.

use grid_explorer_core::{CellGeometry, GridPoint, PathQuery, Resolution, TerrainProbe};
use tracing::trace;

/// How thoroughly a resolved point must be validated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Validation {
    /// Accept any walkable point. Cheap; used for bulk classification.
    WalkableOnly,
    /// Additionally require a bounded path from the provided origin.
    RoutableFrom(GridPoint),
}

/// Navigable point resolver that reuses its candidate buffer between calls.
#[derive(Debug, Default)]
pub struct NavigablePointResolver {
    candidates: Vec<GridPoint>,
}

impl NavigablePointResolver {
    /// Creates a resolver with an empty candidate buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds a point inside the cell the agent can stand on.
    ///
    /// The reference point defaults to the cell center. A walkable reference
    /// is accepted as is; otherwise the walkable point of the cell nearest to
    /// the reference wins, ties going to the earlier point in column-major
    /// order. When no walkable point exists the reference is returned and the
    /// resolution is unreachable, without consulting the oracle.
    ///
    /// The returned point is meaningful even when the reachability check
    /// fails: the cell records it, and only its classification changes.
    pub fn resolve(
        &mut self,
        cell: &CellGeometry,
        reference: Option<GridPoint>,
        validation: Validation,
        probe: &TerrainProbe<'_>,
    ) -> Resolution {
        let reference = reference.unwrap_or_else(|| cell.center());

        let point = if probe.is_walkable(reference) {
            reference
        } else {
            match self.nearest_walkable(cell, reference, probe) {
                Some(point) => point,
                None => {
                    trace!(cell = ?cell.index(), "no walkable point inside cell");
                    return Resolution {
                        point: reference,
                        reachable: false,
                    };
                }
            }
        };

        let reachable = match validation {
            Validation::WalkableOnly => true,
            Validation::RoutableFrom(origin) => {
                probe.is_reachable(&PathQuery::bounded(origin, point))
            }
        };

        Resolution { point, reachable }
    }

    fn nearest_walkable(
        &mut self,
        cell: &CellGeometry,
        reference: GridPoint,
        probe: &TerrainProbe<'_>,
    ) -> Option<GridPoint> {
        self.candidates.clear();
        self.candidates.extend(cell.points());
        // Stable sort keeps enumeration order among equidistant candidates.
        self.candidates
            .sort_by_key(|candidate| candidate.distance_squared(reference));
        self.candidates
            .iter()
            .copied()
            .find(|candidate| probe.is_walkable(*candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_explorer_core::{CellCoord, OracleError, TerrainView};

    fn never_routable(_: &PathQuery) -> Result<bool, OracleError> {
        Ok(false)
    }

    fn origin_only(_: TerrainView<'_>, point: GridPoint) -> bool {
        point == GridPoint::ZERO
    }

    #[test]
    fn candidate_buffer_is_reused() {
        let probe = TerrainProbe::new(TerrainView::empty(), &origin_only, &never_routable);
        let cell = CellGeometry::at(CellCoord::new(0, 0));
        let mut resolver = NavigablePointResolver::new();

        let _ = resolver.resolve(&cell, None, Validation::WalkableOnly, &probe);
        let capacity = resolver.candidates.capacity();
        let _ = resolver.resolve(&cell, None, Validation::WalkableOnly, &probe);

        assert_eq!(resolver.candidates.capacity(), capacity);
    }
}
