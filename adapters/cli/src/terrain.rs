//! Terrain raster expanded from a tile map and the capabilities it backs.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use grid_explorer_core::{GridPoint, OracleError, PathOracle, PathQuery, TerrainView};
use tracing::debug;

/// Raster byte of a point the agent may stand on.
pub(crate) const WALKABLE: u8 = 1;
/// Raster byte of a blocked point.
pub(crate) const BLOCKED: u8 = 0;
/// Threshold handed to the walkability predicate.
pub(crate) const QUERY_VALUE: u8 = WALKABLE;

/// Breadth-first expansions allowed per unit of a query's search budget.
const EXPANSIONS_PER_BUDGET_UNIT: usize = 50_000;

/// Dense row-major raster with one byte per world point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Raster {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl Raster {
    /// Expands row-major tile walkability into `tile_size × tile_size` point blocks.
    ///
    /// Returns `None` when the raster size overflows `usize`.
    pub(crate) fn from_tiles(columns: usize, walkable: &[bool], tile_size: usize) -> Option<Self> {
        let rows = if columns == 0 {
            0
        } else {
            walkable.len() / columns
        };
        let width = columns.checked_mul(tile_size)?;
        let height = rows.checked_mul(tile_size)?;
        let mut data = vec![BLOCKED; width.checked_mul(height)?];

        for (tile, &open) in walkable.iter().enumerate() {
            if !open {
                continue;
            }
            let origin_x = (tile % columns) * tile_size;
            let origin_y = (tile / columns) * tile_size;
            for y in origin_y..origin_y + tile_size {
                let row_start = y * width + origin_x;
                data[row_start..row_start + tile_size].fill(WALKABLE);
            }
        }

        Some(Self {
            data,
            width,
            height,
        })
    }

    /// Borrows the raster in the shape the engine consumes.
    pub(crate) fn view(&self) -> TerrainView<'_> {
        TerrainView::new(&self.data, self.width, QUERY_VALUE)
    }

    /// Shortest 4-connected route from `origin` to a point within `tolerance`
    /// (Chebyshev) of `destination`, excluding `origin` itself.
    pub(crate) fn route(
        &self,
        origin: GridPoint,
        destination: GridPoint,
        tolerance: i32,
    ) -> Option<Vec<GridPoint>> {
        let mut search = Search::default();
        let reached = search.run(self, origin, destination, tolerance, usize::MAX)?;

        let mut route = Vec::new();
        let mut current = reached;
        while let Some(previous) = search.parents.get(current).copied().flatten() {
            route.push(self.point(current));
            current = previous;
        }
        route.reverse();
        Some(route)
    }

    fn index(&self, point: GridPoint) -> Option<usize> {
        let x = usize::try_from(point.x()).ok()?;
        let y = usize::try_from(point.y()).ok()?;
        if x < self.width && y < self.height {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    fn point(&self, index: usize) -> GridPoint {
        let x = i32::try_from(index % self.width).unwrap_or(i32::MAX);
        let y = i32::try_from(index / self.width).unwrap_or(i32::MAX);
        GridPoint::new(x, y)
    }

    fn neighbors(&self, index: usize) -> impl Iterator<Item = usize> {
        let x = index % self.width;
        let y = index / self.width;
        let mut candidates = [None; 4];
        let mut count = 0;

        if y > 0 {
            candidates[count] = Some(index - self.width);
            count += 1;
        }

        if x + 1 < self.width {
            candidates[count] = Some(index + 1);
            count += 1;
        }

        if y + 1 < self.height {
            candidates[count] = Some(index + self.width);
            count += 1;
        }

        if x > 0 {
            candidates[count] = Some(index - 1);
            count += 1;
        }

        candidates.into_iter().take(count).flatten()
    }
}

/// Walkability predicate over the raster: the byte must reach the query value.
pub(crate) fn is_walkable(terrain: TerrainView<'_>, point: GridPoint) -> bool {
    terrain
        .byte_at(point)
        .map_or(false, |byte| byte >= terrain.query_value())
}

/// Reusable breadth-first search state.
#[derive(Debug, Default)]
struct Search {
    parents: Vec<Option<usize>>,
    visited: Vec<bool>,
    queue: VecDeque<usize>,
}

impl Search {
    /// Returns the first index found within `tolerance` of the destination.
    fn run(
        &mut self,
        raster: &Raster,
        origin: GridPoint,
        destination: GridPoint,
        tolerance: i32,
        limit: usize,
    ) -> Option<usize> {
        let start = raster.index(origin)?;
        if raster.data[start] < QUERY_VALUE {
            return None;
        }

        let cell_count = raster.data.len();
        if self.visited.len() != cell_count {
            self.visited = vec![false; cell_count];
            self.parents = vec![None; cell_count];
        } else {
            self.visited.fill(false);
            self.parents.fill(None);
        }
        self.queue.clear();

        self.visited[start] = true;
        self.queue.push_back(start);
        let mut expansions = 0_usize;

        while let Some(current) = self.queue.pop_front() {
            let point = raster.point(current);
            let arrived = (point.x() - destination.x()).abs() <= tolerance
                && (point.y() - destination.y()).abs() <= tolerance;
            if arrived {
                return Some(current);
            }

            expansions += 1;
            if expansions >= limit {
                debug!(%origin, %destination, expansions, "search budget exhausted");
                return None;
            }

            for neighbor in raster.neighbors(current) {
                if self.visited[neighbor] || raster.data[neighbor] < QUERY_VALUE {
                    continue;
                }
                self.visited[neighbor] = true;
                self.parents[neighbor] = Some(current);
                self.queue.push_back(neighbor);
            }
        }

        None
    }
}

/// Reachability oracle answering queries with a bounded breadth-first search.
#[derive(Debug)]
pub(crate) struct RasterOracle {
    raster: Rc<Raster>,
    search: RefCell<Search>,
}

impl RasterOracle {
    pub(crate) fn new(raster: Rc<Raster>) -> Self {
        Self {
            raster,
            search: RefCell::new(Search::default()),
        }
    }
}

impl PathOracle for RasterOracle {
    fn path_exists(&self, query: &PathQuery) -> Result<bool, OracleError> {
        for point in [query.origin, query.destination] {
            if self.raster.index(point).is_none() {
                return Err(OracleError::OutOfBounds { point });
            }
        }

        let limit = usize::try_from(query.search_budget)
            .unwrap_or(usize::MAX)
            .saturating_mul(EXPANSIONS_PER_BUDGET_UNIT);
        // Partial paths are never accepted; arrival is judged by tolerance alone.
        let reached = self.search.borrow_mut().run(
            &self.raster,
            query.origin,
            query.destination,
            query.tolerance,
            limit,
        );
        Ok(reached.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a 3×1 tile raster with a blocked middle tile.
    fn corridor(middle_open: bool) -> Rc<Raster> {
        Rc::new(Raster::from_tiles(3, &[true, middle_open, true], 4).expect("small raster"))
    }

    #[test]
    fn tiles_expand_into_point_blocks() {
        let raster = corridor(false);
        assert!(is_walkable(raster.view(), GridPoint::new(0, 0)));
        assert!(is_walkable(raster.view(), GridPoint::new(3, 3)));
        assert!(!is_walkable(raster.view(), GridPoint::new(4, 0)));
        assert!(!is_walkable(raster.view(), GridPoint::new(7, 3)));
        assert!(is_walkable(raster.view(), GridPoint::new(8, 2)));
        assert!(!is_walkable(raster.view(), GridPoint::new(12, 0)));
        assert!(!is_walkable(raster.view(), GridPoint::new(0, 4)));
    }

    #[test]
    fn overflowing_rasters_are_refused() {
        assert_eq!(Raster::from_tiles(2, &[true, true], usize::MAX), None);
    }

    #[test]
    fn oracle_follows_open_corridors() {
        let oracle = RasterOracle::new(corridor(true));
        let query = PathQuery {
            origin: GridPoint::new(0, 0),
            destination: GridPoint::new(11, 3),
            tolerance: 0,
            allow_partial: false,
            search_budget: 1,
        };
        assert!(matches!(oracle.path_exists(&query), Ok(true)));
    }

    #[test]
    fn oracle_rejects_walled_destinations() {
        let oracle = RasterOracle::new(corridor(false));
        let query = PathQuery {
            tolerance: 2,
            ..PathQuery::bounded(GridPoint::new(0, 0), GridPoint::new(11, 3))
        };
        assert!(matches!(oracle.path_exists(&query), Ok(false)));
    }

    #[test]
    fn tolerance_accepts_nearby_arrival() {
        let oracle = RasterOracle::new(corridor(false));
        let query = PathQuery {
            origin: GridPoint::new(0, 0),
            destination: GridPoint::new(5, 1),
            tolerance: 2,
            allow_partial: false,
            search_budget: 1,
        };
        assert!(matches!(oracle.path_exists(&query), Ok(true)));
    }

    #[test]
    fn oracle_reports_out_of_bounds_endpoints() {
        let oracle = RasterOracle::new(corridor(true));
        let query = PathQuery::bounded(GridPoint::new(0, 0), GridPoint::new(-3, 0));
        assert!(matches!(
            oracle.path_exists(&query),
            Err(OracleError::OutOfBounds { point }) if point == GridPoint::new(-3, 0)
        ));
    }

    #[test]
    fn route_steps_one_point_at_a_time() {
        let raster = corridor(true);
        let origin = GridPoint::new(0, 0);
        let route = raster
            .route(origin, GridPoint::new(6, 0), 0)
            .expect("corridor is open");

        assert_eq!(route.len(), 6);
        assert_eq!(route.last(), Some(&GridPoint::new(6, 0)));
        let mut previous = origin;
        for point in route {
            let step = (point.x() - previous.x()).abs() + (point.y() - previous.y()).abs();
            assert_eq!(step, 1);
            previous = point;
        }
    }

    #[test]
    fn route_to_current_position_is_empty() {
        let raster = corridor(true);
        let origin = GridPoint::new(2, 2);
        assert_eq!(raster.route(origin, origin, 0), Some(Vec::new()));
    }
}
