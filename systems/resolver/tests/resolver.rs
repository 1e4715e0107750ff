use std::{cell::RefCell, collections::HashSet};

use grid_explorer_core::{
    CellCoord, CellGeometry, GridPoint, OracleError, PathOracle, PathQuery, TerrainProbe,
    TerrainView, Walkability, DEFAULT_PATH_TOLERANCE, DEFAULT_SEARCH_BUDGET,
};
use grid_explorer_system_resolver::{NavigablePointResolver, Validation};

struct WalkablePoints(HashSet<GridPoint>);

impl WalkablePoints {
    fn new(points: impl IntoIterator<Item = (i32, i32)>) -> Self {
        Self(
            points
                .into_iter()
                .map(|(x, y)| GridPoint::new(x, y))
                .collect(),
        )
    }
}

impl Walkability for WalkablePoints {
    fn is_walkable(&self, _terrain: TerrainView<'_>, point: GridPoint) -> bool {
        self.0.contains(&point)
    }
}

struct EverywhereWalkable;

impl Walkability for EverywhereWalkable {
    fn is_walkable(&self, _terrain: TerrainView<'_>, _point: GridPoint) -> bool {
        true
    }
}

#[derive(Default)]
struct RecordingOracle {
    fail: bool,
    answer: bool,
    queries: RefCell<Vec<PathQuery>>,
}

impl RecordingOracle {
    fn answering(answer: bool) -> Self {
        Self {
            answer,
            ..Self::default()
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn queries(&self) -> Vec<PathQuery> {
        self.queries.borrow().clone()
    }
}

impl PathOracle for RecordingOracle {
    fn path_exists(&self, query: &PathQuery) -> Result<bool, OracleError> {
        self.queries.borrow_mut().push(*query);
        if self.fail {
            return Err(OracleError::Backend("navmesh unavailable".to_owned()));
        }
        Ok(self.answer)
    }
}

fn cell() -> CellGeometry {
    CellGeometry::at(CellCoord::new(1, 2))
}

#[test]
fn walkable_reference_is_kept() {
    let oracle = RecordingOracle::answering(true);
    let probe = TerrainProbe::new(TerrainView::empty(), &EverywhereWalkable, &oracle);
    let mut resolver = NavigablePointResolver::new();
    let reference = GridPoint::new(30, 50);

    let resolution = resolver.resolve(&cell(), Some(reference), Validation::WalkableOnly, &probe);

    assert_eq!(resolution.point, reference);
    assert!(resolution.reachable);
    assert!(oracle.queries().is_empty(), "cheap mode must not pathfind");
}

#[test]
fn missing_reference_defaults_to_center() {
    let oracle = RecordingOracle::answering(true);
    let probe = TerrainProbe::new(TerrainView::empty(), &EverywhereWalkable, &oracle);
    let mut resolver = NavigablePointResolver::new();

    let resolution = resolver.resolve(&cell(), None, Validation::WalkableOnly, &probe);

    assert_eq!(resolution.point, cell().center());
}

#[test]
fn re_resolving_a_walkable_point_is_idempotent() {
    let walkable = WalkablePoints::new([(25, 47), (40, 60)]);
    let oracle = RecordingOracle::answering(true);
    let probe = TerrainProbe::new(TerrainView::empty(), &walkable, &oracle);
    let mut resolver = NavigablePointResolver::new();

    let first = resolver.resolve(&cell(), None, Validation::WalkableOnly, &probe);
    let second = resolver.resolve(&cell(), Some(first.point), Validation::WalkableOnly, &probe);

    assert!(first.reachable);
    assert_eq!(first.point, second.point);
}

#[test]
fn fallback_picks_the_nearest_walkable_point() {
    let geometry = cell();
    let reference = geometry.center();
    let walkable_points = [(23, 46), (40, 52), (30, 62), (45, 68)];
    let walkable = WalkablePoints::new(walkable_points);
    let oracle = RecordingOracle::answering(true);
    let probe = TerrainProbe::new(TerrainView::empty(), &walkable, &oracle);
    let mut resolver = NavigablePointResolver::new();

    let resolution = resolver.resolve(&geometry, None, Validation::WalkableOnly, &probe);

    let expected = walkable_points
        .iter()
        .map(|&(x, y)| GridPoint::new(x, y))
        .min_by_key(|point| point.distance_squared(reference))
        .expect("candidates exist");
    assert_eq!(resolution.point, expected);
    assert!(resolution.reachable);
}

#[test]
fn equidistant_candidates_resolve_in_column_major_order() {
    let geometry = cell();
    let center = geometry.center();
    let walkable = WalkablePoints::new([
        (center.x() + 1, center.y()),
        (center.x(), center.y() + 1),
        (center.x() - 1, center.y()),
    ]);
    let oracle = RecordingOracle::answering(true);
    let probe = TerrainProbe::new(TerrainView::empty(), &walkable, &oracle);
    let mut resolver = NavigablePointResolver::new();

    let resolution = resolver.resolve(&geometry, None, Validation::WalkableOnly, &probe);

    assert_eq!(resolution.point, GridPoint::new(center.x() - 1, center.y()));
}

#[test]
fn cell_without_walkable_points_is_unreachable() {
    let walkable = WalkablePoints::new([(0, 0), (200, 200)]);
    let oracle = RecordingOracle::answering(true);
    let probe = TerrainProbe::new(TerrainView::empty(), &walkable, &oracle);
    let mut resolver = NavigablePointResolver::new();
    let origin = GridPoint::new(5, 5);

    let resolution = resolver.resolve(&cell(), None, Validation::RoutableFrom(origin), &probe);

    assert!(!resolution.reachable);
    assert_eq!(resolution.point, cell().center());
    assert!(
        oracle.queries().is_empty(),
        "oracle must not run when no walkable point exists"
    );
}

#[test]
fn validation_issues_a_bounded_non_partial_query() {
    let oracle = RecordingOracle::answering(true);
    let probe = TerrainProbe::new(TerrainView::empty(), &EverywhereWalkable, &oracle);
    let mut resolver = NavigablePointResolver::new();
    let origin = GridPoint::new(5, 5);

    let resolution = resolver.resolve(&cell(), None, Validation::RoutableFrom(origin), &probe);

    assert!(resolution.reachable);
    assert_eq!(
        oracle.queries(),
        vec![PathQuery {
            origin,
            destination: cell().center(),
            tolerance: DEFAULT_PATH_TOLERANCE,
            allow_partial: false,
            search_budget: DEFAULT_SEARCH_BUDGET,
        }]
    );
}

#[test]
fn missing_path_marks_point_unreachable_but_keeps_it() {
    let walkable = WalkablePoints::new([(24, 47)]);
    let oracle = RecordingOracle::answering(false);
    let probe = TerrainProbe::new(TerrainView::empty(), &walkable, &oracle);
    let mut resolver = NavigablePointResolver::new();

    let resolution = resolver.resolve(
        &cell(),
        None,
        Validation::RoutableFrom(GridPoint::ZERO),
        &probe,
    );

    assert!(!resolution.reachable);
    assert_eq!(resolution.point, GridPoint::new(24, 47));
}

#[test]
fn oracle_failure_counts_as_unreachable() {
    let oracle = RecordingOracle::failing();
    let probe = TerrainProbe::new(TerrainView::empty(), &EverywhereWalkable, &oracle);
    let mut resolver = NavigablePointResolver::new();

    let resolution = resolver.resolve(
        &cell(),
        None,
        Validation::RoutableFrom(GridPoint::ZERO),
        &probe,
    );

    assert!(!resolution.reachable);
    assert_eq!(oracle.queries().len(), 1);
}
