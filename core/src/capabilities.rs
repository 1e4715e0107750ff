//! Capabilities the host injects into the engine.

use thiserror::Error;
use tracing::warn;

use crate::{AreaInfo, GridPoint, TerrainView, DEFAULT_PATH_TOLERANCE, DEFAULT_SEARCH_BUDGET};

/// Live session state reported by the host on every tick.
pub trait Session {
    /// Reports whether an exploration session is currently active.
    fn in_session(&self) -> bool;

    /// Current world position of the agent.
    fn agent_position(&self) -> GridPoint;

    /// Metadata for the area the agent occupies, if one is loaded.
    fn area(&self) -> Option<AreaInfo>;

    /// Terrain raster of the current area.
    fn terrain(&self) -> TerrainView<'_>;
}

/// Side-effect-free walkability predicate over the terrain raster.
pub trait Walkability {
    /// Reports whether the agent may stand on the provided point.
    fn is_walkable(&self, terrain: TerrainView<'_>, point: GridPoint) -> bool;
}

impl<F> Walkability for F
where
    F: Fn(TerrainView<'_>, GridPoint) -> bool,
{
    fn is_walkable(&self, terrain: TerrainView<'_>, point: GridPoint) -> bool {
        self(terrain, point)
    }
}

/// Existence-only pathfinding query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathQuery {
    /// Start of the path, normally the agent's position.
    pub origin: GridPoint,
    /// Point the path must reach.
    pub destination: GridPoint,
    /// Distance from the destination at which the path counts as arrived.
    pub tolerance: i32,
    /// Whether a path ending short of the destination is acceptable.
    pub allow_partial: bool,
    /// Opaque search budget passed through to the oracle.
    pub search_budget: u32,
}

impl PathQuery {
    /// Builds the bounded, non-partial query the resolver issues.
    #[must_use]
    pub const fn bounded(origin: GridPoint, destination: GridPoint) -> Self {
        Self {
            origin,
            destination,
            tolerance: DEFAULT_PATH_TOLERANCE,
            allow_partial: false,
            search_budget: DEFAULT_SEARCH_BUDGET,
        }
    }
}

/// Failures reported by a reachability oracle.
#[derive(Debug, Error)]
pub enum OracleError {
    /// One of the query endpoints lies outside the pathfinding data.
    #[error("path endpoint {point} lies outside the navigation data")]
    OutOfBounds {
        /// Offending endpoint.
        point: GridPoint,
    },
    /// The pathfinding backend failed for a reason of its own.
    #[error("pathfinding backend failed: {0}")]
    Backend(String),
}

/// Reachability oracle answering whether a path exists between two points.
pub trait PathOracle {
    /// Reports whether a path satisfying the query exists.
    fn path_exists(&self, query: &PathQuery) -> Result<bool, OracleError>;
}

impl<F> PathOracle for F
where
    F: Fn(&PathQuery) -> Result<bool, OracleError>,
{
    fn path_exists(&self, query: &PathQuery) -> Result<bool, OracleError> {
        self(query)
    }
}

/// Terrain raster paired with the walkability and reachability capabilities.
///
/// A probe lives for a single tick. It is the boundary at which capability
/// failures stop: an oracle error is reported and treated as "unreachable".
#[derive(Clone, Copy)]
pub struct TerrainProbe<'a> {
    terrain: TerrainView<'a>,
    walkability: &'a dyn Walkability,
    oracle: &'a dyn PathOracle,
}

impl<'a> TerrainProbe<'a> {
    /// Bundles the capabilities for one tick.
    #[must_use]
    pub fn new(
        terrain: TerrainView<'a>,
        walkability: &'a dyn Walkability,
        oracle: &'a dyn PathOracle,
    ) -> Self {
        Self {
            terrain,
            walkability,
            oracle,
        }
    }

    /// Reports whether the point is walkable.
    #[must_use]
    pub fn is_walkable(&self, point: GridPoint) -> bool {
        self.walkability.is_walkable(self.terrain, point)
    }

    /// Reports whether the oracle found a path; errors count as no path.
    #[must_use]
    pub fn is_reachable(&self, query: &PathQuery) -> bool {
        match self.oracle.path_exists(query) {
            Ok(found) => found,
            Err(error) => {
                warn!(
                    origin = %query.origin,
                    destination = %query.destination,
                    %error,
                    "reachability oracle failed; treating destination as unreachable"
                );
                false
            }
        }
    }
}

impl std::fmt::Debug for TerrainProbe<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerrainProbe")
            .field("terrain", &self.terrain)
            .finish_non_exhaustive()
    }
}
