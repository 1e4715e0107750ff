#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the grid explorer engine.
//!
//! This crate defines the vocabulary that connects the driving host, the
//! authoritative exploration grid, and the pure systems that advance it. The
//! host supplies capabilities ([`Session`], [`Walkability`], [`PathOracle`]),
//! systems read the grid and answer with [`Command`] batches, and the grid
//! reports every classification change as an [`Event`].

use std::fmt;

use serde::{Deserialize, Serialize};

mod capabilities;
mod config;

pub use capabilities::{OracleError, PathOracle, PathQuery, Session, TerrainProbe, Walkability};
pub use config::{ExplorerConfig, DEFAULT_KNOWN_RADIUS, DEFAULT_SEEN_RADIUS, MIN_RADIUS};

/// Length of a cell edge measured in world units.
pub const CELL_SIZE: i32 = 23;

/// Path-length tolerance forwarded with every reachability query.
pub const DEFAULT_PATH_TOLERANCE: i32 = 15;

/// Search budget forwarded with every reachability query.
pub const DEFAULT_SEARCH_BUDGET: u32 = 9;

/// Integer point expressed in world units.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridPoint {
    x: i32,
    y: i32,
}

impl GridPoint {
    /// The world origin.
    pub const ZERO: Self = Self::new(0, 0);

    /// Creates a new world point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal world coordinate.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical world coordinate.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Exact squared Euclidean distance between two points.
    #[must_use]
    pub fn distance_squared(self, other: GridPoint) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        dx * dx + dy * dy
    }

    /// Euclidean distance between two points.
    #[must_use]
    pub fn distance(self, other: GridPoint) -> f64 {
        (self.distance_squared(other) as f64).sqrt()
    }

    /// Index of the cell containing this point.
    ///
    /// Uses Euclidean division so points left of or above the origin map to
    /// negative indices instead of collapsing onto row or column zero.
    #[must_use]
    pub fn cell_index(self) -> CellIndex {
        CellIndex::new(self.x.div_euclid(CELL_SIZE), self.y.div_euclid(CELL_SIZE))
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Chebyshev distance between two cell coordinates.
    #[must_use]
    pub fn chebyshev_distance(self, other: CellCoord) -> u32 {
        self.column
            .abs_diff(other.column)
            .max(self.row.abs_diff(other.row))
    }
}

impl From<CellCoord> for CellIndex {
    fn from(coord: CellCoord) -> Self {
        // Grids never approach i32::MAX cells per side.
        CellIndex::new(coord.column as i32, coord.row as i32)
    }
}

/// Signed cell index that may lie outside the grid.
///
/// Agents can stand on the area border and neighborhood offsets routinely
/// step past it, so this type defers bounds checks to [`CellIndex::clip`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellIndex {
    column: i32,
    row: i32,
}

impl CellIndex {
    /// Creates a new signed cell index.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Signed column index.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Signed row index.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Index displaced by the provided column and row offsets.
    #[must_use]
    pub fn offset(self, columns: i32, rows: i32) -> Self {
        Self::new(
            self.column.saturating_add(columns),
            self.row.saturating_add(rows),
        )
    }

    /// Converts the index into a coordinate when it lies inside the grid.
    #[must_use]
    pub fn clip(self, columns: u32, rows: u32) -> Option<CellCoord> {
        let column = u32::try_from(self.column).ok()?;
        let row = u32::try_from(self.row).ok()?;
        if column < columns && row < rows {
            Some(CellCoord::new(column, row))
        } else {
            None
        }
    }
}

/// Immutable geometry of a cell, derived once from its grid index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellGeometry {
    index: CellCoord,
    location: GridPoint,
    size: i32,
    center: GridPoint,
}

impl CellGeometry {
    /// Derives the geometry of the cell at the provided index.
    #[must_use]
    pub fn at(index: CellCoord) -> Self {
        let location = GridPoint::new(
            (index.column() as i32).saturating_mul(CELL_SIZE),
            (index.row() as i32).saturating_mul(CELL_SIZE),
        );
        let center = GridPoint::new(location.x() + CELL_SIZE / 2, location.y() + CELL_SIZE / 2);
        Self {
            index,
            location,
            size: CELL_SIZE,
            center,
        }
    }

    /// Grid index of the cell.
    #[must_use]
    pub const fn index(&self) -> CellCoord {
        self.index
    }

    /// Top-left corner of the cell in world units.
    #[must_use]
    pub const fn location(&self) -> GridPoint {
        self.location
    }

    /// Edge length of the cell in world units.
    #[must_use]
    pub const fn size(&self) -> i32 {
        self.size
    }

    /// Geometric center of the cell.
    #[must_use]
    pub const fn center(&self) -> GridPoint {
        self.center
    }

    /// Reports whether the point lies inside the cell's square.
    #[must_use]
    pub fn contains(&self, point: GridPoint) -> bool {
        let dx = point.x() - self.location.x();
        let dy = point.y() - self.location.y();
        (0..self.size).contains(&dx) && (0..self.size).contains(&dy)
    }

    /// Every integer point inside the cell, column-major from the top-left corner.
    pub fn points(&self) -> impl Iterator<Item = GridPoint> {
        let origin = self.location;
        let size = self.size;
        (0..size).flat_map(move |dx| {
            (0..size).map(move |dy| GridPoint::new(origin.x() + dx, origin.y() + dy))
        })
    }
}

/// Mutually exclusive coverage state of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Not yet observed by any scan.
    Unknown,
    /// Observed from a distance and confirmed reachable; a travel candidate.
    Known,
    /// Visited closely enough to count as explored.
    Seen,
    /// Excluded from exploration by an external override.
    Ignored,
    /// No walkable or routable point exists inside the cell.
    Disconnected,
}

impl Classification {
    /// Number of distinct classifications.
    pub const COUNT: usize = 5;

    /// Every classification in slot order.
    pub const ALL: [Classification; Self::COUNT] = [
        Self::Unknown,
        Self::Known,
        Self::Seen,
        Self::Ignored,
        Self::Disconnected,
    ];

    /// Dense index used by per-classification tables.
    #[must_use]
    pub const fn slot(self) -> usize {
        match self {
            Self::Unknown => 0,
            Self::Known => 1,
            Self::Seen => 2,
            Self::Ignored => 3,
            Self::Disconnected => 4,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unknown => "unknown",
            Self::Known => "known",
            Self::Seen => "seen",
            Self::Ignored => "ignored",
            Self::Disconnected => "disconnected",
        };
        f.write_str(label)
    }
}

/// Number of cells held in each classification set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationCounts {
    /// Cells classified [`Classification::Unknown`].
    pub unknown: usize,
    /// Cells classified [`Classification::Known`].
    pub known: usize,
    /// Cells classified [`Classification::Seen`].
    pub seen: usize,
    /// Cells classified [`Classification::Ignored`].
    pub ignored: usize,
    /// Cells classified [`Classification::Disconnected`].
    pub disconnected: usize,
}

impl ClassificationCounts {
    /// Number of cells in the provided classification.
    #[must_use]
    pub const fn get(&self, classification: Classification) -> usize {
        match classification {
            Classification::Unknown => self.unknown,
            Classification::Known => self.known,
            Classification::Seen => self.seen,
            Classification::Ignored => self.ignored,
            Classification::Disconnected => self.disconnected,
        }
    }

    /// Total number of cells across all classifications.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.unknown + self.known + self.seen + self.ignored + self.disconnected
    }

    /// Share of explorable cells that have been seen, in percent.
    ///
    /// Ignored and disconnected cells are excluded from the denominator. When
    /// no explorable cell remains the result is zero.
    #[must_use]
    pub fn completion_percentage(&self) -> f32 {
        let explorable = self.unknown + self.known + self.seen;
        if explorable == 0 {
            return 0.0;
        }
        100.0 * self.seen as f32 / explorable as f32
    }
}

/// Outcome of resolving a navigable point inside a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Navigable point the cell should record.
    pub point: GridPoint,
    /// Whether the point is walkable and, when validated, routable.
    pub reachable: bool,
}

/// Identifier of the area the agent currently occupies.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AreaId(String);

impl AreaId {
    /// Creates a new area identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrows the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque content hash identifying one instance of an area.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AreaHash(u32);

impl AreaHash {
    /// Wraps a raw hash value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Raw hash value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Metadata describing the area the host currently reports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AreaInfo {
    /// Identifier of the area.
    pub id: AreaId,
    /// Content hash that changes whenever the area instance changes.
    pub hash: AreaHash,
    /// Number of cell columns spanned by the terrain.
    pub columns: u32,
    /// Number of cell rows spanned by the terrain.
    pub rows: u32,
}

/// Borrowed terrain raster handed to the walkability predicate.
#[derive(Clone, Copy, Debug)]
pub struct TerrainView<'a> {
    data: &'a [u8],
    row_stride: usize,
    query_value: u8,
}

impl<'a> TerrainView<'a> {
    /// Captures a raster with the provided row stride and query value.
    #[must_use]
    pub const fn new(data: &'a [u8], row_stride: usize, query_value: u8) -> Self {
        Self {
            data,
            row_stride,
            query_value,
        }
    }

    /// A raster without data; every lookup misses.
    #[must_use]
    pub const fn empty() -> Self {
        Self::new(&[], 0, 0)
    }

    /// Raw raster bytes.
    #[must_use]
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Number of bytes per raster row.
    #[must_use]
    pub const fn row_stride(&self) -> usize {
        self.row_stride
    }

    /// Value the walkability predicate compares raster bytes against.
    #[must_use]
    pub const fn query_value(&self) -> u8 {
        self.query_value
    }

    /// Raster byte stored for the point, if the point lies inside the raster.
    #[must_use]
    pub fn byte_at(&self, point: GridPoint) -> Option<u8> {
        let x = usize::try_from(point.x()).ok()?;
        let y = usize::try_from(point.y()).ok()?;
        if x >= self.row_stride {
            return None;
        }
        let offset = y.checked_mul(self.row_stride)?.checked_add(x)?;
        self.data.get(offset).copied()
    }
}

/// Active travel target and the cell that owns it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    /// Cell whose navigable point became the target.
    pub cell: CellCoord,
    /// World point the agent should travel to.
    pub point: GridPoint,
}

/// Commands that express all permissible grid mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Records a scan result for a cell.
    ClassifyCell {
        /// Cell being classified.
        cell: CellCoord,
        /// Classification the cell moves into.
        classification: Classification,
        /// Navigable point the resolver settled on.
        navigable_point: GridPoint,
    },
    /// Overrides the classification of a cell without touching its navigable point.
    ForceClassification {
        /// Cell being overridden.
        cell: CellCoord,
        /// Classification the cell moves into.
        classification: Classification,
    },
}

/// Events broadcast by the grid after processing commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a cell moved between classification sets.
    CellClassified {
        /// Cell that changed.
        cell: CellCoord,
        /// Classification held before the command.
        from: Classification,
        /// Classification held after the command.
        to: Classification,
    },
}
