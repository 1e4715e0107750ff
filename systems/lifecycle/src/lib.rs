#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tick-driven controller that owns the exploration grid for one agent.
//!
//! The host calls [`Explorer::tick`] once per frame with a [`Session`]
//! snapshot. The controller keeps the grid current for the reported area,
//! rescans the neighborhood whenever the agent enters a new cell, and
//! maintains at most one travel [`Target`]. Everything runs synchronously on
//! the caller's thread; there is exactly one writer of grid state.

use std::fmt;

use grid_explorer_core::{
    AreaInfo, CellCoord, CellIndex, Classification, ClassificationCounts, Command, Event,
    ExplorerConfig, GridPoint, PathOracle, Session, Target, TerrainProbe, Walkability,
};
use grid_explorer_system_resolver::{NavigablePointResolver, Validation};
use grid_explorer_system_scanner::{ScanRadii, Scanner};
use grid_explorer_system_target_selection::TargetSelector;
use grid_explorer_world::{self as world, query, Cell, Grid};
use tracing::{debug, info};

/// Summary of the work performed by a single [`Explorer::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Whether the host reported an active session with a loaded area.
    pub active: bool,
    /// Whether the grid was rebuilt during the tick.
    pub rebuilt: bool,
    /// Whether the neighborhood around the agent was rescanned.
    pub scanned: bool,
    /// Number of cells whose classification changed during the scan.
    pub reclassified: usize,
    /// Target held once the tick completed.
    pub target: Option<Target>,
}

struct AreaState {
    info: AreaInfo,
    grid: Grid,
}

/// Exploration engine driven by the host's tick.
pub struct Explorer {
    config: ExplorerConfig,
    walkability: Box<dyn Walkability>,
    oracle: Box<dyn PathOracle>,
    resolver: NavigablePointResolver,
    scanner: Scanner,
    selector: TargetSelector,
    area: Option<AreaState>,
    needs_rebuild: bool,
    last_agent_cell: Option<CellIndex>,
    target: Option<Target>,
    attached: bool,
    commands: Vec<Command>,
    events: Vec<Event>,
}

impl Explorer {
    /// Creates an explorer around the host's walkability and pathfinding capabilities.
    #[must_use]
    pub fn new(
        config: ExplorerConfig,
        walkability: impl Walkability + 'static,
        oracle: impl PathOracle + 'static,
    ) -> Self {
        Self {
            config,
            walkability: Box::new(walkability),
            oracle: Box::new(oracle),
            resolver: NavigablePointResolver::new(),
            scanner: Scanner::new(),
            selector: TargetSelector::new(),
            area: None,
            needs_rebuild: false,
            last_agent_cell: None,
            target: None,
            attached: false,
            commands: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Records that the host attached the explorer to its frame loop.
    pub fn start(&mut self) {
        self.attached = true;
        info!("explorer started");
    }

    /// Detaches the explorer and releases every piece of grid state.
    pub fn stop(&mut self) {
        self.unload();
        self.attached = false;
        info!("explorer stopped");
    }

    /// Reports whether [`Explorer::start`] was called without a matching stop.
    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.attached
    }

    /// Advances exploration by one step.
    ///
    /// Without an active session or a loaded area all state is discarded.
    /// Otherwise the grid is rebuilt when a reset was requested, when no grid
    /// exists yet, or when the area hash changed while automatic resets are
    /// enabled. The neighborhood is rescanned only when the agent entered a
    /// different cell, and a motionless agent that already holds a target
    /// skips selection as well.
    pub fn tick(&mut self, session: &dyn Session) -> TickReport {
        if !session.in_session() {
            self.unload();
            return TickReport::default();
        }
        let Some(info) = session.area() else {
            self.unload();
            return TickReport::default();
        };

        let mut report = TickReport {
            active: true,
            ..TickReport::default()
        };

        let probe = TerrainProbe::new(session.terrain(), &*self.walkability, &*self.oracle);
        if self.is_stale(&info) {
            let grid = build_grid(&mut self.resolver, &info, &probe);
            self.area = Some(AreaState { info, grid });
            self.needs_rebuild = false;
            self.last_agent_cell = None;
            self.target = None;
            report.rebuilt = true;
        }

        let Some(area) = self.area.as_mut() else {
            return report;
        };

        let agent_position = session.agent_position();
        let agent_cell = agent_position.cell_index();
        let moved = self.last_agent_cell != Some(agent_cell);
        if !moved && self.target.is_some() {
            report.target = self.target;
            return report;
        }

        if moved {
            self.commands.clear();
            self.events.clear();
            self.scanner.handle(
                &area.grid,
                agent_cell,
                agent_position,
                ScanRadii::from(&self.config),
                &mut self.resolver,
                &probe,
                &mut self.commands,
            );
            for command in self.commands.drain(..) {
                world::apply(&mut area.grid, command, &mut self.events);
            }
            self.last_agent_cell = Some(agent_cell);
            report.scanned = true;
            report.reclassified = self.events.len();
        }

        report.target = self
            .selector
            .handle(&area.grid, agent_position, &mut self.target);
        report
    }

    fn is_stale(&self, info: &AreaInfo) -> bool {
        match &self.area {
            None => true,
            Some(_) if self.needs_rebuild => true,
            Some(current) => {
                self.config.auto_reset_on_area_change() && current.info.hash != info.hash
            }
        }
    }

    /// Requests a full rebuild at the next tick.
    pub fn reset(&mut self) {
        self.needs_rebuild = true;
        info!("exploration grid reset requested");
    }

    /// Drops the grid, the target and all agent tracking.
    pub fn unload(&mut self) {
        if let Some(area) = self.area.take() {
            debug!(area = %area.info.id, "unloaded exploration grid");
        }
        self.needs_rebuild = false;
        self.last_agent_cell = None;
        self.target = None;
        self.commands.clear();
        self.events.clear();
    }

    /// Overrides the classification of the cell containing `location`.
    ///
    /// Returns `false` when no grid is loaded or the location lies outside
    /// it. Forcing the cell that owns the current target clears the target.
    pub fn force_classification(
        &mut self,
        location: GridPoint,
        classification: Classification,
    ) -> bool {
        let Some(area) = self.area.as_mut() else {
            return false;
        };
        let Some(cell) = query::cell_at(&area.grid, location).map(Cell::index) else {
            return false;
        };

        self.events.clear();
        world::apply(
            &mut area.grid,
            Command::ForceClassification {
                cell,
                classification,
            },
            &mut self.events,
        );
        debug!(?cell, %classification, "forced cell classification");

        if self.target.map(|target| target.cell) == Some(cell) {
            self.target = None;
            debug!(?cell, "cleared target under forced cell");
        }
        true
    }

    /// Excludes the cell containing `location` from exploration.
    pub fn ignore(&mut self, location: GridPoint) -> bool {
        self.force_classification(location, Classification::Ignored)
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    /// Enables or disables rebuilding when the area hash changes.
    pub fn set_auto_reset_on_area_change(&mut self, enabled: bool) {
        self.config.set_auto_reset_on_area_change(enabled);
        info!(enabled, "auto reset on area change updated");
    }

    /// Updates the outer scan radius and returns the effective value.
    pub fn set_known_radius(&mut self, radius: i32) -> i32 {
        let effective = self.config.set_known_radius(radius);
        info!(requested = radius, effective, "known radius updated");
        effective
    }

    /// Updates the inner scan radius and returns the effective value.
    pub fn set_seen_radius(&mut self, radius: i32) -> i32 {
        let effective = self.config.set_seen_radius(radius);
        info!(requested = radius, effective, "seen radius updated");
        effective
    }

    /// Metadata of the area the grid was built for.
    #[must_use]
    pub fn area(&self) -> Option<&AreaInfo> {
        self.area.as_ref().map(|area| &area.info)
    }

    /// Grid backing the current area, if loaded.
    #[must_use]
    pub fn grid(&self) -> Option<&Grid> {
        self.area.as_ref().map(|area| &area.grid)
    }

    /// Number of columns and rows of the loaded grid.
    #[must_use]
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.grid().map(query::dimensions)
    }

    /// Whether a travel target is currently held.
    #[must_use]
    pub const fn has_target(&self) -> bool {
        self.target.is_some()
    }

    /// Point the agent should travel to.
    #[must_use]
    pub fn target(&self) -> Option<GridPoint> {
        self.target.map(|target| target.point)
    }

    /// Cell whose navigable point is the current target.
    #[must_use]
    pub fn target_cell(&self) -> Option<CellCoord> {
        self.target.map(|target| target.cell)
    }

    /// Cell containing the provided world point.
    #[must_use]
    pub fn cell_at(&self, location: GridPoint) -> Option<&Cell> {
        self.grid().and_then(|grid| query::cell_at(grid, location))
    }

    /// Cells currently holding the provided classification.
    pub fn cells_with(&self, classification: Classification) -> impl Iterator<Item = &Cell> + '_ {
        self.grid()
            .into_iter()
            .flat_map(move |grid| query::cells_with(grid, classification))
    }

    /// Size of every classification set; all zero without a grid.
    #[must_use]
    pub fn counts(&self) -> ClassificationCounts {
        self.grid().map(query::counts).unwrap_or_default()
    }

    /// Share of explorable cells that have been seen, in percent.
    #[must_use]
    pub fn completion_percentage(&self) -> f32 {
        self.counts().completion_percentage()
    }
}

fn build_grid(
    resolver: &mut NavigablePointResolver,
    info: &AreaInfo,
    probe: &TerrainProbe<'_>,
) -> Grid {
    let grid = world::build(info.columns, info.rows, |geometry, point| {
        resolver.resolve(geometry, Some(point), Validation::WalkableOnly, probe)
    });
    info!(
        area = %info.id,
        hash = info.hash.get(),
        columns = info.columns,
        rows = info.rows,
        disconnected = query::counts(&grid).disconnected,
        "built exploration grid"
    );
    grid
}

impl fmt::Debug for Explorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Explorer")
            .field("config", &self.config)
            .field("area", &self.area().map(|info| &info.id))
            .field("needs_rebuild", &self.needs_rebuild)
            .field("last_agent_cell", &self.last_agent_cell)
            .field("target", &self.target)
            .field("attached", &self.attached)
            .finish_non_exhaustive()
    }
}
