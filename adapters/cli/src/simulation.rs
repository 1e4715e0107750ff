//! Headless simulation that drives the explorer with a walking agent.

use std::{collections::VecDeque, rc::Rc};

use grid_explorer_core::{
    AreaId, AreaInfo, ClassificationCounts, GridPoint, Session, TerrainView,
};
use grid_explorer_system_lifecycle::Explorer;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    scenario::{SimulationSettings, TileMap},
    terrain::Raster,
};

/// Session state the simulation reports to the explorer.
#[derive(Debug)]
pub(crate) struct ScenarioSession {
    raster: Rc<Raster>,
    area: AreaInfo,
    position: GridPoint,
}

impl ScenarioSession {
    pub(crate) fn new(map: &TileMap, raster: Rc<Raster>, area_id: &str) -> Self {
        let columns = u32::try_from(map.columns()).unwrap_or(u32::MAX);
        let rows = u32::try_from(map.rows()).unwrap_or(u32::MAX);
        Self {
            raster,
            area: AreaInfo {
                id: AreaId::new(area_id),
                hash: map.area_hash(),
                columns,
                rows,
            },
            position: map.start_point(),
        }
    }
}

impl Session for ScenarioSession {
    fn in_session(&self) -> bool {
        true
    }

    fn agent_position(&self) -> GridPoint {
        self.position
    }

    fn area(&self) -> Option<AreaInfo> {
        Some(self.area.clone())
    }

    fn terrain(&self) -> TerrainView<'_> {
        self.raster.view()
    }
}

/// Outcome of a simulation run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct RunSummary {
    /// Identifier of the explored area.
    pub(crate) area: String,
    /// Content hash of the explored area.
    pub(crate) area_hash: u32,
    /// Number of ticks executed.
    pub(crate) ticks: u32,
    /// Whether exploration ran out of targets before the tick limit.
    pub(crate) exhausted: bool,
    /// World units travelled by the agent.
    pub(crate) distance_travelled: u64,
    /// Targets abandoned because the agent found no route to them.
    pub(crate) abandoned_targets: u32,
    /// Final agent position.
    pub(crate) final_position: GridPoint,
    /// Final share of explorable cells that were seen, in percent.
    pub(crate) completion_percentage: f32,
    /// Final size of each classification set.
    pub(crate) counts: ClassificationCounts,
}

/// Route the agent is currently following.
#[derive(Debug, Default)]
struct Itinerary {
    destination: Option<GridPoint>,
    waypoints: VecDeque<GridPoint>,
}

/// Runs the explorer until it has no target left or the tick limit is hit.
///
/// The agent follows the shortest raster route to each target, covering
/// `step_length` points per tick. Targets the agent cannot route to exactly
/// are ignored so exploration keeps moving.
pub(crate) fn run(
    explorer: &mut Explorer,
    session: &mut ScenarioSession,
    settings: &SimulationSettings,
) -> RunSummary {
    let mut itinerary = Itinerary::default();
    let mut ticks = 0;
    let mut exhausted = false;
    let mut distance_travelled = 0_u64;
    let mut abandoned_targets = 0;

    while ticks < settings.max_ticks {
        ticks += 1;
        let report = explorer.tick(&*session);
        let Some(target) = report.target else {
            exhausted = true;
            break;
        };

        if itinerary.destination != Some(target.point) {
            let Some(route) = session.raster.route(session.position, target.point, 0) else {
                warn!(destination = %target.point, "agent has no route to target; ignoring its cell");
                let _ = explorer.ignore(target.point);
                abandoned_targets += 1;
                itinerary = Itinerary::default();
                continue;
            };
            debug!(destination = %target.point, waypoints = route.len(), "planned route");
            itinerary = Itinerary {
                destination: Some(target.point),
                waypoints: route.into(),
            };
        }

        let mut steps = 0_u32;
        while steps < settings.step_length {
            let Some(next) = itinerary.waypoints.pop_front() else {
                break;
            };
            session.position = next;
            steps += 1;
        }
        distance_travelled += u64::from(steps);
    }

    let summary = RunSummary {
        area: session.area.id.to_string(),
        area_hash: session.area.hash.get(),
        ticks,
        exhausted,
        distance_travelled,
        abandoned_targets,
        final_position: session.position,
        completion_percentage: explorer.completion_percentage(),
        counts: explorer.counts(),
    };
    info!(
        ticks,
        exhausted,
        completion = summary.completion_percentage,
        "simulation finished"
    );
    summary
}
