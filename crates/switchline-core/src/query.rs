//! Read-only query API for inspecting session state.
//!
//! Provides snapshot types that aggregate engine state into convenient views
//! for the rendering layer. All types are owned copies -- no references into
//! internal engine storage.

use crate::agent::AgentState;
use crate::color::Color;
use crate::engine::Simulation;
use crate::fixed::Fixed64;
use crate::grid::GridPosition;
use crate::id::{AgentId, OutletId, StationId};
use crate::junction::JunctionRegistry;
use crate::level::Level;

// ---------------------------------------------------------------------------
// Agent snapshot
// ---------------------------------------------------------------------------

/// A view of one agent, taken once per frame by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub outlet: OutletId,
    /// The cell the agent currently occupies.
    pub position: GridPosition,
    /// Progress through the current cell as a 0..1 fraction.
    pub cell_progress: Fixed64,
    pub color: Color,
    pub state: AgentState,
    /// Recently entered cells, oldest first.
    pub trail: Vec<GridPosition>,
}

impl AgentSnapshot {
    pub(crate) fn collect(sim: &Simulation) -> Vec<AgentSnapshot> {
        sim.agents()
            .iter()
            .filter_map(|agent| {
                let position = sim.position_of(agent)?;
                Some(AgentSnapshot {
                    id: agent.id,
                    outlet: agent.outlet,
                    position,
                    cell_progress: agent.progress.frac(),
                    color: agent.color,
                    state: agent.state,
                    trail: agent.trail.iter().copied().collect(),
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Station snapshot
// ---------------------------------------------------------------------------

/// Arrival progress at one station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationSnapshot {
    pub id: StationId,
    pub position: GridPosition,
    pub color: Color,
    /// Arrivals in the current run; 0 when no run exists.
    pub arrived: u32,
    pub required: u32,
}

impl StationSnapshot {
    pub fn is_satisfied(&self) -> bool {
        self.arrived >= self.required
    }

    pub(crate) fn collect(level: &Level, sim: Option<&Simulation>) -> Vec<StationSnapshot> {
        level
            .stations()
            .map(|(id, station)| StationSnapshot {
                id,
                position: station.position,
                color: station.color,
                arrived: sim.map_or(0, |s| s.arrivals(id)),
                required: station.required,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Junction snapshot
// ---------------------------------------------------------------------------

/// A junction cell and which outlet currently holds priority there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JunctionSnapshot {
    pub position: GridPosition,
    pub owners: Vec<OutletId>,
    pub active_owner: OutletId,
}

impl JunctionSnapshot {
    pub(crate) fn collect(registry: &JunctionRegistry) -> Vec<JunctionSnapshot> {
        registry
            .iter()
            .map(|j| JunctionSnapshot {
                position: j.position,
                owners: j.configurations.clone(),
                active_owner: j.active_owner(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::PuzzleSession;
    use crate::test_utils::*;

    fn corridor() -> PuzzleSession {
        let level = LevelBuilder::new(5)
            .outlet("o", 0, 0, Color::Cyan)
            .station("s", 3, 0, Color::Cyan)
            .par(4)
            .build();
        let mut session = PuzzleSession::with_defaults(level);
        draw_path(&mut session, "o", &[(0, 0), (1, 0), (2, 0), (3, 0)]);
        session
    }

    #[test]
    fn no_agents_before_start() {
        let session = corridor();
        assert!(session.agent_snapshots().is_empty());
        let stations = session.station_snapshots();
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].arrived, 0);
        assert!(!stations[0].is_satisfied());
    }

    #[test]
    fn agent_snapshot_mid_cell() {
        let mut session = corridor();
        session.start().unwrap();
        session.tick(375).unwrap();

        let agents = session.agent_snapshots();
        assert_eq!(agents.len(), 1);
        let agent = &agents[0];
        assert_eq!(agent.position, pos(1, 0));
        assert_eq!(agent.state, AgentState::Active);
        assert!(agent.cell_progress > Fixed64::ZERO && agent.cell_progress < Fixed64::from_num(1));
        assert_eq!(agent.trail, vec![pos(0, 0), pos(1, 0)]);
    }

    #[test]
    fn junction_snapshot_lists_owners() {
        let level = LevelBuilder::new(5)
            .outlet("h", 0, 2, Color::Red)
            .outlet("v", 2, 0, Color::Blue)
            .station("sh", 4, 2, Color::Red)
            .station("sv", 2, 4, Color::Blue)
            .par(10)
            .build();
        let mut session = PuzzleSession::with_defaults(level);
        draw_path(&mut session, "h", &[(0, 2), (1, 2), (2, 2), (3, 2), (4, 2)]);
        draw_path(&mut session, "v", &[(2, 0), (2, 1), (2, 2), (2, 3), (2, 4)]);

        let junctions = session.junction_snapshots();
        assert_eq!(junctions.len(), 1);
        assert_eq!(junctions[0].position, pos(2, 2));
        assert_eq!(junctions[0].owners.len(), 2);
        assert!(junctions[0].owners.contains(&junctions[0].active_owner));
    }
}
