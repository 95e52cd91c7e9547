//! The simulation engine: moves agents along frozen paths and resolves
//! their interactions, one externally driven tick at a time.
//!
//! # Tick pipeline
//!
//! Each [`Simulation::tick`] call runs:
//! 1. **Clock** -- advance the simulated clock by `elapsed_ms * speed`.
//! 2. **Release** -- pending agents whose release time has passed go active.
//! 3. **Move** -- active agents advance; newly entered cells update trails
//!    and apply color changers; agents reaching their last cell are judged.
//! 4. **Collide** -- agents still active are checked pairwise, ascending
//!    spawn order, for shared cells (see [`crate::collision`]).
//! 5. **Judge** -- decide whether the run is over.
//!
//! The engine has no timer of its own and never blocks.

use crate::agent::{Agent, AgentState};
use crate::collision::{Interaction, Motion, classify};
use crate::color::{mix, mix_or_first};
use crate::config::SimConfig;
use crate::event::{Event, EventBus};
use crate::fixed::{Fixed64, Millis, cells_travelled, floor_index, fraction};
use crate::grid::GridPosition;
use crate::id::{AgentId, OutletId, StationId};
use crate::level::Level;
use crate::path::{Path, entry_direction, exit_direction};
use crate::sim::{FailureReason, RunOutcome, RunPhase, StateHash};
use slotmap::SecondaryMap;
use std::collections::BTreeSet;
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Rejections from simulation control operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulationError {
    #[error("outlets without a drawn path: {}", missing.join(", "))]
    IncompletePaths { missing: Vec<String> },
    #[error("a simulation is already running")]
    AlreadyRunning,
    #[error("no simulation is running")]
    NotRunning,
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// One run of every outlet's agents over the paths frozen at start.
#[derive(Debug, Clone)]
pub struct Simulation {
    /// Path cells per outlet, copied at start. Paths cannot change mid-run.
    routes: SecondaryMap<OutletId, Vec<GridPosition>>,
    /// Agents in spawn order; `agents[i].id == AgentId(i)`.
    agents: Vec<Agent>,
    /// Arrivals per station during this run.
    arrivals: SecondaryMap<StationId, u32>,
    /// Simulated milliseconds since start.
    clock: Fixed64,
    speed: Fixed64,
    ms_per_cell: Millis,
    cross_tolerance: Fixed64,
    crash_grace_ms: Millis,
    trail_length: usize,
    phase: RunPhase,
    /// First non-crash failure seen this run.
    first_failure: Option<FailureReason>,
    /// Crossings already mixed, so a crossing resolves once.
    crossed: BTreeSet<(AgentId, AgentId, GridPosition)>,
    ticks: u64,
}

impl Simulation {
    /// Validate the paths and spawn every outlet's agents.
    ///
    /// Agents are spawned outlet by outlet in definition order; agent `i` of
    /// an outlet is released at `start_delay + i * delay`.
    pub fn start(
        level: &Level,
        paths: &SecondaryMap<OutletId, Path>,
        config: &SimConfig,
        events: &mut EventBus,
    ) -> Result<Self, SimulationError> {
        let missing: Vec<String> = level
            .outlets()
            .filter(|(id, _)| paths.get(*id).is_none_or(|p| p.len() < 2))
            .map(|(_, o)| o.name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(SimulationError::IncompletePaths { missing });
        }

        let mut routes = SecondaryMap::new();
        let mut agents = Vec::new();
        for (outlet_id, outlet) in level.outlets() {
            let cells = paths[outlet_id].cells().to_vec();
            for i in 0..outlet.count {
                let id = AgentId(agents.len() as u32);
                let release_at = outlet.release_time(i);
                let agent = Agent::new(id, outlet_id, outlet.color, release_at, cells[0]);
                if agent.is_active() {
                    events.emit(Event::AgentReleased {
                        agent: id,
                        outlet: outlet_id,
                        at: 0,
                    });
                }
                agents.push(agent);
            }
            routes.insert(outlet_id, cells);
        }

        let mut arrivals = SecondaryMap::new();
        for (station_id, _) in level.stations() {
            arrivals.insert(station_id, 0);
        }

        debug!(agents = agents.len(), outlets = routes.len(), "run started");
        events.emit(Event::RunStarted {
            agents: agents.len(),
        });

        Ok(Self {
            routes,
            agents,
            arrivals,
            clock: Fixed64::ZERO,
            speed: config.speed_fixed(),
            ms_per_cell: config.ms_per_cell.max(1),
            cross_tolerance: config.cross_tolerance_fixed(),
            crash_grace_ms: config.crash_grace_ms,
            trail_length: config.trail_length,
            phase: RunPhase::Running,
            first_failure: None,
            crossed: BTreeSet::new(),
            ticks: 0,
        })
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance the run by `elapsed_ms` of wall-clock time. Returns the outcome
    /// on the tick the run finishes, `None` otherwise.
    pub fn tick(
        &mut self,
        level: &Level,
        elapsed_ms: Millis,
        events: &mut EventBus,
    ) -> Option<RunOutcome> {
        match self.phase {
            RunPhase::Finished(_) => return None,
            RunPhase::Ending { reason, remaining } => {
                // The grace period runs on wall-clock time.
                if elapsed_ms >= remaining {
                    return Some(self.finish(RunOutcome::Failure(reason)));
                }
                self.phase = RunPhase::Ending {
                    reason,
                    remaining: remaining - elapsed_ms,
                };
                return None;
            }
            RunPhase::Running => {}
        }

        self.ticks += 1;
        let scaled = Fixed64::saturating_from_num(elapsed_ms).saturating_mul(self.speed);
        self.clock = self.clock.saturating_add(scaled);

        self.phase_release(events);
        self.phase_move(level, events);
        let crash = self.phase_collide(events);
        self.phase_judge(level, crash)
    }

    fn phase_release(&mut self, events: &mut EventBus) {
        for agent in &mut self.agents {
            if agent.state != AgentState::Pending {
                continue;
            }
            if self.clock >= Fixed64::saturating_from_num(agent.release_at) {
                agent.state = AgentState::Active;
                trace!(agent = agent.id.0, at = agent.release_at, "agent released");
                events.emit(Event::AgentReleased {
                    agent: agent.id,
                    outlet: agent.outlet,
                    at: agent.release_at,
                });
            }
        }
    }

    fn phase_move(&mut self, level: &Level, events: &mut EventBus) {
        for agent in &mut self.agents {
            if !agent.is_active() {
                continue;
            }
            let Some(route) = self.routes.get(agent.outlet) else {
                continue;
            };
            let last = route.len() - 1;
            if agent.index == last {
                // Parked on a non-station final cell; nothing left to do.
                continue;
            }

            let since_release = self
                .clock
                .saturating_sub(Fixed64::saturating_from_num(agent.release_at))
                .max(Fixed64::ZERO);
            let progress = cells_travelled(since_release, self.ms_per_cell)
                .min(Fixed64::saturating_from_num(last));
            let index = floor_index(progress).min(last);
            agent.progress = progress;

            for step in agent.index + 1..=index {
                let cell = route[step];
                agent.record_trail(cell, self.trail_length);
                if step < last
                    && let Some(changer) = level.color_changer_at(cell)
                    && changer.to_color != agent.color
                {
                    events.emit(Event::ColorChanged {
                        agent: agent.id,
                        position: cell,
                        from: agent.color,
                        to: changer.to_color,
                    });
                    agent.color = changer.to_color;
                }
            }
            agent.index = index;

            if index < last {
                continue;
            }

            // Reached the final cell: judge the arrival.
            let cell = route[last];
            if let Some(station_id) = level.station_at(cell) {
                let Some(station) = level.station(station_id) else {
                    continue;
                };
                if agent.color == station.color {
                    agent.state = AgentState::Succeeded;
                    if let Some(count) = self.arrivals.get_mut(station_id) {
                        *count += 1;
                    }
                    trace!(agent = agent.id.0, station = %station.name, "agent arrived");
                    events.emit(Event::AgentArrived {
                        agent: agent.id,
                        station: station_id,
                    });
                } else {
                    agent.state = AgentState::Failed;
                    let reason = FailureReason::StationColorMismatch {
                        agent: agent.id,
                        station: station_id,
                        expected: station.color,
                        actual: agent.color,
                    };
                    self.first_failure.get_or_insert(reason);
                    events.emit(Event::AgentFailed {
                        agent: agent.id,
                        reason,
                    });
                }
            } else if let Some(changer) = level.color_changer_at(cell) {
                warn!(agent = agent.id.0, %cell, "path ends on a color changer; agent parked");
                if changer.to_color != agent.color {
                    events.emit(Event::ColorChanged {
                        agent: agent.id,
                        position: cell,
                        from: agent.color,
                        to: changer.to_color,
                    });
                    agent.color = changer.to_color;
                }
            } else {
                warn!(agent = agent.id.0, %cell, "path ends off-station");
                agent.state = AgentState::Failed;
                let reason = FailureReason::OffStation {
                    agent: agent.id,
                    position: cell,
                };
                self.first_failure.get_or_insert(reason);
                events.emit(Event::AgentFailed {
                    agent: agent.id,
                    reason,
                });
            }
        }
    }

    /// Resolve pairwise interactions. Returns the first crash, if any.
    fn phase_collide(&mut self, events: &mut EventBus) -> Option<FailureReason> {
        let mut crash = None;
        let n = self.agents.len();

        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = (&self.agents[i], &self.agents[j]);
                if !a.is_active() || !b.is_active() || a.outlet == b.outlet {
                    continue;
                }
                let (Some(route_a), Some(route_b)) =
                    (self.routes.get(a.outlet), self.routes.get(b.outlet))
                else {
                    continue;
                };
                let position = route_a[a.index];
                if position != route_b[b.index] {
                    continue;
                }

                let motion_a = Motion::new(
                    entry_direction(route_a, a.index),
                    exit_direction(route_a, a.index),
                );
                let motion_b = Motion::new(
                    entry_direction(route_b, b.index),
                    exit_direction(route_b, b.index),
                );

                match classify(motion_a, motion_b) {
                    Interaction::Crash => {
                        let (first, second) = (a.id, b.id);
                        self.agents[i].state = AgentState::Crashed;
                        self.agents[j].state = AgentState::Crashed;
                        debug!(first = first.0, second = second.0, %position, "crash");
                        events.emit(Event::Crash {
                            first,
                            second,
                            position,
                        });
                        crash.get_or_insert(FailureReason::Crash {
                            first,
                            second,
                            position,
                        });
                    }
                    Interaction::Merge => {
                        let color = mix_or_first(a.color, b.color);
                        let (survivor, absorbed) = (a.id, b.id);
                        self.agents[i].color = color;
                        self.agents[j].state = AgentState::Merged;
                        trace!(survivor = survivor.0, absorbed = absorbed.0, %position, "merge");
                        events.emit(Event::Merge {
                            survivor,
                            absorbed,
                            position,
                            color,
                        });
                    }
                    Interaction::Cross => {
                        let key = (a.id, b.id, position);
                        if self.crossed.contains(&key) {
                            continue;
                        }
                        let gap = (fraction(a.progress) - fraction(b.progress)).abs();
                        if gap > self.cross_tolerance {
                            continue;
                        }
                        let mixed = mix(a.color, b.color);
                        self.crossed.insert(key);
                        if let Some(color) = mixed {
                            self.agents[i].color = color;
                            self.agents[j].color = color;
                        }
                        trace!(first = key.0.0, second = key.1.0, %position, "cross");
                        events.emit(Event::Cross {
                            first: key.0,
                            second: key.1,
                            position,
                            mixed,
                        });
                    }
                }
            }
        }

        crash
    }

    fn phase_judge(&mut self, level: &Level, crash: Option<FailureReason>) -> Option<RunOutcome> {
        if let Some(reason) = crash {
            if self.crash_grace_ms == 0 {
                return Some(self.finish(RunOutcome::Failure(reason)));
            }
            self.phase = RunPhase::Ending {
                reason,
                remaining: self.crash_grace_ms,
            };
            return None;
        }
        if let Some(reason) = self.first_failure {
            return Some(self.finish(RunOutcome::Failure(reason)));
        }
        if self.agents.iter().any(|a| !a.state.is_terminal()) {
            return None;
        }

        for (station_id, station) in level.stations() {
            let arrived = self.arrivals.get(station_id).copied().unwrap_or(0);
            if arrived < station.required {
                return Some(self.finish(RunOutcome::Failure(
                    FailureReason::StationUnderfilled {
                        station: station_id,
                        arrived,
                        required: station.required,
                    },
                )));
            }
        }
        Some(self.finish(RunOutcome::Success))
    }

    fn finish(&mut self, outcome: RunOutcome) -> RunOutcome {
        debug!(?outcome, ticks = self.ticks, "run finished");
        self.phase = RunPhase::Finished(outcome);
        outcome
    }

    // -----------------------------------------------------------------------
    // Control / queries
    // -----------------------------------------------------------------------

    /// Change the clock multiplier for subsequent ticks.
    pub fn set_speed(&mut self, speed: Fixed64) {
        self.speed = speed;
    }

    pub fn speed(&self) -> Fixed64 {
        self.speed
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, RunPhase::Finished(_))
    }

    pub fn outcome(&self) -> Option<RunOutcome> {
        match self.phase {
            RunPhase::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.0 as usize)
    }

    /// The cell an agent currently occupies.
    pub fn position_of(&self, agent: &Agent) -> Option<GridPosition> {
        self.routes
            .get(agent.outlet)
            .and_then(|route| route.get(agent.index))
            .copied()
    }

    pub fn route(&self, outlet: OutletId) -> Option<&[GridPosition]> {
        self.routes.get(outlet).map(Vec::as_slice)
    }

    pub fn arrivals(&self, station: StationId) -> u32 {
        self.arrivals.get(station).copied().unwrap_or(0)
    }

    /// Simulated milliseconds since start.
    pub fn clock(&self) -> Fixed64 {
        self.clock
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub(crate) fn hash_into(&self, h: &mut StateHash) {
        h.write_fixed64(self.clock);
        h.write_u64(self.ticks);
        for agent in &self.agents {
            h.write_u32(agent.id.0);
            h.write(&[agent.state.tag(), agent.color as u8]);
            h.write_u64(agent.index as u64);
            h.write_fixed64(agent.progress);
        }
        for (_, &count) in &self.arrivals {
            h.write_u32(count);
        }
    }
}
