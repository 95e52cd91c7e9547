//! The puzzle session: the one object a game front-end talks to.
//!
//! # Architecture
//!
//! The `PuzzleSession` owns:
//! - The immutable [`Level`]
//! - One [`Path`] per outlet that has been started
//! - The derived [`JunctionRegistry`], rebuilt after every path mutation
//! - A bounded undo history of path sets
//! - The optional [`Simulation`] and the last run's [`Completion`]
//! - An [`EventBus`] delivered at the end of every call
//!
//! Authoring is locked while a simulation exists, finished or not; call
//! [`PuzzleSession::stop`] to return to editing.

use crate::authoring::{self, AuthoringError, ExtendOutcome, ExtensionPolicy};
use crate::config::{SessionConfig, clamp_speed};
use crate::engine::{Simulation, SimulationError};
use crate::event::{Event, EventBus};
use crate::fixed::{Fixed64, Millis};
use crate::grid::GridPosition;
use crate::id::OutletId;
use crate::junction::JunctionRegistry;
use crate::level::Level;
use crate::path::Path;
use crate::query::{AgentSnapshot, JunctionSnapshot, StationSnapshot};
use crate::scoring::{Score, rate};
use crate::sim::{Completion, RunPhase, StateHash};
use slotmap::SecondaryMap;
use std::collections::VecDeque;
use tracing::debug;

type PathSet = SecondaryMap<OutletId, Path>;

// ---------------------------------------------------------------------------
// PuzzleSession
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct PuzzleSession {
    level: Level,
    config: SessionConfig,
    paths: PathSet,
    junctions: JunctionRegistry,
    /// Path sets before each committed mutation, oldest first.
    history: VecDeque<PathSet>,
    undo_count: u32,
    speed: Fixed64,
    simulation: Option<Simulation>,
    completion: Option<Completion>,
    /// Typed event bus for authoring and simulation events.
    pub event_bus: EventBus,
}

impl PuzzleSession {
    pub fn new(level: Level, config: SessionConfig) -> Self {
        Self {
            speed: config.sim.speed_fixed(),
            event_bus: EventBus::new(config.sim.event_capacity),
            level,
            config,
            paths: SecondaryMap::new(),
            junctions: JunctionRegistry::new(),
            history: VecDeque::new(),
            undo_count: 0,
            simulation: None,
            completion: None,
        }
    }

    pub fn with_defaults(level: Level) -> Self {
        Self::new(level, SessionConfig::default())
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Authoring
    // -----------------------------------------------------------------------

    /// Discard the outlet's path, if any, and start a new one at its origin.
    pub fn start_path(&mut self, outlet: OutletId) -> Result<&Path, AuthoringError> {
        self.ensure_editable()?;
        let path = authoring::start_path(&self.level, outlet)?;
        if self.paths.get(outlet).is_some_and(|p| p.len() <= 1) {
            // Already a bare origin: nothing to discard, nothing to undo.
            return self.paths.get(outlet).ok_or(AuthoringError::NoActivePath);
        }
        let mut next = self.paths.clone();
        next.insert(outlet, path);
        self.commit(next);
        debug!(?outlet, "path started");
        self.emit_path_changed(outlet);
        self.event_bus.deliver();
        self.paths.get(outlet).ok_or(AuthoringError::NoActivePath)
    }

    /// Extend the outlet's path toward `target`.
    pub fn extend(
        &mut self,
        outlet: OutletId,
        target: GridPosition,
        policy: ExtensionPolicy,
    ) -> Result<ExtendOutcome, AuthoringError> {
        self.ensure_editable()?;
        if self.level.outlet(outlet).is_none() {
            return Err(AuthoringError::UnknownOutlet);
        }
        let current = self.paths.get(outlet).ok_or(AuthoringError::NoActivePath)?;
        let (path, outcome) = authoring::extend(&self.level, current, target, policy)?;
        if outcome == ExtendOutcome::Unchanged {
            return Ok(outcome);
        }

        let mut next = self.paths.clone();
        next.insert(outlet, path);
        self.commit(next);
        debug!(?outlet, %target, ?outcome, "path extended");
        self.emit_path_changed(outlet);
        self.event_bus.deliver();
        Ok(outcome)
    }

    /// [`extend`](Self::extend) with the configured default policy.
    pub fn extend_default(
        &mut self,
        outlet: OutletId,
        target: GridPosition,
    ) -> Result<ExtendOutcome, AuthoringError> {
        self.extend(outlet, target, self.config.default_policy)
    }

    /// Remove the outlet's path. Clearing an outlet without a path is a no-op.
    pub fn clear_path(&mut self, outlet: OutletId) -> Result<(), AuthoringError> {
        self.ensure_editable()?;
        if self.level.outlet(outlet).is_none() {
            return Err(AuthoringError::UnknownOutlet);
        }
        if !self.paths.contains_key(outlet) {
            return Ok(());
        }
        let mut next = self.paths.clone();
        next.remove(outlet);
        self.commit(next);
        debug!(?outlet, "path cleared");
        self.event_bus.emit(Event::PathChanged { outlet, length: 0 });
        self.event_bus.deliver();
        Ok(())
    }

    /// Remove every path. Idempotent: clearing an empty session changes
    /// nothing and records no undo step.
    pub fn clear_all(&mut self) -> Result<(), AuthoringError> {
        self.ensure_editable()?;
        if self.paths.is_empty() {
            return Ok(());
        }
        self.commit(SecondaryMap::new());
        debug!("all paths cleared");
        self.event_bus.emit(Event::PathsCleared);
        self.event_bus.deliver();
        Ok(())
    }

    /// Cycle priority at a junction. Returns the new priority owner.
    pub fn toggle_junction(&mut self, position: GridPosition) -> Result<OutletId, AuthoringError> {
        self.ensure_editable()?;
        let owner = self
            .junctions
            .toggle(position)
            .ok_or(AuthoringError::NoJunction { position })?;
        debug!(%position, ?owner, "junction toggled");
        self.event_bus
            .emit(Event::JunctionToggled { position, owner });
        self.event_bus.deliver();
        Ok(owner)
    }

    /// Restore the path set from before the last committed mutation.
    pub fn undo(&mut self) -> Result<(), AuthoringError> {
        self.ensure_editable()?;
        let previous = self
            .history
            .pop_back()
            .ok_or(AuthoringError::NothingToUndo)?;
        self.paths = previous;
        self.junctions.rebuild(self.paths.values());
        self.undo_count += 1;
        debug!(undo_count = self.undo_count, "undo");
        for (outlet, _) in self.level.outlets() {
            let length = self.paths.get(outlet).map_or(0, Path::len);
            self.event_bus.emit(Event::PathChanged { outlet, length });
        }
        self.event_bus.deliver();
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    fn ensure_editable(&self) -> Result<(), AuthoringError> {
        if self.simulation.is_some() {
            return Err(AuthoringError::SimulationRunning);
        }
        Ok(())
    }

    /// Swap in a new path set, remember the old one and rebuild junctions.
    fn commit(&mut self, next: PathSet) {
        let previous = std::mem::replace(&mut self.paths, next);
        self.history.push_back(previous);
        while self.history.len() > self.config.undo_depth {
            self.history.pop_front();
        }
        self.junctions.rebuild(self.paths.values());
    }

    fn emit_path_changed(&mut self, outlet: OutletId) {
        let length = self.paths.get(outlet).map_or(0, Path::len);
        self.event_bus.emit(Event::PathChanged { outlet, length });
    }

    // -----------------------------------------------------------------------
    // Simulation control
    // -----------------------------------------------------------------------

    /// Freeze the current paths and begin a run.
    ///
    /// A finished run that was never stopped is replaced.
    pub fn start(&mut self) -> Result<(), SimulationError> {
        if self.is_running() {
            return Err(SimulationError::AlreadyRunning);
        }
        let mut sim = Simulation::start(
            &self.level,
            &self.paths,
            &self.config.sim,
            &mut self.event_bus,
        )?;
        sim.set_speed(self.speed);
        self.simulation = Some(sim);
        self.completion = None;
        self.event_bus.deliver();
        Ok(())
    }

    /// Advance the run. Returns the completion record on the tick the run
    /// finishes.
    pub fn tick(&mut self, elapsed_ms: Millis) -> Result<Option<Completion>, SimulationError> {
        let sim = self
            .simulation
            .as_mut()
            .ok_or(SimulationError::NotRunning)?;
        let Some(outcome) = sim.tick(&self.level, elapsed_ms, &mut self.event_bus) else {
            self.event_bus.deliver();
            return Ok(None);
        };

        let completion = Completion {
            outcome,
            total_path_length: self.total_path_length(),
            undo_count: self.undo_count,
        };
        debug!(?completion, "run completed");
        self.completion = Some(completion);
        self.event_bus.emit(Event::RunCompleted(completion));
        self.event_bus.deliver();
        Ok(Some(completion))
    }

    /// Discard all agent state and return to editing. Paths are kept. Safe
    /// to call at any time.
    pub fn stop(&mut self) {
        if self.simulation.take().is_some() {
            debug!("run stopped");
            self.event_bus.emit(Event::RunStopped);
            self.event_bus.deliver();
        }
    }

    /// Set the clock multiplier, clamped to the allowed range. Returns the
    /// value actually applied.
    pub fn set_speed(&mut self, speed: f64) -> Fixed64 {
        self.speed = clamp_speed(speed);
        if let Some(sim) = self.simulation.as_mut() {
            sim.set_speed(self.speed);
        }
        self.speed
    }

    pub fn speed(&self) -> Fixed64 {
        self.speed
    }

    /// True while a run exists and has not finished.
    pub fn is_running(&self) -> bool {
        self.simulation.as_ref().is_some_and(|s| !s.is_finished())
    }

    pub fn phase(&self) -> Option<RunPhase> {
        self.simulation.as_ref().map(Simulation::phase)
    }

    pub fn simulation(&self) -> Option<&Simulation> {
        self.simulation.as_ref()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn path(&self, outlet: OutletId) -> Option<&Path> {
        self.paths.get(outlet)
    }

    /// Paths in outlet definition order.
    pub fn paths(&self) -> impl Iterator<Item = (OutletId, &Path)> {
        self.paths.iter()
    }

    pub fn junctions(&self) -> &JunctionRegistry {
        &self.junctions
    }

    /// Sum of all path lengths, outlet cells included.
    pub fn total_path_length(&self) -> u32 {
        self.paths.values().map(|p| p.len() as u32).sum()
    }

    pub fn undo_count(&self) -> u32 {
        self.undo_count
    }

    /// The last finished run's record, kept until the next start.
    pub fn completion(&self) -> Option<Completion> {
        self.completion
    }

    /// The rating of the last run, if it succeeded.
    pub fn score(&self) -> Option<Score> {
        let completion = self.completion.filter(|c| c.outcome.is_success())?;
        Some(rate(
            self.level.par(),
            completion.total_path_length,
            completion.undo_count,
            self.level.undo_bonus(),
        ))
    }

    pub fn agent_snapshots(&self) -> Vec<AgentSnapshot> {
        self.simulation
            .as_ref()
            .map(AgentSnapshot::collect)
            .unwrap_or_default()
    }

    pub fn station_snapshots(&self) -> Vec<StationSnapshot> {
        StationSnapshot::collect(&self.level, self.simulation.as_ref())
    }

    pub fn junction_snapshots(&self) -> Vec<JunctionSnapshot> {
        JunctionSnapshot::collect(&self.junctions)
    }

    /// Deterministic hash over paths, junction priorities, the undo counter
    /// and any running simulation.
    pub fn state_hash(&self) -> u64 {
        let mut h = StateHash::new();
        for (outlet, _) in self.level.outlets() {
            match self.paths.get(outlet) {
                Some(path) => {
                    h.write_u32(path.len() as u32);
                    h.write(&[path.is_finalized() as u8]);
                    for &cell in path.cells() {
                        h.write_position(cell);
                    }
                }
                None => h.write_u32(0),
            }
        }
        for junction in self.junctions.iter() {
            h.write_position(junction.position);
            h.write_u32(junction.active_config_index as u32);
        }
        h.write_u32(self.undo_count);
        if let Some(sim) = &self.simulation {
            sim.hash_into(&mut h);
        }
        h.finish()
    }
}
