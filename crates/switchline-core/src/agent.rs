//! Simulation agents ("trains") and their lifecycle.

use crate::color::Color;
use crate::fixed::{Fixed64, Millis};
use crate::grid::GridPosition;
use crate::id::{AgentId, OutletId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Lifecycle of an agent within one run.
///
/// `Pending -> Active -> {Succeeded, Crashed, Merged, Failed}`; the last four
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentState {
    /// Queued, waiting for its release time.
    Pending,
    /// Moving along its path.
    Active,
    /// Delivered to a station of the matching color.
    Succeeded,
    /// Collided head-on with another agent.
    Crashed,
    /// Absorbed into another agent.
    Merged,
    /// Reached the end of its path without a valid delivery.
    Failed,
}

impl AgentState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AgentState::Succeeded | AgentState::Crashed | AgentState::Merged | AgentState::Failed
        )
    }

    /// Terminal states that count toward a successful run.
    pub fn is_delivered(self) -> bool {
        matches!(self, AgentState::Succeeded | AgentState::Merged)
    }

    pub(crate) fn tag(self) -> u8 {
        match self {
            AgentState::Pending => 0,
            AgentState::Active => 1,
            AgentState::Succeeded => 2,
            AgentState::Crashed => 3,
            AgentState::Merged => 4,
            AgentState::Failed => 5,
        }
    }
}

/// One simulated agent. Lives only for the duration of a run.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub outlet: OutletId,
    /// Current color; diverges from `original_color` after color changers or
    /// mixing.
    pub color: Color,
    pub original_color: Color,
    /// Simulated time at which the agent leaves its outlet.
    pub release_at: Millis,
    /// Progress along the path in cells.
    pub progress: Fixed64,
    /// `floor(progress)`, clamped to the last path index.
    pub index: usize,
    pub state: AgentState,
    /// Most recently entered cells, oldest first.
    pub trail: VecDeque<GridPosition>,
}

impl Agent {
    pub(crate) fn new(
        id: AgentId,
        outlet: OutletId,
        color: Color,
        release_at: Millis,
        origin: GridPosition,
    ) -> Self {
        let mut trail = VecDeque::new();
        trail.push_back(origin);
        Self {
            id,
            outlet,
            color,
            original_color: color,
            release_at,
            progress: Fixed64::ZERO,
            index: 0,
            state: if release_at == 0 {
                AgentState::Active
            } else {
                AgentState::Pending
            },
            trail,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == AgentState::Active
    }

    pub(crate) fn record_trail(&mut self, cell: GridPosition, limit: usize) {
        self.trail.push_back(cell);
        while self.trail.len() > limit.max(1) {
            self.trail.pop_front();
        }
    }
}
