//! Run outcome types and the deterministic state hash.

use crate::color::Color;
use crate::fixed::{Fixed64, Millis};
use crate::grid::GridPosition;
use crate::id::{AgentId, StationId};

// ---------------------------------------------------------------------------
// Run phase / outcome
// ---------------------------------------------------------------------------

/// Why a run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// Two agents met head-on.
    Crash {
        first: AgentId,
        second: AgentId,
        position: GridPosition,
    },
    /// An agent reached a station of a different color.
    StationColorMismatch {
        agent: AgentId,
        station: StationId,
        expected: Color,
        actual: Color,
    },
    /// Every agent finished but a station did not receive enough arrivals.
    StationUnderfilled {
        station: StationId,
        arrived: u32,
        required: u32,
    },
    /// An agent's path ended on a cell with no station.
    OffStation {
        agent: AgentId,
        position: GridPosition,
    },
}

/// The overall result of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    Failure(FailureReason),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success)
    }
}

/// Where a run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Agents are moving.
    Running,
    /// A crash happened; the run is frozen until the grace period ends.
    Ending {
        reason: FailureReason,
        remaining: Millis,
    },
    /// The run is over.
    Finished(RunOutcome),
}

/// Emitted once per run when it finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub outcome: RunOutcome,
    pub total_path_length: u32,
    pub undo_count: u32,
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// A simple deterministic hash of session state for replay verification.
///
/// Uses FNV-1a (64-bit) for speed and simplicity. Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_position(&mut self, p: GridPosition) {
        self.write(&p.x.to_le_bytes());
        self.write(&p.y.to_le_bytes());
    }

    pub fn write_fixed64(&mut self, v: Fixed64) {
        self.write(&v.to_bits().to_le_bytes());
    }

    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}
