//! Replay recording and playback for debugging and solution verification.
//!
//! A replay is a level definition, a session config and the sequence of
//! commands applied to a session. Playing it back on a fresh session
//! reproduces the exact same state, with optional hash verification at
//! checkpoints.

use crate::authoring::ExtensionPolicy;
use crate::config::SessionConfig;
use crate::fixed::Millis;
use crate::grid::GridPosition;
use crate::id::OutletId;
use crate::level::{Level, LevelDef, LevelError};
use crate::session::PuzzleSession;
use serde::{Deserialize, Serialize};
use tracing::trace;

// ---------------------------------------------------------------------------
// ReplayCommand
// ---------------------------------------------------------------------------

/// A session operation that can be recorded and replayed. Outlets are named
/// so a log stays valid across sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReplayCommand {
    StartPath {
        outlet: String,
    },
    Extend {
        outlet: String,
        x: i32,
        y: i32,
        policy: ExtensionPolicy,
    },
    ClearPath {
        outlet: String,
    },
    ClearAll,
    ToggleJunction {
        x: i32,
        y: i32,
    },
    Undo,
    Start,
    Tick {
        elapsed_ms: Millis,
    },
    Stop,
    SetSpeed {
        speed: f64,
    },
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("replay level is invalid: {0}")]
    Level(#[from] LevelError),
    #[error("replay references unknown outlet '{0}'")]
    UnknownOutlet(String),
    #[error("state hash mismatch after command {command_index}: expected {expected:#x}, got {actual:#x}")]
    HashMismatch {
        command_index: usize,
        expected: u64,
        actual: u64,
    },
}

// ---------------------------------------------------------------------------
// ReplayLog
// ---------------------------------------------------------------------------

/// A recorded sequence of commands against one level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayLog {
    pub level: LevelDef,
    pub config: SessionConfig,
    /// Recorded commands in order.
    pub commands: Vec<ReplayCommand>,
    /// Hash checkpoints: (command_index, state_hash).
    pub hash_checkpoints: Vec<(usize, u64)>,
}

impl ReplayLog {
    /// Start a log for a session's level and config.
    pub fn new(session: &PuzzleSession) -> Self {
        Self {
            level: session.level().definition().clone(),
            config: session.config().clone(),
            commands: Vec::new(),
            hash_checkpoints: Vec::new(),
        }
    }

    pub fn record(&mut self, cmd: ReplayCommand) {
        self.commands.push(cmd);
    }

    /// Record a command together with the state hash observed after it.
    pub fn record_with_hash(&mut self, cmd: ReplayCommand, hash: u64) {
        let index = self.commands.len();
        self.commands.push(cmd);
        self.hash_checkpoints.push((index, hash));
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ReplayError> {
        bitcode::serialize(self).map_err(|e| ReplayError::Encode(e.to_string()))
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, ReplayError> {
        bitcode::deserialize(data).map_err(|e| ReplayError::Decode(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Playback
// ---------------------------------------------------------------------------

fn outlet_id(session: &PuzzleSession, name: &str) -> Result<OutletId, ReplayError> {
    session
        .level()
        .outlet_by_name(name)
        .ok_or_else(|| ReplayError::UnknownOutlet(name.to_string()))
}

/// Apply one command to a session.
///
/// Rejections from the session itself are not replay errors: a command that
/// was rejected while recording is rejected identically on playback.
pub fn apply_command(session: &mut PuzzleSession, cmd: &ReplayCommand) -> Result<(), ReplayError> {
    let rejected = match cmd {
        ReplayCommand::StartPath { outlet } => {
            let id = outlet_id(session, outlet)?;
            session.start_path(id).err().map(|e| e.to_string())
        }
        ReplayCommand::Extend {
            outlet,
            x,
            y,
            policy,
        } => {
            let id = outlet_id(session, outlet)?;
            session
                .extend(id, GridPosition::new(*x, *y), *policy)
                .err()
                .map(|e| e.to_string())
        }
        ReplayCommand::ClearPath { outlet } => {
            let id = outlet_id(session, outlet)?;
            session.clear_path(id).err().map(|e| e.to_string())
        }
        ReplayCommand::ClearAll => session.clear_all().err().map(|e| e.to_string()),
        ReplayCommand::ToggleJunction { x, y } => session
            .toggle_junction(GridPosition::new(*x, *y))
            .err()
            .map(|e| e.to_string()),
        ReplayCommand::Undo => session.undo().err().map(|e| e.to_string()),
        ReplayCommand::Start => session.start().err().map(|e| e.to_string()),
        ReplayCommand::Tick { elapsed_ms } => {
            session.tick(*elapsed_ms).err().map(|e| e.to_string())
        }
        ReplayCommand::Stop => {
            session.stop();
            None
        }
        ReplayCommand::SetSpeed { speed } => {
            session.set_speed(*speed);
            None
        }
    };
    if let Some(reason) = rejected {
        trace!(?cmd, %reason, "replayed command rejected");
    }
    Ok(())
}

/// Rebuild a fresh session from the log and re-apply every command,
/// verifying each hash checkpoint. Fails on the first mismatch.
pub fn play(log: &ReplayLog) -> Result<PuzzleSession, ReplayError> {
    let level = Level::from_def(log.level.clone())?;
    let mut session = PuzzleSession::new(level, log.config.clone());

    let mut checkpoints = log.hash_checkpoints.iter().peekable();
    for (i, cmd) in log.commands.iter().enumerate() {
        apply_command(&mut session, cmd)?;
        while let Some(&&(index, expected)) = checkpoints.peek() {
            if index != i {
                break;
            }
            let actual = session.state_hash();
            if actual != expected {
                return Err(ReplayError::HashMismatch {
                    command_index: i,
                    expected,
                    actual,
                });
            }
            checkpoints.next();
        }
    }
    Ok(session)
}
