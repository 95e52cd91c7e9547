//! Path authoring: start, extend (manual or assisted) and backtrack.
//!
//! Every operation here is pure: it takes the current path by reference and
//! returns a candidate replacement. The session commits the candidate only on
//! success, so a rejected edit never leaves a half-applied path behind.

use crate::grid::GridPosition;
use crate::id::{OutletId, StationId};
use crate::level::Level;
use crate::path::Path;
use crate::route::find_route;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Policy / outcome / errors
// ---------------------------------------------------------------------------

/// How a non-adjacent extension target is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionPolicy {
    /// Free draw: only edge-adjacent cells (or backtracks) are accepted.
    Manual,
    /// Non-adjacent targets are reached via shortest-route search.
    #[default]
    Assisted,
}

/// What a successful `extend` did to the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendOutcome {
    /// The target was already the last cell.
    Unchanged,
    /// The path was cut back to an earlier cell.
    Backtracked { removed: usize },
    /// Cells were appended.
    Appended { added: usize },
    /// Cells were appended and the path reached a station.
    Finalized { station: StationId, added: usize },
}

/// Rejections from authoring operations. All are recoverable and leave state
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthoringError {
    #[error("{target} is not adjacent to the end of the path")]
    InvalidMove { target: GridPosition },
    #[error("{target} is blocked by an obstacle")]
    ObstacleBlocked { target: GridPosition },
    #[error("no route from {from} to {target}")]
    NoPathFound {
        from: GridPosition,
        target: GridPosition,
    },
    #[error("{target} is outside the grid")]
    OutOfBounds { target: GridPosition },
    #[error("path already reached a station; restart it to edit")]
    PathFinalized,
    #[error("unknown outlet")]
    UnknownOutlet,
    #[error("outlet has no path in progress")]
    NoActivePath,
    #[error("paths cannot be edited while a simulation is running")]
    SimulationRunning,
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("no junction at {position}")]
    NoJunction { position: GridPosition },
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Begin a new one-cell path at the outlet's origin.
pub fn start_path(level: &Level, outlet: OutletId) -> Result<Path, AuthoringError> {
    let origin = level
        .outlet(outlet)
        .ok_or(AuthoringError::UnknownOutlet)?
        .position;
    Ok(Path::new(outlet, origin))
}

/// Extend `path` toward `target` under `policy`, returning the new path.
pub fn extend(
    level: &Level,
    path: &Path,
    target: GridPosition,
    policy: ExtensionPolicy,
) -> Result<(Path, ExtendOutcome), AuthoringError> {
    if path.is_finalized() {
        return Err(AuthoringError::PathFinalized);
    }
    if !level.in_bounds(target) {
        return Err(AuthoringError::OutOfBounds { target });
    }
    if level.is_obstacle(target) {
        return Err(AuthoringError::ObstacleBlocked { target });
    }

    let last = path.last();
    if target == last {
        return Ok((path.clone(), ExtendOutcome::Unchanged));
    }

    // Backtrack to an earlier occurrence.
    if let Some(index) = path.position_of(target) {
        let mut next = path.clone();
        next.truncate_to(index);
        let removed = path.len() - next.len();
        return Ok((next, ExtendOutcome::Backtracked { removed }));
    }

    if last.is_adjacent(&target) {
        let mut next = path.clone();
        next.push(target);
        let outcome = match level.station_at(target) {
            Some(station) => {
                next.finalize();
                ExtendOutcome::Finalized { station, added: 1 }
            }
            None => ExtendOutcome::Appended { added: 1 },
        };
        return Ok((next, outcome));
    }

    match policy {
        ExtensionPolicy::Manual => Err(AuthoringError::InvalidMove { target }),
        ExtensionPolicy::Assisted => {
            let route = find_route(level, last, target).ok_or(AuthoringError::NoPathFound {
                from: last,
                target,
            })?;
            Ok(apply_route(level, path, &route[1..]))
        }
    }
}

/// Walk the route cell by cell: cells already on the path truncate back to
/// them, new cells are appended, and a station cell finalizes the path.
fn apply_route(level: &Level, path: &Path, steps: &[GridPosition]) -> (Path, ExtendOutcome) {
    let mut next = path.clone();
    let mut added = 0usize;
    let mut removed = 0usize;

    for &cell in steps {
        if let Some(index) = next.position_of(cell) {
            let before = next.len();
            next.truncate_to(index);
            let cut = before - next.len();
            // Cut cells may include ones appended earlier in this walk.
            let cut_added = cut.min(added);
            added -= cut_added;
            removed += cut - cut_added;
            continue;
        }
        next.push(cell);
        added += 1;
        if let Some(station) = level.station_at(cell) {
            next.finalize();
            return (next, ExtendOutcome::Finalized { station, added });
        }
    }

    let outcome = if added > 0 {
        ExtendOutcome::Appended { added }
    } else if removed > 0 {
        ExtendOutcome::Backtracked { removed }
    } else {
        ExtendOutcome::Unchanged
    };
    (next, outcome)
}
