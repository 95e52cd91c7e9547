//! Junction registry: cells shared by more than one outlet's path.
//!
//! The registry is a derived cache. [`JunctionRegistry::rebuild`] recomputes
//! it from scratch out of the current paths after every mutation; it is
//! never patched incrementally. The only state carried across rebuilds is
//! which owner each junction gives priority to.

use crate::grid::{Direction, GridPosition};
use crate::id::OutletId;
use crate::path::Path;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One path's passage through a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JunctionPass {
    pub outlet: OutletId,
    /// Direction of travel into the cell. `None` at the path's first cell.
    pub entry: Option<Direction>,
    /// Direction of travel out of the cell. `None` at the path's last cell.
    pub exit: Option<Direction>,
}

/// A cell traversed by at least two distinct outlets' paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Junction {
    pub position: GridPosition,
    /// Every passage through this cell, in outlet order.
    pub passes: Vec<JunctionPass>,
    /// One configuration per distinct owning outlet, ascending.
    pub configurations: Vec<OutletId>,
    /// Index into `configurations` of the outlet holding priority.
    pub active_config_index: usize,
}

impl Junction {
    /// The outlet currently holding priority at this cell.
    pub fn active_owner(&self) -> OutletId {
        self.configurations[self.active_config_index]
    }

    /// Advance to the next configuration, wrapping around.
    pub fn toggle(&mut self) -> OutletId {
        self.active_config_index = (self.active_config_index + 1) % self.configurations.len();
        self.active_owner()
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct JunctionRegistry {
    junctions: BTreeMap<GridPosition, Junction>,
}

impl JunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute every junction from `paths`.
    ///
    /// A junction that survives the rebuild keeps its active owner if that
    /// outlet still passes through; otherwise its previous index is clamped
    /// to the new configuration count.
    pub fn rebuild<'a>(&mut self, paths: impl IntoIterator<Item = &'a Path>) {
        let mut fresh = collect_junctions(paths);
        for (position, junction) in fresh.iter_mut() {
            let Some(previous) = self.junctions.get(position) else {
                continue;
            };
            let owner = previous.active_owner();
            junction.active_config_index = match junction
                .configurations
                .iter()
                .position(|&o| o == owner)
            {
                Some(index) => index,
                None => previous
                    .active_config_index
                    .min(junction.configurations.len() - 1),
            };
        }
        self.junctions = fresh;
    }

    /// Cycle the active configuration at `position`. Returns the new owner, or
    /// `None` if no junction exists there.
    pub fn toggle(&mut self, position: GridPosition) -> Option<OutletId> {
        self.junctions.get_mut(&position).map(Junction::toggle)
    }

    pub fn get(&self, position: GridPosition) -> Option<&Junction> {
        self.junctions.get(&position)
    }

    /// Junctions in row-major cell order.
    pub fn iter(&self) -> impl Iterator<Item = &Junction> {
        self.junctions.values()
    }

    pub fn len(&self) -> usize {
        self.junctions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.junctions.is_empty()
    }

    pub fn clear(&mut self) {
        self.junctions.clear();
    }
}

/// Index every path cell, then keep cells visited by two or more distinct
/// outlets. Cost is proportional to the total path length.
fn collect_junctions<'a>(paths: impl IntoIterator<Item = &'a Path>) -> BTreeMap<GridPosition, Junction> {
    let mut by_cell: BTreeMap<GridPosition, Vec<JunctionPass>> = BTreeMap::new();
    for path in paths {
        let cells = path.cells();
        for (index, &cell) in cells.iter().enumerate() {
            by_cell.entry(cell).or_default().push(JunctionPass {
                outlet: path.outlet(),
                entry: path.entry_direction(index),
                exit: path.exit_direction(index),
            });
        }
    }

    by_cell
        .into_iter()
        .filter_map(|(position, mut passes)| {
            passes.sort_by_key(|p| p.outlet);
            let mut configurations: Vec<OutletId> = passes.iter().map(|p| p.outlet).collect();
            configurations.dedup();
            (configurations.len() >= 2).then(|| {
                (
                    position,
                    Junction {
                        position,
                        passes,
                        configurations,
                        active_config_index: 0,
                    },
                )
            })
        })
        .collect()
}
