//! A player-authored route from an outlet.

use crate::grid::{Direction, GridPosition};
use crate::id::OutletId;
use serde::{Deserialize, Serialize};

/// An ordered, 4-connected sequence of cells starting at the owning outlet.
///
/// Paths never contain the same cell twice: revisiting a cell truncates
/// back to it instead. A path of one cell (just the outlet) is "empty".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    outlet: OutletId,
    cells: Vec<GridPosition>,
    finalized: bool,
}

impl Path {
    /// A fresh one-cell path at the outlet's origin.
    pub fn new(outlet: OutletId, origin: GridPosition) -> Self {
        Self {
            outlet,
            cells: vec![origin],
            finalized: false,
        }
    }

    pub fn outlet(&self) -> OutletId {
        self.outlet
    }

    pub fn cells(&self) -> &[GridPosition] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True while only the outlet cell has been placed.
    pub fn is_empty(&self) -> bool {
        self.cells.len() <= 1
    }

    pub fn head(&self) -> GridPosition {
        self.cells[0]
    }

    pub fn last(&self) -> GridPosition {
        self.cells[self.cells.len() - 1]
    }

    pub fn last_index(&self) -> usize {
        self.cells.len() - 1
    }

    /// True once the path has reached a station. Finalized paths accept no
    /// further edits until restarted.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn position_of(&self, cell: GridPosition) -> Option<usize> {
        self.cells.iter().position(|&c| c == cell)
    }

    pub fn contains(&self, cell: GridPosition) -> bool {
        self.cells.contains(&cell)
    }

    /// Direction of travel into the cell at `index`; `None` for the head.
    pub fn entry_direction(&self, index: usize) -> Option<Direction> {
        entry_direction(&self.cells, index)
    }

    /// Direction of travel out of the cell at `index`; `None` for the last cell.
    pub fn exit_direction(&self, index: usize) -> Option<Direction> {
        exit_direction(&self.cells, index)
    }

    pub(crate) fn push(&mut self, cell: GridPosition) {
        self.cells.push(cell);
    }

    /// Keep cells `0..=index`.
    pub(crate) fn truncate_to(&mut self, index: usize) {
        self.cells.truncate(index + 1);
    }

    pub(crate) fn finalize(&mut self) {
        self.finalized = true;
    }
}

/// Direction of travel into `cells[index]` from its predecessor.
pub fn entry_direction(cells: &[GridPosition], index: usize) -> Option<Direction> {
    if index == 0 || index >= cells.len() {
        return None;
    }
    Direction::between(cells[index - 1], cells[index])
}

/// Direction of travel from `cells[index]` to its successor.
pub fn exit_direction(cells: &[GridPosition], index: usize) -> Option<Direction> {
    if index + 1 >= cells.len() {
        return None;
    }
    Direction::between(cells[index], cells[index + 1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn outlet_id() -> OutletId {
        let mut map: SlotMap<OutletId, ()> = SlotMap::with_key();
        map.insert(())
    }

    fn l_shape() -> Path {
        let mut p = Path::new(outlet_id(), GridPosition::new(0, 0));
        p.push(GridPosition::new(1, 0));
        p.push(GridPosition::new(1, 1));
        p
    }

    #[test]
    fn new_path_is_empty() {
        let p = Path::new(outlet_id(), GridPosition::new(3, 3));
        assert!(p.is_empty());
        assert_eq!(p.len(), 1);
        assert_eq!(p.head(), p.last());
        assert!(!p.is_finalized());
    }

    #[test]
    fn directions_follow_cells() {
        let p = l_shape();
        assert_eq!(p.entry_direction(0), None);
        assert_eq!(p.exit_direction(0), Some(Direction::East));
        assert_eq!(p.entry_direction(1), Some(Direction::East));
        assert_eq!(p.exit_direction(1), Some(Direction::South));
        assert_eq!(p.entry_direction(2), Some(Direction::South));
        assert_eq!(p.exit_direction(2), None);
        assert_eq!(p.exit_direction(9), None);
    }

    #[test]
    fn truncate_keeps_prefix() {
        let mut p = l_shape();
        p.truncate_to(0);
        assert_eq!(p.cells(), &[GridPosition::new(0, 0)]);
    }

    #[test]
    fn position_lookup() {
        let p = l_shape();
        assert_eq!(p.position_of(GridPosition::new(1, 1)), Some(2));
        assert_eq!(p.position_of(GridPosition::new(4, 4)), None);
        assert!(p.contains(GridPosition::new(1, 0)));
    }
}
