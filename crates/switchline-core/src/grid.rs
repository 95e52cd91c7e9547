//! Grid coordinates and cardinal directions.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GridPosition
// ---------------------------------------------------------------------------

/// A cell on the square puzzle grid. `(0, 0)` is the top-left corner and `y`
/// grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another position.
    pub fn manhattan_distance(&self, other: &GridPosition) -> u32 {
        (self.x - other.x).unsigned_abs() + (self.y - other.y).unsigned_abs()
    }

    /// Whether `other` shares an edge with this cell.
    pub fn is_adjacent(&self, other: &GridPosition) -> bool {
        self.manhattan_distance(other) == 1
    }

    /// The cell one step away in `direction`.
    pub fn step(&self, direction: Direction) -> GridPosition {
        let (dx, dy) = direction.offset();
        GridPosition::new(self.x + dx, self.y + dy)
    }

    /// The four edge neighbors, in [`Direction::all`] order.
    pub fn neighbors_4(&self) -> [GridPosition; 4] {
        Direction::all().map(|d| self.step(d))
    }
}

impl std::fmt::Display for GridPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Direction / Axis
// ---------------------------------------------------------------------------

/// The two movement axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Cardinal directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All four cardinal directions. This is also the neighbor enumeration
    /// order used by route search.
    pub fn all() -> [Direction; 4] {
        [
            Direction::North,
            Direction::East,
            Direction::South,
            Direction::West,
        ]
    }

    /// Offset for this direction.
    pub fn offset(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Direction::North | Direction::South => Axis::Vertical,
            Direction::East | Direction::West => Axis::Horizontal,
        }
    }

    /// Direction of travel from `from` to an adjacent `to`. `None` if the
    /// cells are not edge neighbors.
    pub fn between(from: GridPosition, to: GridPosition) -> Option<Direction> {
        match (to.x - from.x, to.y - from.y) {
            (0, -1) => Some(Direction::North),
            (1, 0) => Some(Direction::East),
            (0, 1) => Some(Direction::South),
            (-1, 0) => Some(Direction::West),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_distance() {
        let a = GridPosition::new(0, 2);
        let b = GridPosition::new(4, 0);
        assert_eq!(a.manhattan_distance(&b), 6);
        assert_eq!(b.manhattan_distance(&a), 6);
    }

    #[test]
    fn adjacency_excludes_diagonals_and_self() {
        let c = GridPosition::new(2, 2);
        assert!(c.is_adjacent(&GridPosition::new(2, 1)));
        assert!(c.is_adjacent(&GridPosition::new(3, 2)));
        assert!(!c.is_adjacent(&GridPosition::new(3, 3)));
        assert!(!c.is_adjacent(&c));
    }

    #[test]
    fn between_round_trips_with_step() {
        let c = GridPosition::new(5, 5);
        for d in Direction::all() {
            assert_eq!(Direction::between(c, c.step(d)), Some(d));
        }
        assert_eq!(Direction::between(c, GridPosition::new(7, 5)), None);
    }

    #[test]
    fn opposite_shares_axis() {
        for d in Direction::all() {
            assert_eq!(d.opposite().axis(), d.axis());
            assert_ne!(d.opposite(), d);
            assert_eq!(d.opposite().opposite(), d);
        }
    }

    #[test]
    fn neighbors_follow_direction_order() {
        let n = GridPosition::new(1, 1).neighbors_4();
        assert_eq!(
            n,
            [
                GridPosition::new(1, 0),
                GridPosition::new(2, 1),
                GridPosition::new(1, 2),
                GridPosition::new(0, 1),
            ]
        );
    }
}
