//! Assisted route search between two cells.
//!
//! A* over the 4-neighbor grid with unit step cost and a Manhattan-distance
//! heuristic. Neighbors are always enumerated in [`Direction::all`] order, so
//! identical obstacle layouts produce identical routes.
//!
//! [`Direction::all`]: crate::grid::Direction::all

use crate::grid::GridPosition;
use crate::level::Level;

/// Find a shortest route from `from` to `to`, both endpoints included.
///
/// Obstacles and out-of-grid cells are impassable. Station cells other than
/// `to` are impassable too, since entering a station ends a path. Returns
/// `None` when no route exists.
pub fn find_route(level: &Level, from: GridPosition, to: GridPosition) -> Option<Vec<GridPosition>> {
    if !passable(level, to, to) {
        return None;
    }

    pathfinding::prelude::astar(
        &from,
        |&cell| {
            cell.neighbors_4()
                .into_iter()
                .filter(move |&next| passable(level, next, to))
                .map(|next| (next, 1u32))
        },
        |cell| cell.manhattan_distance(&to),
        |&cell| cell == to,
    )
    .map(|(route, _cost)| route)
}

fn passable(level: &Level, cell: GridPosition, goal: GridPosition) -> bool {
    if !level.in_bounds(cell) || level.is_obstacle(cell) {
        return false;
    }
    cell == goal || level.station_at(cell).is_none()
}
