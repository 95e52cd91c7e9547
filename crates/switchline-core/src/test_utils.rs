//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::authoring::ExtensionPolicy;
use crate::color::Color;
use crate::fixed::{Fixed64, Millis};
use crate::grid::{Direction, GridPosition};
use crate::id::OutletId;
use crate::level::{
    CellDef, ColorChangerDef, Level, LevelDef, OutletDef, SplitterDef, StationDef,
};
use crate::path::Path;
use crate::session::PuzzleSession;
use crate::sim::Completion;

// ===========================================================================
// Small constructors
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

pub fn pos(x: i32, y: i32) -> GridPosition {
    GridPosition::new(x, y)
}

/// Build a path directly from cells, bypassing authoring checks.
pub fn path_from_cells(outlet: OutletId, cells: impl IntoIterator<Item = GridPosition>) -> Path {
    let mut cells = cells.into_iter();
    let origin = cells.next().expect("path needs at least one cell");
    let mut path = Path::new(outlet, origin);
    for cell in cells {
        path.push(cell);
    }
    path
}

// ===========================================================================
// Level builder
// ===========================================================================

/// Fluent builder over [`LevelDef`]. Panics on invalid levels.
#[derive(Debug, Clone)]
pub struct LevelBuilder {
    def: LevelDef,
}

impl LevelBuilder {
    pub fn new(size: u32) -> Self {
        Self {
            def: LevelDef {
                size,
                obstacles: Vec::new(),
                splitters: Vec::new(),
                color_changers: Vec::new(),
                outlets: Vec::new(),
                stations: Vec::new(),
                par: 0,
                undo_bonus: 0,
            },
        }
    }

    pub fn obstacle(mut self, x: i32, y: i32) -> Self {
        self.def.obstacles.push(CellDef { x, y });
        self
    }

    pub fn splitter(mut self, x: i32, y: i32, directions: &[Direction]) -> Self {
        self.def.splitters.push(SplitterDef {
            x,
            y,
            directions: directions.to_vec(),
        });
        self
    }

    pub fn color_changer(mut self, x: i32, y: i32, to_color: Color) -> Self {
        self.def.color_changers.push(ColorChangerDef { x, y, to_color });
        self
    }

    /// A single-agent outlet released at time 0.
    pub fn outlet(self, name: &str, x: i32, y: i32, color: Color) -> Self {
        self.outlet_def(OutletDef {
            id: name.to_string(),
            x,
            y,
            color,
            count: None,
            delay: None,
            start_delay: None,
        })
    }

    pub fn outlet_with(
        self,
        name: &str,
        x: i32,
        y: i32,
        color: Color,
        count: u32,
        delay: Millis,
        start_delay: Millis,
    ) -> Self {
        self.outlet_def(OutletDef {
            id: name.to_string(),
            x,
            y,
            color,
            count: Some(count),
            delay: Some(delay),
            start_delay: Some(start_delay),
        })
    }

    pub fn outlet_def(mut self, def: OutletDef) -> Self {
        self.def.outlets.push(def);
        self
    }

    pub fn station(self, name: &str, x: i32, y: i32, color: Color) -> Self {
        self.station_requiring(name, x, y, color, 1)
    }

    pub fn station_requiring(mut self, name: &str, x: i32, y: i32, color: Color, required: u32) -> Self {
        self.def.stations.push(StationDef {
            id: name.to_string(),
            x,
            y,
            color,
            required: Some(required),
        });
        self
    }

    pub fn par(mut self, par: u32) -> Self {
        self.def.par = par;
        self
    }

    pub fn undo_bonus(mut self, bonus: u32) -> Self {
        self.def.undo_bonus = bonus;
        self
    }

    pub fn def(&self) -> LevelDef {
        self.def.clone()
    }

    pub fn build(self) -> Level {
        Level::from_def(self.def).expect("test level should be valid")
    }
}

// ===========================================================================
// Session helpers
// ===========================================================================

/// Restart the named outlet's path and draw it cell by cell. `cells[0]` must
/// be the outlet's origin.
pub fn draw_path(session: &mut PuzzleSession, outlet: &str, cells: &[(i32, i32)]) {
    let id = session
        .level()
        .outlet_by_name(outlet)
        .unwrap_or_else(|| panic!("no outlet named {outlet}"));
    let origin = session.start_path(id).unwrap().head();
    assert_eq!(origin, pos(cells[0].0, cells[0].1), "path must start at the outlet");
    for &(x, y) in &cells[1..] {
        session
            .extend(id, pos(x, y), ExtensionPolicy::Manual)
            .unwrap_or_else(|e| panic!("drawing {outlet} to ({x}, {y}): {e}"));
    }
}

/// Tick a started session until it completes or `max_ticks` pass.
pub fn run_to_completion(
    session: &mut PuzzleSession,
    step_ms: Millis,
    max_ticks: usize,
) -> Option<Completion> {
    for _ in 0..max_ticks {
        if let Some(completion) = session.tick(step_ms).unwrap() {
            return Some(completion);
        }
    }
    None
}

/// A `size`x`size` level with one outlet per row on the left edge, each
/// feeding a same-colored station on the right edge. Used by benchmarks.
pub fn build_lanes(size: u32) -> Level {
    let colors = Color::all();
    let mut builder = LevelBuilder::new(size);
    let last = size as i32 - 1;
    for row in 0..size as i32 {
        let color = colors[row as usize % colors.len()];
        builder = builder
            .outlet_with(&format!("o{row}"), 0, row, color, 3, 500, 0)
            .station_requiring(&format!("s{row}"), last, row, color, 3);
    }
    builder.par(size * size).build()
}

/// Draw every lane of a [`build_lanes`] level as a straight row.
pub fn draw_lanes(session: &mut PuzzleSession) {
    let size = session.level().size() as i32;
    for row in 0..size {
        let cells: Vec<(i32, i32)> = (0..size).map(|x| (x, row)).collect();
        draw_path(session, &format!("o{row}"), &cells);
    }
}
