//! The grid model: an immutable, validated description of one puzzle level.
//!
//! A [`LevelDef`] is the raw serde input supplied by the level catalog. It is
//! validated once into a [`Level`], which answers read-only cell queries for
//! the rest of the engine and is never mutated during play.

use crate::color::Color;
use crate::fixed::Millis;
use crate::grid::{Direction, GridPosition};
use crate::id::{OutletId, StationId};
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Default gap between two agents released by the same outlet.
pub const DEFAULT_RELEASE_DELAY_MS: Millis = 1000;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Reasons a level definition is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LevelError {
    #[error("grid size must be at least 1")]
    ZeroSize,
    #[error("{kind} at {position} is outside the {size}x{size} grid")]
    OutOfBounds {
        kind: &'static str,
        position: GridPosition,
        size: u32,
    },
    #[error("{kind} at {position} overlaps another tile")]
    CellConflict {
        kind: &'static str,
        position: GridPosition,
    },
    #[error("duplicate {kind} id '{name}'")]
    DuplicateName { kind: &'static str, name: String },
    #[error("outlet '{0}' releases no agents")]
    EmptyOutlet(String),
    #[error("station '{0}' requires no arrivals")]
    EmptyStation(String),
}

// ---------------------------------------------------------------------------
// Definition (serde input)
// ---------------------------------------------------------------------------

/// A bare cell reference, used for obstacles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellDef {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitterDef {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub directions: Vec<Direction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorChangerDef {
    pub x: i32,
    pub y: i32,
    pub to_color: Color,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutletDef {
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub color: Color,
    #[serde(default)]
    pub count: Option<u32>,
    /// Milliseconds between consecutive releases.
    #[serde(default)]
    pub delay: Option<Millis>,
    /// Milliseconds before the first release.
    #[serde(default)]
    pub start_delay: Option<Millis>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationDef {
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub color: Color,
    #[serde(default)]
    pub required: Option<u32>,
}

/// Level definition as supplied by the level catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDef {
    pub size: u32,
    #[serde(default)]
    pub obstacles: Vec<CellDef>,
    #[serde(default)]
    pub splitters: Vec<SplitterDef>,
    #[serde(default)]
    pub color_changers: Vec<ColorChangerDef>,
    #[serde(default)]
    pub outlets: Vec<OutletDef>,
    #[serde(default)]
    pub stations: Vec<StationDef>,
    pub par: u32,
    #[serde(default)]
    pub undo_bonus: u32,
}

// ---------------------------------------------------------------------------
// Level entities
// ---------------------------------------------------------------------------

/// A tile annotated with allowed exit directions. Informational only: the
/// engine never auto-branches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splitter {
    pub position: GridPosition,
    pub directions: Vec<Direction>,
}

/// A tile that recolors any agent entering it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorChanger {
    pub position: GridPosition,
    pub to_color: Color,
}

/// A cell releasing one or more colored agents along a player-authored path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outlet {
    pub name: String,
    pub position: GridPosition,
    pub color: Color,
    pub count: u32,
    pub delay: Millis,
    pub start_delay: Millis,
}

impl Outlet {
    /// Release time of the `index`-th agent (0-based) from this outlet.
    pub fn release_time(&self, index: u32) -> Millis {
        self.start_delay
            .saturating_add(self.delay.saturating_mul(index as Millis))
    }
}

/// A cell accepting agents of one color, possibly several of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    pub name: String,
    pub position: GridPosition,
    pub color: Color,
    pub required: u32,
}

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

/// A validated, immutable puzzle level.
#[derive(Debug, Clone)]
pub struct Level {
    size: u32,
    obstacles: BTreeSet<GridPosition>,
    splitters: BTreeMap<GridPosition, Splitter>,
    color_changers: BTreeMap<GridPosition, ColorChanger>,
    outlets: SlotMap<OutletId, Outlet>,
    stations: SlotMap<StationId, Station>,
    outlet_cells: BTreeMap<GridPosition, OutletId>,
    station_cells: BTreeMap<GridPosition, StationId>,
    par: u32,
    undo_bonus: u32,
    definition: LevelDef,
}

impl Level {
    /// Validate a definition and build the level. Outlet and station ids are
    /// assigned in definition order.
    pub fn from_def(def: LevelDef) -> Result<Self, LevelError> {
        if def.size == 0 {
            return Err(LevelError::ZeroSize);
        }
        let size = def.size;
        let mut occupied: HashSet<GridPosition> = HashSet::new();
        let mut claim = |kind: &'static str, x: i32, y: i32| -> Result<GridPosition, LevelError> {
            let position = GridPosition::new(x, y);
            if !within(size, position) {
                return Err(LevelError::OutOfBounds {
                    kind,
                    position,
                    size,
                });
            }
            if !occupied.insert(position) {
                return Err(LevelError::CellConflict { kind, position });
            }
            Ok(position)
        };

        let mut obstacles = BTreeSet::new();
        for cell in &def.obstacles {
            obstacles.insert(claim("obstacle", cell.x, cell.y)?);
        }

        let mut splitters = BTreeMap::new();
        for s in &def.splitters {
            let position = claim("splitter", s.x, s.y)?;
            splitters.insert(
                position,
                Splitter {
                    position,
                    directions: s.directions.clone(),
                },
            );
        }

        let mut color_changers = BTreeMap::new();
        for c in &def.color_changers {
            let position = claim("color changer", c.x, c.y)?;
            color_changers.insert(
                position,
                ColorChanger {
                    position,
                    to_color: c.to_color,
                },
            );
        }

        let mut outlets = SlotMap::with_key();
        let mut outlet_cells = BTreeMap::new();
        let mut outlet_names = HashSet::new();
        for o in &def.outlets {
            let position = claim("outlet", o.x, o.y)?;
            if !outlet_names.insert(o.id.clone()) {
                return Err(LevelError::DuplicateName {
                    kind: "outlet",
                    name: o.id.clone(),
                });
            }
            let count = o.count.unwrap_or(1);
            if count == 0 {
                return Err(LevelError::EmptyOutlet(o.id.clone()));
            }
            let id = outlets.insert(Outlet {
                name: o.id.clone(),
                position,
                color: o.color,
                count,
                delay: o.delay.unwrap_or(DEFAULT_RELEASE_DELAY_MS),
                start_delay: o.start_delay.unwrap_or(0),
            });
            outlet_cells.insert(position, id);
        }

        let mut stations = SlotMap::with_key();
        let mut station_cells = BTreeMap::new();
        let mut station_names = HashSet::new();
        for s in &def.stations {
            let position = claim("station", s.x, s.y)?;
            if !station_names.insert(s.id.clone()) {
                return Err(LevelError::DuplicateName {
                    kind: "station",
                    name: s.id.clone(),
                });
            }
            let required = s.required.unwrap_or(1);
            if required == 0 {
                return Err(LevelError::EmptyStation(s.id.clone()));
            }
            let id = stations.insert(Station {
                name: s.id.clone(),
                position,
                color: s.color,
                required,
            });
            station_cells.insert(position, id);
        }

        Ok(Self {
            size,
            obstacles,
            splitters,
            color_changers,
            outlets,
            stations,
            outlet_cells,
            station_cells,
            par: def.par,
            undo_bonus: def.undo_bonus,
            definition: def,
        })
    }

    // -- Cell queries --

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn in_bounds(&self, position: GridPosition) -> bool {
        within(self.size, position)
    }

    pub fn is_obstacle(&self, position: GridPosition) -> bool {
        self.obstacles.contains(&position)
    }

    pub fn splitter_at(&self, position: GridPosition) -> Option<&Splitter> {
        self.splitters.get(&position)
    }

    pub fn color_changer_at(&self, position: GridPosition) -> Option<&ColorChanger> {
        self.color_changers.get(&position)
    }

    pub fn outlet_at(&self, position: GridPosition) -> Option<OutletId> {
        self.outlet_cells.get(&position).copied()
    }

    pub fn station_at(&self, position: GridPosition) -> Option<StationId> {
        self.station_cells.get(&position).copied()
    }

    // -- Entity access --

    pub fn outlet(&self, id: OutletId) -> Option<&Outlet> {
        self.outlets.get(id)
    }

    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(id)
    }

    /// Outlets in definition order.
    pub fn outlets(&self) -> impl Iterator<Item = (OutletId, &Outlet)> {
        self.outlets.iter()
    }

    /// Stations in definition order.
    pub fn stations(&self) -> impl Iterator<Item = (StationId, &Station)> {
        self.stations.iter()
    }

    pub fn outlet_count(&self) -> usize {
        self.outlets.len()
    }

    pub fn outlet_by_name(&self, name: &str) -> Option<OutletId> {
        self.outlets
            .iter()
            .find(|(_, o)| o.name == name)
            .map(|(id, _)| id)
    }

    pub fn station_by_name(&self, name: &str) -> Option<StationId> {
        self.stations
            .iter()
            .find(|(_, s)| s.name == name)
            .map(|(id, _)| id)
    }

    pub fn obstacles(&self) -> impl Iterator<Item = GridPosition> + '_ {
        self.obstacles.iter().copied()
    }

    pub fn par(&self) -> u32 {
        self.par
    }

    pub fn undo_bonus(&self) -> u32 {
        self.undo_bonus
    }

    /// The definition this level was built from.
    pub fn definition(&self) -> &LevelDef {
        &self.definition
    }
}

fn within(size: u32, position: GridPosition) -> bool {
    let n = size as i64;
    let (x, y) = (position.x as i64, position.y as i64);
    x >= 0 && y >= 0 && x < n && y < n
}
