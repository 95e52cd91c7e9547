//! Switchline Core -- path authoring and multi-agent simulation for a
//! grid-based routing puzzle.
//!
//! Players draw paths from outlets to stations. At run time every outlet
//! releases colored agents that travel those paths at the same time, merging,
//! crossing or crashing where paths share a cell and changing color on
//! special tiles. A run succeeds once every station has received enough
//! agents of its color.
//!
//! # Tick Pipeline
//!
//! Each call to [`session::PuzzleSession::tick`] advances the run through:
//!
//! 1. **Clock** -- Scale the elapsed wall-clock time by the speed multiplier.
//! 2. **Release** -- Pending agents whose release time has passed go active.
//! 3. **Move** -- Agents advance along their paths; arrivals are judged.
//! 4. **Collide** -- Agents sharing a cell merge, cross or crash.
//! 5. **Judge** -- Decide success or failure once the run is over.
//!
//! # Authoring Pattern
//!
//! Edits are computed as candidate paths and committed only on success, so a
//! rejected edit never changes the session:
//!
//! ```rust,ignore
//! let outlet = session.level().outlet_by_name("red").unwrap();
//! session.start_path(outlet)?;
//! session.extend(outlet, GridPosition::new(4, 2), ExtensionPolicy::Assisted)?;
//! session.start()?;
//! while session.tick(16)?.is_none() {}
//! ```
//!
//! # Key Types
//!
//! - [`session::PuzzleSession`] -- Owns the level, paths, junctions and run.
//! - [`level::Level`] -- Immutable, validated grid of tiles.
//! - [`path::Path`] -- One outlet's authored route.
//! - [`junction::JunctionRegistry`] -- Derived cache of shared cells.
//! - [`engine::Simulation`] -- One run of the agent mover.
//! - [`collision::classify`] -- Crash / merge / cross policy.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic math.
//! - [`event::EventBus`] -- Per-kind ring buffers with batched delivery.
//! - [`replay`] -- Command logs encoded with bitcode.

pub mod agent;
pub mod authoring;
pub mod collision;
pub mod color;
pub mod config;
pub mod engine;
pub mod event;
pub mod fixed;
pub mod grid;
pub mod id;
pub mod junction;
pub mod level;
pub mod path;
pub mod query;
pub mod replay;
pub mod route;
pub mod scoring;
pub mod session;
pub mod sim;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
