//! Session and simulation tuning.
//!
//! Both structs deserialize with `#[serde(default)]`, so a config file only
//! needs the fields it overrides.

use crate::authoring::ExtensionPolicy;
use crate::fixed::{Fixed64, Millis, f64_to_fixed64};
use serde::{Deserialize, Serialize};

/// Slowest allowed speed multiplier.
pub const MIN_SPEED: f64 = 0.25;
/// Fastest allowed speed multiplier.
pub const MAX_SPEED: f64 = 8.0;

/// Timing and tolerance parameters of the simulation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Simulated milliseconds an agent spends crossing one cell at speed 1.
    pub ms_per_cell: Millis,
    /// Clock multiplier applied to every `tick`.
    pub speed: f64,
    /// Largest difference in in-cell progress at which crossing agents mix.
    pub cross_tolerance: f64,
    /// Simulated milliseconds a crashed run stays on screen before failing.
    pub crash_grace_ms: Millis,
    /// Cells kept in each agent's trail.
    pub trail_length: usize,
    /// Ring buffer capacity per event kind.
    pub event_capacity: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ms_per_cell: 250,
            speed: 1.0,
            cross_tolerance: 0.25,
            crash_grace_ms: 1000,
            trail_length: 8,
            event_capacity: 256,
        }
    }
}

impl SimConfig {
    pub fn speed_fixed(&self) -> Fixed64 {
        clamp_speed(self.speed)
    }

    pub fn cross_tolerance_fixed(&self) -> Fixed64 {
        f64_to_fixed64(self.cross_tolerance.max(0.0))
    }
}

/// Clamp a requested multiplier into `[MIN_SPEED, MAX_SPEED]`.
pub fn clamp_speed(speed: f64) -> Fixed64 {
    let speed = if speed.is_nan() { 1.0 } else { speed };
    f64_to_fixed64(speed.clamp(MIN_SPEED, MAX_SPEED))
}

/// Everything a [`PuzzleSession`](crate::session::PuzzleSession) is tuned by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub sim: SimConfig,
    /// Path snapshots kept for undo.
    pub undo_depth: usize,
    /// Policy used by `extend_default`.
    pub default_policy: ExtensionPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sim: SimConfig::default(),
            undo_depth: 64,
            default_policy: ExtensionPolicy::Assisted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: SessionConfig =
            serde_json::from_str(r#"{"sim": {"speed": 2.0}, "default_policy": "manual"}"#).unwrap();
        assert_eq!(cfg.sim.speed, 2.0);
        assert_eq!(cfg.sim.ms_per_cell, 250);
        assert_eq!(cfg.undo_depth, 64);
        assert_eq!(cfg.default_policy, ExtensionPolicy::Manual);
    }

    #[test]
    fn speed_is_clamped() {
        assert_eq!(clamp_speed(100.0), f64_to_fixed64(MAX_SPEED));
        assert_eq!(clamp_speed(0.0), f64_to_fixed64(MIN_SPEED));
        assert_eq!(clamp_speed(f64::NAN), Fixed64::ONE);
    }
}
