use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Simulation time is measured in whole milliseconds.
pub type Millis = u64;

/// Convert an f64 to Fixed64. Use only for initialization, never in the tick loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::saturating_from_num(v)
}

/// Convert Fixed64 to f64. Use only for display.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Number of cells travelled after `elapsed` simulated milliseconds at one
/// cell per `ms_per_cell`.
#[inline]
pub fn cells_travelled(elapsed: Fixed64, ms_per_cell: Millis) -> Fixed64 {
    elapsed
        .checked_div(Fixed64::saturating_from_num(ms_per_cell.max(1)))
        .unwrap_or(Fixed64::MAX)
}

/// The fractional part of a non-negative progress value.
#[inline]
pub fn fraction(v: Fixed64) -> Fixed64 {
    v.frac()
}

/// Floor a non-negative progress value to a path index.
#[inline]
pub fn floor_index(v: Fixed64) -> usize {
    if v <= Fixed64::ZERO {
        0
    } else {
        v.to_num::<u64>() as usize
    }
}
