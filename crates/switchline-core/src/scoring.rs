//! Solution-quality scoring for a successful run.
//!
//! All arithmetic is Q32.32 fixed point so the same solution always earns
//! the same score.

use crate::fixed::Fixed64;

/// The rating of a finished, successful solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub total_path_length: u32,
    /// `par / total_path_length`.
    pub efficiency_ratio: Fixed64,
    /// `max(0, undo_count - undo_bonus)`.
    pub undo_penalty: u32,
    /// 0..=100.
    pub score: Fixed64,
    /// 1..=3.
    pub stars: u8,
}

const EFFICIENCY_BASE: i32 = 50;
const EFFICIENCY_BONUS_CAP: i32 = 20;
const EFFICIENCY_BONUS_SLOPE: i32 = 40;
const UNDO_POINTS: i32 = 30;
const UNDO_PENALTY_STEP: i32 = 10;

/// Rate a solution.
///
/// Efficiency is worth up to 70 points: `50 + min(20, (ratio - 1) * 40)` at
/// or under par, `ratio * 50` over par. Undo discipline is worth up to 30:
/// `30 - 10 * penalty`, floored at zero.
pub fn rate(par: u32, total_path_length: u32, undo_count: u32, undo_bonus: u32) -> Score {
    let efficiency_ratio = if total_path_length == 0 {
        Fixed64::ZERO
    } else {
        Fixed64::saturating_from_num(par)
            .checked_div(Fixed64::saturating_from_num(total_path_length))
            .unwrap_or(Fixed64::ZERO)
    };
    let undo_penalty = undo_count.saturating_sub(undo_bonus);

    let efficiency_points = if efficiency_ratio >= Fixed64::ONE {
        let bonus = (efficiency_ratio - Fixed64::ONE)
            .saturating_mul(Fixed64::from_num(EFFICIENCY_BONUS_SLOPE))
            .min(Fixed64::from_num(EFFICIENCY_BONUS_CAP));
        Fixed64::from_num(EFFICIENCY_BASE) + bonus
    } else {
        efficiency_ratio
            .saturating_mul(Fixed64::from_num(EFFICIENCY_BASE))
            .max(Fixed64::ZERO)
    };

    let undo_points = Fixed64::from_num(UNDO_POINTS)
        .saturating_sub(
            Fixed64::saturating_from_num(undo_penalty)
                .saturating_mul(Fixed64::from_num(UNDO_PENALTY_STEP)),
        )
        .max(Fixed64::ZERO);

    let score = efficiency_points + undo_points;
    Score {
        total_path_length,
        efficiency_ratio,
        undo_penalty,
        score,
        stars: stars_for(score),
    }
}

/// Star rating for a score: 80 and up earns 3, 50 and up earns 2.
pub fn stars_for(score: Fixed64) -> u8 {
    if score >= Fixed64::from_num(80) {
        3
    } else if score >= Fixed64::from_num(50) {
        2
    } else {
        1
    }
}
