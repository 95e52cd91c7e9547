//! Classification of two agents meeting on the same cell.
//!
//! Each agent is described by its [`Motion`] through the shared cell: the
//! direction it entered by and the direction it is about to leave by. The
//! rules, checked in order:
//!
//! 1. Either agent has no exit (it ends on this cell): **merge**.
//! 2. Opposite entries that leave by the same exit (a T-junction where both
//!    turn the same way): **crash**.
//! 3. Exits on the same axis: opposite exits **crash**, equal exits
//!    **merge**.
//! 4. Exits on perpendicular axes: **cross**.
//!
//! Only exits decide the outcome, so an agent turning inside the cell is
//! treated like one running straight toward its exit. Rule 2 is the one
//! place entries matter. Without it, two agents meeting head-on at a T would
//! merge.
//!
//! Every rule is symmetric in its two arguments, so
//! `classify(a, b) == classify(b, a)`.

use crate::grid::Direction;

/// How two agents sharing a cell interact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interaction {
    Crash,
    Merge,
    Cross,
}

/// An agent's passage through a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Motion {
    pub entry: Option<Direction>,
    pub exit: Option<Direction>,
}

impl Motion {
    pub fn new(entry: Option<Direction>, exit: Option<Direction>) -> Self {
        Self { entry, exit }
    }
}

/// Classify the meeting of two agents on one cell.
pub fn classify(a: Motion, b: Motion) -> Interaction {
    let (Some(exit_a), Some(exit_b)) = (a.exit, b.exit) else {
        return Interaction::Merge;
    };

    let opposite_entries = matches!(
        (a.entry, b.entry),
        (Some(ea), Some(eb)) if ea == eb.opposite()
    );
    if opposite_entries && exit_a == exit_b {
        return Interaction::Crash;
    }

    if exit_a.axis() != exit_b.axis() {
        Interaction::Cross
    } else if exit_a == exit_b {
        Interaction::Merge
    } else {
        Interaction::Crash
    }
}
