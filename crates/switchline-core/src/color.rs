//! Agent colors and the symmetric color-mixing table.
//!
//! Mixing is keyed by the *unordered* pair of colors: the pair is normalized
//! so the lower discriminant comes first, then looked up once. Pairs with no
//! entry yield `None`; callers decide the fallback (see [`mix_or_first`]).

use serde::{Deserialize, Serialize};

/// The colors an outlet, station, color changer or agent can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Blue,
    Yellow,
    Green,
    Purple,
    Orange,
    Cyan,
}

impl Color {
    /// Every color, in discriminant order.
    pub fn all() -> [Color; 7] {
        [
            Color::Red,
            Color::Blue,
            Color::Yellow,
            Color::Green,
            Color::Purple,
            Color::Orange,
            Color::Cyan,
        ]
    }

    /// Lowercase display name, matching the serialized form.
    pub fn name(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Blue => "blue",
            Color::Yellow => "yellow",
            Color::Green => "green",
            Color::Purple => "purple",
            Color::Orange => "orange",
            Color::Cyan => "cyan",
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Mix two colors. Returns `None` when the pair has no defined mix.
///
/// A color mixed with itself is itself.
pub fn mix(a: Color, b: Color) -> Option<Color> {
    if a == b {
        return Some(a);
    }
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    match (lo, hi) {
        (Color::Red, Color::Blue) => Some(Color::Purple),
        (Color::Red, Color::Yellow) => Some(Color::Orange),
        (Color::Blue, Color::Yellow) => Some(Color::Green),
        (Color::Blue, Color::Green) => Some(Color::Cyan),
        _ => None,
    }
}

/// Mix two colors, keeping `first` when the pair is unmapped.
pub fn mix_or_first(first: Color, second: Color) -> Color {
    mix(first, second).unwrap_or(first)
}
