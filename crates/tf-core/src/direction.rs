//! Cardinal directions, turns, and compact direction sets.
//!
//! A vehicle's *heading* is the direction it is travelling.  A segment
//! leaving intersection `X` heading `East` arrives at `X`'s east neighbor,
//! and the vehicles on it approach that neighbor travelling east, so the
//! light there governs them through the `East` heading.
//!
//! Row indices grow southwards and column indices grow eastwards:
//!
//! ```text
//!            North (row - 1)
//!                 ↑
//! West (col - 1) ← X → East (col + 1)
//!                 ↓
//!            South (row + 1)
//! ```

use std::fmt;
use std::str::FromStr;

use crate::CoreError;

// ── Direction ─────────────────────────────────────────────────────────────────

/// One of the four cardinal directions.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All four directions in index order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Stable index in `0..4` (N, E, S, W).
    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Inverse of [`index`][Self::index].  Returns `None` for `i >= 4`.
    #[inline]
    pub fn from_index(i: usize) -> Option<Direction> {
        Self::ALL.get(i).copied()
    }

    #[inline]
    pub fn opposite(self) -> Direction {
        Self::ALL[(self.index() + 2) % 4]
    }

    /// The heading after turning left (counter-clockwise).
    #[inline]
    pub fn left(self) -> Direction {
        Self::ALL[(self.index() + 3) % 4]
    }

    /// The heading after turning right (clockwise).
    #[inline]
    pub fn right(self) -> Direction {
        Self::ALL[(self.index() + 1) % 4]
    }

    /// The heading that results from applying `turn` to `self`.
    #[inline]
    pub fn turned(self, turn: Turn) -> Direction {
        match turn {
            Turn::Straight => self,
            Turn::Left     => self.left(),
            Turn::Right    => self.right(),
        }
    }

    /// The turn that takes a vehicle from heading `self` to heading `next`,
    /// or `None` for a U-turn.
    pub fn turn_to(self, next: Direction) -> Option<Turn> {
        if next == self {
            Some(Turn::Straight)
        } else if next == self.left() {
            Some(Turn::Left)
        } else if next == self.right() {
            Some(Turn::Right)
        } else {
            None
        }
    }

    /// `(d_row, d_col)` offset of one step in this direction.
    #[inline]
    pub fn delta(self) -> (i64, i64) {
        match self {
            Direction::North => (-1, 0),
            Direction::East  => (0, 1),
            Direction::South => (1, 0),
            Direction::West  => (0, -1),
        }
    }

    #[inline]
    pub fn axis(self) -> Axis {
        match self {
            Direction::North | Direction::South => Axis::NorthSouth,
            Direction::East  | Direction::West  => Axis::EastWest,
        }
    }

    /// Lower-case label, used for CSV column values and log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::East  => "east",
            Direction::South => "south",
            Direction::West  => "west",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = CoreError;

    /// Accepts full names or single letters, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "north" | "n" => Ok(Direction::North),
            "east"  | "e" => Ok(Direction::East),
            "south" | "s" => Ok(Direction::South),
            "west"  | "w" => Ok(Direction::West),
            other => Err(CoreError::Parse(format!(
                "direction {other:?} (expected north, east, south or west)"
            ))),
        }
    }
}

// ── Turn ──────────────────────────────────────────────────────────────────────

/// Movement through an intersection relative to the current heading.
/// U-turns are not part of the model.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Turn {
    #[default]
    Straight,
    Left,
    Right,
}

impl Turn {
    pub const ALL: [Turn; 3] = [Turn::Straight, Turn::Left, Turn::Right];

    pub fn as_str(self) -> &'static str {
        match self {
            Turn::Straight => "straight",
            Turn::Left     => "left",
            Turn::Right    => "right",
        }
    }
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Axis ──────────────────────────────────────────────────────────────────────

/// The two street axes of the lattice.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Axis {
    NorthSouth,
    EastWest,
}

impl Axis {
    /// Both headings that travel along this axis.
    pub fn directions(self) -> DirectionSet {
        match self {
            Axis::NorthSouth => DirectionSet::NORTH_SOUTH,
            Axis::EastWest   => DirectionSet::EAST_WEST,
        }
    }

    pub fn other(self) -> Axis {
        match self {
            Axis::NorthSouth => Axis::EastWest,
            Axis::EastWest   => Axis::NorthSouth,
        }
    }
}

// ── DirectionSet ──────────────────────────────────────────────────────────────

/// A set of headings packed into the low four bits of a `u8`.
///
/// Serialized as a list of directions (`["north", "south"]`).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "Vec<Direction>", into = "Vec<Direction>")
)]
pub struct DirectionSet(u8);

impl DirectionSet {
    pub const EMPTY: DirectionSet       = DirectionSet(0);
    pub const NORTH_SOUTH: DirectionSet = DirectionSet(0b0101);
    pub const EAST_WEST: DirectionSet   = DirectionSet(0b1010);
    pub const ALL: DirectionSet         = DirectionSet(0b1111);

    #[inline]
    pub fn single(d: Direction) -> Self {
        DirectionSet(1 << d.index())
    }

    #[inline]
    pub fn with(self, d: Direction) -> Self {
        DirectionSet(self.0 | (1 << d.index()))
    }

    #[inline]
    pub fn contains(self, d: Direction) -> bool {
        self.0 & (1 << d.index()) != 0
    }

    #[inline]
    pub fn union(self, other: DirectionSet) -> Self {
        DirectionSet(self.0 | other.0)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Raw bitmask (bit `i` = `Direction::ALL[i]`).  Handy for compact output.
    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Members in index order (N, E, S, W).
    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |d| self.contains(*d))
    }
}

impl FromIterator<Direction> for DirectionSet {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        iter.into_iter().fold(DirectionSet::EMPTY, DirectionSet::with)
    }
}

impl From<Vec<Direction>> for DirectionSet {
    fn from(v: Vec<Direction>) -> Self {
        v.into_iter().collect()
    }
}

impl From<DirectionSet> for Vec<Direction> {
    fn from(s: DirectionSet) -> Self {
        s.iter().collect()
    }
}

impl fmt::Debug for DirectionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for DirectionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letters: String = self
            .iter()
            .map(|d| d.as_str().chars().next().unwrap_or('?').to_ascii_uppercase())
            .collect();
        f.write_str(&letters)
    }
}
