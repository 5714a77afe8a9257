//! Grid coordinate types — integer positions and the four cardinal directions.
//!
//! Origin is the top-left corner: `x` grows east, `y` grows south.

use serde::{Deserialize, Serialize};

/// Grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell one step in `dir` from this one.
    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.offset();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Manhattan (taxicab) distance.
    pub fn manhattan(self, other: Self) -> u32 {
        (self.x - other.x).unsigned_abs() + (self.y - other.y).unsigned_abs()
    }

    /// Chebyshev (king-move) distance.
    pub fn chebyshev(self, other: Self) -> u32 {
        (self.x - other.x)
            .unsigned_abs()
            .max((self.y - other.y).unsigned_abs())
    }

    /// The four orthogonal neighbors, in clockwise direction order.
    pub fn neighbors(self) -> [Self; 4] {
        Direction::ALL.map(|dir| self.step(dir))
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Facing direction. Clockwise ordering `[N, E, S, W]`; rotation is modular
/// over this ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    N,
    E,
    S,
    W,
}

impl Direction {
    pub const ALL: [Self; 4] = [Self::N, Self::E, Self::S, Self::W];

    /// Unit offset (dx, dy) for this direction.
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::N => (0, -1),
            Self::E => (1, 0),
            Self::S => (0, 1),
            Self::W => (-1, 0),
        }
    }

    /// Index into the clockwise ordering.
    pub const fn index(self) -> usize {
        match self {
            Self::N => 0,
            Self::E => 1,
            Self::S => 2,
            Self::W => 3,
        }
    }

    /// Rotate 90° counter-clockwise (-1 mod 4).
    pub const fn turn_left(self) -> Self {
        Self::ALL[(self.index() + 3) % 4]
    }

    /// Rotate 90° clockwise (+1 mod 4).
    pub const fn turn_right(self) -> Self {
        Self::ALL[(self.index() + 1) % 4]
    }

    /// 180° turn.
    pub const fn opposite(self) -> Self {
        Self::ALL[(self.index() + 2) % 4]
    }

    /// Number of 90° clockwise steps from `self` to `other` (0..=3).
    pub const fn clockwise_steps_to(self, other: Self) -> usize {
        (other.index() + 4 - self.index()) % 4
    }

    /// One rotation step from `self` toward `target`: clockwise when the
    /// clockwise arc is shorter or equal, counter-clockwise otherwise.
    pub fn rotate_toward(self, target: Self) -> Self {
        match self.clockwise_steps_to(target) {
            0 => self,
            3 => self.turn_left(),
            _ => self.turn_right(),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::N => "N",
            Self::E => "E",
            Self::S => "S",
            Self::W => "W",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_matches_offsets() {
        let origin = Position::new(3, 3);
        assert_eq!(origin.step(Direction::N), Position::new(3, 2));
        assert_eq!(origin.step(Direction::E), Position::new(4, 3));
        assert_eq!(origin.step(Direction::S), Position::new(3, 4));
        assert_eq!(origin.step(Direction::W), Position::new(2, 3));
    }

    #[test]
    fn manhattan_distance() {
        assert_eq!(Position::new(0, 0).manhattan(Position::new(4, 4)), 8);
        assert_eq!(Position::new(2, 5).manhattan(Position::new(2, 5)), 0);
    }

    #[test]
    fn chebyshev_distance() {
        assert_eq!(Position::new(0, 0).chebyshev(Position::new(3, 1)), 3);
        assert_eq!(Position::new(1, 1).chebyshev(Position::new(2, 2)), 1);
    }

    #[test]
    fn rotation_is_modular() {
        assert_eq!(Direction::N.turn_right(), Direction::E);
        assert_eq!(Direction::W.turn_right(), Direction::N);
        assert_eq!(Direction::N.turn_left(), Direction::W);
        assert_eq!(Direction::E.turn_left(), Direction::N);
        for dir in Direction::ALL {
            assert_eq!(dir.turn_left().turn_right(), dir);
            assert_eq!(dir.turn_right().turn_right(), dir.opposite());
        }
    }

    #[test]
    fn rotate_toward_prefers_clockwise_on_half_turn() {
        assert_eq!(Direction::N.rotate_toward(Direction::S), Direction::E);
        assert_eq!(Direction::N.rotate_toward(Direction::W), Direction::W);
        assert_eq!(Direction::N.rotate_toward(Direction::E), Direction::E);
        assert_eq!(Direction::N.rotate_toward(Direction::N), Direction::N);
    }

    #[test]
    fn all_neighbors_adjacent() {
        let origin = Position::new(5, 5);
        for n in origin.neighbors() {
            assert_eq!(origin.manhattan(n), 1);
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn four_right_turns_are_identity(idx in 0usize..4) {
                let dir = Direction::ALL[idx];
                let back = dir.turn_right().turn_right().turn_right().turn_right();
                prop_assert_eq!(back, dir);
            }

            #[test]
            fn distances_are_symmetric(
                ax in -50i32..50, ay in -50i32..50,
                bx in -50i32..50, by in -50i32..50,
            ) {
                let a = Position::new(ax, ay);
                let b = Position::new(bx, by);
                prop_assert_eq!(a.manhattan(b), b.manhattan(a));
                prop_assert_eq!(a.chebyshev(b), b.chebyshev(a));
                prop_assert!(a.chebyshev(b) <= a.manhattan(b));
            }
        }
    }
}
