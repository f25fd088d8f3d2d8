//! Grid coordinates and the adjacency/distance tests the solver rules need.

use std::fmt;

/// A `(row, col)` position on the board. Ordered first by row, then by
/// column, matching the iteration order the rest of the solver relies on for
/// deterministic rule application.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Coord {
    pub row: i32,
    pub col: i32,
}

impl Coord {
    pub fn new(row: i32, col: i32) -> Self {
        Coord { row, col }
    }

    pub fn north(self) -> Coord {
        Coord::new(self.row - 1, self.col)
    }
    pub fn south(self) -> Coord {
        Coord::new(self.row + 1, self.col)
    }
    pub fn east(self) -> Coord {
        Coord::new(self.row, self.col + 1)
    }
    pub fn west(self) -> Coord {
        Coord::new(self.row, self.col - 1)
    }
    pub fn northeast(self) -> Coord {
        Coord::new(self.row - 1, self.col + 1)
    }
    pub fn northwest(self) -> Coord {
        Coord::new(self.row - 1, self.col - 1)
    }
    pub fn southeast(self) -> Coord {
        Coord::new(self.row + 1, self.col + 1)
    }
    pub fn southwest(self) -> Coord {
        Coord::new(self.row + 1, self.col - 1)
    }

    /// The four orthogonal neighbors, in a fixed deterministic order.
    pub fn orthogonal_neighbors(self) -> [Coord; 4] {
        [self.north(), self.south(), self.east(), self.west()]
    }

    /// The four diagonal neighbors, in a fixed deterministic order.
    pub fn diagonal_neighbors(self) -> [Coord; 4] {
        [
            self.northeast(),
            self.northwest(),
            self.southeast(),
            self.southwest(),
        ]
    }

    /// True if `self` and `other` are exactly one orthogonal step apart.
    pub fn touches(self, other: Coord) -> bool {
        let dr = (self.row - other.row).abs();
        let dc = (self.col - other.col).abs();
        dr + dc == 1
    }

    /// True if `self` and `other` are diagonal (corner) neighbors.
    pub fn corner_touches(self, other: Coord) -> bool {
        (self.row - other.row).abs() == 1 && (self.col - other.col).abs() == 1
    }

    /// Manhattan distance plus one, the unit region enumeration bounds
    /// distance against (a cell `d` steps away needs at least `d` more cells
    /// including itself to reach, hence the +1).
    pub fn dist(self, other: Coord) -> i32 {
        (self.row - other.row).abs() + (self.col - other.col).abs() + 1
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orthogonal_adjacency() {
        let a = Coord::new(2, 2);
        assert!(a.touches(a.north()));
        assert!(a.touches(a.south()));
        assert!(a.touches(a.east()));
        assert!(a.touches(a.west()));
        assert!(!a.touches(a.northeast()));
        assert!(!a.touches(Coord::new(2, 2)));
    }

    #[test]
    fn diagonal_adjacency() {
        let a = Coord::new(2, 2);
        assert!(a.corner_touches(a.northeast()));
        assert!(a.corner_touches(a.southwest()));
        assert!(!a.corner_touches(a.north()));
    }

    #[test]
    fn distance_is_manhattan_plus_one() {
        assert_eq!(Coord::new(0, 0).dist(Coord::new(0, 0)), 1);
        assert_eq!(Coord::new(0, 0).dist(Coord::new(1, 2)), 4);
    }

    #[test]
    fn ordering_is_row_major() {
        assert!(Coord::new(0, 5) < Coord::new(1, 0));
        assert!(Coord::new(1, 0) < Coord::new(1, 1));
    }
}
