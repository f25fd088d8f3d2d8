//! A numbered white island in progress, its disjunctive constraints, and
//! the candidate-completion type its enumerator produces.
//!
//! The rule pass and completion enumerator themselves live on
//! [`crate::grid::Grid`] (see `grid.rs`): they need simultaneous access to
//! the board, every region, and the derived pools/islands/gaps, which is
//! awkward to express as a method taking `&mut self` on `Region` alone
//! without interior mutability. Per the design notes this crate prefers
//! plain indices owned by one orchestrator over back-pointers, so `Region`
//! itself stays a plain data record.

use std::collections::HashSet;

use crate::coord::Coord;
use crate::ids::RegionId;

/// "At least one of these cells must be white in any completion."
#[derive(Clone, Debug)]
pub struct OneWhite(pub Vec<Coord>);

/// "At least one of these cells must be black — not all may lie inside the
/// region."
#[derive(Clone, Debug)]
pub struct OneBlack(pub Vec<Coord>);

impl OneWhite {
    /// Is this constraint already satisfied given the cells currently
    /// committed to the region?
    pub fn satisfied_by(&self, coords: &HashSet<Coord>) -> bool {
        self.0.iter().any(|c| coords.contains(c))
    }

    /// Cells of this constraint not yet adjacent to `coords`.
    pub fn all_adjacent_to(&self, coords: &HashSet<Coord>) -> bool {
        self.0
            .iter()
            .all(|c| coords.iter().any(|r| r.touches(*c)) || coords.contains(c))
    }
}

impl OneBlack {
    /// A `OneBlack` constraint is violated only once *every* one of its
    /// cells has been pulled inside the candidate region.
    pub fn violated_by(&self, coords: &HashSet<Coord>) -> bool {
        self.0.iter().all(|c| coords.contains(c))
    }
}

/// A candidate completion of a region to exactly its target size.
#[derive(Clone, Debug)]
pub struct Solution {
    /// The region's id this is a candidate completion for.
    pub region: RegionId,
    /// The `N` cells of the hypothetical completion (includes the number
    /// cell and every already-committed region cell).
    pub icoords: Vec<Coord>,
    /// Unknown cells bordering `icoords` that must be black if this
    /// completion is chosen.
    pub ocoords: Vec<Coord>,
    /// Populated once the candidate has been validated under a hypothesis:
    /// every cell observed white across the whole board in that
    /// hypothesis, for intersection against sibling solutions.
    pub white_coords: Vec<Coord>,
    /// Same, but black.
    pub black_coords: Vec<Coord>,
}

impl Solution {
    pub fn icoords_set(&self) -> HashSet<Coord> {
        self.icoords.iter().copied().collect()
    }
}

impl PartialEq for Solution {
    fn eq(&self, other: &Self) -> bool {
        self.icoords_set() == other.icoords_set()
    }
}
impl Eq for Solution {}

/// A number cell's in-progress island.
#[derive(Clone, Debug)]
pub struct Region {
    pub id: RegionId,
    pub number_cell: Coord,
    /// The island's target size, `N`.
    pub value: u8,
    /// Cells currently known to be in this region (white or the number
    /// cell itself), kept orthogonally connected and containing exactly
    /// one Number cell. Refreshed (never replaced) by `rebuild`.
    pub coords: Vec<Coord>,
    pub one_white: Vec<OneWhite>,
    pub one_black: Vec<OneBlack>,
    /// Cached completions from the last full enumeration, paired with the
    /// board generation they were computed against (see
    /// [`crate::board::Board::generation`]). Stale as soon as that
    /// generation moves on, i.e. as soon as any top-level color changes
    /// anywhere on the board.
    pub solutions: Option<Vec<Solution>>,
    pub solutions_as_of: Option<u64>,
}

impl Region {
    pub fn new(id: RegionId, number_cell: Coord, value: u8) -> Self {
        Region {
            id,
            number_cell,
            value,
            coords: vec![number_cell],
            one_white: Vec::new(),
            one_black: Vec::new(),
            solutions: None,
            solutions_as_of: None,
        }
    }

    pub fn len(&self) -> u8 {
        self.coords.len() as u8
    }

    pub fn is_complete(&self) -> bool {
        self.len() == self.value
    }

    pub fn remaining(&self) -> u8 {
        self.value - self.len()
    }

    pub fn coords_set(&self) -> HashSet<Coord> {
        self.coords.iter().copied().collect()
    }

    pub fn contains(&self, coord: Coord) -> bool {
        self.coords.contains(&coord)
    }

    pub fn clear_constraints(&mut self) {
        self.one_white.clear();
        self.one_black.clear();
    }

    /// Records a freshly built completion set as valid as of `generation`.
    pub fn cache_solutions(&mut self, solutions: Vec<Solution>, generation: u64) {
        self.solutions = Some(solutions);
        self.solutions_as_of = Some(generation);
    }

    /// The cached completions, if any, and if still fresh as of `generation`.
    pub fn cached_solutions(&self, generation: u64) -> Option<&Vec<Solution>> {
        if self.solutions_as_of == Some(generation) { self.solutions.as_ref() } else { None }
    }

    pub fn add_one_white(&mut self, coords: Vec<Coord>) {
        if !coords.is_empty() {
            self.one_white.push(OneWhite(coords));
        }
    }

    pub fn add_one_black(&mut self, coords: Vec<Coord>) {
        if !coords.is_empty() {
            self.one_black.push(OneBlack(coords));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_black_is_violated_only_when_fully_enclosed() {
        let a = Coord::new(0, 0);
        let b = Coord::new(0, 1);
        let constraint = OneBlack(vec![a, b]);
        let mut coords = HashSet::new();
        coords.insert(a);
        assert!(!constraint.violated_by(&coords));
        coords.insert(b);
        assert!(constraint.violated_by(&coords));
    }

    #[test]
    fn one_white_satisfied_when_any_member_present() {
        let a = Coord::new(0, 0);
        let b = Coord::new(0, 1);
        let constraint = OneWhite(vec![a, b]);
        let mut coords = HashSet::new();
        coords.insert(b);
        assert!(constraint.satisfied_by(&coords));
    }

    #[test]
    fn region_starts_at_its_number_cell_and_tracks_completeness() {
        let r = Region::new(RegionId(0), Coord::new(1, 1), 3);
        assert_eq!(r.len(), 1);
        assert!(!r.is_complete());
        assert_eq!(r.remaining(), 2);
    }

    #[test]
    fn cached_solutions_only_returned_for_the_generation_they_were_built_at() {
        let mut r = Region::new(RegionId(0), Coord::new(0, 0), 1);
        assert_eq!(r.cached_solutions(7), None);

        let solution = Solution {
            region: RegionId(0),
            icoords: vec![Coord::new(0, 0)],
            ocoords: vec![],
            white_coords: vec![],
            black_coords: vec![],
        };
        r.cache_solutions(vec![solution], 7);
        assert!(r.cached_solutions(7).is_some());
        assert_eq!(r.cached_solutions(8), None, "a later generation must not reuse a stale cache");
    }
}
