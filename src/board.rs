//! Cell storage, neighbor queries, and the hypothesis-aware color view.

use std::collections::{HashSet, VecDeque};

use ndarray::Array2;

use crate::cell::{Cell, CellValue};
use crate::coord::Coord;

/// A tentative color assignment layered on top of the real board. Only
/// Unknown cells are ever represented here; White/Black cells are already
/// immutable at the top level and an overlay never needs to shadow them.
#[derive(Clone, Default, Debug)]
pub struct Overlay {
    pub white: HashSet<Coord>,
    pub black: HashSet<Coord>,
}

impl Overlay {
    pub fn is_empty(&self) -> bool {
        self.white.is_empty() && self.black.is_empty()
    }
}

/// The fixed `R x C` cell store plus the hypothesis overlay.
///
/// Matches the source's `pushCoords`/`popCoords`: a push unions its new
/// coordinates onto whatever overlay is currently active and snapshots the
/// prior overlay for restoration on pop, so nested hypotheses accumulate
/// rather than stacking independent views.
pub struct Board {
    rows: i32,
    cols: i32,
    cells: Array2<Cell>,
    overlay: Overlay,
    snapshots: Vec<Overlay>,
    /// Bumped every time a top-level cell is actually colored. A region's
    /// cached completion set is only trustworthy while this hasn't moved
    /// since it was built — see [`crate::region::Region::cached_solutions`].
    generation: u64,
}

impl Board {
    pub fn new(rows: i32, cols: i32, cells: Array2<Cell>) -> Self {
        assert_eq!(cells.nrows() as i32, rows);
        assert_eq!(cells.ncols() as i32, cols);
        Board {
            rows,
            cols,
            cells,
            overlay: Overlay::default(),
            snapshots: Vec::new(),
            generation: 0,
        }
    }

    /// Monotonically increasing counter of genuine top-level color changes.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }
    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn in_bounds(&self, coord: Coord) -> bool {
        coord.row >= 0 && coord.row < self.rows && coord.col >= 0 && coord.col < self.cols
    }

    pub fn cell(&self, coord: Coord) -> &Cell {
        &self.cells[[coord.row as usize, coord.col as usize]]
    }

    pub fn cell_mut(&mut self, coord: Coord) -> &mut Cell {
        &mut self.cells[[coord.row as usize, coord.col as usize]]
    }

    pub fn try_cell(&self, coord: Coord) -> Option<&Cell> {
        self.in_bounds(coord).then(|| self.cell(coord))
    }

    /// Iterates every coordinate on the board, row-major.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.rows).flat_map(move |r| (0..self.cols).map(move |c| Coord::new(r, c)))
    }

    pub fn orthogonal_in_bounds(&self, coord: Coord) -> impl Iterator<Item = Coord> + '_ {
        coord
            .orthogonal_neighbors()
            .into_iter()
            .filter(move |n| self.in_bounds(*n))
    }

    pub fn diagonal_in_bounds(&self, coord: Coord) -> impl Iterator<Item = Coord> + '_ {
        coord
            .diagonal_neighbors()
            .into_iter()
            .filter(move |n| self.in_bounds(*n))
    }

    /// `true` once the hypothesis stack is empty; only then may cells be
    /// permanently colored.
    pub fn is_top_level(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn hypothesis_depth(&self) -> usize {
        self.snapshots.len()
    }

    /// The color an observer sees right now: the stored value, or (when a
    /// hypothesis is active and the stored value is Unknown) whatever the
    /// current overlay says.
    pub fn observed(&self, coord: Coord) -> CellValue {
        let value = self.cell(coord).value;
        if !value.is_unknown() || self.is_top_level() {
            return value;
        }
        if self.overlay.white.contains(&coord) {
            CellValue::White
        } else if self.overlay.black.contains(&coord) {
            CellValue::Black
        } else {
            CellValue::Unknown
        }
    }

    pub fn is_white(&self, coord: Coord) -> bool {
        self.observed(coord).is_white()
    }
    pub fn is_black(&self, coord: Coord) -> bool {
        self.observed(coord).is_black()
    }
    pub fn is_unknown(&self, coord: Coord) -> bool {
        self.observed(coord).is_unknown()
    }
    pub fn is_number(&self, coord: Coord) -> bool {
        self.observed(coord).is_number()
    }
    pub fn is_white_or_number(&self, coord: Coord) -> bool {
        self.observed(coord).is_white_or_number()
    }

    /// Mutate a currently-Unknown cell to White. At the top level this
    /// writes the stored value and returns `true` (changed). Under a
    /// hypothesis it appends to the active overlay instead of touching the
    /// stored value, returning `true` unless the coordinate was already
    /// known to be white, and `false` (no-op) rather than mutating twice.
    ///
    /// Returns `Err` if the coordinate is already observed to be the
    /// opposite color — a direct contradiction, handled by the caller as
    /// either a top-level `LogicError` or a hypothesis rejection depending
    /// on context (see `crate::error`).
    pub fn set_white(&mut self, coord: Coord) -> Result<bool, String> {
        self.set_color(coord, CellValue::White)
    }

    pub fn set_black(&mut self, coord: Coord) -> Result<bool, String> {
        self.set_color(coord, CellValue::Black)
    }

    fn set_color(&mut self, coord: Coord, color: CellValue) -> Result<bool, String> {
        debug_assert!(color.is_white() || color.is_black());
        match self.observed(coord) {
            CellValue::Number(_) => Err(format!("cannot color a Number cell at {coord}")),
            other if other == color => Ok(false),
            other if !other.is_unknown() => {
                Err(format!("contradiction: {coord} is already the opposite color"))
            }
            CellValue::Unknown => {
                if let Some(hint) = self.cell(coord).solution_hint {
                    if !hint.is_unknown() && hint != color {
                        return Err(format!(
                            "deduced {color:?} at {coord} contradicts the provided solution hint {hint:?}"
                        ));
                    }
                }
                if self.is_top_level() {
                    self.cell_mut(coord).value = color;
                    self.generation += 1;
                } else if color.is_white() {
                    self.overlay.white.insert(coord);
                } else {
                    self.overlay.black.insert(coord);
                }
                Ok(true)
            }
            _ => unreachable!(),
        }
    }

    /// Pushes a new hypothesis layer, unioning `white`/`black` onto
    /// whatever overlay is currently active.
    pub fn push_hypothesis(&mut self, white: &HashSet<Coord>, black: &HashSet<Coord>) {
        self.snapshots.push(self.overlay.clone());
        self.overlay.white.extend(white.iter().copied());
        self.overlay.black.extend(black.iter().copied());
    }

    /// Restores the overlay active before the matching `push_hypothesis`.
    pub fn pop_hypothesis(&mut self) {
        self.overlay = self
            .snapshots
            .pop()
            .expect("pop_hypothesis without a matching push");
    }

    /// Flattens every active hypothesis layer into real top-level
    /// mutations and clears the stack back to empty. Mirrors the source's
    /// `commit()`: the whole accumulated overlay, not just the top layer,
    /// is promoted at once.
    pub fn commit_hypothesis(&mut self) -> Result<bool, String> {
        let whites: Vec<Coord> = self.overlay.white.iter().copied().collect();
        let blacks: Vec<Coord> = self.overlay.black.iter().copied().collect();
        self.overlay = Overlay::default();
        self.snapshots.clear();

        let mut changed = false;
        for coord in whites {
            changed |= self.set_white(coord)?;
        }
        for coord in blacks {
            changed |= self.set_black(coord)?;
        }
        Ok(changed)
    }

    /// Breadth-first flood fill over orthogonal neighbors satisfying
    /// `in_component`, starting from `seed`. Used by `rebuild` to carve out
    /// Pools/Islands/Gaps and by region enumeration to grow a candidate.
    pub fn flood(&self, seed: Coord, mut in_component: impl FnMut(Coord) -> bool) -> Vec<Coord> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        seen.insert(seed);
        queue.push_back(seed);
        let mut out = Vec::new();
        while let Some(c) = queue.pop_front() {
            out.push(c);
            for n in self.orthogonal_in_bounds(c).collect::<Vec<_>>() {
                if !seen.contains(&n) && in_component(n) {
                    seen.insert(n);
                    queue.push_back(n);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_board(rows: i32, cols: i32) -> Board {
        Board::new(
            rows,
            cols,
            Array2::from_elem((rows as usize, cols as usize), Cell::new(CellValue::Unknown)),
        )
    }

    #[test]
    fn top_level_set_mutates_stored_value() {
        let mut b = blank_board(2, 2);
        let c = Coord::new(0, 0);
        assert!(b.set_white(c).unwrap());
        assert!(b.is_white(c));
        assert_eq!(b.cell(c).value, CellValue::White);
    }

    #[test]
    fn hypothesis_overlay_does_not_touch_stored_value() {
        let mut b = blank_board(2, 2);
        let c = Coord::new(0, 0);
        b.push_hypothesis(&HashSet::from([c]), &HashSet::new());
        assert!(b.is_white(c));
        assert_eq!(b.cell(c).value, CellValue::Unknown);
        b.pop_hypothesis();
        assert!(b.is_unknown(c));
    }

    #[test]
    fn push_pop_is_identity_on_top_level_state() {
        let mut b = blank_board(3, 3);
        let before: Vec<_> = b.coords().map(|c| b.observed(c)).collect();
        b.push_hypothesis(&HashSet::from([Coord::new(1, 1)]), &HashSet::new());
        b.pop_hypothesis();
        let after: Vec<_> = b.coords().map(|c| b.observed(c)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn commit_promotes_overlay_to_top_level() {
        let mut b = blank_board(2, 2);
        let w = Coord::new(0, 0);
        let k = Coord::new(1, 1);
        b.push_hypothesis(&HashSet::from([w]), &HashSet::from([k]));
        b.commit_hypothesis().unwrap();
        assert!(b.is_top_level());
        assert_eq!(b.cell(w).value, CellValue::White);
        assert_eq!(b.cell(k).value, CellValue::Black);
    }

    #[test]
    fn contradiction_detected_against_opposite_observed_color() {
        let mut b = blank_board(1, 2);
        let c = Coord::new(0, 0);
        b.set_white(c).unwrap();
        assert!(b.set_black(c).is_err());
    }

    #[test]
    fn generation_advances_only_on_genuine_top_level_changes() {
        let mut b = blank_board(2, 2);
        let c = Coord::new(0, 0);
        assert_eq!(b.generation(), 0);

        b.push_hypothesis(&HashSet::from([c]), &HashSet::new());
        assert_eq!(b.generation(), 0, "exploring under a hypothesis must not advance it");
        b.pop_hypothesis();
        assert_eq!(b.generation(), 0);

        b.set_white(c).unwrap();
        assert_eq!(b.generation(), 1);

        assert!(!b.set_white(c).unwrap(), "re-setting the same color is a no-op");
        assert_eq!(b.generation(), 1, "a no-op write must not advance it");
    }
}
