//! The central orchestrator: owns the board plus every derived
//! region/pool/island/gap and drives the fixed-point deductive solve.
//!
//! Grounded throughout on `CNurikabe.{h,cpp}`'s `Grid` class. The source
//! keeps `Region`/`Pool`/`Island`/`Gap` as objects with back-pointers into
//! `Grid`; here they stay plain data (see `ids.rs`) and every rule that
//! needs simultaneous access to the board and its siblings lives as a
//! method on `Grid` instead.

use std::collections::HashSet;

use crate::board::Board;
use crate::cell::RegionConstraint;
use crate::coord::Coord;
use crate::error::{SolveError, SolveResult, StepOutcome};
use crate::format::{self, ParsedPuzzle};
use crate::gap::Gap;
use crate::host::SolveOptions;
use crate::ids::{GapId, IslandId, PoolId, RegionId};
use crate::island::Island;
use crate::pool::Pool;
use crate::region::{Region, Solution};

pub struct Grid {
    board: Board,
    regions: Vec<Region>,
    pools: Vec<Pool>,
    islands: Vec<Island>,
    gaps: Vec<Gap>,
    dirty: bool,
    max_remaining: u8,
    max_solutions: usize,
    next_max_remaining: Option<u8>,
    next_max_solutions: bool,
    /// Set only while `get_region_solutions` is bounding an exploratory
    /// enumeration for a caller; `None` means "enumerate to exact size",
    /// the behavior every internal call wants.
    enum_max_depth: Option<u8>,
    options: SolveOptions,
}

impl Grid {
    pub fn new(parsed: &ParsedPuzzle, options: SolveOptions) -> Self {
        let cells = format::build_cells(parsed);
        let board = Board::new(parsed.rows, parsed.cols, cells);
        let mut regions = Vec::new();
        for coord in board.coords() {
            if let Some(value) = board.cell(coord).value.number() {
                regions.push(Region::new(RegionId(regions.len()), coord, value));
            }
        }
        let max_remaining = options.max_remaining;
        let max_solutions = options.max_solutions;
        let mut grid = Grid {
            board,
            regions,
            pools: Vec::new(),
            islands: Vec::new(),
            gaps: Vec::new(),
            dirty: true,
            max_remaining,
            max_solutions,
            next_max_remaining: None,
            next_max_solutions: false,
            enum_max_depth: None,
            options,
        };
        grid.rebuild(true);
        grid
    }

    /// Parses `board_def`/`solution_def` and constructs a `Grid` from them.
    pub fn load_puzzle(
        board_def: &str,
        solution_def: &str,
        options: SolveOptions,
    ) -> anyhow::Result<Grid> {
        let parsed = format::parse(board_def, solution_def)?;
        Ok(Grid::new(&parsed, options))
    }

    pub fn rows(&self) -> i32 {
        self.board.rows()
    }
    pub fn cols(&self) -> i32 {
        self.board.cols()
    }
    pub fn board(&self) -> &Board {
        &self.board
    }
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Clears every Black/White deduction back to Unknown, re-derives fresh
    /// `Region`s from the same number cells, drops every Pool/Island/Gap,
    /// and restores the default budgets. The solution hints (if any) and
    /// the given Numbers are untouched.
    pub fn reset(&mut self) {
        while !self.board.is_top_level() {
            self.board.pop_hypothesis();
        }
        for coord in self.board.coords().collect::<Vec<_>>() {
            let cell = self.board.cell_mut(coord);
            if !cell.value.is_number() {
                cell.value = crate::cell::CellValue::Unknown;
            }
            cell.region_constraint = RegionConstraint::None;
            cell.clear_derived_refs();
        }
        let specs: Vec<(Coord, u8)> = self
            .regions
            .iter()
            .map(|r| (r.number_cell, r.value))
            .collect();
        self.regions = specs
            .into_iter()
            .enumerate()
            .map(|(i, (c, v))| Region::new(RegionId(i), c, v))
            .collect();
        self.pools.clear();
        self.islands.clear();
        self.gaps.clear();
        self.max_remaining = 8;
        self.max_solutions = 4096;
        self.next_max_remaining = None;
        self.next_max_solutions = false;
        self.dirty = true;
        self.rebuild(true);
    }

    // ---- rebuild: re-derive Region/Pool/Island/Gap from the board ----

    pub fn rebuild(&mut self, force: bool) {
        if !self.dirty && !force {
            return;
        }
        log::trace!("rebuilding derived regions/pools/islands/gaps");
        for coord in self.board.coords().collect::<Vec<_>>() {
            self.board.cell_mut(coord).clear_derived_refs();
        }
        self.build_regions();
        self.build_pools();
        self.build_islands();
        self.build_gaps();
        self.dirty = false;
    }

    fn build_regions(&mut self) {
        for i in 0..self.regions.len() {
            self.refresh_region_coords(RegionId(i));
        }
    }

    fn refresh_region_coords(&mut self, rid: RegionId) {
        let number_cell = self.regions[rid.index()].number_cell;
        let mut coords = self.board.flood(number_cell, |c| self.board.is_white(c));
        coords.sort();
        for &c in &coords {
            self.board.cell_mut(c).region = Some(rid);
        }
        self.regions[rid.index()].coords = coords;
    }

    fn build_pools(&mut self) {
        self.pools.clear();
        for coord in self.board.coords().collect::<Vec<_>>() {
            if !self.board.is_black(coord) || self.board.cell(coord).pool.is_some() {
                continue;
            }
            let id = PoolId(self.pools.len());
            let mut coords = self.board.flood(coord, |c| self.board.is_black(c));
            coords.sort();
            for &c in &coords {
                self.board.cell_mut(c).pool = Some(id);
            }
            self.pools.push(Pool::new(id, coords));
        }
    }

    fn build_islands(&mut self) {
        self.islands.clear();
        for coord in self.board.coords().collect::<Vec<_>>() {
            if !self.board.is_white(coord) {
                continue;
            }
            let cell = self.board.cell(coord);
            if cell.region.is_some() || cell.island.is_some() {
                continue;
            }
            let id = IslandId(self.islands.len());
            let mut coords = self.board.flood(coord, |c| self.board.is_white(c));
            coords.sort();
            for &c in &coords {
                self.board.cell_mut(c).island = Some(id);
            }
            self.islands.push(Island::new(id, coords));
        }
    }

    fn build_gaps(&mut self) {
        self.gaps.clear();
        for coord in self.board.coords().collect::<Vec<_>>() {
            if !self.board.is_unknown(coord) || self.board.cell(coord).gap.is_some() {
                continue;
            }
            let id = GapId(self.gaps.len());
            let mut coords = self.board.flood(coord, |c| self.board.is_unknown(c));
            coords.sort();
            for &c in &coords {
                self.board.cell_mut(c).gap = Some(id);
            }
            let mut gap = Gap::new(id, coords.clone());
            for &c in &coords {
                for n in self.board.orthogonal_in_bounds(c).collect::<Vec<_>>() {
                    let ncell = self.board.cell(n);
                    if let Some(rid) = ncell.region {
                        gap.add_bordering_region(rid);
                    } else if let Some(iid) = ncell.island {
                        match self.island_region_constraint(iid) {
                            Some(rid) => gap.add_bordering_region(rid),
                            None => gap.add_bordering_island(iid),
                        }
                    }
                }
            }
            self.gaps.push(gap);
        }
    }

    /// The single choke point for writing a `MustBelongTo` claim, mirroring
    /// the source's `Cell::setRegionConstraint`: a second, different region
    /// laying claim to the same cell collapses it to `MustBeBlack` instead
    /// of silently overwriting the earlier claim (§9g).
    fn claim_region_constraint(&mut self, c: Coord, rid: RegionId) {
        let cell = self.board.cell_mut(c);
        cell.region_constraint = cell.region_constraint.claim(rid);
    }

    fn island_region_constraint(&self, id: IslandId) -> Option<RegionId> {
        let first = *self.islands[id.index()].coords.first()?;
        self.board.cell(first).region_constraint.region()
    }

    // ---- small geometric/lookup helpers shared across rule passes ----

    fn region_of(&self, c: Coord) -> Option<RegionId> {
        self.board.try_cell(c).and_then(|cell| cell.region)
    }

    fn can_be_in_region(&self, c: Coord, rid: RegionId) -> bool {
        match self.board.cell(c).region_constraint {
            RegionConstraint::None => true,
            RegionConstraint::MustBelongTo(r) => r == rid,
            RegionConstraint::MustBeBlack => false,
        }
    }

    /// Unknown cells orthogonally bordering (but not inside) `coords`.
    fn outside_unknown(&self, coords: &[Coord]) -> Vec<Coord> {
        let set: HashSet<Coord> = coords.iter().copied().collect();
        let mut out: HashSet<Coord> = HashSet::new();
        for &c in coords {
            for n in self.board.orthogonal_in_bounds(c) {
                if !set.contains(&n) && self.board.is_unknown(n) {
                    out.insert(n);
                }
            }
        }
        let mut v: Vec<Coord> = out.into_iter().collect();
        v.sort();
        v
    }

    fn outside_unknown_or_white(&self, coords: &HashSet<Coord>) -> Vec<Coord> {
        let mut out: HashSet<Coord> = HashSet::new();
        for &c in coords {
            for n in self.board.orthogonal_in_bounds(c) {
                if !coords.contains(&n) && (self.board.is_unknown(n) || self.board.is_white(n)) {
                    out.insert(n);
                }
            }
        }
        out.into_iter().collect()
    }

    fn is_black_reachable(&self, cell: Coord) -> bool {
        let mut visited = HashSet::new();
        self.is_black_reachable_rec(cell, &mut visited)
    }

    fn is_black_reachable_rec(&self, cell: Coord, visited: &mut HashSet<Coord>) -> bool {
        if visited.contains(&cell) {
            return false;
        }
        for n in self.board.orthogonal_in_bounds(cell) {
            if self.board.is_black(n) {
                return true;
            }
        }
        visited.insert(cell);
        for n in self.board.orthogonal_in_bounds(cell).collect::<Vec<_>>() {
            if self.board.is_unknown(n) && self.is_black_reachable_rec(n, visited) {
                return true;
            }
        }
        false
    }

    /// Recursive, distance-bounded reachability: can `cell` reach into
    /// completing `rid` without crossing another region, within `rid`'s
    /// remaining size budget?
    fn can_connect_to_region(&self, cell: Coord, rid: RegionId) -> bool {
        let mut visited = HashSet::new();
        self.can_connect_to_region_rec(cell, rid, &mut visited)
    }

    fn can_connect_to_region_rec(
        &self,
        cell: Coord,
        rid: RegionId,
        visited: &mut HashSet<Coord>,
    ) -> bool {
        if visited.contains(&cell) || self.board.is_black(cell) {
            return false;
        }
        let number_cell = self.regions[rid.index()].number_cell;
        let value = self.regions[rid.index()].value as i32;
        let min_dist = cell.dist(number_cell) + visited.len() as i32;
        if min_dist > value {
            return false;
        }
        visited.insert(cell);

        let mut touching: HashSet<RegionId> = HashSet::new();
        for n in self.board.orthogonal_in_bounds(cell) {
            if let Some(r) = self.region_of(n) {
                touching.insert(r);
            }
        }
        if touching.len() > 1 {
            return false;
        }
        if let Some(&only) = touching.iter().next() {
            if only != rid {
                return false;
            }
            let mut total: HashSet<Coord> = visited.clone();
            total.extend(self.regions[rid.index()].coords.iter().copied());
            for n in self.board.orthogonal_in_bounds(cell) {
                if let Some(iid) = self.board.cell(n).island {
                    total.extend(self.islands[iid.index()].coords.iter().copied());
                }
            }
            return total.len() <= value as usize;
        }

        let mut candidates: Vec<Coord> = self
            .board
            .orthogonal_in_bounds(cell)
            .filter(|&n| !self.board.is_black(n) && self.can_be_in_region(n, rid))
            .collect();
        candidates.sort_by_key(|&n| n.dist(number_cell));
        for n in candidates {
            let mut branch = visited.clone();
            if self.can_connect_to_region_rec(n, rid, &mut branch) {
                return true;
            }
        }
        false
    }

    fn is_single_black_component(&self) -> bool {
        let seed = self.board.coords().find(|&c| self.board.is_black(c));
        let Some(seed) = seed else {
            return true;
        };
        let reached: HashSet<Coord> = self
            .board
            .flood(seed, |c| self.board.is_black(c))
            .into_iter()
            .collect();
        self.board
            .coords()
            .all(|c| !self.board.is_black(c) || reached.contains(&c))
    }

    /// With every still-unassigned Gap cell tentatively Black (and nothing
    /// tentatively White), would the sea still be a single component?
    /// Checked once per simple rule pass per §4.4: a sea that's already
    /// forked into two pieces, even before every Gap is resolved, can never
    /// become the required single Pool.
    fn check_single_pool_feasibility(&mut self) -> SolveResult<()> {
        let gap_coords: HashSet<Coord> =
            self.gaps.iter().flat_map(|g| g.coords.iter().copied()).collect();
        self.board.push_hypothesis(&HashSet::new(), &gap_coords);
        let single = self.is_single_black_component();
        self.board.pop_hypothesis();
        if !single {
            return Err(SolveError::Logic(
                "the sea has already split into more than one component".into(),
            ));
        }
        Ok(())
    }

    /// Same check, but for an in-progress region completion candidate: with
    /// `coords` tentatively white and every other Unknown cell tentatively
    /// black, is the sea still one component? Only meaningful once at most
    /// one region remains incomplete (matches the source's
    /// `getNumIncomplete() < 2` gate — with two or more regions still open,
    /// black connectivity can't be decided yet).
    fn check_single_pool_with_white(&mut self, coords: &HashSet<Coord>) -> bool {
        let ocoords: HashSet<Coord> = self
            .board
            .coords()
            .filter(|c| self.board.is_unknown(*c) && !coords.contains(c))
            .collect();
        self.board.push_hypothesis(&HashSet::new(), &ocoords);
        let single = self.is_single_black_component();
        self.board.pop_hypothesis();
        single
    }

    fn num_incomplete_regions(&self) -> usize {
        self.regions.iter().filter(|r| !r.is_complete()).count()
    }

    fn request_max_remaining(&mut self, n: u8) {
        self.next_max_remaining = Some(self.next_max_remaining.map_or(n, |cur| cur.min(n)));
    }

    // ---- the simple local rule pass (§4.3) ----

    fn simple_solve_pass(&mut self) -> SolveResult<StepOutcome> {
        if self.options.host.check_break() {
            return Err(SolveError::Cancelled);
        }
        self.rebuild(false);
        let mut outcome = StepOutcome::NoChange;

        for rid in (0..self.regions.len()).map(RegionId) {
            outcome = outcome.merge(self.region_rule_pass(rid)?);
        }
        for pid in (0..self.pools.len()).map(PoolId) {
            outcome = outcome.merge(self.pool_rule_pass(pid)?);
        }
        for iid in (0..self.islands.len()).map(IslandId) {
            outcome = outcome.merge(self.island_rule_pass(iid)?);
        }
        for gid in (0..self.gaps.len()).map(GapId) {
            outcome = outcome.merge(self.gap_rule_pass(gid)?);
        }

        self.check_single_pool_feasibility()?;

        if outcome.changed() {
            self.dirty = true;
            log::debug!("simple rule pass changed the board");
        }
        Ok(outcome)
    }

    fn region_rule_pass(&mut self, rid: RegionId) -> SolveResult<StepOutcome> {
        let mut outcome = StepOutcome::NoChange;
        if self.regions[rid.index()].is_complete() {
            return self.surround_complete(rid);
        }

        let region_coords = self.regions[rid.index()].coords.clone();
        for c in &region_coords {
            outcome = outcome.merge(self.two_away_and_diagonal(rid, *c)?);
            if self.board.is_top_level() {
                for n in self.board.orthogonal_in_bounds(*c).collect::<Vec<_>>() {
                    if self.board.is_unknown(n) {
                        self.claim_region_constraint(n, rid);
                    }
                }
            }
        }

        outcome = outcome.merge(self.single_exit_region(rid)?);
        outcome = outcome.merge(self.corner_force_single_exit(rid)?);
        self.corner_region_constraint(rid);
        outcome = outcome.merge(self.reachability_enclosure(rid)?);
        Ok(outcome)
    }

    fn two_away_and_diagonal(&mut self, rid: RegionId, c: Coord) -> SolveResult<StepOutcome> {
        let mut outcome = StepOutcome::NoChange;
        let two_away = [
            (c.north(), Coord::new(c.row - 2, c.col)),
            (c.south(), Coord::new(c.row + 2, c.col)),
            (c.east(), Coord::new(c.row, c.col + 2)),
            (c.west(), Coord::new(c.row, c.col - 2)),
        ];
        for (mid, far) in two_away {
            if self.board.in_bounds(mid)
                && self.board.is_unknown(mid)
                && self.region_of(far).is_some_and(|r| r != rid)
            {
                outcome = outcome.merge(StepOutcome::from_bool(
                    self.board.set_black(mid).map_err(SolveError::Logic)?,
                ));
            }
        }

        let diagonals = [
            (c.northeast(), c.north(), c.east()),
            (c.northwest(), c.north(), c.west()),
            (c.southeast(), c.south(), c.east()),
            (c.southwest(), c.south(), c.west()),
        ];
        for (diag, a, b) in diagonals {
            if self.region_of(diag).is_some_and(|r| r != rid) {
                if self.board.is_unknown(a) {
                    outcome = outcome.merge(StepOutcome::from_bool(
                        self.board.set_black(a).map_err(SolveError::Logic)?,
                    ));
                }
                if self.board.is_unknown(b) {
                    outcome = outcome.merge(StepOutcome::from_bool(
                        self.board.set_black(b).map_err(SolveError::Logic)?,
                    ));
                }
            }
        }
        Ok(outcome)
    }

    fn single_exit_region(&mut self, rid: RegionId) -> SolveResult<StepOutcome> {
        let mut outcome = StepOutcome::NoChange;
        loop {
            let region = &self.regions[rid.index()];
            if region.is_complete() {
                break;
            }
            let ocoords = self.outside_unknown(&region.coords);
            if ocoords.is_empty() {
                return Err(SolveError::Logic(format!(
                    "region needing {} more cells has nowhere left to grow",
                    region.remaining()
                )));
            }
            if ocoords.len() != 1 {
                break;
            }
            let open = ocoords[0];
            let changed = self.board.set_white(open).map_err(SolveError::Logic)?;
            if !changed {
                break;
            }
            outcome = StepOutcome::Changed;
            self.refresh_region_coords(rid);
        }
        Ok(outcome)
    }

    /// If a region needs exactly one more cell and has exactly two
    /// candidate Unknown neighbors that touch only at a corner, only one of
    /// the two "far" cells opposite that corner can still be Unknown once
    /// the geometry is worked out — forcing it Black narrows the choice.
    fn corner_force_single_exit(&mut self, rid: RegionId) -> SolveResult<StepOutcome> {
        let region = &self.regions[rid.index()];
        if region.remaining() != 1 {
            return Ok(StepOutcome::NoChange);
        }
        let ocoords = self.outside_unknown(&region.coords);
        if ocoords.len() != 2 || !ocoords[0].corner_touches(ocoords[1]) {
            return Ok(StepOutcome::NoChange);
        }
        let (far1, far2) = Self::far_corner_cells(ocoords[0], ocoords[1]);
        let far1_unknown = self.board.is_unknown(far1);
        let far2_unknown = self.board.is_unknown(far2);
        if far1_unknown && !far2_unknown {
            Ok(StepOutcome::from_bool(
                self.board.set_black(far1).map_err(SolveError::Logic)?,
            ))
        } else if far2_unknown && !far1_unknown {
            Ok(StepOutcome::from_bool(
                self.board.set_black(far2).map_err(SolveError::Logic)?,
            ))
        } else {
            Ok(StepOutcome::NoChange)
        }
    }

    /// Same corner geometry as `corner_force_single_exit`, but independent
    /// of how many cells remain: whenever a region's only two Unknown exits
    /// touch at a corner, the far cell that's still Unknown is stamped with
    /// a region-constraint (it'll have to belong to this region if it ever
    /// turns white) rather than forced black outright.
    fn corner_region_constraint(&mut self, rid: RegionId) {
        if !self.board.is_top_level() || self.regions[rid.index()].is_complete() {
            return;
        }
        let coords = self.regions[rid.index()].coords.clone();
        let ocoords = self.outside_unknown(&coords);
        if ocoords.len() != 2 || !ocoords[0].corner_touches(ocoords[1]) {
            return;
        }
        let (far1, far2) = Self::far_corner_cells(ocoords[0], ocoords[1]);
        let far1_unknown = self.board.is_unknown(far1);
        let far2_unknown = self.board.is_unknown(far2);
        if far1_unknown && !far2_unknown {
            self.claim_region_constraint(far1, rid);
        } else if far2_unknown && !far1_unknown {
            self.claim_region_constraint(far2, rid);
        }
    }

    /// Given two corner-touching cells, the pair of cells diagonally
    /// opposite the shared corner.
    fn far_corner_cells(c1: Coord, c2: Coord) -> (Coord, Coord) {
        let (left, right) = if c1.col <= c2.col { (c1, c2) } else { (c2, c1) };
        if left.row < right.row {
            (left.east(), left.south())
        } else {
            (left.east(), left.north())
        }
    }

    /// Expands the set of cells an incomplete region could still reach
    /// (Unknown or White neighbors not ruled out by another region's
    /// constraint) to a fixed point. If that reachable set is exactly the
    /// region's target size, every Unknown cell in it must be White; if
    /// it's smaller, the region can never complete.
    fn reachability_enclosure(&mut self, rid: RegionId) -> SolveResult<StepOutcome> {
        if self.regions[rid.index()].is_complete() {
            return Ok(StepOutcome::NoChange);
        }
        let value = self.regions[rid.index()].value as usize;
        let mut coords: HashSet<Coord> = self.regions[rid.index()].coords.iter().copied().collect();
        loop {
            let mut added = false;
            for c in self.outside_unknown_or_white(&coords) {
                if self.can_be_in_region(c, rid) && coords.insert(c) {
                    added = true;
                }
            }
            if !added {
                break;
            }
        }
        if coords.len() < value {
            return Err(SolveError::Logic(format!(
                "region can never reach its required size of {value}"
            )));
        }
        let mut outcome = StepOutcome::NoChange;
        if coords.len() == value {
            for c in coords {
                if self.board.is_unknown(c) {
                    outcome = outcome.merge(StepOutcome::from_bool(
                        self.board.set_white(c).map_err(SolveError::Logic)?,
                    ));
                }
            }
        }
        Ok(outcome)
    }

    fn surround_complete(&mut self, rid: RegionId) -> SolveResult<StepOutcome> {
        let coords = self.regions[rid.index()].coords.clone();
        let ocoords = self.outside_unknown(&coords);
        let mut outcome = StepOutcome::NoChange;
        for c in ocoords {
            outcome = outcome.merge(StepOutcome::from_bool(
                self.board.set_black(c).map_err(SolveError::Logic)?,
            ));
        }
        Ok(outcome)
    }

    fn pool_rule_pass(&mut self, pid: PoolId) -> SolveResult<StepOutcome> {
        let mut outcome = StepOutcome::NoChange;
        let coords = self.pools[pid.index()].coords.clone();
        for c in &coords {
            if let Some(corner) = self.l_shape_corner(*c) {
                outcome = outcome.merge(StepOutcome::from_bool(
                    self.board.set_white(corner).map_err(SolveError::Logic)?,
                ));
            }
        }
        if self.pools.len() > 1 {
            outcome = outcome.merge(self.single_exit_pool(pid)?);
        }
        Ok(outcome)
    }

    /// A 2x2 window with exactly three of its corners already Black would
    /// become an illegal all-black square if the fourth joined the same
    /// Pool — so if that fourth cell is still Unknown, it must be White.
    fn l_shape_corner(&self, c: Coord) -> Option<Coord> {
        let windows = [
            [c, c.east(), c.south(), c.southeast()],
            [c, c.west(), c.south(), c.southwest()],
            [c, c.east(), c.north(), c.northeast()],
            [c, c.west(), c.north(), c.northwest()],
        ];
        for w in windows {
            if !w.iter().all(|&cc| self.board.in_bounds(cc)) {
                continue;
            }
            let black_count = w.iter().filter(|&&cc| self.board.is_black(cc)).count();
            if black_count == 3 {
                if let Some(&corner) = w.iter().find(|&&cc| self.board.is_unknown(cc)) {
                    return Some(corner);
                }
            }
        }
        None
    }

    fn single_exit_pool(&mut self, pid: PoolId) -> SolveResult<StepOutcome> {
        let mut outcome = StepOutcome::NoChange;
        loop {
            let coords = self.pools[pid.index()].coords.clone();
            let ocoords = self.outside_unknown(&coords);
            if ocoords.is_empty() {
                return Err(SolveError::Logic("a pool has nowhere left to grow".into()));
            }
            if ocoords.len() != 1 {
                break;
            }
            let changed = self.board.set_black(ocoords[0]).map_err(SolveError::Logic)?;
            if !changed {
                break;
            }
            outcome = StepOutcome::Changed;
            self.pools[pid.index()].coords.push(ocoords[0]);
            self.pools[pid.index()].coords.sort();
        }
        Ok(outcome)
    }

    fn island_rule_pass(&mut self, iid: IslandId) -> SolveResult<StepOutcome> {
        let mut outcome = StepOutcome::NoChange;
        loop {
            let coords = self.islands[iid.index()].coords.clone();
            let ocoords = self.outside_unknown(&coords);
            if ocoords.is_empty() {
                return Err(SolveError::Logic("an island has nowhere left to grow".into()));
            }
            if ocoords.len() != 1 {
                break;
            }
            let changed = self.board.set_white(ocoords[0]).map_err(SolveError::Logic)?;
            if !changed {
                break;
            }
            outcome = StepOutcome::Changed;
            self.islands[iid.index()].coords.push(ocoords[0]);
            self.islands[iid.index()].coords.sort();
        }

        let seed = *self.islands[iid.index()]
            .coords
            .first()
            .expect("an island is never empty");
        let mut connectable = Vec::new();
        for rid in (0..self.regions.len()).map(RegionId) {
            if !self.regions[rid.index()].is_complete() && self.can_connect_to_region(seed, rid) {
                connectable.push(rid);
            }
        }
        if connectable.is_empty() {
            return Err(SolveError::Logic(
                "an island can't connect to any remaining region".into(),
            ));
        }
        if connectable.len() == 1 && self.board.is_top_level() {
            let rid = connectable[0];
            let coords = self.islands[iid.index()].coords.clone();
            for c in coords {
                self.claim_region_constraint(c, rid);
            }
        }
        Ok(outcome)
    }

    fn gap_rule_pass(&mut self, gid: GapId) -> SolveResult<StepOutcome> {
        let mut outcome = StepOutcome::NoChange;
        let coords = self.gaps[gid.index()].coords.clone();
        let coord_set: HashSet<Coord> = coords.iter().copied().collect();

        let mut border: HashSet<Coord> = HashSet::new();
        for &c in &coords {
            for n in self.board.orthogonal_in_bounds(c) {
                if !coord_set.contains(&n) {
                    border.insert(n);
                }
            }
        }
        if !border.is_empty() && border.iter().all(|&n| self.board.is_black(n)) {
            for &c in &coords {
                outcome = outcome.merge(StepOutcome::from_bool(
                    self.board.set_black(c).map_err(SolveError::Logic)?,
                ));
            }
        }

        for &c in &coords {
            outcome = outcome.merge(self.unknown_cell_rule(c)?);
        }

        if self.gaps[gid.index()].bordering_islands.is_empty() {
            let regions = self.gaps[gid.index()].bordering_regions.clone();
            for &c in &coords {
                if !self.board.is_unknown(c) {
                    continue;
                }
                let mut found = false;
                let mut unique_region = None;
                for &rid in &regions {
                    if self.can_connect_to_region(c, rid) {
                        if found {
                            unique_region = None;
                            break;
                        }
                        found = true;
                        unique_region = Some(rid);
                    }
                }
                if !found {
                    outcome = outcome.merge(StepOutcome::from_bool(
                        self.board.set_black(c).map_err(SolveError::Logic)?,
                    ));
                } else if let Some(rid) = unique_region {
                    if self.board.is_top_level() {
                        self.claim_region_constraint(c, rid);
                    }
                }
            }
        }
        Ok(outcome)
    }

    /// Rules that apply to any single still-Unknown cell regardless of
    /// which Gap it's in: a `MustBeBlack` constraint wins outright; a cell
    /// orthogonally surrounded entirely by White/Number must itself be
    /// White (else it would be an unreachable black speck); surrounded
    /// entirely by Black, it must join the sea; and if no path from it ever
    /// reaches an existing Black cell, it can't become Black at all.
    fn unknown_cell_rule(&mut self, c: Coord) -> SolveResult<StepOutcome> {
        let mut outcome = StepOutcome::NoChange;
        if self.board.cell(c).region_constraint.is_must_be_black() {
            outcome = outcome.merge(StepOutcome::from_bool(
                self.board.set_black(c).map_err(SolveError::Logic)?,
            ));
        }

        let neighbors: Vec<Coord> = self.board.orthogonal_in_bounds(c).collect();
        let off_board_count = 4 - neighbors.len();

        let white_neighbors = neighbors.iter().filter(|&&n| self.board.is_white_or_number(n)).count();
        if white_neighbors + off_board_count == 4 {
            outcome = outcome.merge(StepOutcome::from_bool(
                self.board.set_white(c).map_err(SolveError::Logic)?,
            ));
        }

        let black_neighbors = neighbors.iter().filter(|&&n| self.board.is_black(n)).count();
        if black_neighbors + off_board_count == 4 {
            outcome = outcome.merge(StepOutcome::from_bool(
                self.board.set_black(c).map_err(SolveError::Logic)?,
            ));
        }

        if !self.is_black_reachable(c) {
            outcome = outcome.merge(StepOutcome::from_bool(
                self.board.set_white(c).map_err(SolveError::Logic)?,
            ));
        }
        Ok(outcome)
    }

    // ---- region-completion enumeration and intersection (§4.4) ----

    fn recurse_solve_step(&mut self) -> SolveResult<bool> {
        if self.options.host.check_break() {
            return Err(SolveError::Cancelled);
        }
        self.rebuild(false);
        self.set_constraints();

        let mut all_valid = true;
        let mut all_coords: HashSet<Coord> = HashSet::new();

        for rid in (0..self.regions.len()).map(RegionId) {
            let (is_complete, coords, remaining) = {
                let r = &self.regions[rid.index()];
                (r.is_complete(), r.coords.clone(), r.remaining())
            };
            if is_complete {
                all_coords.extend(coords);
                continue;
            }
            if remaining > self.max_remaining {
                log::debug!(
                    "region needing {remaining} more cells exceeds max_remaining {}",
                    self.max_remaining
                );
                self.request_max_remaining(remaining);
                all_valid = false;
                continue;
            }

            let solutions = match self.build_region_solutions(rid)? {
                Some(s) => s,
                None => {
                    all_valid = false;
                    continue;
                }
            };
            for s in &solutions {
                all_coords.extend(s.icoords.iter().copied());
            }
            if remaining > 0 {
                self.apply_common_solution_coords(rid, &solutions)?;
            }
        }

        let mut changed = false;
        if all_valid && (all_coords.len() as i64) < (self.board.rows() as i64 * self.board.cols() as i64) {
            let unused: Vec<Coord> = self
                .board
                .coords()
                .filter(|c| self.board.is_unknown(*c) && !all_coords.contains(c))
                .collect();
            for c in unused {
                changed |= self.board.set_black(c).map_err(SolveError::Logic)?;
            }
        }

        if !self.check_valid_structural() {
            return Err(SolveError::Logic(
                "the board failed its global validity check".into(),
            ));
        }

        Ok(changed)
    }

    /// Derives `OneWhite`/`OneBlack` disjunctive constraints that the
    /// enumerator prunes branches with: an about-to-complete 2x2 square
    /// forces at least one of its cells White (else it'd be an illegal
    /// black square), a Pool's whole exterior must contain at least one
    /// eventual Black cell (else the Pool could never be walled off from an
    /// adjacent one), and an Island already pinned to one region is really
    /// just that region's cells-to-be.
    fn set_constraints(&mut self) {
        for r in &mut self.regions {
            r.clear_constraints();
        }

        for c in self.board.coords().collect::<Vec<_>>() {
            if self.board.is_white_or_number(c) {
                continue;
            }
            let window = [c, c.south(), c.east(), c.southeast()];
            if !window.iter().all(|&w| self.board.in_bounds(w)) {
                continue;
            }
            if window[1..].iter().any(|&w| self.board.is_white_or_number(w)) {
                continue;
            }
            let unknowns: Vec<Coord> = window.into_iter().filter(|&w| self.board.is_unknown(w)).collect();
            self.add_one_white_constraint(&unknowns);
        }

        for pid in 0..self.pools.len() {
            let coords = self.pools[pid].coords.clone();
            let ocoords = self.outside_unknown(&coords);
            self.add_one_black_constraint(&ocoords);
        }

        for iid in 0..self.islands.len() {
            let first = self.islands[iid].coords[0];
            if let Some(rid) = self.board.cell(first).region_constraint.region() {
                let coords = self.islands[iid].coords.clone();
                self.regions[rid.index()].add_one_white(coords);
            }
        }
    }

    fn add_one_white_constraint(&mut self, coords: &[Coord]) {
        if !coords.is_empty() {
            if let Some(rid) = self.uniform_region_constraint(coords) {
                self.regions[rid.index()].add_one_white(coords.to_vec());
            }
        }
    }

    fn add_one_black_constraint(&mut self, coords: &[Coord]) {
        if !coords.is_empty() {
            if let Some(rid) = self.uniform_region_constraint(coords) {
                self.regions[rid.index()].add_one_black(coords.to_vec());
            }
        }
    }

    /// `Some(rid)` only if every cell's region-constraint is `MustBelongTo`
    /// the *same* region; a mix, or any unconstrained cell, yields `None`.
    fn uniform_region_constraint(&self, coords: &[Coord]) -> Option<RegionId> {
        let mut common: Option<Option<RegionId>> = None;
        for &c in coords {
            let r = self.board.cell(c).region_constraint.region();
            match common {
                None => common = Some(r),
                Some(prev) if prev == r => {}
                _ => return None,
            }
        }
        common.flatten()
    }

    fn build_region_solutions(&mut self, rid: RegionId) -> SolveResult<Option<Vec<Solution>>> {
        if self.options.host.check_break() {
            return Err(SolveError::Cancelled);
        }
        // A depth-capped preview (`enum_max_depth.is_some()`) enumerates to
        // a different stopping point than a full completion and must never
        // be satisfied from a cache populated by the other kind of call.
        if self.enum_max_depth.is_none() {
            let generation = self.board.generation();
            if let Some(cached) = self.regions[rid.index()].cached_solutions(generation) {
                return Ok(Some(cached.clone()));
            }
        }
        let value = self.regions[rid.index()].value;
        let seed_coords = self.regions[rid.index()].coords.clone();
        let mut visited_sets: HashSet<Vec<Coord>> = HashSet::new();
        let mut raw: Vec<Vec<Coord>> = Vec::new();
        let budget_ok = self.expand_region(rid, seed_coords, &mut visited_sets, &mut raw)?;
        if !budget_ok {
            log::debug!("region enumeration exceeded max_solutions, doubling budget");
            self.next_max_solutions = true;
            return Ok(None);
        }
        if raw.is_empty() {
            return Err(SolveError::Logic(format!(
                "region of size {value} has no possible completion"
            )));
        }

        let mut solutions = Vec::new();
        for icoords in raw {
            let (valid, white_coords, black_coords) = self.validate_solution_candidate(&icoords)?;
            if valid {
                let ocoords = self.outside_unknown(&icoords);
                solutions.push(Solution {
                    region: rid,
                    icoords,
                    ocoords,
                    white_coords,
                    black_coords,
                });
            }
        }
        if solutions.is_empty() {
            return Err(SolveError::Logic(format!(
                "region of size {value} has no *valid* completion"
            )));
        }

        if self.board.is_top_level() {
            let mut common_io: HashSet<Coord> = solutions[0]
                .icoords
                .iter()
                .chain(solutions[0].ocoords.iter())
                .copied()
                .collect();
            for s in &solutions[1..] {
                let io: HashSet<Coord> = s.icoords.iter().chain(s.ocoords.iter()).copied().collect();
                common_io.retain(|c| io.contains(c));
            }
            for c in common_io {
                if self.board.is_unknown(c) {
                    self.claim_region_constraint(c, rid);
                }
            }
        }

        if self.enum_max_depth.is_none() {
            self.regions[rid.index()]
                .cache_solutions(solutions.clone(), self.board.generation());
        }
        Ok(Some(solutions))
    }

    /// Depth-first expansion of one region's candidate completions, pruning
    /// branches that overflow its size, violate a `OneBlack` constraint, or
    /// (once at most one region remains open) would split the sea. Returns
    /// `Ok(false)` once `max_solutions` candidates have already been found,
    /// signaling the caller to double the budget and retry later.
    fn expand_region(
        &mut self,
        rid: RegionId,
        coords: Vec<Coord>,
        visited: &mut HashSet<Vec<Coord>>,
        solutions: &mut Vec<Vec<Coord>>,
    ) -> SolveResult<bool> {
        if self.options.host.check_break() {
            return Err(SolveError::Cancelled);
        }
        let value = self.regions[rid.index()].value as usize;
        if coords.len() > value {
            return Ok(true);
        }

        let coord_set: HashSet<Coord> = coords.iter().copied().collect();
        if self.one_black_violated(rid, &coord_set) {
            return Ok(true);
        }
        if self.num_incomplete_regions() < 2 && !self.check_single_pool_with_white(&coord_set) {
            return Ok(true);
        }

        let mut canonical = coords.clone();
        canonical.sort();
        if !visited.insert(canonical) {
            return Ok(true);
        }

        let depth_cap = self.enum_max_depth.map(|d| d as usize).unwrap_or(value);
        if coords.len() == value || coords.len() >= depth_cap {
            solutions.push(coords);
            return Ok(solutions.len() <= self.max_solutions);
        }

        let border = self
            .forced_one_white_border(rid, &coord_set)
            .unwrap_or_else(|| self.outside_unknown(&coords));

        for u in border {
            if !self.can_be_in_region(u, rid) {
                continue;
            }
            let mut next = coords.clone();
            let mut next_set: HashSet<Coord> = next.iter().copied().collect();
            if !next_set.contains(&u) {
                for c in self.board.flood(u, |c| self.board.is_white_or_number(c)) {
                    if next_set.insert(c) {
                        next.push(c);
                    }
                }
            }
            if !self.expand_region(rid, next, visited, solutions)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn one_black_violated(&self, rid: RegionId, coords: &HashSet<Coord>) -> bool {
        self.regions[rid.index()].one_black.iter().any(|c| c.violated_by(coords))
    }

    fn forced_one_white_border(&self, rid: RegionId, coords: &HashSet<Coord>) -> Option<Vec<Coord>> {
        for constraint in &self.regions[rid.index()].one_white {
            if constraint.satisfied_by(coords) {
                continue;
            }
            if constraint.all_adjacent_to(coords) {
                return Some(constraint.0.clone());
            }
        }
        None
    }

    /// Pushes `icoords` White / their border Black as a hypothesis, runs
    /// the simple rule pass to quiescence (any contradiction just rejects
    /// the candidate rather than escaping as a fatal error), checks global
    /// validity, and — if valid — harvests every White and Black cell
    /// across the whole (hypothetical) board for intersection against
    /// sibling candidates.
    fn validate_solution_candidate(
        &mut self,
        icoords: &[Coord],
    ) -> SolveResult<(bool, Vec<Coord>, Vec<Coord>)> {
        let icoords_set: HashSet<Coord> = icoords.iter().copied().collect();
        let ocoords: HashSet<Coord> = self.outside_unknown(icoords).into_iter().collect();
        self.board.push_hypothesis(&icoords_set, &ocoords);
        let result = self.validate_under_hypothesis();
        self.board.pop_hypothesis();
        self.rebuild(true);
        result
    }

    fn validate_under_hypothesis(&mut self) -> SolveResult<(bool, Vec<Coord>, Vec<Coord>)> {
        self.rebuild(true);
        let ran_clean = loop {
            if self.options.host.check_break() {
                return Err(SolveError::Cancelled);
            }
            match self.simple_solve_pass() {
                Ok(StepOutcome::NoChange) => break true,
                Ok(StepOutcome::Changed) => continue,
                Err(SolveError::Cancelled) => return Err(SolveError::Cancelled),
                Err(SolveError::Logic(_)) => break false,
            }
        };
        if !ran_clean {
            return Ok((false, Vec::new(), Vec::new()));
        }
        self.rebuild(true);
        if !self.check_valid_structural() {
            return Ok((false, Vec::new(), Vec::new()));
        }
        let mut white_coords = Vec::new();
        let mut black_coords = Vec::new();
        for r in &self.regions {
            white_coords.extend(r.coords.iter().copied());
        }
        for isl in &self.islands {
            white_coords.extend(isl.coords.iter().copied());
        }
        for p in &self.pools {
            black_coords.extend(p.coords.iter().copied());
        }
        Ok((true, white_coords, black_coords))
    }

    fn apply_common_solution_coords(&mut self, rid: RegionId, solutions: &[Solution]) -> SolveResult<()> {
        if solutions.is_empty() {
            return Ok(());
        }
        let mut common_white: HashSet<Coord> = solutions[0].white_coords.iter().copied().collect();
        let mut common_black: HashSet<Coord> = solutions[0].black_coords.iter().copied().collect();
        for s in &solutions[1..] {
            let w: HashSet<Coord> = s.white_coords.iter().copied().collect();
            let b: HashSet<Coord> = s.black_coords.iter().copied().collect();
            common_white.retain(|c| w.contains(c));
            common_black.retain(|c| b.contains(c));
        }
        for c in common_white {
            self.board.set_white(c).map_err(SolveError::Logic)?;
        }
        for c in common_black {
            self.board.set_black(c).map_err(SolveError::Logic)?;
        }
        self.refresh_region_coords(rid);
        Ok(())
    }

    // ---- global validity (§4.6) ----

    /// No 2x2 all-Black square, no region over-full, every incomplete
    /// region/pool still has somewhere to grow, and (once every region is
    /// complete and no Islands/Gaps remain) exactly one Pool.
    ///
    /// A White cell fully boxed in by Black is *not* checked directly here:
    /// an incomplete region's own "has somewhere to grow" check already
    /// catches that case, and a complete region's White cells are routinely
    /// and correctly walled off by Black in a solved puzzle.
    fn check_valid_structural(&mut self) -> bool {
        for c in self.board.coords().collect::<Vec<_>>() {
            let window = [c, c.east(), c.south(), c.southeast()];
            if window.iter().all(|&w| self.board.in_bounds(w) && self.board.is_black(w)) {
                return false;
            }
        }

        for i in 0..self.regions.len() {
            let rid = RegionId(i);
            if self.regions[i].len() > self.regions[i].value {
                return false;
            }
            if !self.regions[i].is_complete() {
                let ocoords = self.outside_unknown(&self.regions[i].coords);
                if ocoords.is_empty() {
                    return false;
                }
                if !self.check_non_black_reachable(rid) {
                    return false;
                }
            }
        }

        if self.pools.len() > 1 {
            for i in 0..self.pools.len() {
                if self.outside_unknown(&self.pools[i].coords).is_empty() {
                    return false;
                }
            }
        }

        let solved_shape = self.regions.iter().all(|r| r.is_complete())
            && self.islands.is_empty()
            && self.gaps.is_empty();
        if solved_shape && self.pools.len() > 1 {
            return false;
        }

        true
    }

    fn check_non_black_reachable(&self, rid: RegionId) -> bool {
        let coords = self.regions[rid.index()].coords.clone();
        for c in &coords {
            for n in self.board.orthogonal_in_bounds(*c) {
                if !self.board.is_black(n) && self.can_be_in_region(n, rid) {
                    return true;
                }
            }
        }
        false
    }

    // ---- the budget-growing outer loop (§4.5) ----

    /// Runs the simple rule pass to quiescence, then one region-enumeration
    /// pass. If every skipped region (over `max_remaining`) or exhausted
    /// enumeration (over `max_solutions`) was the only thing standing in
    /// the way, the relevant budget is raised and the whole step retried —
    /// otherwise a genuinely stuck board returns `false` with nothing
    /// raised.
    pub fn solve_step(&mut self) -> SolveResult<bool> {
        self.next_max_remaining = None;
        self.next_max_solutions = false;

        let mut changed = self.run_simple_pass_to_fixpoint()?;
        changed |= self.recurse_solve_step()?;

        while self.next_max_remaining.is_some() || self.next_max_solutions {
            if let Some(next) = self.next_max_remaining.take() {
                if next > self.max_remaining {
                    log::debug!("raising max_remaining from {} to {next}", self.max_remaining);
                    self.max_remaining = next;
                }
            }
            if self.next_max_solutions {
                self.next_max_solutions = false;
                self.max_solutions *= 2;
                log::debug!("raising max_solutions to {}", self.max_solutions);
            }
            changed |= self.run_simple_pass_to_fixpoint()?;
            changed |= self.recurse_solve_step()?;
        }

        if changed {
            self.options.host.notify_changed();
        }
        Ok(changed)
    }

    fn run_simple_pass_to_fixpoint(&mut self) -> SolveResult<bool> {
        let mut any = false;
        loop {
            if self.options.host.check_break() {
                return Err(SolveError::Cancelled);
            }
            match self.simple_solve_pass()? {
                StepOutcome::NoChange => break,
                StepOutcome::Changed => any = true,
            }
        }
        Ok(any)
    }

    /// Repeats `solve_step` until it stops changing the board (either
    /// solved, or genuinely stuck) or the host asks to cancel.
    pub fn solve(&mut self) -> SolveResult<()> {
        self.options.host.set_busy(true);
        let result = self.solve_inner();
        self.options.host.set_busy(false);
        result
    }

    fn solve_inner(&mut self) -> SolveResult<()> {
        loop {
            if self.options.host.check_break() {
                return Err(SolveError::Cancelled);
            }
            if !self.solve_step()? {
                break;
            }
        }
        Ok(())
    }

    pub fn is_solved(&mut self) -> bool {
        self.rebuild(false);
        self.regions.iter().all(|r| r.is_complete())
            && self.pools.len() == 1
            && self.islands.is_empty()
            && self.gaps.is_empty()
    }

    // ---- the hypothesis API a host drives interactively ----

    /// Enumerates `rid`'s candidate completions. `max_depth`, if given,
    /// caps the search at that many committed cells instead of the
    /// region's exact target size — useful for a host that only wants to
    /// preview a few steps ahead rather than a full completion.
    pub fn get_region_solutions(
        &mut self,
        rid: RegionId,
        max_depth: Option<u8>,
    ) -> SolveResult<Vec<Solution>> {
        self.rebuild(true);
        self.set_constraints();
        self.enum_max_depth = max_depth;
        let result = self.build_region_solutions(rid);
        self.enum_max_depth = None;
        match result? {
            Some(solutions) => Ok(solutions),
            None => Err(SolveError::Logic(
                "enumeration budget exhausted before any completion was found".into(),
            )),
        }
    }

    pub fn play_solution(&mut self, solution: &Solution) {
        let icoords: HashSet<Coord> = solution.icoords.iter().copied().collect();
        let ocoords: HashSet<Coord> = solution.ocoords.iter().copied().collect();
        self.board.push_hypothesis(&icoords, &ocoords);
        self.rebuild(true);
    }

    pub fn unplay_solution(&mut self) {
        self.board.pop_hypothesis();
        self.rebuild(true);
    }

    pub fn commit(&mut self) -> SolveResult<()> {
        self.board.commit_hypothesis().map_err(SolveError::Logic)?;
        self.dirty = true;
        self.rebuild(true);
        Ok(())
    }

    pub fn hypothesis_depth(&self) -> usize {
        self.board.hypothesis_depth()
    }

    fn ensure_top_level_edit(&self) -> SolveResult<()> {
        if !self.board.is_top_level() {
            return Err(SolveError::Logic(
                "cannot set a cell directly while a hypothesis is active".into(),
            ));
        }
        Ok(())
    }

    pub fn set_cell_black(&mut self, coord: Coord) -> SolveResult<bool> {
        self.ensure_top_level_edit()?;
        let changed = self.board.set_black(coord).map_err(SolveError::Logic)?;
        if changed {
            self.dirty = true;
            self.options.host.notify_changed();
        }
        Ok(changed)
    }

    pub fn set_cell_white(&mut self, coord: Coord) -> SolveResult<bool> {
        self.ensure_top_level_edit()?;
        let changed = self.board.set_white(coord).map_err(SolveError::Logic)?;
        if changed {
            self.dirty = true;
            self.options.host.notify_changed();
        }
        Ok(changed)
    }
}
