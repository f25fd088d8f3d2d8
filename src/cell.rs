//! Per-cell value and the deduced `region-constraint` tag.

use crate::ids::{GapId, IslandId, PoolId, RegionId};

/// The color (or given number) of one cell. `Number` is set once at load
/// time and is never mutated afterward. `White`/`Black` are immutable once
/// set at the top level; under a hypothesis they are never written into
/// this field at all (see [`crate::board::Board`]'s overlay).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CellValue {
    Unknown,
    White,
    Black,
    Number(u8),
}

impl CellValue {
    pub fn is_unknown(self) -> bool {
        matches!(self, CellValue::Unknown)
    }
    pub fn is_white(self) -> bool {
        matches!(self, CellValue::White)
    }
    pub fn is_black(self) -> bool {
        matches!(self, CellValue::Black)
    }
    pub fn is_number(self) -> bool {
        matches!(self, CellValue::Number(_))
    }
    pub fn is_white_or_number(self) -> bool {
        self.is_white() || self.is_number()
    }
    pub fn number(self) -> Option<u8> {
        match self {
            CellValue::Number(n) => Some(n),
            _ => None,
        }
    }
}

/// A deduction about a still-Unknown cell that survives across rebuilds.
/// Replaces the source's sentinel-pointer hack
/// (`BLACK_REGION_CONSTRAINT = (Region*)0x1`) with a proper tagged value.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum RegionConstraint {
    #[default]
    None,
    /// This cell cannot belong to any region; it must eventually be black.
    MustBeBlack,
    /// If this cell turns out white, it must belong to this specific
    /// region (it is reachable from no other incomplete region).
    MustBelongTo(RegionId),
}

impl RegionConstraint {
    pub fn is_must_be_black(self) -> bool {
        matches!(self, RegionConstraint::MustBeBlack)
    }

    pub fn region(self) -> Option<RegionId> {
        match self {
            RegionConstraint::MustBelongTo(r) => Some(r),
            _ => None,
        }
    }

    /// Folds in a claim that this cell belongs to `rid`. Mirrors the
    /// source's single choke point `Cell::setRegionConstraint`: the first
    /// claim is recorded as-is, a repeat claim from the same region is a
    /// no-op, and a claim from a *different* region than the one already
    /// recorded collapses to `MustBeBlack` — a cell two regions both reach
    /// can belong to neither, so it must join the sea. Once black, further
    /// claims leave it black.
    pub fn claim(self, rid: RegionId) -> RegionConstraint {
        match self {
            RegionConstraint::None => RegionConstraint::MustBelongTo(rid),
            RegionConstraint::MustBelongTo(r) if r == rid => self,
            RegionConstraint::MustBelongTo(_) => RegionConstraint::MustBeBlack,
            RegionConstraint::MustBeBlack => RegionConstraint::MustBeBlack,
        }
    }
}

/// One grid square. The `region`/`pool`/`island`/`gap` fields are weak
/// lookup aids recomputed wholesale by [`crate::grid::Grid::rebuild`]; they
/// are never used to keep anything alive and carry no ownership.
#[derive(Clone, Debug)]
pub struct Cell {
    pub value: CellValue,
    /// The reference-solution color for this cell, if a `solution_def` was
    /// supplied. Used only to cross-check forced decisions, never to drive
    /// them.
    pub solution_hint: Option<CellValue>,
    pub region_constraint: RegionConstraint,
    pub region: Option<RegionId>,
    pub pool: Option<PoolId>,
    pub island: Option<IslandId>,
    pub gap: Option<GapId>,
}

impl Cell {
    pub fn new(value: CellValue) -> Self {
        Cell {
            value,
            solution_hint: None,
            region_constraint: RegionConstraint::None,
            region: None,
            pool: None,
            island: None,
            gap: None,
        }
    }

    /// Clears every derived back-reference. Called at the start of every
    /// `rebuild`; the region-constraint field is deliberately *not* cleared
    /// here, since it must survive rebuilds (only `reset` clears it).
    pub fn clear_derived_refs(&mut self) {
        self.region = None;
        self.pool = None;
        self.island = None;
        self.gap = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_constraint_defaults_to_none() {
        assert_eq!(RegionConstraint::default(), RegionConstraint::None);
    }

    #[test]
    fn must_belong_to_carries_a_region_id() {
        let c = RegionConstraint::MustBelongTo(RegionId(3));
        assert_eq!(c.region(), Some(RegionId(3)));
        assert!(!c.is_must_be_black());
    }

    #[test]
    fn claim_from_none_records_the_region() {
        let c = RegionConstraint::None.claim(RegionId(1));
        assert_eq!(c, RegionConstraint::MustBelongTo(RegionId(1)));
    }

    #[test]
    fn repeat_claim_from_the_same_region_is_a_no_op() {
        let c = RegionConstraint::MustBelongTo(RegionId(1)).claim(RegionId(1));
        assert_eq!(c, RegionConstraint::MustBelongTo(RegionId(1)));
    }

    #[test]
    fn claim_from_a_different_region_collapses_to_black() {
        let c = RegionConstraint::MustBelongTo(RegionId(1)).claim(RegionId(2));
        assert_eq!(c, RegionConstraint::MustBeBlack);
    }

    #[test]
    fn claim_on_an_already_black_cell_stays_black() {
        let c = RegionConstraint::MustBeBlack.claim(RegionId(5));
        assert_eq!(c, RegionConstraint::MustBeBlack);
    }
}
