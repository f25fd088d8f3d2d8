//! A maximal orthogonally connected component of Unknown cells.
//!
//! A Gap remembers which regions border it (directly, or via a bordering
//! island already constrained to belong to exactly one region) and which
//! bordering islands remain unattached, since those govern the `all-border
//! black` and `unique reachable region` rules.

use crate::coord::Coord;
use crate::ids::{GapId, IslandId, RegionId};

#[derive(Clone, Debug, Default)]
pub struct Gap {
    pub id_: Option<GapId>,
    pub coords: Vec<Coord>,
    pub bordering_regions: Vec<RegionId>,
    pub bordering_islands: Vec<IslandId>,
}

impl Gap {
    pub fn new(id: GapId, coords: Vec<Coord>) -> Self {
        Gap {
            id_: Some(id),
            coords,
            bordering_regions: Vec::new(),
            bordering_islands: Vec::new(),
        }
    }

    pub fn id(&self) -> GapId {
        self.id_.expect("Gap constructed without an id")
    }

    pub fn add_bordering_region(&mut self, region: RegionId) {
        if !self.bordering_regions.contains(&region) {
            self.bordering_regions.push(region);
        }
    }

    pub fn add_bordering_island(&mut self, island: IslandId) {
        if !self.bordering_islands.contains(&island) {
            self.bordering_islands.push(island);
        }
    }
}
