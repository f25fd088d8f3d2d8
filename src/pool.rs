//! A maximal orthogonally connected component of Black cells.
//!
//! Like [`crate::region::Region`], the actual rule pass (`L-corner`,
//! `single exit for pool`) lives on [`crate::grid::Grid`], where it has
//! simultaneous access to the board and every pool.

use crate::coord::Coord;
use crate::ids::PoolId;

#[derive(Clone, Debug)]
pub struct Pool {
    pub id: PoolId,
    pub coords: Vec<Coord>,
}

impl Pool {
    pub fn new(id: PoolId, coords: Vec<Coord>) -> Self {
        Pool { id, coords }
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}
