//! A deductive, fixed-point solver core for the Nurikabe grid puzzle.
//!
//! The entry point is [`grid::Grid`], built from a parsed puzzle
//! ([`format::parse`]) plus a [`host::SolveOptions`]. Everything below it —
//! [`board::Board`] and its hypothesis overlay, [`region::Region`] and its
//! completion enumerator, [`pool::Pool`]/[`island::Island`]/[`gap::Gap`] —
//! is plain data the `Grid` owns and operates on directly.

pub mod board;
pub mod cell;
pub mod coord;
pub mod error;
pub mod format;
pub mod gap;
pub mod grid;
pub mod host;
pub mod ids;
pub mod island;
pub mod pool;
pub mod region;

pub use crate::coord::Coord;
pub use crate::error::{SolveError, SolveResult, StepOutcome};
pub use crate::grid::Grid;
pub use crate::host::{Host, NullHost, SolveOptions};
pub use crate::ids::{GapId, IslandId, PoolId, RegionId};
