//! Index-based identifiers for the derived structures.
//!
//! The source models `Cell -> Region/Pool/Island/Gap` as raw back-pointers
//! that are invalidated and reassigned on every rebuild. Per the design
//! notes ("cyclic references... model them as indices or identifiers"),
//! this crate represents every such back-reference as a lightweight newtype
//! index into a `Vec` owned by [`crate::grid::Grid`]. Cells never own a
//! `Region`/`Pool`/`Island`/`Gap` directly.

macro_rules! index_id {
    ($name:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
        pub struct $name(pub usize);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

index_id!(RegionId);
index_id!(PoolId);
index_id!(IslandId);
index_id!(GapId);
