//! Identifier collections shared by every correlation pass.

pub mod disjoint_id_set;
pub mod id_set;
pub mod id_set_map;

/// Graph element identifier. `0` is reserved for "absent".
pub type Id = u64;

pub use disjoint_id_set::DisjointIdSet;
pub use id_set::{IdSet, SMALL_SET_THRESHOLD};
pub use id_set_map::IdSetMap;
