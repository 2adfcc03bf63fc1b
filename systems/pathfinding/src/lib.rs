#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Grid pathfinding for Warren units.
//!
//! The search runs over a [`SearchGrid`] that subdivides map tiles, and asks
//! a caller-supplied predicate whether a tile may be crossed. The predicate
//! usually comes from [`passable_for`], which binds a [`TileMap`] to one
//! unit's [`MovementMask`].

mod grid;
mod pathfinder;

pub use grid::SearchGrid;
pub use pathfinder::{
    FoundPath, PathRequest, PathSummary, Pathfinder, PathfindingError, HEURISTIC_INFLATION,
};

use warren_core::{MovementMask, TileCell, TileMap};

/// Builds a passability predicate for a unit moving with `mask`.
pub fn passable_for(map: &dyn TileMap, mask: MovementMask) -> impl Fn(TileCell) -> bool + '_ {
    move |tile| map.is_passable(tile, mask)
}
