//! Grid A* with jump point pruning.
//!
//! Diagonal moves never cut corners: stepping diagonally requires both
//! orthogonally adjacent cells to be open. Step costs are Euclidean, so the
//! reported length does not depend on how finely the grid subdivides tiles.

use std::collections::TryReserveError;

use fixedbitset::FixedBitSet;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::trace;
use warren_core::{CellCoord, TileCell, Waypoint};

use crate::grid::SearchGrid;

/// Tie-breaking inflation applied to the heuristic. Found paths are at most
/// this factor longer than the optimum.
pub const HEURISTIC_INFLATION: f32 = 1.001;

/// Errors raised by a search that could not run to completion.
#[derive(Debug, Error)]
pub enum PathfindingError {
    /// The open or closed set could not grow.
    #[error("search storage could not grow beyond {len} entries")]
    CapacityExhausted {
        /// Number of entries held when growth failed.
        len: usize,
        /// Allocator failure.
        #[source]
        source: TryReserveError,
    },
}

/// Parameters of a single search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathRequest {
    /// Starting point in tile space.
    pub start: Waypoint,
    /// Destination in tile space.
    pub goal: Waypoint,
    /// Maximum number of waypoints returned; longer paths keep their goal end.
    pub max_depth: usize,
}

/// Owned search result.
#[derive(Clone, Debug, PartialEq)]
pub struct FoundPath {
    /// Waypoints from start (or the first kept hop) to goal.
    pub waypoints: Vec<Waypoint>,
    /// Length of the returned waypoints in tiles.
    pub length: f32,
}

/// Result of a search written into a caller-provided buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathSummary {
    /// Number of waypoints written.
    pub depth: usize,
    /// Length of the written waypoints in tiles.
    pub length: f32,
}

#[derive(Clone, Copy, Debug)]
struct SearchNode {
    cell: CellCoord,
    g: f32,
    depth: usize,
    parent: Option<usize>,
}

#[derive(Clone, Copy, Debug)]
struct OpenEntry {
    f: f32,
    node: usize,
}

/// Reusable search state. Buffers are reset, not reallocated, between searches.
#[derive(Debug, Default)]
pub struct Pathfinder {
    nodes: Vec<SearchNode>,
    open: Vec<OpenEntry>,
    closed: FixedBitSet,
    best_g: FxHashMap<usize, f32>,
    expanded: usize,
}

impl Pathfinder {
    /// Creates a pathfinder with empty buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Searches for a path and returns owned waypoints.
    ///
    /// Returns `Ok(None)` when either endpoint is off the grid or impassable,
    /// when `max_depth` is zero, or when no path exists.
    pub fn find_path<P>(
        &mut self,
        grid: &SearchGrid,
        request: PathRequest,
        passable: &P,
    ) -> Result<Option<FoundPath>, PathfindingError>
    where
        P: Fn(TileCell) -> bool + ?Sized,
    {
        if request.max_depth == 0 {
            return Ok(None);
        }
        let Some(goal) = self.search(grid, request, passable)? else {
            return Ok(None);
        };
        let chain = self.nodes[goal].depth;
        let mut waypoints = vec![Waypoint::default(); chain.min(request.max_depth)];
        let length = self.reconstruct(grid, request, goal, &mut waypoints);
        Ok(Some(FoundPath { waypoints, length }))
    }

    /// Searches for a path and writes it into `out`.
    ///
    /// The capacity is the smaller of `out.len()` and `request.max_depth`.
    /// Nothing is written when no path is found.
    pub fn find_path_into<P>(
        &mut self,
        grid: &SearchGrid,
        request: PathRequest,
        passable: &P,
        out: &mut [Waypoint],
    ) -> Result<Option<PathSummary>, PathfindingError>
    where
        P: Fn(TileCell) -> bool + ?Sized,
    {
        let capacity = out.len().min(request.max_depth);
        if capacity == 0 {
            return Ok(None);
        }
        let Some(goal) = self.search(grid, request, passable)? else {
            return Ok(None);
        };
        let depth = self.nodes[goal].depth.min(capacity);
        let length = self.reconstruct(grid, request, goal, &mut out[..depth]);
        Ok(Some(PathSummary { depth, length }))
    }

    fn reset(&mut self, grid: &SearchGrid) -> Result<(), PathfindingError> {
        self.nodes.clear();
        self.open.clear();
        self.best_g.clear();
        self.closed.clear();
        self.expanded = 0;

        let cells = grid.cell_count();
        if self.closed.len() < cells {
            reserve_bits(self.closed.len(), cells)?;
            self.closed.grow(cells);
        }
        Ok(())
    }

    fn search<P>(
        &mut self,
        grid: &SearchGrid,
        request: PathRequest,
        passable: &P,
    ) -> Result<Option<usize>, PathfindingError>
    where
        P: Fn(TileCell) -> bool + ?Sized,
    {
        self.reset(grid)?;
        let (Some(start), Some(goal)) = (grid.cell_at(request.start), grid.cell_at(request.goal))
        else {
            return Ok(None);
        };
        if !grid.is_passable(start, passable) || !grid.is_passable(goal, passable) {
            return Ok(None);
        }

        let probe = Probe {
            grid,
            passable,
            goal: (i64::from(goal.column()), i64::from(goal.row())),
        };
        self.open_node(
            SearchNode {
                cell: start,
                g: 0.0,
                depth: 1,
                parent: None,
            },
            octile(start, goal),
            grid,
        )?;

        let found = loop {
            let Some(entry) = self.open.pop() else {
                break None;
            };
            let node = self.nodes[entry.node];
            let Some(index) = grid.index(node.cell) else {
                continue;
            };
            if self.closed.put(index) {
                continue;
            }
            self.expanded += 1;
            if node.cell == goal {
                break Some(entry.node);
            }

            let arrival = node
                .parent
                .map(|parent| direction_between(self.nodes[parent].cell, node.cell));
            for (dx, dy) in probe.pruned_directions(node.cell, arrival) {
                let Some(jump_point) = probe.jump(cell_pos(node.cell), dx, dy) else {
                    continue;
                };
                let cell = CellCoord::new(jump_point.0 as u32, jump_point.1 as u32);
                let Some(jump_index) = grid.index(cell) else {
                    continue;
                };
                if self.closed.contains(jump_index) {
                    continue;
                }
                let g = node.g + euclidean(node.cell, cell);
                if self
                    .best_g
                    .get(&jump_index)
                    .is_some_and(|best| *best <= g)
                {
                    continue;
                }
                let _ = self.best_g.insert(jump_index, g);
                self.open_node(
                    SearchNode {
                        cell,
                        g,
                        depth: node.depth + 1,
                        parent: Some(entry.node),
                    },
                    g + octile(cell, goal) * HEURISTIC_INFLATION,
                    grid,
                )?;
            }
        };

        trace!(
            expanded = self.expanded,
            generated = self.nodes.len(),
            found = found.is_some(),
            "path search finished"
        );
        Ok(found)
    }

    fn open_node(
        &mut self,
        node: SearchNode,
        f: f32,
        grid: &SearchGrid,
    ) -> Result<(), PathfindingError> {
        reserve_one(&mut self.nodes)?;
        reserve_one(&mut self.open)?;
        if let Some(index) = grid.index(node.cell) {
            if node.parent.is_none() {
                let _ = self.best_g.insert(index, node.g);
            }
        }
        let entry = OpenEntry {
            f,
            node: self.nodes.len(),
        };
        self.nodes.push(node);
        // Sorted by descending f so the best entry pops from the back; equal
        // scores pop in insertion order.
        let position = self.open.partition_point(|open| open.f > f);
        self.open.insert(position, entry);
        Ok(())
    }

    /// Writes the goal-adjacent suffix of the chain ending at `goal` into `out`.
    fn reconstruct(
        &self,
        grid: &SearchGrid,
        request: PathRequest,
        goal: usize,
        out: &mut [Waypoint],
    ) -> f32 {
        let goal_g = self.nodes[goal].g;
        let mut cursor = Some(goal);
        let mut first_kept = goal;
        for slot in out.iter_mut().rev() {
            let Some(index) = cursor else {
                break;
            };
            let node = self.nodes[index];
            *slot = if node.parent.is_none() {
                request.start
            } else {
                grid.center_of(node.cell)
            };
            first_kept = index;
            cursor = node.parent;
        }
        if let Some(last) = out.last_mut() {
            *last = request.goal;
        }
        (goal_g - self.nodes[first_kept].g) / grid.granularity() as f32
    }
}

fn reserve_one<T>(buffer: &mut Vec<T>) -> Result<(), PathfindingError> {
    if buffer.len() < buffer.capacity() {
        return Ok(());
    }
    let len = buffer.len();
    buffer
        .try_reserve(buffer.capacity() + 1)
        .map_err(|source| PathfindingError::CapacityExhausted { len, source })
}

/// Fails when the allocator cannot back a closed set of `bits` cells.
///
/// `FixedBitSet` only grows infallibly, so its block storage is reserved
/// once up front and released before the set grows into it.
fn reserve_bits(len: usize, bits: usize) -> Result<(), PathfindingError> {
    let blocks = bits.div_ceil(usize::BITS as usize);
    let mut storage: Vec<usize> = Vec::new();
    storage
        .try_reserve_exact(blocks)
        .map_err(|source| PathfindingError::CapacityExhausted { len, source })
}

/// Passability oracle and goal shared by the jump routines.
struct Probe<'a, P: ?Sized> {
    grid: &'a SearchGrid,
    passable: &'a P,
    goal: (i64, i64),
}

impl<P> Probe<'_, P>
where
    P: Fn(TileCell) -> bool + ?Sized,
{
    fn open(&self, x: i64, y: i64) -> bool {
        let (Ok(column), Ok(row)) = (u32::try_from(x), u32::try_from(y)) else {
            return false;
        };
        self.grid
            .is_passable(CellCoord::new(column, row), self.passable)
    }

    fn can_step(&self, x: i64, y: i64, dx: i64, dy: i64) -> bool {
        if !self.open(x + dx, y + dy) {
            return false;
        }
        dx == 0 || dy == 0 || (self.open(x + dx, y) && self.open(x, y + dy))
    }

    fn forced(&self, x: i64, y: i64, dx: i64, dy: i64) -> bool {
        if dx != 0 {
            (self.open(x, y - 1) && !self.open(x - dx, y - 1))
                || (self.open(x, y + 1) && !self.open(x - dx, y + 1))
        } else {
            (self.open(x - 1, y) && !self.open(x - 1, y - dy))
                || (self.open(x + 1, y) && !self.open(x + 1, y - dy))
        }
    }

    /// Walks from `from` in direction `(dx, dy)` until reaching the goal, a
    /// forced neighbour, or a dead end.
    fn jump(&self, from: (i64, i64), dx: i64, dy: i64) -> Option<(i64, i64)> {
        let (mut x, mut y) = from;
        loop {
            if !self.can_step(x, y, dx, dy) {
                return None;
            }
            x += dx;
            y += dy;
            if (x, y) == self.goal {
                return Some((x, y));
            }
            if dx != 0 && dy != 0 {
                if self.jump((x, y), dx, 0).is_some() || self.jump((x, y), 0, dy).is_some() {
                    return Some((x, y));
                }
            } else if self.forced(x, y, dx, dy) {
                return Some((x, y));
            }
        }
    }

    fn pruned_directions(&self, cell: CellCoord, arrival: Option<(i64, i64)>) -> Directions {
        let mut directions = Directions::default();
        let (x, y) = cell_pos(cell);
        let Some((dx, dy)) = arrival else {
            for (dx, dy) in ALL_DIRECTIONS {
                directions.push(dx, dy);
            }
            return directions;
        };

        if dx != 0 && dy != 0 {
            let vertical = self.open(x, y + dy);
            let horizontal = self.open(x + dx, y);
            if vertical {
                directions.push(0, dy);
            }
            if horizontal {
                directions.push(dx, 0);
            }
            if vertical && horizontal {
                directions.push(dx, dy);
            }
        } else if dx != 0 {
            let next = self.open(x + dx, y);
            let below = self.open(x, y + 1);
            let above = self.open(x, y - 1);
            if next {
                directions.push(dx, 0);
                if below {
                    directions.push(dx, 1);
                }
                if above {
                    directions.push(dx, -1);
                }
            }
            if below {
                directions.push(0, 1);
            }
            if above {
                directions.push(0, -1);
            }
        } else {
            let next = self.open(x, y + dy);
            let right = self.open(x + 1, y);
            let left = self.open(x - 1, y);
            if next {
                directions.push(0, dy);
                if right {
                    directions.push(1, dy);
                }
                if left {
                    directions.push(-1, dy);
                }
            }
            if right {
                directions.push(1, 0);
            }
            if left {
                directions.push(-1, 0);
            }
        }
        directions
    }
}

const ALL_DIRECTIONS: [(i64, i64); 8] = [
    (0, -1),
    (1, 0),
    (0, 1),
    (-1, 0),
    (1, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
];

#[derive(Clone, Debug, Default)]
struct Directions {
    buffer: [(i64, i64); 8],
    len: usize,
    cursor: usize,
}

impl Directions {
    fn push(&mut self, dx: i64, dy: i64) {
        if self.len < self.buffer.len() {
            self.buffer[self.len] = (dx, dy);
            self.len += 1;
        }
    }
}

impl Iterator for Directions {
    type Item = (i64, i64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.len {
            return None;
        }
        let value = self.buffer[self.cursor];
        self.cursor += 1;
        Some(value)
    }
}

fn cell_pos(cell: CellCoord) -> (i64, i64) {
    (i64::from(cell.column()), i64::from(cell.row()))
}

fn direction_between(from: CellCoord, to: CellCoord) -> (i64, i64) {
    let (fx, fy) = cell_pos(from);
    let (tx, ty) = cell_pos(to);
    ((tx - fx).signum(), (ty - fy).signum())
}

fn euclidean(from: CellCoord, to: CellCoord) -> f32 {
    let dx = from.column().abs_diff(to.column()) as f32;
    let dy = from.row().abs_diff(to.row()) as f32;
    dx.hypot(dy)
}

fn octile(from: CellCoord, to: CellCoord) -> f32 {
    let dx = from.column().abs_diff(to.column()) as f32;
    let dy = from.row().abs_diff(to.row()) as f32;
    dx.max(dy) + (std::f32::consts::SQRT_2 - 1.0) * dx.min(dy)
}
