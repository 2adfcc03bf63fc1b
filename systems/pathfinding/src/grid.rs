//! Discretised search grid laid over the tile map.

use warren_core::{CellCoord, TileCell, TileMap, Waypoint};

/// Search grid subdividing every map tile into `granularity²` cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchGrid {
    granularity: u32,
    cells_per_edge: u32,
}

impl SearchGrid {
    /// Number of cells along one tile edge used when none is configured.
    pub const DEFAULT_GRANULARITY: u32 = 2;

    /// Creates a grid over a square map of `map_size` tiles.
    ///
    /// A granularity of zero is treated as one.
    #[must_use]
    pub fn new(map_size: u32, granularity: u32) -> Self {
        let granularity = granularity.max(1);
        Self {
            granularity,
            cells_per_edge: map_size.saturating_mul(granularity),
        }
    }

    /// Creates a grid sized to the provided map.
    #[must_use]
    pub fn for_map(map: &dyn TileMap, granularity: u32) -> Self {
        Self::new(map.map_size(), granularity)
    }

    /// Cells per tile edge.
    #[must_use]
    pub const fn granularity(&self) -> u32 {
        self.granularity
    }

    /// Cells along one edge of the whole grid.
    #[must_use]
    pub const fn cells_per_edge(&self) -> u32 {
        self.cells_per_edge
    }

    /// Total number of cells in the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let edge = usize::try_from(self.cells_per_edge).unwrap_or(0);
        edge.saturating_mul(edge)
    }

    /// Cell containing a tile-space point, if the point lies on the grid.
    #[must_use]
    pub fn cell_at(&self, point: Waypoint) -> Option<CellCoord> {
        let scale = self.granularity as f32;
        let column = (point.x * scale).floor();
        let row = (point.y * scale).floor();
        if !(column >= 0.0 && row >= 0.0) {
            return None;
        }
        let edge = self.cells_per_edge as f32;
        if column >= edge || row >= edge {
            return None;
        }
        Some(CellCoord::new(column as u32, row as u32))
    }

    /// Centre of a cell in tile space.
    #[must_use]
    pub fn center_of(&self, cell: CellCoord) -> Waypoint {
        let scale = self.granularity as f32;
        Waypoint::new(
            (cell.column() as f32 + 0.5) / scale,
            (cell.row() as f32 + 0.5) / scale,
        )
    }

    /// Map tile overlapped by a cell.
    #[must_use]
    pub fn tile_of(&self, cell: CellCoord) -> TileCell {
        TileCell::new(
            cell.column() / self.granularity,
            cell.row() / self.granularity,
        )
    }

    /// Linear index of a cell, used to key dense per-cell storage.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let edge = usize::try_from(self.cells_per_edge).ok()?;
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        Some(row * edge + column)
    }

    /// Reports whether a cell lies on the grid.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.cells_per_edge && cell.row() < self.cells_per_edge
    }

    /// Reports whether a cell lies on the grid and its tile satisfies `passable`.
    pub fn is_passable<P>(&self, cell: CellCoord, passable: &P) -> bool
    where
        P: Fn(TileCell) -> bool + ?Sized,
    {
        self.contains(cell) && passable(self.tile_of(cell))
    }
}
