//! Block map used by adapters and tests as the [`TileMap`] collaborator.

use thiserror::Error;
use warren_core::{MovementMask, TileCell, TileMap};

/// Square grid of tiles, each carrying the movement capabilities that may cross it.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockMap {
    size: u32,
    tile_size: f32,
    tiles: Vec<MovementMask>,
}

/// Errors raised while parsing an ASCII map.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MapParseError {
    /// The rows do not form a square.
    #[error("row {row} does not match the map size of {rows}")]
    NotSquare {
        /// Number of rows found.
        rows: usize,
        /// Row whose length differs from the row count.
        row: usize,
    },
    /// A character does not denote a known block.
    #[error("unknown block '{symbol}' in row {row}")]
    UnknownBlock {
        /// Offending character.
        symbol: char,
        /// Row containing the character.
        row: usize,
    },
}

impl BlockMap {
    /// Creates a map where every tile is open floor.
    #[must_use]
    pub fn open(size: u32, tile_size: f32) -> Self {
        let count = usize::try_from(size).unwrap_or(0).pow(2);
        Self {
            size,
            tile_size,
            tiles: vec![MovementMask::WALK.union(MovementMask::DOOR); count],
        }
    }

    /// Parses a square map from ASCII rows.
    ///
    /// `.` is floor, `#` is rock, `~` is water, `^` is lava and `+` is a door.
    pub fn from_ascii<S: AsRef<str>>(rows: &[S], tile_size: f32) -> Result<Self, MapParseError> {
        let size = rows.len();
        let mut tiles = Vec::with_capacity(size * size);
        for (index, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.chars().count() != size {
                return Err(MapParseError::NotSquare { rows: size, row: index });
            }
            for symbol in row.chars() {
                let mask = match symbol {
                    '.' => MovementMask::WALK.union(MovementMask::DOOR),
                    '#' => MovementMask::NONE,
                    '~' => MovementMask::WADE,
                    '^' => MovementMask::LAVA,
                    '+' => MovementMask::DOOR,
                    other => {
                        return Err(MapParseError::UnknownBlock {
                            symbol: other,
                            row: index,
                        })
                    }
                };
                tiles.push(mask);
            }
        }
        Ok(Self {
            size: u32::try_from(size).unwrap_or(u32::MAX),
            tile_size,
            tiles,
        })
    }

    /// Replaces the capabilities of a single tile.
    pub fn set(&mut self, tile: TileCell, mask: MovementMask) {
        if let Some(index) = self.index(tile) {
            self.tiles[index] = mask;
        }
    }

    /// Iterator over every tile crossable with the provided mask, in row-major order.
    pub fn passable_tiles(&self, mask: MovementMask) -> impl Iterator<Item = TileCell> + '_ {
        (0..self.size)
            .flat_map(move |row| (0..self.size).map(move |column| TileCell::new(column, row)))
            .filter(move |tile| self.is_passable(*tile, mask))
    }

    fn index(&self, tile: TileCell) -> Option<usize> {
        if tile.column() >= self.size || tile.row() >= self.size {
            return None;
        }
        let width = usize::try_from(self.size).ok()?;
        let row = usize::try_from(tile.row()).ok()?;
        let column = usize::try_from(tile.column()).ok()?;
        Some(row * width + column)
    }
}

impl TileMap for BlockMap {
    fn is_passable(&self, tile: TileCell, mask: MovementMask) -> bool {
        self.index(tile)
            .and_then(|index| self.tiles.get(index))
            .is_some_and(|tile_mask| tile_mask.intersects(mask))
    }

    fn tile_size(&self) -> f32 {
        self.tile_size
    }

    fn map_size(&self) -> u32 {
        self.size
    }
}
