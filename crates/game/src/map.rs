//! # World Tile Map
//!
//! The host's tile grid. Tiles are stored column by column, matching the
//! order tile squares use on the wire.

use std::fmt;

use hookwire_core::Tile;
use parking_lot::RwLock;

/// Fixed-size grid of tiles owned by the host
///
/// Coordinates are signed so wire values can be passed straight through;
/// anything outside the grid reads as `None` and ignores writes.
pub struct TileMap {
    width: usize,
    height: usize,
    tiles: RwLock<Vec<Tile>>,
}

impl TileMap {
    /// Create a grid of empty tiles
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            tiles: RwLock::new(vec![Tile::default(); width * height]),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok().filter(|x| *x < self.width)?;
        let y = usize::try_from(y).ok().filter(|y| *y < self.height)?;
        Some(x * self.height + y)
    }

    /// Whether `(x, y)` lies inside the grid
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.offset(x, y).is_some()
    }

    /// Copy of the tile at `(x, y)`
    pub fn get(&self, x: i32, y: i32) -> Option<Tile> {
        let offset = self.offset(x, y)?;
        Some(self.tiles.read()[offset])
    }

    /// Overwrite the tile at `(x, y)`
    ///
    /// # Returns
    /// `false` if the position is outside the grid
    pub fn set(&self, x: i32, y: i32, tile: Tile) -> bool {
        self.update(x, y, |slot| *slot = tile).is_some()
    }

    /// Edit the tile at `(x, y)` in place
    ///
    /// The grid is write-locked while `f` runs, so `f` must not touch the
    /// map again.
    pub fn update<R>(&self, x: i32, y: i32, f: impl FnOnce(&mut Tile) -> R) -> Option<R> {
        let offset = self.offset(x, y)?;
        Some(f(&mut self.tiles.write()[offset]))
    }
}

impl fmt::Debug for TileMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileMap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}
