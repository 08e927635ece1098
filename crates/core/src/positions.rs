//! Position types for game objects

use serde::{Deserialize, Serialize};

/// Size of one tile in world pixels
pub const TILE_SIZE: f32 = 16.0;

/// Tile-based position (for tiles, fishing spots, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TilePosition {
    pub x: i32,
    pub y: i32,
}

impl TilePosition {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Convert tile position to world position (1 tile = 16 pixels)
    pub fn to_world(self) -> Vector2f {
        Vector2f {
            x: self.x as f32 * TILE_SIZE,
            y: self.y as f32 * TILE_SIZE,
        }
    }
}

/// World position or velocity in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2f {
    pub x: f32,
    pub y: f32,
}

impl Vector2f {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Convert world position to the tile containing it
    pub fn to_tiles(self) -> TilePosition {
        TilePosition {
            x: (self.x / TILE_SIZE).floor() as i32,
            y: (self.y / TILE_SIZE).floor() as i32,
        }
    }

    /// Calculate distance to another position
    pub fn distance_to(self, other: Vector2f) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}
