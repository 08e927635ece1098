//! Tile values for the world grid
//!
//! A world is a column-addressed grid of [`Tile`]s. Each tile carries a
//! block layer, a wall layer, liquid, paint and wiring.

use serde::{Deserialize, Serialize};

/// Block type of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockId(pub u16);

impl BlockId {
    pub const DIRT: Self = Self(0);
    pub const STONE: Self = Self(1);
    pub const GRASS: Self = Self(2);
    pub const TORCHES: Self = Self(4);
    pub const TREES: Self = Self(5);
    pub const SWITCH: Self = Self(136);

    /// Block types that carry frame coordinates on the wire
    ///
    /// Only the multi-tile and styled blocks the host knows are listed.
    const FRAMED: [u16; 13] = [3, 4, 5, 10, 11, 12, 13, 14, 15, 18, 21, 28, 136];

    /// Whether tiles of this type send `frame_x`/`frame_y`
    pub fn has_frames(self) -> bool {
        Self::FRAMED.contains(&self.0)
    }
}

/// Wall type of a tile; `NONE` means no wall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WallId(pub u16);

impl WallId {
    pub const NONE: Self = Self(0);
    pub const STONE: Self = Self(1);
    pub const DIRT: Self = Self(2);
    pub const WOOD: Self = Self(4);
}

/// Paint applied to a block or wall; `NONE` means unpainted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PaintColor(pub u8);

impl PaintColor {
    pub const NONE: Self = Self(0);
    pub const RED: Self = Self(1);
    pub const ORANGE: Self = Self(2);
    pub const YELLOW: Self = Self(3);
}

/// Liquid kind held by a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Liquid {
    #[default]
    Water = 0,
    Lava = 1,
    Honey = 2,
    Shimmer = 3,
}

impl Liquid {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Water),
            1 => Some(Self::Lava),
            2 => Some(Self::Honey),
            3 => Some(Self::Shimmer),
            _ => None,
        }
    }

    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// One cell of the world grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tile {
    pub block_id: BlockId,
    pub is_block_active: bool,
    /// Block is switched off by an actuator and can be walked through
    pub is_block_actuated: bool,
    pub block_color: PaintColor,
    pub block_frame_x: i16,
    pub block_frame_y: i16,
    pub is_block_half: bool,
    /// Slope shape, 0 to 7
    pub block_slope: u8,

    pub wall_id: WallId,
    pub wall_color: PaintColor,

    /// Liquid level, 0 (dry) to 255 (full)
    pub liquid_amount: u8,
    pub liquid: Liquid,

    pub has_red_wire: bool,
    pub has_blue_wire: bool,
    pub has_green_wire: bool,
    pub has_yellow_wire: bool,
    pub has_actuator: bool,
}

impl Tile {
    /// An active block of the given type
    pub fn block(id: BlockId) -> Self {
        Self {
            block_id: id,
            is_block_active: true,
            ..Self::default()
        }
    }

    /// Whether any wire color runs through this tile
    #[inline]
    pub fn has_wire(&self) -> bool {
        self.has_red_wire || self.has_blue_wire || self.has_green_wire || self.has_yellow_wire
    }

    /// Remove the block layer, keeping wall, liquid and wiring
    pub fn clear_block(&mut self) {
        self.block_id = BlockId::DIRT;
        self.is_block_active = false;
        self.is_block_actuated = false;
        self.block_color = PaintColor::NONE;
        self.block_frame_x = 0;
        self.block_frame_y = 0;
        self.is_block_half = false;
        self.block_slope = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tile_is_empty() {
        let tile = Tile::default();
        assert_eq!(tile.block_id, BlockId::DIRT);
        assert!(!tile.is_block_active);
        assert_eq!(tile.wall_id, WallId::NONE);
        assert!(!tile.has_wire());
    }

    #[test]
    fn test_clear_block_keeps_wall() {
        let mut tile = Tile::block(BlockId::STONE);
        tile.wall_id = WallId::STONE;
        tile.block_color = PaintColor::RED;
        tile.clear_block();
        assert!(!tile.is_block_active);
        assert_eq!(tile.block_color, PaintColor::NONE);
        assert_eq!(tile.wall_id, WallId::STONE);
    }

    #[test]
    fn test_framed_blocks() {
        assert!(BlockId::TORCHES.has_frames());
        assert!(BlockId::SWITCH.has_frames());
        assert!(!BlockId::STONE.has_frames());
    }
}
