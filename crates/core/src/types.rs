//! Core type definitions

use serde::{Deserialize, Serialize};

/// Player team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Team {
    #[default]
    None = 0,
    Red = 1,
    Green = 2,
    Blue = 3,
    Yellow = 4,
    Pink = 5,
}

impl Team {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Red),
            2 => Some(Self::Green),
            3 => Some(Self::Blue),
            4 => Some(Self::Yellow),
            5 => Some(Self::Pink),
            _ => None,
        }
    }

    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Character difficulty chosen at character creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum CharacterDifficulty {
    #[default]
    Medium = 0,
    Hard = 1,
    Extreme = 2,
    Journey = 3,
}

impl CharacterDifficulty {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Medium),
            1 => Some(Self::Hard),
            2 => Some(Self::Extreme),
            3 => Some(Self::Journey),
            _ => None,
        }
    }
}

/// Buff type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BuffId(pub u16);

/// A buff with its remaining duration in ticks
///
/// The default value (id 0, 0 ticks) represents an empty buff slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Buff {
    pub id: BuffId,
    pub ticks: i32,
}

impl Buff {
    pub const fn new(id: BuffId, ticks: i32) -> Self {
        Self { id, ticks }
    }
}

/// NPC type identifier (negative values are net variants)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct NpcId(pub i16);

impl NpcId {
    pub const NONE: Self = Self(0);
    pub const BLUE_SLIME: Self = Self(1);
    pub const GREEN_SLIME: Self = Self(-3);
    pub const GOLDFISH: Self = Self(55);
}

/// Projectile type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ProjectileId(pub i16);

impl ProjectileId {
    pub const NONE: Self = Self(0);
    pub const WOODEN_ARROW: Self = Self(1);
    pub const FIRE_ARROW: Self = Self(2);
}

/// Item type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ItemId(pub i16);

impl ItemId {
    pub const NONE: Self = Self(0);
    pub const DIRT_BLOCK: Self = Self(2);
    pub const STONE_BLOCK: Self = Self(3);
    pub const TORCH: Self = Self(8);
    pub const GEL: Self = Self(23);
    pub const STONE_WALL: Self = Self(26);
    pub const DIRT_WALL: Self = Self(30);
    pub const SDMG: Self = Self(1553);
}

/// Item prefix (modifier)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ItemPrefix(pub u8);

impl ItemPrefix {
    pub const NONE: Self = Self(0);
    pub const UNREAL: Self = Self(82);
    /// Asks the host to roll a random prefix when the item is created
    pub const RANDOM: Self = Self(255);
}

/// 24-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color3 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color3 {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}
