//! # Packet and Module Identifiers
//!
//! Every wire message starts with a `u16` little-endian frame length (header
//! included) followed by a one byte packet id. One reserved id, [`PacketId::Module`],
//! carries a nested `u16` module id that selects a second namespace of 65536
//! module kinds.
//!
//! ```text
//! {u16 length}{u8 id}{payload}
//! {u16 length}{82}{u16 module}{module payload}
//! ```

/// Size of the frame length header in bytes
pub const HEADER_LEN: usize = 2;

/// Packet id reserved for module packets
pub const MODULE_PACKET_ID: u8 = 82;

/// Number of primary packet kinds
pub const PACKET_KIND_COUNT: usize = 256;

/// Number of module kinds nested under [`MODULE_PACKET_ID`]
pub const MODULE_KIND_COUNT: usize = 65536;

/// The side of the protocol that authored a message
///
/// Some kinds carry different fields depending on who wrote them, so both
/// reading and writing need to know the author. Inbound packets were authored
/// by a client; outbound packets are authored by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketRole {
    /// Message written by a game client
    Client,
    /// Message written by the game server
    Server,
}

/// Statically known primary packet kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketId {
    /// Client announces its game version
    ///
    /// # Packet Format
    /// ```text
    /// {1}{STRING version}
    /// ```
    ClientConnect = 1,

    /// Client finished loading and joins the world
    ///
    /// # Packet Format
    /// ```text
    /// {6}
    /// ```
    PlayerJoin = 6,

    /// Player health update
    ///
    /// # Packet Format
    /// ```text
    /// {16}{U8 player}{I16 health}{I16 max_health}
    /// ```
    PlayerHealth = 16,

    /// Player modifies a tile: breaks or places a block or wall
    ///
    /// # Packet Format
    /// ```text
    /// {17}{U8 modification}{I16 x}{I16 y}{I16 data}{U8 style}
    /// ```
    /// `data` is the block or wall type for placements and a failure flag
    /// (`1`) for breaks.
    TileModify = 17,

    /// Square of tiles, anchored at its top left corner
    ///
    /// # Packet Format
    /// ```text
    /// {20}{U16 size}[{U8 change_type}]{I16 x}{I16 y}{TILE}*(size*size)
    /// ```
    /// The change type is present when bit 15 of `size` is set. Tiles are
    /// listed column by column.
    TileSquare = 20,

    /// Player toggles PvP
    ///
    /// # Packet Format
    /// ```text
    /// {30}{U8 player}{BOOL pvp}
    /// ```
    PlayerPvp = 30,

    /// Client answers a password challenge
    ///
    /// # Packet Format
    /// ```text
    /// {38}{STRING password}
    /// ```
    ClientPassword = 38,

    /// Player mana update
    ///
    /// # Packet Format
    /// ```text
    /// {42}{U8 player}{I16 mana}{I16 max_mana}
    /// ```
    PlayerMana = 42,

    /// Player changes team
    ///
    /// # Packet Format
    /// ```text
    /// {45}{U8 player}{U8 team}
    /// ```
    PlayerTeam = 45,

    /// Liquid settles on a tile
    ///
    /// # Packet Format
    /// ```text
    /// {48}{I16 x}{I16 y}{U8 amount}{U8 liquid}
    /// ```
    TileLiquid = 48,

    /// Player applies a buff to an NPC
    ///
    /// # Packet Format
    /// ```text
    /// {53}{I16 npc}{U16 buff}{U16 ticks}
    /// ```
    NpcBuff = 53,

    /// Player hits a wired tile, e.g. a switch
    ///
    /// # Packet Format
    /// ```text
    /// {59}{I16 x}{I16 y}
    /// ```
    WireActivate = 59,

    /// Player paints a block
    ///
    /// # Packet Format
    /// ```text
    /// {63}{I16 x}{I16 y}{U8 color}
    /// ```
    BlockPaint = 63,

    /// Player paints a wall
    ///
    /// # Packet Format
    /// ```text
    /// {64}{I16 x}{I16 y}{U8 color}
    /// ```
    WallPaint = 64,

    /// Client sends its UUID
    ///
    /// # Packet Format
    /// ```text
    /// {68}{STRING uuid}
    /// ```
    ClientUuid = 68,

    /// Player catches a critter NPC
    ///
    /// # Packet Format
    /// ```text
    /// {70}{I16 npc}{U8 player}
    /// ```
    NpcCatch = 70,

    /// Module packet, see [`ModuleId`]
    Module = 82,

    /// Player fishes up an NPC
    ///
    /// # Packet Format
    /// ```text
    /// {130}{U16 x}{U16 y}{I16 npc_id}
    /// ```
    NpcFish = 130,
}

impl PacketId {
    /// Every known packet id, in ascending order
    pub const ALL: [PacketId; 18] = [
        Self::ClientConnect,
        Self::PlayerJoin,
        Self::PlayerHealth,
        Self::TileModify,
        Self::TileSquare,
        Self::PlayerPvp,
        Self::ClientPassword,
        Self::PlayerMana,
        Self::PlayerTeam,
        Self::TileLiquid,
        Self::NpcBuff,
        Self::WireActivate,
        Self::BlockPaint,
        Self::WallPaint,
        Self::ClientUuid,
        Self::NpcCatch,
        Self::Module,
        Self::NpcFish,
    ];

    /// Convert a raw id byte to a known packet id
    ///
    /// # Returns
    /// `None` for ids that this library does not interpret
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::ClientConnect),
            6 => Some(Self::PlayerJoin),
            16 => Some(Self::PlayerHealth),
            17 => Some(Self::TileModify),
            20 => Some(Self::TileSquare),
            30 => Some(Self::PlayerPvp),
            38 => Some(Self::ClientPassword),
            42 => Some(Self::PlayerMana),
            45 => Some(Self::PlayerTeam),
            48 => Some(Self::TileLiquid),
            53 => Some(Self::NpcBuff),
            59 => Some(Self::WireActivate),
            63 => Some(Self::BlockPaint),
            64 => Some(Self::WallPaint),
            68 => Some(Self::ClientUuid),
            70 => Some(Self::NpcCatch),
            82 => Some(Self::Module),
            130 => Some(Self::NpcFish),
            _ => None,
        }
    }

    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Statically known module kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ModuleId {
    /// Chat message or command
    Chat = 1,
}

impl ModuleId {
    pub const ALL: [ModuleId; 1] = [Self::Chat];

    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(Self::Chat),
            _ => None,
        }
    }

    #[inline]
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_id_conversion() {
        for id in PacketId::ALL {
            assert_eq!(PacketId::from_u8(id.as_u8()), Some(id));
        }
        assert_eq!(PacketId::from_u8(255), None);
        assert_eq!(PacketId::Module.as_u8(), MODULE_PACKET_ID);
    }

    #[test]
    fn test_module_id_conversion() {
        assert_eq!(ModuleId::from_u16(1), Some(ModuleId::Chat));
        assert_eq!(ModuleId::from_u16(65535), None);
    }
}
