//! # Packet Structures
//!
//! One struct per known packet kind, plus [`UnknownPacket`] for everything
//! else. All of them implement [`Packet`], the codec contract the dispatch
//! layer is generic over.
//!
//! `read`/`write` only see the payload: the frame header and the id byte are
//! handled by [`Packet::decode`] and [`Packet::encode_frame`].

use std::fmt::Debug;

use bytes::{BufMut, BytesMut};
use hookwire_core::{BlockId, BuffId, HookwireError, Liquid, NpcId, PaintColor, Result, Team, Tile, WallId};

use super::codecs::*;
use super::packets::{PacketId, PacketRole, HEADER_LEN};

/// Codec contract for one packet kind
pub trait Packet: Clone + Debug + Send + Sync + 'static {
    /// Raw id byte of this packet
    fn id(&self) -> u8;

    /// Read the payload that followed the id byte
    ///
    /// # Arguments
    /// * `id` - The id byte the payload arrived with
    /// * `buf` - Cursor over the payload; advanced past what was read
    /// * `role` - The side that authored the message
    fn read(id: u8, buf: &mut &[u8], role: PacketRole) -> Result<Self>;

    /// Append the payload (without the id byte) to `buf`
    fn write(&self, buf: &mut BytesMut, role: PacketRole) -> Result<()>;

    /// Decode a payload that must be consumed exactly
    ///
    /// # Returns
    /// The packet, or [`HookwireError::Framing`] if bytes are left over
    fn decode(id: u8, payload: &[u8], role: PacketRole) -> Result<Self> {
        let mut cursor = payload;
        let packet = Self::read(id, &mut cursor, role)?;
        if !cursor.is_empty() {
            return Err(HookwireError::Framing {
                expected: payload.len(),
                consumed: payload.len() - cursor.len(),
            });
        }
        Ok(packet)
    }

    /// Append a complete frame (length header, id byte, payload) to `buf`
    ///
    /// # Returns
    /// The number of bytes written, which is also the value of the header
    fn encode_frame(&self, buf: &mut BytesMut, role: PacketRole) -> Result<usize> {
        let start = buf.len();
        buf.put_u16_le(0);
        buf.put_u8(self.id());
        self.write(buf, role)?;

        let written = buf.len() - start;
        let header = u16::try_from(written).map_err(|_| {
            HookwireError::Protocol(format!("Frame of {} bytes does not fit the length header", written))
        })?;
        buf[start..start + HEADER_LEN].copy_from_slice(&header.to_le_bytes());
        Ok(written)
    }

    /// Encode into a fresh buffer
    fn to_frame(&self, role: PacketRole) -> Result<BytesMut> {
        let mut buf = BytesMut::new();
        self.encode_frame(&mut buf, role)?;
        Ok(buf)
    }
}

/// A packet kind with a statically known id
pub trait KnownPacket: Packet + Default {
    const ID: PacketId;
}

macro_rules! known_packet {
    ($ty:ty, $id:expr) => {
        impl KnownPacket for $ty {
            const ID: PacketId = $id;
        }
    };
}

/// Client announces its game version
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConnectPacket {
    pub version: String,
}

impl Packet for ClientConnectPacket {
    fn id(&self) -> u8 {
        Self::ID.as_u8()
    }

    fn read(_id: u8, buf: &mut &[u8], _role: PacketRole) -> Result<Self> {
        Ok(Self { version: read_string(buf)? })
    }

    fn write(&self, buf: &mut BytesMut, _role: PacketRole) -> Result<()> {
        write_string(buf, &self.version);
        Ok(())
    }
}

known_packet!(ClientConnectPacket, PacketId::ClientConnect);

/// Client joins the world
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerJoinPacket;

impl Packet for PlayerJoinPacket {
    fn id(&self) -> u8 {
        Self::ID.as_u8()
    }

    fn read(_id: u8, _buf: &mut &[u8], _role: PacketRole) -> Result<Self> {
        Ok(Self)
    }

    fn write(&self, _buf: &mut BytesMut, _role: PacketRole) -> Result<()> {
        Ok(())
    }
}

known_packet!(PlayerJoinPacket, PacketId::PlayerJoin);

/// Player health update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerHealthPacket {
    pub player_index: u8,
    pub health: i16,
    pub max_health: i16,
}

impl Packet for PlayerHealthPacket {
    fn id(&self) -> u8 {
        Self::ID.as_u8()
    }

    fn read(_id: u8, buf: &mut &[u8], _role: PacketRole) -> Result<Self> {
        Ok(Self {
            player_index: read_u8(buf)?,
            health: read_i16(buf)?,
            max_health: read_i16(buf)?,
        })
    }

    fn write(&self, buf: &mut BytesMut, _role: PacketRole) -> Result<()> {
        write_u8(buf, self.player_index);
        write_i16(buf, self.health);
        write_i16(buf, self.max_health);
        Ok(())
    }
}

known_packet!(PlayerHealthPacket, PacketId::PlayerHealth);

/// Player toggles PvP
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerPvpPacket {
    pub player_index: u8,
    pub is_in_pvp: bool,
}

impl Packet for PlayerPvpPacket {
    fn id(&self) -> u8 {
        Self::ID.as_u8()
    }

    fn read(_id: u8, buf: &mut &[u8], _role: PacketRole) -> Result<Self> {
        Ok(Self {
            player_index: read_u8(buf)?,
            is_in_pvp: read_bool(buf)?,
        })
    }

    fn write(&self, buf: &mut BytesMut, _role: PacketRole) -> Result<()> {
        write_u8(buf, self.player_index);
        write_bool(buf, self.is_in_pvp);
        Ok(())
    }
}

known_packet!(PlayerPvpPacket, PacketId::PlayerPvp);

/// Client answers a password challenge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientPasswordPacket {
    pub password: String,
}

impl Packet for ClientPasswordPacket {
    fn id(&self) -> u8 {
        Self::ID.as_u8()
    }

    fn read(_id: u8, buf: &mut &[u8], _role: PacketRole) -> Result<Self> {
        Ok(Self { password: read_string(buf)? })
    }

    fn write(&self, buf: &mut BytesMut, _role: PacketRole) -> Result<()> {
        write_string(buf, &self.password);
        Ok(())
    }
}

known_packet!(ClientPasswordPacket, PacketId::ClientPassword);

/// Player mana update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerManaPacket {
    pub player_index: u8,
    pub mana: i16,
    pub max_mana: i16,
}

impl Packet for PlayerManaPacket {
    fn id(&self) -> u8 {
        Self::ID.as_u8()
    }

    fn read(_id: u8, buf: &mut &[u8], _role: PacketRole) -> Result<Self> {
        Ok(Self {
            player_index: read_u8(buf)?,
            mana: read_i16(buf)?,
            max_mana: read_i16(buf)?,
        })
    }

    fn write(&self, buf: &mut BytesMut, _role: PacketRole) -> Result<()> {
        write_u8(buf, self.player_index);
        write_i16(buf, self.mana);
        write_i16(buf, self.max_mana);
        Ok(())
    }
}

known_packet!(PlayerManaPacket, PacketId::PlayerMana);

/// Player changes team
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerTeamPacket {
    pub player_index: u8,
    pub team: Team,
}

impl Packet for PlayerTeamPacket {
    fn id(&self) -> u8 {
        Self::ID.as_u8()
    }

    fn read(_id: u8, buf: &mut &[u8], _role: PacketRole) -> Result<Self> {
        let player_index = read_u8(buf)?;
        let raw = read_u8(buf)?;
        let team = Team::from_u8(raw)
            .ok_or_else(|| HookwireError::InvalidData(format!("Unknown team: {}", raw)))?;
        Ok(Self { player_index, team })
    }

    fn write(&self, buf: &mut BytesMut, _role: PacketRole) -> Result<()> {
        write_u8(buf, self.player_index);
        write_u8(buf, self.team.as_u8());
        Ok(())
    }
}

known_packet!(PlayerTeamPacket, PacketId::PlayerTeam);

/// Player applies a buff to an NPC
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NpcBuffPacket {
    pub npc_index: i16,
    pub id: BuffId,
    /// Duration in ticks; unsigned on the wire
    pub ticks: i16,
}

impl Packet for NpcBuffPacket {
    fn id(&self) -> u8 {
        Self::ID.as_u8()
    }

    fn read(_id: u8, buf: &mut &[u8], _role: PacketRole) -> Result<Self> {
        Ok(Self {
            npc_index: read_i16(buf)?,
            id: BuffId(read_u16(buf)?),
            ticks: read_u16(buf)? as i16,
        })
    }

    fn write(&self, buf: &mut BytesMut, _role: PacketRole) -> Result<()> {
        write_i16(buf, self.npc_index);
        write_u16(buf, self.id.0);
        write_u16(buf, self.ticks as u16);
        Ok(())
    }
}

known_packet!(NpcBuffPacket, PacketId::NpcBuff);

/// Client sends its UUID
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientUuidPacket {
    pub uuid: String,
}

impl Packet for ClientUuidPacket {
    fn id(&self) -> u8 {
        Self::ID.as_u8()
    }

    fn read(_id: u8, buf: &mut &[u8], _role: PacketRole) -> Result<Self> {
        Ok(Self { uuid: read_string(buf)? })
    }

    fn write(&self, buf: &mut BytesMut, _role: PacketRole) -> Result<()> {
        write_string(buf, &self.uuid);
        Ok(())
    }
}

known_packet!(ClientUuidPacket, PacketId::ClientUuid);

/// Player catches a critter NPC
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NpcCatchPacket {
    pub npc_index: i16,
    pub player_index: u8,
}

impl Packet for NpcCatchPacket {
    fn id(&self) -> u8 {
        Self::ID.as_u8()
    }

    fn read(_id: u8, buf: &mut &[u8], _role: PacketRole) -> Result<Self> {
        Ok(Self {
            npc_index: read_i16(buf)?,
            player_index: read_u8(buf)?,
        })
    }

    fn write(&self, buf: &mut BytesMut, _role: PacketRole) -> Result<()> {
        write_i16(buf, self.npc_index);
        write_u8(buf, self.player_index);
        Ok(())
    }
}

known_packet!(NpcCatchPacket, PacketId::NpcCatch);

/// Player fishes up an NPC at a tile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NpcFishPacket {
    pub x: u16,
    pub y: u16,
    pub npc_id: NpcId,
}

impl Packet for NpcFishPacket {
    fn id(&self) -> u8 {
        Self::ID.as_u8()
    }

    fn read(_id: u8, buf: &mut &[u8], _role: PacketRole) -> Result<Self> {
        Ok(Self {
            x: read_u16(buf)?,
            y: read_u16(buf)?,
            npc_id: NpcId(read_i16(buf)?),
        })
    }

    fn write(&self, buf: &mut BytesMut, _role: PacketRole) -> Result<()> {
        write_u16(buf, self.x);
        write_u16(buf, self.y);
        write_i16(buf, self.npc_id.0);
        Ok(())
    }
}

known_packet!(NpcFishPacket, PacketId::NpcFish);

/// What a [`TileModifyPacket`] does to its tile
///
/// Kept as a raw byte so unknown modifications still decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TileModification(pub u8);

impl TileModification {
    pub const BREAK_BLOCK: Self = Self(0);
    pub const PLACE_BLOCK: Self = Self(1);
    pub const BREAK_WALL: Self = Self(2);
    pub const PLACE_WALL: Self = Self(3);
    /// Break a block without dropping its item
    pub const BREAK_BLOCK_ITEMLESS: Self = Self(4);
    pub const REPLACE_BLOCK: Self = Self(21);
    pub const REPLACE_WALL: Self = Self(22);
}

/// Player modifies a tile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileModifyPacket {
    pub modification: TileModification,
    pub x: i16,
    pub y: i16,
    /// Block or wall type for placements, failure flag for breaks
    pub data: i16,
    pub style: u8,
}

impl TileModifyPacket {
    /// A break the client already knows failed; the tile only took damage
    #[inline]
    pub fn is_failure(&self) -> bool {
        self.data == 1
    }

    #[inline]
    pub fn block_id(&self) -> BlockId {
        BlockId(self.data as u16)
    }

    #[inline]
    pub fn wall_id(&self) -> WallId {
        WallId(self.data as u16)
    }
}

impl Packet for TileModifyPacket {
    fn id(&self) -> u8 {
        Self::ID.as_u8()
    }

    fn read(_id: u8, buf: &mut &[u8], _role: PacketRole) -> Result<Self> {
        Ok(Self {
            modification: TileModification(read_u8(buf)?),
            x: read_i16(buf)?,
            y: read_i16(buf)?,
            data: read_i16(buf)?,
            style: read_u8(buf)?,
        })
    }

    fn write(&self, buf: &mut BytesMut, _role: PacketRole) -> Result<()> {
        write_u8(buf, self.modification.0);
        write_i16(buf, self.x);
        write_i16(buf, self.y);
        write_i16(buf, self.data);
        write_u8(buf, self.style);
        Ok(())
    }
}

known_packet!(TileModifyPacket, PacketId::TileModify);

const SQUARE_CHANGE_TYPE_FLAG: u16 = 0x8000;

/// Square of tiles
///
/// `tiles` holds `size * size` entries, column by column: the tile at
/// offset `(i, j)` from the corner is `tiles[i * size + j]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileSquarePacket {
    pub size: u16,
    pub change_type: Option<u8>,
    pub x: i16,
    pub y: i16,
    pub tiles: Vec<Tile>,
}

impl TileSquarePacket {
    #[inline]
    fn offset(&self, i: usize, j: usize) -> Option<usize> {
        let size = self.size as usize;
        (i < size && j < size).then_some(i * size + j)
    }

    /// Tile at column `i`, row `j` of the square
    pub fn tile(&self, i: usize, j: usize) -> Option<&Tile> {
        self.offset(i, j).and_then(|index| self.tiles.get(index))
    }

    pub fn tile_mut(&mut self, i: usize, j: usize) -> Option<&mut Tile> {
        self.offset(i, j).and_then(move |index| self.tiles.get_mut(index))
    }
}

impl Packet for TileSquarePacket {
    fn id(&self) -> u8 {
        Self::ID.as_u8()
    }

    fn read(_id: u8, buf: &mut &[u8], _role: PacketRole) -> Result<Self> {
        let raw_size = read_u16(buf)?;
        let change_type = if raw_size & SQUARE_CHANGE_TYPE_FLAG != 0 {
            Some(read_u8(buf)?)
        } else {
            None
        };
        let size = raw_size & !SQUARE_CHANGE_TYPE_FLAG;
        let x = read_i16(buf)?;
        let y = read_i16(buf)?;

        // Every tile takes at least two bytes, so a short buffer fails early
        let count = size as usize * size as usize;
        let mut tiles = Vec::with_capacity(count.min(buf.len() / 2));
        for _ in 0..count {
            tiles.push(read_tile(buf)?);
        }

        Ok(Self { size, change_type, x, y, tiles })
    }

    fn write(&self, buf: &mut BytesMut, _role: PacketRole) -> Result<()> {
        let count = self.size as usize * self.size as usize;
        if self.size & SQUARE_CHANGE_TYPE_FLAG != 0 || self.tiles.len() != count {
            return Err(HookwireError::Protocol(format!(
                "Tile square of size {} holds {} tiles",
                self.size,
                self.tiles.len()
            )));
        }

        match self.change_type {
            Some(change_type) => {
                write_u16(buf, self.size | SQUARE_CHANGE_TYPE_FLAG);
                write_u8(buf, change_type);
            }
            None => write_u16(buf, self.size),
        }
        write_i16(buf, self.x);
        write_i16(buf, self.y);
        for tile in &self.tiles {
            write_tile(buf, tile);
        }
        Ok(())
    }
}

known_packet!(TileSquarePacket, PacketId::TileSquare);

/// Read one tile of a tile square
///
/// # Format
/// ```text
/// {U8 header}{U8 flags}[{U8 block_color}][{U8 wall_color}]
/// [{U16 block}[{I16 frame_x}{I16 frame_y}]][{U16 wall}][{U8 amount}{U8 liquid}]
/// ```
/// Header bits: active, unused, wall, liquid, red wire, half block,
/// actuator, actuated. Flag bits: blue wire, green wire, block color,
/// wall color, three slope bits, yellow wire.
fn read_tile(buf: &mut &[u8]) -> Result<Tile> {
    let header = read_u8(buf)?;
    let flags = read_u8(buf)?;

    let mut tile = Tile {
        is_block_active: header & 0x01 != 0,
        has_red_wire: header & 0x10 != 0,
        is_block_half: header & 0x20 != 0,
        has_actuator: header & 0x40 != 0,
        is_block_actuated: header & 0x80 != 0,
        has_blue_wire: flags & 0x01 != 0,
        has_green_wire: flags & 0x02 != 0,
        block_slope: (flags >> 4) & 0x07,
        has_yellow_wire: flags & 0x80 != 0,
        ..Tile::default()
    };

    if flags & 0x04 != 0 {
        tile.block_color = PaintColor(read_u8(buf)?);
    }
    if flags & 0x08 != 0 {
        tile.wall_color = PaintColor(read_u8(buf)?);
    }
    if tile.is_block_active {
        tile.block_id = BlockId(read_u16(buf)?);
        if tile.block_id.has_frames() {
            tile.block_frame_x = read_i16(buf)?;
            tile.block_frame_y = read_i16(buf)?;
        }
    }
    if header & 0x04 != 0 {
        tile.wall_id = WallId(read_u16(buf)?);
    }
    if header & 0x08 != 0 {
        tile.liquid_amount = read_u8(buf)?;
        let raw = read_u8(buf)?;
        tile.liquid = Liquid::from_u8(raw)
            .ok_or_else(|| HookwireError::InvalidData(format!("Unknown liquid: {}", raw)))?;
    }
    Ok(tile)
}

fn write_tile(buf: &mut BytesMut, tile: &Tile) {
    let has_wall = tile.wall_id != WallId::NONE;
    let has_liquid = tile.liquid_amount > 0;
    let has_block_color = tile.block_color != PaintColor::NONE;
    let has_wall_color = tile.wall_color != PaintColor::NONE;

    let header = tile.is_block_active as u8
        | (has_wall as u8) << 2
        | (has_liquid as u8) << 3
        | (tile.has_red_wire as u8) << 4
        | (tile.is_block_half as u8) << 5
        | (tile.has_actuator as u8) << 6
        | (tile.is_block_actuated as u8) << 7;
    let flags = tile.has_blue_wire as u8
        | (tile.has_green_wire as u8) << 1
        | (has_block_color as u8) << 2
        | (has_wall_color as u8) << 3
        | (tile.block_slope & 0x07) << 4
        | (tile.has_yellow_wire as u8) << 7;
    write_u8(buf, header);
    write_u8(buf, flags);

    if has_block_color {
        write_u8(buf, tile.block_color.0);
    }
    if has_wall_color {
        write_u8(buf, tile.wall_color.0);
    }
    if tile.is_block_active {
        write_u16(buf, tile.block_id.0);
        if tile.block_id.has_frames() {
            write_i16(buf, tile.block_frame_x);
            write_i16(buf, tile.block_frame_y);
        }
    }
    if has_wall {
        write_u16(buf, tile.wall_id.0);
    }
    if has_liquid {
        write_u8(buf, tile.liquid_amount);
        write_u8(buf, tile.liquid.as_u8());
    }
}

/// Liquid settles on a tile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileLiquidPacket {
    pub x: i16,
    pub y: i16,
    pub amount: u8,
    pub liquid: Liquid,
}

impl Packet for TileLiquidPacket {
    fn id(&self) -> u8 {
        Self::ID.as_u8()
    }

    fn read(_id: u8, buf: &mut &[u8], _role: PacketRole) -> Result<Self> {
        let x = read_i16(buf)?;
        let y = read_i16(buf)?;
        let amount = read_u8(buf)?;
        let raw = read_u8(buf)?;
        let liquid =
            Liquid::from_u8(raw).ok_or_else(|| HookwireError::InvalidData(format!("Unknown liquid: {}", raw)))?;
        Ok(Self { x, y, amount, liquid })
    }

    fn write(&self, buf: &mut BytesMut, _role: PacketRole) -> Result<()> {
        write_i16(buf, self.x);
        write_i16(buf, self.y);
        write_u8(buf, self.amount);
        write_u8(buf, self.liquid.as_u8());
        Ok(())
    }
}

known_packet!(TileLiquidPacket, PacketId::TileLiquid);

/// Player hits a wired tile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WireActivatePacket {
    pub x: i16,
    pub y: i16,
}

impl Packet for WireActivatePacket {
    fn id(&self) -> u8 {
        Self::ID.as_u8()
    }

    fn read(_id: u8, buf: &mut &[u8], _role: PacketRole) -> Result<Self> {
        Ok(Self {
            x: read_i16(buf)?,
            y: read_i16(buf)?,
        })
    }

    fn write(&self, buf: &mut BytesMut, _role: PacketRole) -> Result<()> {
        write_i16(buf, self.x);
        write_i16(buf, self.y);
        Ok(())
    }
}

known_packet!(WireActivatePacket, PacketId::WireActivate);

macro_rules! paint_packet {
    ($(#[$doc:meta])* $name:ident, $id:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name {
            pub x: i16,
            pub y: i16,
            pub color: PaintColor,
        }

        impl Packet for $name {
            fn id(&self) -> u8 {
                Self::ID.as_u8()
            }

            fn read(_id: u8, buf: &mut &[u8], _role: PacketRole) -> Result<Self> {
                Ok(Self {
                    x: read_i16(buf)?,
                    y: read_i16(buf)?,
                    color: PaintColor(read_u8(buf)?),
                })
            }

            fn write(&self, buf: &mut BytesMut, _role: PacketRole) -> Result<()> {
                write_i16(buf, self.x);
                write_i16(buf, self.y);
                write_u8(buf, self.color.0);
                Ok(())
            }
        }

        known_packet!($name, $id);
    };
}

paint_packet!(
    /// Player paints a block
    BlockPaintPacket,
    PacketId::BlockPaint
);

paint_packet!(
    /// Player paints a wall
    WallPaintPacket,
    PacketId::WallPaint
);

/// Any packet kind this library does not interpret
///
/// The id is kept and the payload is carried through untouched, so an
/// unknown packet re-encodes to exactly the bytes it was read from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnknownPacket {
    pub id: u8,
    pub payload: Vec<u8>,
}

impl UnknownPacket {
    /// Payload length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

impl Packet for UnknownPacket {
    fn id(&self) -> u8 {
        self.id
    }

    fn read(id: u8, buf: &mut &[u8], _role: PacketRole) -> Result<Self> {
        Ok(Self { id, payload: read_remaining(buf) })
    }

    fn write(&self, buf: &mut BytesMut, _role: PacketRole) -> Result<()> {
        buf.put_slice(&self.payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_health_frame() {
        let packet = PlayerHealthPacket { player_index: 5, health: 100, max_health: 500 };
        let frame = packet.to_frame(PacketRole::Client).unwrap();
        assert_eq!(&frame[..], &[8, 0, 16, 5, 100, 0, 244, 1]);

        let decoded = PlayerHealthPacket::decode(16, &frame[3..], PacketRole::Client).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_client_password_decode() {
        let payload = [8, 84, 101, 114, 114, 97, 114, 105, 97];
        let packet = ClientPasswordPacket::decode(38, &payload, PacketRole::Client).unwrap();
        assert_eq!(packet.password, "Terraria");
    }

    #[test]
    fn test_npc_buff_ticks_unsigned_on_wire() {
        let packet = NpcBuffPacket::decode(53, &[1, 0, 20, 0, 60, 0], PacketRole::Client).unwrap();
        assert_eq!(packet.npc_index, 1);
        assert_eq!(packet.id, BuffId(20));
        assert_eq!(packet.ticks, 60);
    }

    #[test]
    fn test_npc_fish_decode() {
        let packet = NpcFishPacket::decode(130, &[100, 0, 0, 1, 108, 2], PacketRole::Client).unwrap();
        assert_eq!(packet.x, 100);
        assert_eq!(packet.y, 256);
        assert_eq!(packet.npc_id, NpcId(620));
    }

    #[test]
    fn test_leftover_bytes_are_framing_error() {
        let err = PlayerPvpPacket::decode(30, &[5, 1, 9], PacketRole::Client).unwrap_err();
        match err {
            HookwireError::Framing { expected, consumed } => {
                assert_eq!(expected, 3);
                assert_eq!(consumed, 2);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_short_payload_is_error() {
        assert!(PlayerManaPacket::decode(42, &[5, 100], PacketRole::Client).is_err());
    }

    #[test]
    fn test_unknown_team_is_error() {
        assert!(PlayerTeamPacket::decode(45, &[5, 9], PacketRole::Client).is_err());
    }

    #[test]
    fn test_unknown_packet_preserves_bytes() {
        let packet = UnknownPacket::decode(255, &[], PacketRole::Client).unwrap();
        assert_eq!(packet.id, 255);
        assert!(packet.is_empty());
        assert_eq!(&packet.to_frame(PacketRole::Client).unwrap()[..], &[3, 0, 255]);

        let packet = UnknownPacket::decode(25, &[1, 2, 3], PacketRole::Server).unwrap();
        assert_eq!(packet.len(), 3);
        assert_eq!(&packet.to_frame(PacketRole::Server).unwrap()[..], &[6, 0, 25, 1, 2, 3]);
    }

    #[test]
    fn test_oversized_frame_is_error() {
        let packet = UnknownPacket { id: 25, payload: vec![0; 70000] };
        assert!(packet.to_frame(PacketRole::Server).is_err());
    }

    #[test]
    fn test_tile_modify_decode() {
        let packet = TileModifyPacket::decode(17, &[1, 100, 0, 0, 1, 4, 0, 1], PacketRole::Client).unwrap();
        assert_eq!(packet.modification, TileModification::PLACE_BLOCK);
        assert_eq!(packet.x, 100);
        assert_eq!(packet.y, 256);
        assert_eq!(packet.block_id(), BlockId::TORCHES);
        assert_eq!(packet.style, 1);

        let packet = TileModifyPacket::decode(17, &[0, 100, 0, 0, 1, 1, 0, 0], PacketRole::Client).unwrap();
        assert!(packet.is_failure());

        // Unknown modifications still decode
        let packet = TileModifyPacket::decode(17, &[255, 100, 0, 0, 1, 0, 0, 0], PacketRole::Client).unwrap();
        assert_eq!(packet.modification, TileModification(255));
    }

    #[test]
    fn test_tile_square_decode() {
        let payload = [
            3, 0, 100, 0, 0, 1, 0, 0, 1, 0, 1, 0, 1, 0, 4, 0, 1, 0, 2, 0, 4, 0, 1, 0, 8, 0, 255, 1, 0, 4, 1, 0, 8,
            1, 240, 131, 0, 0,
        ];
        let packet = TileSquarePacket::decode(20, &payload, PacketRole::Client).unwrap();
        assert_eq!(packet.size, 3);
        assert_eq!(packet.change_type, None);
        assert_eq!(packet.x, 100);
        assert_eq!(packet.y, 256);
        assert_eq!(packet.tiles.len(), 9);

        assert!(!packet.tile(0, 0).unwrap().is_block_active);

        let stone = packet.tile(0, 1).unwrap();
        assert!(stone.is_block_active);
        assert_eq!(stone.block_id, BlockId::STONE);

        let torch = packet.tile(0, 2).unwrap();
        assert_eq!(torch.block_id, BlockId::TORCHES);
        assert_eq!((torch.block_frame_x, torch.block_frame_y), (1, 2));

        assert_eq!(packet.tile(1, 0).unwrap().wall_id, WallId::STONE);

        let lava = packet.tile(1, 1).unwrap();
        assert_eq!(lava.liquid_amount, 255);
        assert_eq!(lava.liquid, Liquid::Lava);

        assert_eq!(packet.tile(1, 2).unwrap().block_color, PaintColor::RED);
        assert_eq!(packet.tile(2, 0).unwrap().wall_color, PaintColor::RED);

        let wired = packet.tile(2, 1).unwrap();
        assert!(wired.has_red_wire && wired.has_blue_wire && wired.has_green_wire && wired.has_yellow_wire);
        assert!(wired.is_block_half && wired.has_actuator && wired.is_block_actuated);

        assert_eq!(packet.tile(3, 0), None);

        let frame = packet.to_frame(PacketRole::Client).unwrap();
        assert_eq!(&frame[3..], &payload[..]);
    }

    #[test]
    fn test_tile_square_change_type() {
        let packet = TileSquarePacket {
            size: 1,
            change_type: Some(2),
            x: 5,
            y: 6,
            tiles: vec![Tile::block(BlockId::STONE)],
        };
        let frame = packet.to_frame(PacketRole::Server).unwrap();
        assert_eq!(&frame[..], &[14, 0, 20, 1, 128, 2, 5, 0, 6, 0, 1, 0, 1, 0]);
        assert_eq!(TileSquarePacket::decode(20, &frame[3..], PacketRole::Server).unwrap(), packet);
    }

    #[test]
    fn test_tile_square_size_mismatch_is_error() {
        let packet = TileSquarePacket { size: 2, tiles: vec![Tile::default()], ..Default::default() };
        assert!(packet.to_frame(PacketRole::Server).is_err());

        // Claims nine tiles but carries one
        assert!(TileSquarePacket::decode(20, &[3, 0, 0, 0, 0, 0, 0, 0], PacketRole::Client).is_err());
    }

    #[test]
    fn test_tile_liquid_decode() {
        let packet = TileLiquidPacket::decode(48, &[0, 1, 100, 0, 255, 2], PacketRole::Client).unwrap();
        assert_eq!((packet.x, packet.y), (256, 100));
        assert_eq!(packet.amount, 255);
        assert_eq!(packet.liquid, Liquid::Honey);

        assert!(TileLiquidPacket::decode(48, &[0, 1, 100, 0, 255, 9], PacketRole::Client).is_err());
    }

    #[test]
    fn test_paint_and_wire_frames() {
        let packet = BlockPaintPacket { x: 256, y: 100, color: PaintColor::RED };
        assert_eq!(&packet.to_frame(PacketRole::Client).unwrap()[..], &[8, 0, 63, 0, 1, 100, 0, 1]);

        let packet = WallPaintPacket::decode(64, &[0, 1, 100, 0, 1], PacketRole::Client).unwrap();
        assert_eq!(packet.color, PaintColor::RED);

        let packet = WireActivatePacket::decode(59, &[0, 1, 100, 0], PacketRole::Client).unwrap();
        assert_eq!((packet.x, packet.y), (256, 100));
    }

    #[test]
    fn test_encode_frame_appends() {
        let mut buf = BytesMut::new();
        let first = PlayerJoinPacket.encode_frame(&mut buf, PacketRole::Client).unwrap();
        let second = PlayerPvpPacket { player_index: 5, is_in_pvp: true }
            .encode_frame(&mut buf, PacketRole::Client)
            .unwrap();
        assert_eq!(first, 3);
        assert_eq!(second, 5);
        assert_eq!(&buf[..], &[3, 0, 6, 5, 0, 30, 5, 1]);
    }
}
