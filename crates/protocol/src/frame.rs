//! # Frame Classification
//!
//! Classifies a frame body by its one byte packet id and, for module
//! packets, its two byte module id. Also provides [`AnyPacket`], a sum type
//! over the closed set of known kinds, and [`visit_known`], the static list
//! dispatch tables are built from.

use bytes::BytesMut;
use hookwire_core::{HookwireError, Result};

use super::modules::*;
use super::packet_types::*;
use super::packets::*;

/// Two-level discriminant of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    /// One of the 256 primary kinds
    Primary(u8),
    /// One of the 65536 module kinds under [`MODULE_PACKET_ID`]
    Module(u16),
}

/// Classify a frame body
///
/// # Arguments
/// * `body` - Frame without its length header; `body[0]` is the packet id
///
/// # Returns
/// The frame's kind, or an error if the body is too short to hold its
/// discriminant
pub fn classify(body: &[u8]) -> Result<PacketKind> {
    match body {
        [] => Err(HookwireError::InvalidData("Not enough bytes for packet id".into())),
        [MODULE_PACKET_ID, lo, hi, ..] => Ok(PacketKind::Module(u16::from_le_bytes([*lo, *hi]))),
        [MODULE_PACKET_ID, ..] => Err(HookwireError::InvalidData("Not enough bytes for module id".into())),
        [id, ..] => Ok(PacketKind::Primary(*id)),
    }
}

/// Split a complete frame into its body, checking the length header
pub fn frame_body(frame: &[u8]) -> Result<&[u8]> {
    if frame.len() < HEADER_LEN + 1 {
        return Err(HookwireError::InvalidData(format!("Frame too short: {} bytes", frame.len())));
    }
    let declared = u16::from_le_bytes([frame[0], frame[1]]) as usize;
    if declared != frame.len() {
        return Err(HookwireError::Framing { expected: declared, consumed: frame.len() });
    }
    Ok(&frame[HEADER_LEN..])
}

/// Receives one callback per statically known kind
pub trait PacketVisitor {
    fn visit_packet<P: KnownPacket>(&mut self);
    fn visit_module<M: KnownModule>(&mut self);
}

/// Walk every known packet kind and module kind
///
/// The module packet id itself is not visited; its kinds are reported
/// through [`PacketVisitor::visit_module`].
pub fn visit_known<V: PacketVisitor>(visitor: &mut V) {
    visitor.visit_packet::<ClientConnectPacket>();
    visitor.visit_packet::<PlayerJoinPacket>();
    visitor.visit_packet::<PlayerHealthPacket>();
    visitor.visit_packet::<TileModifyPacket>();
    visitor.visit_packet::<TileSquarePacket>();
    visitor.visit_packet::<PlayerPvpPacket>();
    visitor.visit_packet::<ClientPasswordPacket>();
    visitor.visit_packet::<PlayerManaPacket>();
    visitor.visit_packet::<PlayerTeamPacket>();
    visitor.visit_packet::<TileLiquidPacket>();
    visitor.visit_packet::<NpcBuffPacket>();
    visitor.visit_packet::<WireActivatePacket>();
    visitor.visit_packet::<BlockPaintPacket>();
    visitor.visit_packet::<WallPaintPacket>();
    visitor.visit_packet::<ClientUuidPacket>();
    visitor.visit_packet::<NpcCatchPacket>();
    visitor.visit_packet::<NpcFishPacket>();

    visitor.visit_module::<ChatModule>();
}

/// Any decoded packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyPacket {
    ClientConnect(ClientConnectPacket),
    PlayerJoin(PlayerJoinPacket),
    PlayerHealth(PlayerHealthPacket),
    TileModify(TileModifyPacket),
    TileSquare(TileSquarePacket),
    PlayerPvp(PlayerPvpPacket),
    ClientPassword(ClientPasswordPacket),
    PlayerMana(PlayerManaPacket),
    PlayerTeam(PlayerTeamPacket),
    TileLiquid(TileLiquidPacket),
    NpcBuff(NpcBuffPacket),
    WireActivate(WireActivatePacket),
    BlockPaint(BlockPaintPacket),
    WallPaint(WallPaintPacket),
    ClientUuid(ClientUuidPacket),
    NpcCatch(NpcCatchPacket),
    NpcFish(NpcFishPacket),
    Chat(ModulePacket<ChatModule>),
    UnknownModule(ModulePacket<UnknownModule>),
    Unknown(UnknownPacket),
}

macro_rules! with_packet {
    ($value:expr, $p:ident => $body:expr) => {
        match $value {
            AnyPacket::ClientConnect($p) => $body,
            AnyPacket::PlayerJoin($p) => $body,
            AnyPacket::PlayerHealth($p) => $body,
            AnyPacket::TileModify($p) => $body,
            AnyPacket::TileSquare($p) => $body,
            AnyPacket::PlayerPvp($p) => $body,
            AnyPacket::ClientPassword($p) => $body,
            AnyPacket::PlayerMana($p) => $body,
            AnyPacket::PlayerTeam($p) => $body,
            AnyPacket::TileLiquid($p) => $body,
            AnyPacket::NpcBuff($p) => $body,
            AnyPacket::WireActivate($p) => $body,
            AnyPacket::BlockPaint($p) => $body,
            AnyPacket::WallPaint($p) => $body,
            AnyPacket::ClientUuid($p) => $body,
            AnyPacket::NpcCatch($p) => $body,
            AnyPacket::NpcFish($p) => $body,
            AnyPacket::Chat($p) => $body,
            AnyPacket::UnknownModule($p) => $body,
            AnyPacket::Unknown($p) => $body,
        }
    };
}

impl AnyPacket {
    /// Decode a frame body into the matching variant
    ///
    /// Unknown packet and module ids never fail; they decode into
    /// [`AnyPacket::Unknown`] and [`AnyPacket::UnknownModule`].
    pub fn decode(body: &[u8], role: PacketRole) -> Result<Self> {
        let kind = classify(body)?;
        let id = body[0];
        let payload = &body[1..];

        let packet = match kind {
            PacketKind::Module(module) => match ModuleId::from_u16(module) {
                Some(ModuleId::Chat) => Self::Chat(ModulePacket::decode(id, payload, role)?),
                None => Self::UnknownModule(ModulePacket::decode(id, payload, role)?),
            },
            PacketKind::Primary(raw) => match PacketId::from_u8(raw) {
                Some(PacketId::ClientConnect) => Self::ClientConnect(Packet::decode(id, payload, role)?),
                Some(PacketId::PlayerJoin) => Self::PlayerJoin(Packet::decode(id, payload, role)?),
                Some(PacketId::PlayerHealth) => Self::PlayerHealth(Packet::decode(id, payload, role)?),
                Some(PacketId::TileModify) => Self::TileModify(Packet::decode(id, payload, role)?),
                Some(PacketId::TileSquare) => Self::TileSquare(Packet::decode(id, payload, role)?),
                Some(PacketId::PlayerPvp) => Self::PlayerPvp(Packet::decode(id, payload, role)?),
                Some(PacketId::ClientPassword) => Self::ClientPassword(Packet::decode(id, payload, role)?),
                Some(PacketId::PlayerMana) => Self::PlayerMana(Packet::decode(id, payload, role)?),
                Some(PacketId::PlayerTeam) => Self::PlayerTeam(Packet::decode(id, payload, role)?),
                Some(PacketId::TileLiquid) => Self::TileLiquid(Packet::decode(id, payload, role)?),
                Some(PacketId::NpcBuff) => Self::NpcBuff(Packet::decode(id, payload, role)?),
                Some(PacketId::WireActivate) => Self::WireActivate(Packet::decode(id, payload, role)?),
                Some(PacketId::BlockPaint) => Self::BlockPaint(Packet::decode(id, payload, role)?),
                Some(PacketId::WallPaint) => Self::WallPaint(Packet::decode(id, payload, role)?),
                Some(PacketId::ClientUuid) => Self::ClientUuid(Packet::decode(id, payload, role)?),
                Some(PacketId::NpcCatch) => Self::NpcCatch(Packet::decode(id, payload, role)?),
                Some(PacketId::NpcFish) => Self::NpcFish(Packet::decode(id, payload, role)?),
                // classify() already routed module ids
                Some(PacketId::Module) | None => Self::Unknown(Packet::decode(id, payload, role)?),
            },
        };
        Ok(packet)
    }

    /// Decode a complete frame, header included
    pub fn decode_frame(frame: &[u8], role: PacketRole) -> Result<Self> {
        Self::decode(frame_body(frame)?, role)
    }

    pub fn id(&self) -> u8 {
        with_packet!(self, p => p.id())
    }

    pub fn kind(&self) -> PacketKind {
        match self {
            Self::Chat(p) => PacketKind::Module(p.module.module_id()),
            Self::UnknownModule(p) => PacketKind::Module(p.module.module_id()),
            other => PacketKind::Primary(other.id()),
        }
    }

    /// Append a complete frame to `buf`
    pub fn encode_frame(&self, buf: &mut BytesMut, role: PacketRole) -> Result<usize> {
        with_packet!(self, p => p.encode_frame(buf, role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookwire_core::BuffId;

    #[test]
    fn test_classify() {
        assert_eq!(classify(&[16, 5]).unwrap(), PacketKind::Primary(16));
        assert_eq!(classify(&[82, 1, 0]).unwrap(), PacketKind::Module(1));
        assert_eq!(classify(&[82, 255, 255]).unwrap(), PacketKind::Module(65535));
        assert!(classify(&[]).is_err());
        assert!(classify(&[82, 1]).is_err());
    }

    #[test]
    fn test_frame_body_checks_header() {
        assert_eq!(frame_body(&[3, 0, 255]).unwrap(), &[255]);
        assert!(frame_body(&[4, 0, 255]).is_err());
        assert!(frame_body(&[2, 0]).is_err());
    }

    #[test]
    fn test_visit_known_covers_packet_ids() {
        #[derive(Default)]
        struct Collect {
            packets: Vec<u8>,
            modules: Vec<u16>,
        }

        impl PacketVisitor for Collect {
            fn visit_packet<P: KnownPacket>(&mut self) {
                assert_eq!(P::default().id(), P::ID.as_u8());
                self.packets.push(P::ID.as_u8());
            }

            fn visit_module<M: KnownModule>(&mut self) {
                self.modules.push(M::ID.as_u16());
            }
        }

        let mut collect = Collect::default();
        visit_known(&mut collect);

        let expected: Vec<u8> = PacketId::ALL
            .iter()
            .filter(|id| **id != PacketId::Module)
            .map(|id| id.as_u8())
            .collect();
        assert_eq!(collect.packets, expected);
        assert_eq!(collect.modules, vec![ModuleId::Chat.as_u16()]);
    }

    #[test]
    fn test_any_packet_decode_frame() {
        let packet = AnyPacket::decode_frame(&[9, 0, 53, 1, 0, 20, 0, 60, 0], PacketRole::Client).unwrap();
        match &packet {
            AnyPacket::NpcBuff(p) => {
                assert_eq!(p.npc_index, 1);
                assert_eq!(p.id, BuffId(20));
            }
            other => panic!("unexpected packet: {:?}", other),
        }
        assert_eq!(packet.kind(), PacketKind::Primary(53));
    }

    #[test]
    fn test_any_packet_unknowns() {
        let packet = AnyPacket::decode(&[255], PacketRole::Client).unwrap();
        assert_eq!(packet, AnyPacket::Unknown(UnknownPacket { id: 255, payload: vec![] }));

        let packet = AnyPacket::decode(&[82, 255, 255], PacketRole::Client).unwrap();
        assert_eq!(packet.kind(), PacketKind::Module(65535));
    }

    #[test]
    fn test_any_packet_round_trip_keeps_length() {
        let packet = AnyPacket::PlayerTeam(PlayerTeamPacket {
            player_index: 5,
            team: hookwire_core::Team::Red,
        });
        let mut buf = BytesMut::new();
        let written = packet.encode_frame(&mut buf, PacketRole::Client).unwrap();
        assert_eq!(written, buf.len());
        assert_eq!(AnyPacket::decode_frame(&buf, PacketRole::Client).unwrap(), packet);
    }
}
