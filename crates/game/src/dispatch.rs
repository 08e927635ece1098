//! # Packet Dispatch Tables
//!
//! Maps each packet kind to a monomorphized routine that decodes the frame
//! body into its typed packet and hands it to the matching [`Player`] entry
//! point. Tables are built once from the protocol's list of known kinds;
//! kinds without an entry fall back to the opaque unknown types.

use std::fmt;

use hookwire_core::{HookwireError, Result};
use hookwire_protocol::{
    classify, visit_known, KnownModule, KnownPacket, ModulePacket, Packet, PacketKind, PacketRole, PacketVisitor,
    UnknownModule, UnknownPacket, MODULE_KIND_COUNT, PACKET_KIND_COUNT,
};

use crate::data::PlayerData;
use crate::entities::EntityList;
use crate::player::Player;

pub type PlayerList = EntityList<PlayerData, Player>;

/// Decode a frame body and deliver it for one player
pub type DispatchFn = fn(&PlayerList, usize, &[u8]) -> Result<()>;

/// Which way frames handled by a table travel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Frames from a client, delivered through [`Player::receive_packet`]
    Inbound,
    /// Frames to a client, delivered through [`Player::send_packet`]
    Outbound,
}

impl Direction {
    fn routine<P: Packet>(self) -> DispatchFn {
        match self {
            Direction::Inbound => receive::<P>,
            Direction::Outbound => send::<P>,
        }
    }
}

/// One primary table and one module table for a direction
pub struct DispatchTable {
    direction: Direction,
    primary: Box<[Option<DispatchFn>]>,
    modules: Box<[Option<DispatchFn>]>,
    unknown: DispatchFn,
    unknown_module: DispatchFn,
}

impl DispatchTable {
    pub fn new(direction: Direction) -> Self {
        let mut table = Self {
            direction,
            primary: vec![None; PACKET_KIND_COUNT].into_boxed_slice(),
            modules: vec![None; MODULE_KIND_COUNT].into_boxed_slice(),
            unknown: direction.routine::<UnknownPacket>(),
            unknown_module: direction.routine::<ModulePacket<UnknownModule>>(),
        };
        visit_known(&mut table);
        table
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether a kind has a typed routine
    pub fn is_known(&self, kind: PacketKind) -> bool {
        match kind {
            PacketKind::Primary(id) => self.primary[usize::from(id)].is_some(),
            PacketKind::Module(id) => self.modules[usize::from(id)].is_some(),
        }
    }

    /// Routine for a kind, falling back to the unknown types
    pub fn routine(&self, kind: PacketKind) -> DispatchFn {
        match kind {
            PacketKind::Primary(id) => self.primary[usize::from(id)].unwrap_or(self.unknown),
            PacketKind::Module(id) => self.modules[usize::from(id)].unwrap_or(self.unknown_module),
        }
    }

    /// Classify and deliver a frame body
    ///
    /// # Arguments
    /// * `players` - View used to find the player for `client`
    /// * `client` - Connection slot the frame belongs to
    /// * `body` - Frame without its length header
    pub fn dispatch(&self, players: &PlayerList, client: usize, body: &[u8]) -> Result<()> {
        let kind = classify(body)?;
        (self.routine(kind))(players, client, body)
    }
}

impl PacketVisitor for DispatchTable {
    fn visit_packet<P: KnownPacket>(&mut self) {
        self.primary[usize::from(P::ID.as_u8())] = Some(self.direction.routine::<P>());
    }

    fn visit_module<M: KnownModule>(&mut self) {
        self.modules[usize::from(M::ID.as_u16())] = Some(self.direction.routine::<ModulePacket<M>>());
    }
}

impl fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTable")
            .field("direction", &self.direction)
            .field("primary", &self.primary.iter().filter(|r| r.is_some()).count())
            .field("modules", &self.modules.iter().filter(|r| r.is_some()).count())
            .finish()
    }
}

fn split_body(body: &[u8]) -> Result<(u8, &[u8])> {
    match body.split_first() {
        Some((id, payload)) => Ok((*id, payload)),
        None => Err(HookwireError::InvalidData("Not enough bytes for packet id".into())),
    }
}

fn receive<P: Packet>(players: &PlayerList, client: usize, body: &[u8]) -> Result<()> {
    let (id, payload) = split_body(body)?;
    let packet = P::decode(id, payload, PacketRole::Client)?;
    players.get(client)?.receive_packet(packet);
    Ok(())
}

fn send<P: Packet>(players: &PlayerList, client: usize, body: &[u8]) -> Result<()> {
    let (id, payload) = split_body(body)?;
    let packet = P::decode(id, payload, PacketRole::Server)?;
    players.get(client)?.send_packet(packet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookwire_protocol::{ModuleId, PacketId};

    #[test]
    fn test_tables_cover_known_kinds() {
        let table = DispatchTable::new(Direction::Inbound);
        for id in PacketId::ALL {
            if id == PacketId::Module {
                continue;
            }
            assert!(table.is_known(PacketKind::Primary(id.as_u8())), "{:?} missing", id);
        }
        for id in ModuleId::ALL {
            assert!(table.is_known(PacketKind::Module(id.as_u16())));
        }
        assert!(!table.is_known(PacketKind::Primary(255)));
        assert!(!table.is_known(PacketKind::Primary(82)));
        assert!(!table.is_known(PacketKind::Module(65535)));
    }

    #[test]
    fn test_unknown_kinds_fall_back() {
        let table = DispatchTable::new(Direction::Outbound);
        assert_eq!(table.direction(), Direction::Outbound);
        assert!(table.routine(PacketKind::Primary(25)) == table.unknown);
        assert!(table.routine(PacketKind::Module(1234)) == table.unknown_module);
    }
}
