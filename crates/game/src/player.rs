//! # Player Wrapper
//!
//! A stable handle onto one player slot, with typed accessors and the
//! packet entry points services and plugins use to talk to a client.

use std::fmt;
use std::sync::Arc;

use hookwire_core::{Buff, CharacterDifficulty, HookwireError, Result, Team};
use hookwire_events::{Event, EventBus};
use hookwire_protocol::{Packet, PacketRole};

use crate::data::{PlayerData, PLAYER_BUFF_SLOTS};
use crate::entities::EntityCell;
use crate::events::{PacketReceiveEvent, PacketSendEvent};
use crate::guard::ReplayGuard;
use crate::host::Host;
use crate::pool::BufferPool;

/// Individual player
///
/// # Purpose
/// Wraps the host's record for one slot. Reads and writes go straight to
/// the record, so changes made here are visible to the host and vice versa.
///
/// # Thread Safety
/// The record is behind a `RwLock`; each accessor takes it briefly.
pub struct Player {
    index: Option<usize>,
    data: EntityCell<PlayerData>,
    events: Arc<EventBus>,
    host: Arc<dyn Host>,
    pool: Arc<BufferPool>,
}

impl Player {
    /// Create a new player wrapper
    ///
    /// # Arguments
    /// * `index` - Slot in the host table, or `None` for a detached record
    /// * `data` - The host record
    /// * `events` - Bus that packet events are raised on
    /// * `host` - The host that replays and sends frames
    /// * `pool` - Send buffer pool
    pub fn new(
        index: Option<usize>,
        data: EntityCell<PlayerData>,
        events: Arc<EventBus>,
        host: Arc<dyn Host>,
        pool: Arc<BufferPool>,
    ) -> Self {
        tracing::trace!("Wrapping player slot {:?}", index);
        Self {
            index,
            data,
            events,
            host,
            pool,
        }
    }

    /// Slot index, `None` when detached
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn is_active(&self) -> bool {
        self.data.read().active
    }

    pub fn name(&self) -> String {
        self.data.read().name.clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.data.write().name = name.into();
    }

    pub fn health(&self) -> i32 {
        self.data.read().health
    }

    pub fn set_health(&self, health: i32) {
        self.data.write().health = health;
    }

    pub fn max_health(&self) -> i32 {
        self.data.read().max_health
    }

    pub fn set_max_health(&self, max_health: i32) {
        self.data.write().max_health = max_health;
    }

    pub fn mana(&self) -> i32 {
        self.data.read().mana
    }

    pub fn set_mana(&self, mana: i32) {
        self.data.write().mana = mana;
    }

    pub fn max_mana(&self) -> i32 {
        self.data.read().max_mana
    }

    pub fn set_max_mana(&self, max_mana: i32) {
        self.data.write().max_mana = max_mana;
    }

    pub fn is_in_pvp(&self) -> bool {
        self.data.read().is_in_pvp
    }

    pub fn set_pvp(&self, is_in_pvp: bool) {
        self.data.write().is_in_pvp = is_in_pvp;
    }

    pub fn team(&self) -> Team {
        self.data.read().team
    }

    pub fn set_team(&self, team: Team) {
        self.data.write().team = team;
    }

    pub fn difficulty(&self) -> CharacterDifficulty {
        self.data.read().difficulty
    }

    pub fn set_difficulty(&self, difficulty: CharacterDifficulty) {
        self.data.write().difficulty = difficulty;
    }

    /// Buff in a slot; expired buffs read as the default buff
    pub fn buff(&self, slot: usize) -> Result<Buff> {
        let data = self.data.read();
        let buff = data.buffs.get(slot).copied().ok_or(buff_slot_error(slot))?;
        Ok(if buff.ticks > 0 { buff } else { Buff::default() })
    }

    pub fn set_buff(&self, slot: usize, buff: Buff) -> Result<()> {
        let mut data = self.data.write();
        let target = data.buffs.get_mut(slot).ok_or(buff_slot_error(slot))?;
        *target = buff;
        Ok(())
    }

    /// Number of buff slots
    pub fn buff_count(&self) -> usize {
        PLAYER_BUFF_SLOTS
    }

    /// Hand a packet to the host as if this player had sent it
    ///
    /// Raises [`PacketReceiveEvent`] first. If no handler cancels, the
    /// (possibly edited) packet is serialized as client-authored and
    /// replayed into the host's inbound processing. The replay does not
    /// raise the event again.
    pub fn receive_packet<P: Packet>(self: &Arc<Self>, packet: P) {
        let Some(index) = self.index else {
            tracing::warn!("Cannot receive packet {} for a detached player", packet.id());
            return;
        };

        let mut evt = PacketReceiveEvent::new(packet, self.clone());
        self.events.raise(&mut evt);
        if evt.is_canceled() {
            tracing::trace!("Receive of packet {} from {} canceled", evt.packet.id(), index);
            return;
        }

        let mut buffer = self.pool.rent();
        if let Err(e) = evt.packet.encode_frame(&mut buffer, PacketRole::Client) {
            tracing::warn!("Failed to encode packet {} from {}: {}", evt.packet.id(), index, e);
            return;
        }

        let _replay = ReplayGuard::enter();
        self.host.replay_receive(index, &buffer);
    }

    /// Send a packet to this player's client
    ///
    /// Does nothing when the client is not connected. Otherwise raises
    /// [`PacketSendEvent`]; if no handler cancels, the packet is serialized
    /// as server-authored into a pooled buffer and queued on the host.
    pub fn send_packet<P: Packet>(self: &Arc<Self>, packet: P) {
        let Some(index) = self.index else {
            tracing::warn!("Cannot send packet {} to a detached player", packet.id());
            return;
        };
        if !self.host.is_client_connected(index) {
            return;
        }

        let mut evt = PacketSendEvent::new(packet, self.clone());
        self.events.raise(&mut evt);
        if evt.is_canceled() {
            tracing::trace!("Send of packet {} to {} canceled", evt.packet.id(), index);
            return;
        }

        let mut buffer = self.pool.rent();
        if let Err(e) = evt.packet.encode_frame(&mut buffer, PacketRole::Server) {
            tracing::warn!("Failed to encode packet {} for {}: {}", evt.packet.id(), index, e);
            return;
        }

        if let Err(e) = self.host.async_send(index, buffer) {
            tracing::debug!("Send to {} failed: {}", index, e);
        }
    }
}

fn buff_slot_error(slot: usize) -> HookwireError {
    HookwireError::IndexOutOfRange {
        index: slot as i64,
        count: PLAYER_BUFF_SLOTS,
    }
}

impl fmt::Debug for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Player")
            .field("index", &self.index)
            .field("name", &self.data.read().name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryHost;
    use hookwire_core::BuffId;
    use parking_lot::RwLock;

    fn player(index: Option<usize>) -> (Arc<Player>, EntityCell<PlayerData>) {
        let host = MemoryHost::new(8, 8, 8);
        let data = Arc::new(RwLock::new(PlayerData::default()));
        let player = Player::new(
            index,
            data.clone(),
            Arc::new(EventBus::new()),
            host,
            BufferPool::new(64),
        );
        (Arc::new(player), data)
    }

    #[test]
    fn test_player_accessors_write_through() {
        let (player, data) = player(Some(1));
        player.set_name("Terrarian");
        player.set_health(80);
        player.set_team(Team::Blue);
        assert_eq!(data.read().name, "Terrarian");
        assert_eq!(data.read().health, 80);

        data.write().mana = 15;
        assert_eq!(player.mana(), 15);
        assert_eq!(player.team(), Team::Blue);
        assert_eq!(player.index(), Some(1));
    }

    #[test]
    fn test_player_buffs() {
        let (player, _) = player(Some(0));
        player.set_buff(0, Buff::new(BuffId(1), 60)).unwrap();
        player.set_buff(1, Buff::new(BuffId(2), 0)).unwrap();

        assert_eq!(player.buff(0).unwrap(), Buff::new(BuffId(1), 60));
        assert_eq!(player.buff(1).unwrap(), Buff::default());
        assert!(player.buff(player.buff_count()).is_err());
        assert!(player.set_buff(PLAYER_BUFF_SLOTS, Buff::default()).is_err());
    }

    #[test]
    fn test_detached_player_ignores_packets() {
        let (player, _) = player(None);
        player.receive_packet(hookwire_protocol::PlayerJoinPacket);
        player.send_packet(hookwire_protocol::PlayerJoinPacket);
        assert_eq!(player.pool.outstanding(), 0);
    }
}
