//! # Game Events
//!
//! Events raised by the built-in services. Packet events carry the decoded
//! packet and may be edited by handlers; the edited packet is what the host
//! sees. The player and NPC events forwarded from packet events are
//! informational: canceling them cancels the packet, but field changes are
//! not written back. World events forwarded from tile packets do write
//! their edited fields back into the packet.

use std::sync::Arc;

use hookwire_core::{
    BlockId, Buff, ItemId, ItemPrefix, Liquid, NpcId, PaintColor, ProjectileId, Team, Tile, TilePosition, WallId,
};
use hookwire_events::{impl_event, Event, EventState};
use hookwire_protocol::Packet;

use crate::map::TileMap;
use crate::npc::Npc;
use crate::player::Player;
use crate::projectile::Projectile;

/// A packet received from a client, before the host processes it
#[derive(Debug)]
pub struct PacketReceiveEvent<P> {
    state: EventState,
    pub packet: P,
    pub sender: Arc<Player>,
}

impl<P: Packet> PacketReceiveEvent<P> {
    pub fn new(packet: P, sender: Arc<Player>) -> Self {
        Self {
            state: EventState::default(),
            packet,
            sender,
        }
    }
}

impl<P: Packet> Event for PacketReceiveEvent<P> {
    fn state(&self) -> &EventState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut EventState {
        &mut self.state
    }
}

/// A packet about to be sent to a client
#[derive(Debug)]
pub struct PacketSendEvent<P> {
    state: EventState,
    pub packet: P,
    pub receiver: Arc<Player>,
}

impl<P: Packet> PacketSendEvent<P> {
    pub fn new(packet: P, receiver: Arc<Player>) -> Self {
        Self {
            state: EventState::default(),
            packet,
            receiver,
        }
    }
}

impl<P: Packet> Event for PacketSendEvent<P> {
    fn state(&self) -> &EventState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut EventState {
        &mut self.state
    }
}

macro_rules! game_event {
    ($(#[$meta:meta])* $name:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name {
            state: EventState,
            $(pub $field: $ty,)*
        }

        impl $name {
            pub fn new($($field: $ty),*) -> Self {
                Self {
                    state: EventState::default(),
                    $($field,)*
                }
            }
        }

        impl_event!($name);
    };
}

game_event!(
    /// A player finished joining
    PlayerJoinEvent { player: Arc<Player> }
);
game_event!(
    /// A player reported their health
    PlayerHealthEvent { player: Arc<Player>, health: i16, max_health: i16 }
);
game_event!(PlayerPvpEvent { player: Arc<Player>, is_in_pvp: bool });
game_event!(
    /// A player sent the server password
    PlayerPasswordEvent { player: Arc<Player>, password: String }
);
game_event!(PlayerManaEvent { player: Arc<Player>, mana: i16, max_mana: i16 });
game_event!(PlayerTeamEvent { player: Arc<Player>, team: Team });
game_event!(PlayerUuidEvent { player: Arc<Player>, uuid: String });
game_event!(
    /// A player sent a chat line or command
    PlayerChatEvent { player: Arc<Player>, command: String, message: String }
);
game_event!(
    /// A player is about to be updated; canceling skips the update
    PlayerTickEvent { player: Arc<Player> }
);
game_event!(
    /// An active player's connection is being reset
    PlayerQuitEvent { player: Arc<Player> }
);

game_event!(
    /// NPC defaults are about to be applied; `id` may be replaced
    NpcDefaultsEvent { npc: Arc<Npc>, id: NpcId }
);
game_event!(
    /// An NPC was placed in a slot; canceling despawns it
    NpcSpawnEvent { npc: Arc<Npc> }
);
game_event!(NpcTickEvent { npc: Arc<Npc> });
game_event!(NpcKilledEvent { npc: Arc<Npc> });
game_event!(
    /// An NPC is about to drop loot; the item fields may be replaced
    NpcLootEvent { npc: Arc<Npc>, id: ItemId, stack_size: i32, prefix: ItemPrefix }
);
game_event!(
    /// A player applied a buff to an NPC
    NpcBuffEvent { npc: Arc<Npc>, player: Arc<Player>, buff: Buff }
);
game_event!(
    /// A player caught an NPC with a bug net
    NpcCatchEvent { npc: Arc<Npc>, player: Arc<Player> }
);
game_event!(
    /// A player fished out an NPC
    NpcFishEvent { player: Arc<Player>, position: TilePosition, id: NpcId }
);

game_event!(
    /// Projectile defaults are about to be applied; `id` may be replaced
    ProjectileDefaultsEvent { projectile: Arc<Projectile>, id: ProjectileId }
);
game_event!(ProjectileTickEvent { projectile: Arc<Projectile> });

game_event!(
    /// A player broke a block; itemless breaks drop nothing
    BlockBreakEvent { player: Arc<Player>, position: TilePosition, is_itemless: bool }
);
game_event!(
    /// A player placed a block, or replaced one; `id` and `style` may be replaced
    BlockPlaceEvent { player: Arc<Player>, position: TilePosition, id: BlockId, style: u8, is_replacement: bool }
);
game_event!(WallBreakEvent { player: Arc<Player>, position: TilePosition });
game_event!(
    /// A player placed a wall, or replaced one; `id` may be replaced
    WallPlaceEvent { player: Arc<Player>, position: TilePosition, id: WallId, is_replacement: bool }
);
game_event!(BlockPaintEvent { player: Arc<Player>, position: TilePosition, color: PaintColor });
game_event!(WallPaintEvent { player: Arc<Player>, position: TilePosition, color: PaintColor });
game_event!(
    /// Liquid settled on a tile; the amount and kind may be replaced
    TileLiquidEvent { player: Arc<Player>, position: TilePosition, amount: u8, liquid: Liquid }
);
game_event!(
    /// A player sent a square of tiles anchored at `position`
    ///
    /// `tiles` is column by column, `size * size` long. Edits are applied
    /// as long as the length is unchanged.
    TileSquareEvent { player: Arc<Player>, position: TilePosition, size: u16, tiles: Vec<Tile> }
);
game_event!(
    /// A player hit a wired tile
    WiringActivateEvent { player: Arc<Player>, position: TilePosition }
);
game_event!(
    /// The host is about to save the world; canceling skips the save
    WorldSaveEvent { world: Arc<TileMap> }
);

impl TileSquareEvent {
    /// Tile at column `i`, row `j` of the square
    pub fn tile_mut(&mut self, i: usize, j: usize) -> Option<&mut Tile> {
        let size = usize::from(self.size);
        if i >= size || j >= size {
            return None;
        }
        self.tiles.get_mut(i * size + j)
    }
}

/// Raise `event`, then copy its cancellation onto `source`
///
/// # Returns
/// The event after every handler has run
pub fn forward<S: Event, E: Event>(bus: &hookwire_events::EventBus, source: &mut S, mut event: E) -> E {
    bus.raise(&mut event);
    if event.is_canceled() {
        let reason = event.cancellation_reason().map(str::to_string);
        source.state_mut().cancel(reason);
    }
    event
}
