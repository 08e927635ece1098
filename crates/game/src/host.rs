//! # Host Contract
//!
//! The engine that owns the world implements [`Host`]. Services read and
//! mutate its tables, install callbacks into its [`HostHooks`], and hand it
//! frames to process or send.

use std::io;
use std::sync::Arc;

use hookwire_core::{NpcId, ProjectileId, Vector2f};

use crate::data::{NpcData, PlayerData, ProjectileData};
use crate::entities::EntityTable;
use crate::hooks::{HostHooks, SocketId};
use crate::map::TileMap;
use crate::pool::PooledBuffer;

pub trait Host: Send + Sync + 'static {
    fn hooks(&self) -> &HostHooks;

    /// Player table, one slot per connection plus the sentinel
    fn players(&self) -> &Arc<EntityTable<PlayerData>>;

    fn npcs(&self) -> &Arc<EntityTable<NpcData>>;

    fn projectiles(&self) -> &Arc<EntityTable<ProjectileData>>;

    /// The world's tile grid
    fn world(&self) -> &Arc<TileMap>;

    /// Whether the connection slot has a live socket
    fn is_client_connected(&self, client: usize) -> bool;

    /// Whether the connection slot is past the handshake and in use
    fn is_client_active(&self, client: usize) -> bool;

    /// Connection slot that owns a socket
    fn client_for_socket(&self, socket: SocketId) -> Option<usize>;

    /// Run the host's inbound processing on a complete frame
    ///
    /// # Arguments
    /// * `client` - Connection slot the frame is attributed to
    /// * `frame` - Length header, packet id and payload
    fn replay_receive(&self, client: usize, frame: &[u8]);

    /// Queue a complete frame for sending
    ///
    /// The host holds `buffer` until the send finishes and drops it after,
    /// which returns it to its pool. An `Err` means the send was never
    /// started; the buffer has already been released.
    fn async_send(&self, client: usize, buffer: PooledBuffer) -> io::Result<()>;

    /// Create an NPC in the first free slot
    fn spawn_npc(&self, id: NpcId, position: Vector2f) -> Option<usize>;

    /// Create a projectile in the first free slot
    fn spawn_projectile(
        &self,
        id: ProjectileId,
        position: Vector2f,
        velocity: Vector2f,
        damage: i32,
        knockback: f32,
    ) -> Option<usize>;
}
