//! # In-Process Host
//!
//! [`MemoryHost`] simulates the game process: connection slots with a
//! handshake state, entity tables, a tile grid, a small native packet
//! handler, and socket output captured in memory. Every interception point
//! fires where a real host would fire it.

use std::collections::{HashSet, VecDeque};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use hookwire_config::HookwireConfig;
use hookwire_core::{
    BlockId, Color3, ItemId, ItemPrefix, NpcId, PaintColor, ProjectileId, Tile, TilePosition, Vector2f, WallId,
};
use hookwire_protocol::{
    frame_body, AnyPacket, ChatModule, ModulePacket, NetworkText, Packet, PacketRole, TileModification,
    TileModifyPacket, TileSquarePacket,
};
use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::data::{NpcData, PlayerData, ProjectileData};
use crate::entities::{EntityCell, EntityTable};
use crate::hooks::{run_index_hook, HookResult, HostHooks, LootDrop, SocketId};
use crate::host::Host;
use crate::map::TileMap;
use crate::npc::Npc;
use crate::pool::PooledBuffer;

/// Version string a client must announce to be let in
pub const MEMORY_VERSION: &str = "Terraria279";

/// Handshake state: socket open, nothing received
pub const STATE_CONNECTED: i32 = 0;
/// Handshake state: waiting for the server password
pub const STATE_AWAITING_PASSWORD: i32 = -1;
/// Handshake state: version (and password) accepted
pub const STATE_ACCEPTED: i32 = 1;
/// Handshake state: in game
pub const STATE_PLAYING: i32 = 2;

/// Side length of the world built by [`MemoryHost::new`]
pub const SCRATCH_WORLD_SIZE: usize = 512;

/// Styled blocks keep one frame row per style, this many pixels apart
const STYLE_FRAME_HEIGHT: i16 = 22;

/// One chat line accepted by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub client: usize,
    pub command: String,
    pub message: String,
}

#[derive(Debug, Default)]
struct Client {
    connected: bool,
    active: bool,
    state: i32,
    uuid: String,
    socket: Option<SocketId>,
    fail_sends: bool,
    sent: Vec<Vec<u8>>,
}

/// Simulated host
///
/// # Purpose
/// Stands in for the game process in tests and in the launcher.
///
/// # Thread Safety
/// Client slots are individually locked. No lock is held while a hook runs,
/// so hooks may call back into the host.
pub struct MemoryHost {
    hooks: HostHooks,
    players: Arc<EntityTable<PlayerData>>,
    npcs: Arc<EntityTable<NpcData>>,
    projectiles: Arc<EntityTable<ProjectileData>>,
    world: Arc<TileMap>,
    saves: AtomicUsize,
    clients: Vec<Mutex<Client>>,
    password: RwLock<String>,
    next_socket: AtomicU64,
    hold_sends: AtomicBool,
    pending: Mutex<Vec<(usize, PooledBuffer)>>,
    chat: Mutex<Vec<ChatLine>>,
    dropped: Mutex<Vec<LootDrop>>,
}

impl MemoryHost {
    /// Create a host with a [`SCRATCH_WORLD_SIZE`] square world
    ///
    /// # Arguments
    /// * `max_players` - Player table length, including the reserved slot
    /// * `max_npcs` - NPC table length, including the reserved slot
    /// * `max_projectiles` - Projectile table length, including the reserved slot
    pub fn new(max_players: usize, max_npcs: usize, max_projectiles: usize) -> Arc<Self> {
        let world = TileMap::new(SCRATCH_WORLD_SIZE, SCRATCH_WORLD_SIZE);
        Self::with_world(max_players, max_npcs, max_projectiles, world)
    }

    pub fn with_world(max_players: usize, max_npcs: usize, max_projectiles: usize, world: TileMap) -> Arc<Self> {
        let players = Arc::new(EntityTable::new(max_players));
        let clients = (0..players.capacity()).map(|_| Mutex::new(Client::default())).collect();

        tracing::debug!(
            "Created memory host with {} players, {} NPCs, {} projectiles and a {}x{} world",
            max_players,
            max_npcs,
            max_projectiles,
            world.width(),
            world.height()
        );
        Arc::new(Self {
            hooks: HostHooks::new(),
            players,
            npcs: Arc::new(EntityTable::new(max_npcs)),
            projectiles: Arc::new(EntityTable::new(max_projectiles)),
            world: Arc::new(world),
            saves: AtomicUsize::new(0),
            clients,
            password: RwLock::new(String::new()),
            next_socket: AtomicU64::new(1),
            hold_sends: AtomicBool::new(false),
            pending: Mutex::new(Vec::new()),
            chat: Mutex::new(Vec::new()),
            dropped: Mutex::new(Vec::new()),
        })
    }

    pub fn from_config(config: &HookwireConfig) -> Arc<Self> {
        Self::with_world(
            config.max_players,
            config.max_npcs,
            config.max_projectiles,
            TileMap::new(config.world_width, config.world_height),
        )
    }

    fn client(&self, client: usize) -> Option<MutexGuard<'_, Client>> {
        self.clients.get(client).map(|slot| slot.lock())
    }

    pub fn set_password(&self, password: impl Into<String>) {
        *self.password.write() = password.into();
    }

    /// Accept a connection into a slot
    ///
    /// The slot gets a fresh player record, so wrappers built for the
    /// previous occupant are not reused.
    pub fn connect(&self, client: usize) -> Option<SocketId> {
        let socket = SocketId(self.next_socket.fetch_add(1, Ordering::Relaxed));
        {
            let mut slot = self.client(client)?;
            *slot = Client {
                connected: true,
                active: true,
                socket: Some(socket),
                ..Client::default()
            };
        }
        self.players.replace(client, PlayerData::default());
        tracing::debug!("Client {} connected on {:?}", client, socket);
        Some(socket)
    }

    /// Tear down a connection slot
    pub fn reset_client(&self, client: usize) {
        if run_index_hook(&self.hooks.client_pre_reset, client) == HookResult::Cancel {
            return;
        }
        if let Some(mut slot) = self.client(client) {
            *slot = Client::default();
        }
        self.players.deactivate(client);
    }

    pub fn client_state(&self, client: usize) -> i32 {
        self.client(client).map(|slot| slot.state).unwrap_or_default()
    }

    pub fn set_client_state(&self, client: usize, state: i32) {
        if let Some(mut slot) = self.client(client) {
            slot.state = state;
        }
    }

    pub fn client_uuid(&self, client: usize) -> String {
        self.client(client).map(|slot| slot.uuid.clone()).unwrap_or_default()
    }

    pub fn socket(&self, client: usize) -> Option<SocketId> {
        self.client(client).and_then(|slot| slot.socket)
    }

    /// Current health and max health of a player slot
    pub fn player_health(&self, client: usize) -> (i32, i32) {
        self.players
            .get(client)
            .map(|player| {
                let player = player.read();
                (player.health, player.max_health)
            })
            .unwrap_or_default()
    }

    /// Make every later send to a client fail synchronously
    pub fn set_send_failure(&self, client: usize, fail: bool) {
        if let Some(mut slot) = self.client(client) {
            slot.fail_sends = fail;
        }
    }

    /// Keep queued sends in flight until [`MemoryHost::complete_sends`]
    pub fn set_hold_sends(&self, hold: bool) {
        self.hold_sends.store(hold, Ordering::SeqCst);
    }

    /// Finish every send in flight
    ///
    /// # Returns
    /// The number of sends completed
    pub fn complete_sends(&self) -> usize {
        let pending = std::mem::take(&mut *self.pending.lock());
        let count = pending.len();
        for (client, buffer) in pending {
            self.write_socket(client, buffer.to_vec());
        }
        count
    }

    /// Drain frames written to a client's socket
    pub fn take_sent(&self, client: usize) -> Vec<Vec<u8>> {
        self.client(client)
            .map(|mut slot| std::mem::take(&mut slot.sent))
            .unwrap_or_default()
    }

    pub fn chat_log(&self) -> Vec<ChatLine> {
        self.chat.lock().clone()
    }

    pub fn dropped_items(&self) -> Vec<LootDrop> {
        self.dropped.lock().clone()
    }

    /// Write the world out
    ///
    /// # Returns
    /// `false` if the save was canceled
    pub fn save_world(&self) -> bool {
        if let Some(hook) = self.hooks.world_save.get() {
            if hook() == HookResult::Cancel {
                return false;
            }
        }
        let saves = self.saves.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!("Saved {}x{} world (save #{})", self.world.width(), self.world.height(), saves);
        true
    }

    /// Number of completed world saves
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// A frame arrived from a client's socket
    pub fn receive_frame(&self, client: usize, frame: &[u8]) {
        match frame_body(frame) {
            Ok(body) => self.get_data(client, body),
            Err(e) => tracing::debug!("Host dropped frame from {}: {}", client, e),
        }
    }

    /// Send a complete non-module frame to a client
    pub fn send_frame(&self, client: usize, frame: &[u8]) {
        if !self.is_client_connected(client) {
            return;
        }
        if let Some(hook) = self.hooks.send_bytes.get() {
            if hook(client, frame) == HookResult::Cancel {
                return;
            }
        }
        self.write_socket(client, frame.to_vec());
    }

    /// Send a complete module frame to a client's socket
    pub fn send_module_frame(&self, client: usize, frame: &[u8]) {
        let Some(socket) = self.socket(client) else {
            return;
        };
        if let Some(hook) = self.hooks.send_net_data.get() {
            if hook(socket, frame) == HookResult::Cancel {
                return;
            }
        }
        self.write_socket(client, frame.to_vec());
    }

    fn write_socket(&self, client: usize, frame: Vec<u8>) {
        if let Some(mut slot) = self.client(client) {
            if slot.connected {
                slot.sent.push(frame);
            }
        }
    }

    fn get_data(&self, client: usize, body: &[u8]) {
        if let Some(hook) = self.hooks.receive_data.get() {
            if hook(client, body) == HookResult::Cancel {
                return;
            }
        }
        self.handle_native(client, body);
    }

    fn handle_native(&self, client: usize, body: &[u8]) {
        let packet = match AnyPacket::decode(body, PacketRole::Client) {
            Ok(packet) => packet,
            Err(e) => {
                tracing::debug!("Host ignored packet from {}: {}", client, e);
                return;
            }
        };

        match packet {
            AnyPacket::ClientConnect(connect) => {
                let needs_password = !self.password.read().is_empty();
                if let Some(mut slot) = self.client(client) {
                    if slot.state == STATE_CONNECTED && connect.version == MEMORY_VERSION {
                        slot.state = if needs_password {
                            STATE_AWAITING_PASSWORD
                        } else {
                            STATE_ACCEPTED
                        };
                    }
                }
            }
            AnyPacket::ClientPassword(password) => {
                let matches = *self.password.read() == password.password;
                if let Some(mut slot) = self.client(client) {
                    if slot.state == STATE_AWAITING_PASSWORD && matches {
                        slot.state = STATE_ACCEPTED;
                    }
                }
            }
            AnyPacket::PlayerJoin(_) => {
                let joined = match self.client(client) {
                    Some(mut slot) if slot.state == STATE_ACCEPTED => {
                        slot.state = STATE_PLAYING;
                        true
                    }
                    _ => false,
                };
                if joined {
                    self.players.activate(client);
                }
            }
            AnyPacket::PlayerHealth(health) => self.with_player(client, |player| {
                player.health = i32::from(health.health);
                player.max_health = i32::from(health.max_health);
            }),
            AnyPacket::PlayerMana(mana) => self.with_player(client, |player| {
                player.mana = i32::from(mana.mana);
                player.max_mana = i32::from(mana.max_mana);
            }),
            AnyPacket::PlayerPvp(pvp) => self.with_player(client, |player| player.is_in_pvp = pvp.is_in_pvp),
            AnyPacket::PlayerTeam(team) => self.with_player(client, |player| player.team = team.team),
            AnyPacket::ClientUuid(uuid) => {
                if let Some(mut slot) = self.client(client) {
                    slot.uuid = uuid.uuid;
                }
            }
            AnyPacket::NpcBuff(buff) => {
                if let Some(npc) = self.live_npc(i64::from(buff.npc_index)) {
                    npc.add_buff(hookwire_core::Buff::new(buff.id, i32::from(buff.ticks)));
                }
            }
            AnyPacket::NpcCatch(catch) => {
                if let Some(index) = self.live_npc(i64::from(catch.npc_index)).and_then(|npc| npc.index()) {
                    self.npcs.deactivate(index);
                }
            }
            AnyPacket::NpcFish(fish) => {
                let position = TilePosition::new(i32::from(fish.x), i32::from(fish.y)).to_world();
                self.spawn_npc(fish.npc_id, position);
            }
            AnyPacket::TileModify(modify) => self.modify_tile(client, modify),
            AnyPacket::TileSquare(square) => self.apply_square(&square),
            AnyPacket::TileLiquid(liquid) => {
                self.world.update(i32::from(liquid.x), i32::from(liquid.y), |tile| {
                    tile.liquid_amount = liquid.amount;
                    tile.liquid = liquid.liquid;
                });
            }
            AnyPacket::WireActivate(wire) => {
                let toggled = self.hit_wire(i32::from(wire.x), i32::from(wire.y));
                tracing::trace!("Wire hit by {} toggled {} actuators", client, toggled);
            }
            AnyPacket::BlockPaint(paint) => {
                self.world.update(i32::from(paint.x), i32::from(paint.y), |tile| {
                    if tile.is_block_active {
                        tile.block_color = paint.color;
                    }
                });
            }
            AnyPacket::WallPaint(paint) => {
                self.world.update(i32::from(paint.x), i32::from(paint.y), |tile| {
                    if tile.wall_id != WallId::NONE {
                        tile.wall_color = paint.color;
                    }
                });
            }
            AnyPacket::Chat(chat) => self.broadcast_chat(client, chat.module),
            AnyPacket::UnknownModule(_) | AnyPacket::Unknown(_) => {}
        }
    }

    fn modify_tile(&self, client: usize, modify: TileModifyPacket) {
        let (x, y) = (i32::from(modify.x), i32::from(modify.y));
        let dropped = self.world.update(x, y, |tile| match modify.modification {
            TileModification::BREAK_BLOCK | TileModification::BREAK_BLOCK_ITEMLESS => {
                if modify.is_failure() || !tile.is_block_active {
                    return None;
                }
                let item = block_item(tile.block_id);
                tile.clear_block();
                item.filter(|_| modify.modification == TileModification::BREAK_BLOCK)
            }
            TileModification::PLACE_BLOCK if !tile.is_block_active => {
                place_block(tile, modify.block_id(), modify.style);
                None
            }
            TileModification::REPLACE_BLOCK if tile.is_block_active => {
                let item = block_item(tile.block_id);
                place_block(tile, modify.block_id(), modify.style);
                item
            }
            TileModification::BREAK_WALL => {
                if modify.is_failure() || tile.wall_id == WallId::NONE {
                    return None;
                }
                let item = wall_item(tile.wall_id);
                tile.wall_id = WallId::NONE;
                tile.wall_color = PaintColor::NONE;
                item
            }
            TileModification::PLACE_WALL if tile.wall_id == WallId::NONE => {
                tile.wall_id = modify.wall_id();
                None
            }
            TileModification::REPLACE_WALL if tile.wall_id != WallId::NONE => {
                let item = wall_item(tile.wall_id);
                tile.wall_id = modify.wall_id();
                item
            }
            _ => None,
        });

        if let Some(id) = dropped.flatten() {
            tracing::trace!("Tile ({}, {}) broken by {} dropped {:?}", x, y, client, id);
            self.dropped.lock().push(LootDrop {
                id,
                stack_size: 1,
                prefix: ItemPrefix::NONE,
            });
        }
    }

    fn apply_square(&self, square: &TileSquarePacket) {
        let size = usize::from(square.size);
        let (x, y) = (i32::from(square.x), i32::from(square.y));
        for (offset, tile) in square.tiles.iter().enumerate() {
            // Offsets are below 2^15 * 2^15 so each axis fits an i32
            let (i, j) = ((offset / size) as i32, (offset % size) as i32);
            self.world.set(x + i, y + j, *tile);
        }
    }

    /// Run the circuit through a wired tile, flipping every actuator on it
    ///
    /// All wire colors count as one circuit.
    ///
    /// # Returns
    /// The number of actuators toggled
    fn hit_wire(&self, x: i32, y: i32) -> usize {
        if !self.world.get(x, y).is_some_and(|tile| tile.has_wire()) {
            return 0;
        }

        let mut seen = HashSet::from([(x, y)]);
        let mut queue = VecDeque::from([(x, y)]);
        let mut toggled = 0;
        while let Some((x, y)) = queue.pop_front() {
            let flipped = self.world.update(x, y, |tile| {
                if tile.has_actuator {
                    tile.is_block_actuated = !tile.is_block_actuated;
                }
                tile.has_actuator
            });
            if flipped == Some(true) {
                toggled += 1;
            }

            for next in [(x + 1, y), (x - 1, y), (x, y + 1), (x, y - 1)] {
                let wired = self.world.get(next.0, next.1).is_some_and(|tile| tile.has_wire());
                if wired && seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        toggled
    }

    fn with_player<F: FnOnce(&mut PlayerData)>(&self, client: usize, f: F) {
        if let Some(player) = self.players.get(client) {
            f(&mut player.write());
        }
    }

    fn live_npc(&self, index: i64) -> Option<Npc> {
        let index = usize::try_from(index).ok().filter(|index| *index < self.npcs.capacity())?;
        let cell = self.npcs.get(index)?;
        let npc = Npc::new(Some(index), cell);
        npc.is_active().then_some(npc)
    }

    fn broadcast_chat(&self, client: usize, chat: ChatModule) {
        self.chat.lock().push(ChatLine {
            client,
            command: chat.client_command,
            message: chat.client_message.clone(),
        });

        let author = u8::try_from(client).unwrap_or(u8::MAX);
        let broadcast = ModulePacket::new(ChatModule {
            server_author_index: author,
            server_message: NetworkText::literal(chat.client_message),
            server_color: Color3::WHITE,
            ..ChatModule::default()
        });
        let frame = match broadcast.to_frame(PacketRole::Server) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Cannot broadcast chat from {}: {}", client, e);
                return;
            }
        };
        for target in 0..self.clients.len() {
            if self.is_client_connected(target) {
                self.send_module_frame(target, &frame);
            }
        }
    }

    /// Advance the simulation by one tick
    pub fn tick(&self) {
        for index in self.players.active_indices() {
            if run_index_hook(&self.hooks.player_pre_update, index) == HookResult::Continue {
                self.with_player(index, |player| {
                    player.mana = (player.mana + 1).min(player.max_mana);
                });
            }
        }

        for index in self.npcs.active_indices() {
            if run_index_hook(&self.hooks.npc_pre_update, index) == HookResult::Continue {
                if let Some(npc) = self.npcs.get(index) {
                    let mut npc = npc.write();
                    npc.position = Vector2f::new(npc.position.x + npc.velocity.x, npc.position.y + npc.velocity.y);
                }
            }
        }

        for index in self.projectiles.active_indices() {
            if run_index_hook(&self.hooks.projectile_pre_update, index) == HookResult::Continue {
                let Some(projectile) = self.projectiles.get(index) else {
                    continue;
                };
                let expired = {
                    let mut projectile = projectile.write();
                    projectile.position = Vector2f::new(
                        projectile.position.x + projectile.velocity.x,
                        projectile.position.y + projectile.velocity.y,
                    );
                    projectile.time_left -= 1;
                    projectile.time_left <= 0
                };
                if expired {
                    self.projectiles.deactivate(index);
                }
            }
        }
    }

    /// Kill the NPC in a slot and drop its loot
    ///
    /// # Returns
    /// `false` if the slot holds no live NPC
    pub fn kill_npc(&self, index: usize) -> bool {
        let Some(cell) = self.npcs.get(index).filter(|_| index < self.npcs.capacity()) else {
            return false;
        };
        let id = {
            let npc = cell.read();
            if !npc.active {
                return false;
            }
            npc.id
        };

        run_index_hook(&self.hooks.npc_killed, index);

        if let Some(mut loot) = native_loot(id) {
            let result = match self.hooks.npc_loot.get() {
                Some(hook) => hook(index, &mut loot),
                None => HookResult::Continue,
            };
            if result == HookResult::Continue {
                self.dropped.lock().push(loot);
            }
        }

        self.npcs.deactivate(index);
        true
    }

    /// Build an NPC outside the table, the way the host builds templates
    pub fn npc_template(&self, id: NpcId) -> EntityCell<NpcData> {
        let cell = Arc::new(RwLock::new(NpcData::default()));
        self.set_npc_defaults(None, &cell, id);
        cell
    }

    /// Build a projectile outside the table
    pub fn projectile_template(&self, id: ProjectileId) -> EntityCell<ProjectileData> {
        let cell = Arc::new(RwLock::new(ProjectileData::default()));
        self.set_projectile_defaults(None, &cell, id);
        cell
    }

    fn set_npc_defaults(&self, slot: Option<usize>, cell: &EntityCell<NpcData>, id: NpcId) {
        let mut id = id;
        let result = match self.hooks.npc_set_defaults.get() {
            Some(hook) => hook(slot, cell, &mut id),
            None => HookResult::Continue,
        };
        if result == HookResult::Continue {
            cell.write().apply_defaults(id);
        }
    }

    fn set_projectile_defaults(&self, slot: Option<usize>, cell: &EntityCell<ProjectileData>, id: ProjectileId) {
        let mut id = id;
        let result = match self.hooks.projectile_set_defaults.get() {
            Some(hook) => hook(slot, cell, &mut id),
            None => HookResult::Continue,
        };
        if result == HookResult::Continue {
            cell.write().apply_defaults(id);
        }
    }
}

fn native_loot(id: NpcId) -> Option<LootDrop> {
    match id {
        NpcId::BLUE_SLIME | NpcId::GREEN_SLIME => Some(LootDrop {
            id: ItemId::GEL,
            stack_size: 1,
            prefix: ItemPrefix::NONE,
        }),
        _ => None,
    }
}

/// Put a block on a tile, keeping its wall, liquid and wiring
fn place_block(tile: &mut Tile, id: BlockId, style: u8) {
    tile.clear_block();
    tile.block_id = id;
    tile.is_block_active = true;
    if id.has_frames() {
        tile.block_frame_y = i16::from(style) * STYLE_FRAME_HEIGHT;
    }
}

/// Item a broken block drops
fn block_item(id: BlockId) -> Option<ItemId> {
    match id {
        BlockId::DIRT => Some(ItemId::DIRT_BLOCK),
        BlockId::STONE => Some(ItemId::STONE_BLOCK),
        BlockId::TORCHES => Some(ItemId::TORCH),
        _ => None,
    }
}

/// Item a broken wall drops
fn wall_item(id: WallId) -> Option<ItemId> {
    match id {
        WallId::STONE => Some(ItemId::STONE_WALL),
        WallId::DIRT => Some(ItemId::DIRT_WALL),
        _ => None,
    }
}

impl Host for MemoryHost {
    fn hooks(&self) -> &HostHooks {
        &self.hooks
    }

    fn players(&self) -> &Arc<EntityTable<PlayerData>> {
        &self.players
    }

    fn npcs(&self) -> &Arc<EntityTable<NpcData>> {
        &self.npcs
    }

    fn projectiles(&self) -> &Arc<EntityTable<ProjectileData>> {
        &self.projectiles
    }

    fn world(&self) -> &Arc<TileMap> {
        &self.world
    }

    fn is_client_connected(&self, client: usize) -> bool {
        self.client(client).map(|slot| slot.connected).unwrap_or(false)
    }

    fn is_client_active(&self, client: usize) -> bool {
        self.client(client).map(|slot| slot.active).unwrap_or(false)
    }

    fn client_for_socket(&self, socket: SocketId) -> Option<usize> {
        self.clients
            .iter()
            .position(|slot| slot.lock().socket == Some(socket))
    }

    fn replay_receive(&self, client: usize, frame: &[u8]) {
        self.receive_frame(client, frame);
    }

    fn async_send(&self, client: usize, buffer: PooledBuffer) -> io::Result<()> {
        let (connected, fail) = self
            .client(client)
            .map(|slot| (slot.connected, slot.fail_sends))
            .unwrap_or((false, false));
        if !connected {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "client is not connected"));
        }
        if fail {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "socket closed"));
        }

        if self.hold_sends.load(Ordering::SeqCst) {
            self.pending.lock().push((client, buffer));
        } else {
            self.write_socket(client, buffer.to_vec());
        }
        Ok(())
    }

    fn spawn_npc(&self, id: NpcId, position: Vector2f) -> Option<usize> {
        let record = NpcData {
            active: true,
            position,
            ..NpcData::default()
        };
        let (index, cell) = self.npcs.allocate(record)?;
        self.set_npc_defaults(Some(index), &cell, id);

        if run_index_hook(&self.hooks.npc_spawn, index) == HookResult::Cancel {
            self.npcs.deactivate(index);
            return None;
        }
        Some(index)
    }

    fn spawn_projectile(
        &self,
        id: ProjectileId,
        position: Vector2f,
        velocity: Vector2f,
        damage: i32,
        knockback: f32,
    ) -> Option<usize> {
        let record = ProjectileData {
            active: true,
            position,
            velocity,
            ..ProjectileData::default()
        };
        let (index, cell) = self.projectiles.allocate(record)?;
        self.set_projectile_defaults(Some(index), &cell, id);

        let mut projectile = cell.write();
        projectile.damage = damage;
        projectile.knockback = knockback;
        Some(index)
    }
}
