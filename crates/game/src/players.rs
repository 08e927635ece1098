//! # Player Service
//!
//! Intercepts every frame between the host and its clients. Inbound frames
//! are decoded and delivered through [`Player::receive_packet`]; outbound
//! frames through [`Player::send_packet`]. Packet events for the common
//! player packets are forwarded into typed player events.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use hookwire_config::HookwireConfig;
use hookwire_events::{Event, EventBus, EventPriority};
use hookwire_extensions::{Extension, ExtensionContext};
use hookwire_protocol::{
    frame_body, ChatModule, ClientPasswordPacket, ClientUuidPacket, ModulePacket, Packet, PlayerHealthPacket,
    PlayerJoinPacket, PlayerManaPacket, PlayerPvpPacket, PlayerTeamPacket,
};

use crate::dispatch::{DispatchTable, Direction, PlayerList};
use crate::entities::EntityList;
use crate::events::{
    forward, PacketReceiveEvent, PlayerChatEvent, PlayerHealthEvent, PlayerJoinEvent, PlayerManaEvent,
    PlayerPasswordEvent, PlayerPvpEvent, PlayerQuitEvent, PlayerTeamEvent, PlayerTickEvent, PlayerUuidEvent,
};
use crate::guard::ReplayGuard;
use crate::hooks::{HookResult, SocketId};
use crate::host::Host;
use crate::player::Player;
use crate::pool::{BufferPool, DEFAULT_SEND_BUFFER_SIZE};

/// Player capability
pub trait PlayerService: Send + Sync {
    /// Index view over connected players
    fn players(&self) -> &PlayerList;

    /// Pool that send and replay buffers are rented from
    fn send_buffers(&self) -> &Arc<BufferPool>;
}

/// Player service backed by a [`Host`]
pub struct HostPlayerService {
    host: Arc<dyn Host>,
    events: Arc<EventBus>,
    players: PlayerList,
    pool: Arc<BufferPool>,
    inbound: DispatchTable,
    outbound: DispatchTable,
    owner: String,
    span: tracing::Span,
    disposed: AtomicBool,
}

impl HostPlayerService {
    /// Build from the registry and install hooks and forwarders
    pub fn new(ctx: &ExtensionContext<'_>) -> anyhow::Result<Arc<Self>> {
        let host = ctx.get::<dyn Host>()?;
        let events = ctx.events()?;
        let buffer_size = ctx
            .get::<HookwireConfig>()
            .map(|config| config.send_buffer_size)
            .unwrap_or(DEFAULT_SEND_BUFFER_SIZE);
        Ok(Self::with_parts(host, events, buffer_size, ctx.name(), ctx.span()))
    }

    /// Build from explicit parts
    ///
    /// # Arguments
    /// * `host` - The host whose player table and hooks are used
    /// * `events` - Bus for packet and player events
    /// * `buffer_size` - Capacity of each pooled send buffer
    /// * `owner` - Owner name used for handler registration
    /// * `span` - Span entered while handling host callbacks
    pub fn with_parts(
        host: Arc<dyn Host>,
        events: Arc<EventBus>,
        buffer_size: usize,
        owner: &str,
        span: tracing::Span,
    ) -> Arc<Self> {
        let pool = BufferPool::new(buffer_size);
        let players = {
            let events = events.clone();
            let host = host.clone();
            let pool = pool.clone();
            EntityList::new(host.players().clone(), move |index, cell| {
                Player::new(index, cell, events.clone(), host.clone(), pool.clone())
            })
        };

        let service = Arc::new(Self {
            host,
            events,
            players,
            pool,
            inbound: DispatchTable::new(Direction::Inbound),
            outbound: DispatchTable::new(Direction::Outbound),
            owner: owner.to_string(),
            span,
            disposed: AtomicBool::new(false),
        });
        service.install();
        service
    }

    fn install(self: &Arc<Self>) {
        let hooks = self.host.hooks();

        let weak = Arc::downgrade(self);
        hooks.receive_data.set(Arc::new(move |client: usize, body: &[u8]| {
            if ReplayGuard::is_active() {
                return HookResult::Continue;
            }
            with_service(&weak, |service| service.on_receive_data(client, body))
        }));

        let weak = Arc::downgrade(self);
        hooks.send_bytes.set(Arc::new(move |client: usize, frame: &[u8]| {
            with_service(&weak, |service| service.on_send(client, frame))
        }));

        let weak = Arc::downgrade(self);
        hooks.send_net_data.set(Arc::new(move |socket: SocketId, frame: &[u8]| {
            with_service(&weak, |service| service.on_send_net_data(socket, frame))
        }));

        let weak = Arc::downgrade(self);
        hooks
            .player_pre_update
            .set(Arc::new(move |index| with_service(&weak, |service| service.on_pre_update(index))));

        let weak = Arc::downgrade(self);
        hooks
            .client_pre_reset
            .set(Arc::new(move |index| with_service(&weak, |service| service.on_pre_reset(index))));

        self.forward_packet::<PlayerJoinPacket, _, _>(|evt| PlayerJoinEvent::new(evt.sender.clone()));
        self.forward_packet::<PlayerHealthPacket, _, _>(|evt| {
            PlayerHealthEvent::new(evt.sender.clone(), evt.packet.health, evt.packet.max_health)
        });
        self.forward_packet::<PlayerPvpPacket, _, _>(|evt| {
            PlayerPvpEvent::new(evt.sender.clone(), evt.packet.is_in_pvp)
        });
        self.forward_packet::<ClientPasswordPacket, _, _>(|evt| {
            PlayerPasswordEvent::new(evt.sender.clone(), evt.packet.password.clone())
        });
        self.forward_packet::<PlayerManaPacket, _, _>(|evt| {
            PlayerManaEvent::new(evt.sender.clone(), evt.packet.mana, evt.packet.max_mana)
        });
        self.forward_packet::<PlayerTeamPacket, _, _>(|evt| {
            PlayerTeamEvent::new(evt.sender.clone(), evt.packet.team)
        });
        self.forward_packet::<ClientUuidPacket, _, _>(|evt| {
            PlayerUuidEvent::new(evt.sender.clone(), evt.packet.uuid.clone())
        });
        self.forward_packet::<ModulePacket<ChatModule>, _, _>(|evt| {
            let chat = &evt.packet.module;
            PlayerChatEvent::new(evt.sender.clone(), chat.client_command.clone(), chat.client_message.clone())
        });

        tracing::debug!(parent: &self.span, "Installed player hooks");
    }

    /// Raise the event built by `make` whenever a `P` is received
    fn forward_packet<P, E, F>(&self, make: F)
    where
        P: Packet,
        E: Event,
        F: Fn(&PacketReceiveEvent<P>) -> E + Send + Sync + 'static,
    {
        let bus = Arc::downgrade(&self.events);
        self.events
            .register::<PacketReceiveEvent<P>, _>(&self.owner, EventPriority::Lowest, move |evt| {
                if let Some(bus) = bus.upgrade() {
                    let forwarded = make(evt);
                    forward(&bus, evt, forwarded);
                }
            });
    }

    fn on_receive_data(&self, client: usize, body: &[u8]) -> HookResult {
        let _span = self.span.enter();
        if let Err(e) = self.inbound.dispatch(&self.players, client, body) {
            tracing::warn!("Dropped packet from {}: {}", client, e);
        }
        HookResult::Cancel
    }

    fn on_send(&self, client: usize, frame: &[u8]) -> HookResult {
        let _span = self.span.enter();
        let result = frame_body(frame).and_then(|body| self.outbound.dispatch(&self.players, client, body));
        if let Err(e) = result {
            tracing::warn!("Dropped packet to {}: {}", client, e);
        }
        HookResult::Cancel
    }

    fn on_send_net_data(&self, socket: SocketId, frame: &[u8]) -> HookResult {
        match self.host.client_for_socket(socket) {
            Some(client) => self.on_send(client, frame),
            None => {
                tracing::debug!(parent: &self.span, "No client owns socket {:?}", socket);
                HookResult::Continue
            }
        }
    }

    fn on_pre_update(&self, index: usize) -> HookResult {
        let Ok(player) = self.players.get(index) else {
            return HookResult::Continue;
        };
        let mut evt = PlayerTickEvent::new(player);
        self.events.raise(&mut evt);
        if evt.is_canceled() {
            HookResult::Cancel
        } else {
            HookResult::Continue
        }
    }

    fn on_pre_reset(&self, index: usize) -> HookResult {
        if !self.host.is_client_active(index) {
            return HookResult::Continue;
        }
        if let Ok(player) = self.players.get(index) {
            let mut evt = PlayerQuitEvent::new(player);
            self.events.raise(&mut evt);
            tracing::debug!(parent: &self.span, "Player {} quit", index);
        }
        HookResult::Continue
    }
}

fn with_service<F>(weak: &Weak<HostPlayerService>, f: F) -> HookResult
where
    F: FnOnce(&HostPlayerService) -> HookResult,
{
    match weak.upgrade() {
        Some(service) => f(&service),
        None => HookResult::Continue,
    }
}

impl PlayerService for HostPlayerService {
    fn players(&self) -> &PlayerList {
        &self.players
    }

    fn send_buffers(&self) -> &Arc<BufferPool> {
        &self.pool
    }
}

impl Extension for HostPlayerService {
    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let hooks = self.host.hooks();
        hooks.receive_data.clear();
        hooks.send_bytes.clear();
        hooks.send_net_data.clear();
        hooks.player_pre_update.clear();
        hooks.client_pre_reset.clear();
        let removed = self.events.deregister_owner(&self.owner);
        tracing::debug!(parent: &self.span, "Removed player hooks and {} handlers", removed);
    }
}
