//! # NPC Service
//!
//! Index view over the host's NPC table, spawning, and the NPC lifecycle
//! events raised from the host's defaults, spawn, update, death and loot
//! callbacks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use hookwire_core::{Buff, NpcId, TilePosition, Vector2f};
use hookwire_events::{Event, EventBus, EventPriority};
use hookwire_extensions::{Extension, ExtensionContext};
use hookwire_protocol::{NpcBuffPacket, NpcCatchPacket, NpcFishPacket, Packet};

use crate::data::NpcData;
use crate::entities::{EntityCell, EntityList};
use crate::events::{
    forward, NpcBuffEvent, NpcCatchEvent, NpcDefaultsEvent, NpcFishEvent, NpcKilledEvent, NpcLootEvent,
    NpcSpawnEvent, NpcTickEvent, PacketReceiveEvent,
};
use crate::hooks::{HookResult, LootDrop};
use crate::host::Host;
use crate::npc::Npc;
use crate::players::PlayerService;

pub type NpcList = EntityList<NpcData, Npc>;

/// NPC capability
pub trait NpcService: Send + Sync {
    fn npcs(&self) -> &NpcList;

    /// Spawn an NPC at a world position
    ///
    /// # Returns
    /// The new NPC, or `None` when the table is full or the spawn was canceled
    fn spawn(&self, id: NpcId, position: Vector2f) -> Option<Arc<Npc>>;
}

pub struct HostNpcService {
    host: Arc<dyn Host>,
    events: Arc<EventBus>,
    players: Arc<dyn PlayerService>,
    npcs: NpcList,
    owner: String,
    span: tracing::Span,
    disposed: AtomicBool,
}

impl HostNpcService {
    pub fn new(ctx: &ExtensionContext<'_>) -> anyhow::Result<Arc<Self>> {
        let host = ctx.get::<dyn Host>()?;
        let events = ctx.events()?;
        let players = ctx.get::<dyn PlayerService>()?;

        let service = Arc::new(Self {
            npcs: EntityList::new(host.npcs().clone(), Npc::new),
            host,
            events,
            players,
            owner: ctx.name().to_string(),
            span: ctx.span(),
            disposed: AtomicBool::new(false),
        });
        service.install();
        Ok(service)
    }

    fn install(self: &Arc<Self>) {
        let hooks = self.host.hooks();

        let weak = Arc::downgrade(self);
        hooks.npc_set_defaults.set(Arc::new(
            move |slot: Option<usize>, cell: &EntityCell<NpcData>, id: &mut NpcId| {
                with_service(&weak, |service| service.on_set_defaults(slot, cell, id))
            },
        ));

        let weak = Arc::downgrade(self);
        hooks
            .npc_spawn
            .set(Arc::new(move |index| with_service(&weak, |service| service.on_spawn(index))));

        let weak = Arc::downgrade(self);
        hooks
            .npc_pre_update
            .set(Arc::new(move |index| with_service(&weak, |service| service.on_pre_update(index))));

        let weak = Arc::downgrade(self);
        hooks
            .npc_killed
            .set(Arc::new(move |index| with_service(&weak, |service| service.on_killed(index))));

        let weak = Arc::downgrade(self);
        hooks.npc_loot.set(Arc::new(move |index: usize, loot: &mut LootDrop| {
            with_service(&weak, |service| service.on_loot(index, loot))
        }));

        self.on_packet::<NpcBuffPacket, _>(|service, evt| {
            let npc = service.npcs.get_signed(i64::from(evt.packet.npc_index))?;
            let buff = Buff::new(evt.packet.id, i32::from(evt.packet.ticks));
            let buffed = NpcBuffEvent::new(npc, evt.sender.clone(), buff);
            forward(&service.events, evt, buffed);
            Ok(())
        });
        self.on_packet::<NpcCatchPacket, _>(|service, evt| {
            let npc = service.npcs.get_signed(i64::from(evt.packet.npc_index))?;
            let player = service.players.players().get(usize::from(evt.packet.player_index))?;
            let caught = NpcCatchEvent::new(npc, player);
            forward(&service.events, evt, caught);
            Ok(())
        });
        self.on_packet::<NpcFishPacket, _>(|service, evt| {
            let position = TilePosition::new(i32::from(evt.packet.x), i32::from(evt.packet.y));
            let fished = NpcFishEvent::new(evt.sender.clone(), position, evt.packet.npc_id);
            forward(&service.events, evt, fished);
            Ok(())
        });

        tracing::debug!(parent: &self.span, "Installed NPC hooks");
    }

    /// Handle every received `P` at the lowest priority
    ///
    /// A handler error cancels the packet.
    fn on_packet<P, F>(self: &Arc<Self>, handler: F)
    where
        P: Packet,
        F: Fn(&Self, &mut PacketReceiveEvent<P>) -> hookwire_core::Result<()> + Send + Sync + 'static,
    {
        let weak = Arc::downgrade(self);
        self.events
            .register::<PacketReceiveEvent<P>, _>(&self.owner, EventPriority::Lowest, move |evt| {
                let Some(service) = weak.upgrade() else {
                    return;
                };
                if let Err(e) = handler(&service, evt) {
                    tracing::warn!(parent: &service.span, "Rejected packet {}: {}", evt.packet.id(), e);
                    evt.cancel_with(e.to_string());
                }
            });
    }

    fn on_set_defaults(&self, slot: Option<usize>, cell: &EntityCell<NpcData>, id: &mut NpcId) -> HookResult {
        let npc = self.npcs.resolve(slot, cell);
        let mut evt = NpcDefaultsEvent::new(npc, *id);
        self.events.raise(&mut evt);
        if evt.is_canceled() {
            return HookResult::Cancel;
        }
        *id = evt.id;
        HookResult::Continue
    }

    fn on_spawn(&self, index: usize) -> HookResult {
        let Ok(npc) = self.npcs.get(index) else {
            return HookResult::Continue;
        };
        let mut evt = NpcSpawnEvent::new(npc);
        self.events.raise(&mut evt);
        if evt.is_canceled() {
            return HookResult::Cancel;
        }
        HookResult::Continue
    }

    fn on_pre_update(&self, index: usize) -> HookResult {
        let Ok(npc) = self.npcs.get(index) else {
            return HookResult::Continue;
        };
        let mut evt = NpcTickEvent::new(npc);
        self.events.raise(&mut evt);
        if evt.is_canceled() {
            HookResult::Cancel
        } else {
            HookResult::Continue
        }
    }

    fn on_killed(&self, index: usize) -> HookResult {
        if let Ok(npc) = self.npcs.get(index) {
            self.events.raise(&mut NpcKilledEvent::new(npc));
        }
        HookResult::Continue
    }

    fn on_loot(&self, index: usize, loot: &mut LootDrop) -> HookResult {
        let Ok(npc) = self.npcs.get(index) else {
            return HookResult::Continue;
        };
        let mut evt = NpcLootEvent::new(npc, loot.id, loot.stack_size, loot.prefix);
        self.events.raise(&mut evt);
        if evt.is_canceled() {
            return HookResult::Cancel;
        }
        loot.id = evt.id;
        loot.stack_size = evt.stack_size;
        loot.prefix = evt.prefix;
        HookResult::Continue
    }
}

fn with_service<F>(weak: &Weak<HostNpcService>, f: F) -> HookResult
where
    F: FnOnce(&HostNpcService) -> HookResult,
{
    match weak.upgrade() {
        Some(service) => f(&service),
        None => HookResult::Continue,
    }
}

impl NpcService for HostNpcService {
    fn npcs(&self) -> &NpcList {
        &self.npcs
    }

    fn spawn(&self, id: NpcId, position: Vector2f) -> Option<Arc<Npc>> {
        let index = self.host.spawn_npc(id, position)?;
        self.npcs.get(index).ok()
    }
}

impl Extension for HostNpcService {
    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let hooks = self.host.hooks();
        hooks.npc_set_defaults.clear();
        hooks.npc_spawn.clear();
        hooks.npc_pre_update.clear();
        hooks.npc_killed.clear();
        hooks.npc_loot.clear();
        let removed = self.events.deregister_owner(&self.owner);
        tracing::debug!(parent: &self.span, "Removed NPC hooks and {} handlers", removed);
    }
}
